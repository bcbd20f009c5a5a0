use std::mem;

use crate::markup::MarkupNode;

/// Default bound on full-tree flattening passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Outcome of [`flatten_nested_anchors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlattenReport {
    /// Full-tree passes run.
    pub iterations: usize,
    /// Inner anchors unwrapped.
    pub removed: usize,
    /// False when nested anchors remain because the pass bound was hit.
    pub converged: bool,
}

/// Remove anchors nested inside other anchors, splicing each inner anchor's
/// children into its place. The outer anchor and its attributes are kept;
/// inner anchors lose their `href` and every other attribute.
///
/// Passes repeat until one changes nothing or `max_iterations` is reached.
/// The bound is soft: hitting it may leave nesting behind, which the
/// returned report flags instead of failing.
pub fn flatten_nested_anchors(root: &mut MarkupNode, max_iterations: usize) -> FlattenReport {
    let mut report = FlattenReport::default();

    while report.iterations < max_iterations {
        report.iterations += 1;
        let removed = flatten_pass(root);
        report.removed += removed;
        if removed == 0 {
            break;
        }
    }

    report.converged = !has_nested_anchor(root);
    if !report.converged {
        log::warn!(
            "Nested anchors remain after {} flattening passes",
            report.iterations
        );
    }
    report
}

/// True if some `a` element has an `a` descendant.
pub fn has_nested_anchor(node: &MarkupNode) -> bool {
    nested_below(node, false)
}

fn nested_below(node: &MarkupNode, inside_anchor: bool) -> bool {
    let is_anchor = node.is_element("a");
    if is_anchor && inside_anchor {
        return true;
    }
    node.children()
        .iter()
        .any(|child| nested_below(child, inside_anchor || is_anchor))
}

/// One scan: every outermost anchor with an anchor below it is cleaned.
fn flatten_pass(node: &mut MarkupNode) -> usize {
    if let MarkupNode::Element(el) = node
        && el.tag == "a"
        && el.children.iter().any(|c| nested_below(c, true))
    {
        return unwrap_anchors(&mut el.children);
    }
    node.children_mut()
        .map(|children| children.iter_mut().map(flatten_pass).sum())
        .unwrap_or(0)
}

/// Replace every anchor in `children`, at any depth, by its own children.
fn unwrap_anchors(children: &mut Vec<MarkupNode>) -> usize {
    let mut removed = 0;
    let mut flattened = Vec::with_capacity(children.len());

    for mut child in mem::take(children) {
        match child {
            MarkupNode::Element(mut inner) if inner.tag == "a" => {
                removed += 1 + unwrap_anchors(&mut inner.children);
                log::debug!(
                    "Removed nested anchor href={:?}",
                    inner.attrs.get_str("href").unwrap_or_default()
                );
                flattened.extend(inner.children);
            }
            _ => {
                if let Some(grandchildren) = child.children_mut() {
                    removed += unwrap_anchors(grandchildren);
                }
                flattened.push(child);
            }
        }
    }

    *children = flattened;
    removed
}
