use std::mem;

use crate::markup::{AttrValue, Attributes, Element, JsxAttrValue, JsxElement, MarkupNode};

/// Tag used for a JSX element that declares no name.
pub const DEFAULT_TAG: &str = "div";

/// Replace every transient JSX node with a plain [`Element`].
///
/// Children are rewritten first, then each node is swapped out of its
/// parent's child list at its original index, so no node is ever reachable
/// from two parents at once. The result contains no transient nodes.
pub fn normalize_jsx(mut node: MarkupNode) -> MarkupNode {
    normalize_children(&mut node);
    match node {
        MarkupNode::JsxTextElement(jsx) | MarkupNode::JsxFlowElement(jsx) => {
            MarkupNode::Element(to_element(jsx))
        }
        other => other,
    }
}

fn normalize_children(node: &mut MarkupNode) {
    let Some(children) = node.children_mut() else {
        return;
    };
    for index in 0..children.len() {
        let child = mem::take(&mut children[index]);
        children[index] = normalize_jsx(child);
    }
}

/// Plain element for a JSX node whose children are already normalized.
///
/// Expression values are never evaluated: they become `true`, as do
/// attributes without a value.
fn to_element(jsx: JsxElement) -> Element {
    let attrs: Attributes = jsx
        .attributes
        .into_iter()
        .map(|attr| {
            let value = match attr.value {
                Some(JsxAttrValue::Literal(value)) => value,
                Some(JsxAttrValue::Expression(_)) | None => AttrValue::Bool(true),
            };
            (attr.name, value)
        })
        .collect();

    Element {
        tag: jsx.name.unwrap_or_else(|| DEFAULT_TAG.to_string()),
        attrs,
        children: jsx.children,
    }
}

/// Number of transient nodes in a tree.
pub fn count_transient(node: &MarkupNode) -> usize {
    let mut count = 0;
    node.walk(&mut |n| {
        if n.is_transient() {
            count += 1;
        }
    });
    count
}
