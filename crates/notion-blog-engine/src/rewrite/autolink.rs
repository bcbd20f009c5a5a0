use std::mem;
use std::sync::OnceLock;

use regex::Regex;

use crate::markup::{Element, MarkupNode};

/// Elements whose text is never linked.
const NO_LINK_TAGS: &[&str] = &["code", "pre", "script", "style"];

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s<>\[\]]+").expect("Invalid URL regex"))
}

/// Byte ranges of bare urls in `text`, trailing punctuation excluded.
pub fn find_urls(text: &str) -> Vec<(usize, usize)> {
    url_regex()
        .find_iter(text)
        .filter_map(|m| {
            let trimmed = m
                .as_str()
                .trim_end_matches(['.', ',', ':', ';', '!', '?', ')', ']', '}']);
            // Nothing but the scheme left.
            (!trimmed.ends_with("//")).then(|| (m.start(), m.start() + trimmed.len()))
        })
        .collect()
}

/// Turn bare `http(s)://` urls in text into `a` elements.
///
/// Text already inside a markdown link is left alone. Raw HTML anchors are
/// still transient at this point and are not recognised, so urls inside
/// them get linked too; the anchor flattener repairs that nesting later.
pub fn autolink(node: &mut MarkupNode) {
    let Some(children) = node.children_mut() else {
        return;
    };
    let mut linked = Vec::with_capacity(children.len());

    for mut child in mem::take(children) {
        let skip = match &child {
            MarkupNode::Text(text) => {
                linked.extend(link_text(text));
                continue;
            }
            MarkupNode::Element(el) => el.tag == "a" || NO_LINK_TAGS.contains(&el.tag.as_str()),
            MarkupNode::JsxTextElement(jsx) | MarkupNode::JsxFlowElement(jsx) => jsx
                .name
                .as_deref()
                .is_some_and(|name| NO_LINK_TAGS.contains(&name)),
            MarkupNode::Root(_) => false,
        };
        if !skip {
            autolink(&mut child);
        }
        linked.push(child);
    }

    *children = linked;
}

fn link_text(text: &str) -> Vec<MarkupNode> {
    let urls = find_urls(text);
    if urls.is_empty() {
        return vec![MarkupNode::text(text)];
    }

    let mut nodes = Vec::new();
    let mut pos = 0;
    for (start, end) in urls {
        if start > pos {
            nodes.push(MarkupNode::text(&text[pos..start]));
        }
        let url = &text[start..end];
        nodes.push(Element::new("a").with_attr("href", url).with_text(url).into());
        pos = end;
    }
    if pos < text.len() {
        nodes.push(MarkupNode::text(&text[pos..]));
    }
    nodes
}
