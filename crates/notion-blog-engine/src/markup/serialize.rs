use super::{AttrValue, JsxAttrValue, JsxElement, MarkupNode};

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Serialize a tree to an HTML string.
pub fn to_html(node: &MarkupNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Root(children) => children.iter().for_each(|c| write_node(c, out)),
        MarkupNode::Text(text) => out.push_str(&html_escape::encode_text(text)),
        MarkupNode::Element(el) => write_element(
            &el.tag,
            el.attrs.iter().map(|(n, v)| (n, Some(v))),
            &el.children,
            out,
        ),
        MarkupNode::JsxTextElement(jsx) | MarkupNode::JsxFlowElement(jsx) => write_jsx(jsx, out),
    }
}

fn write_jsx(jsx: &JsxElement, out: &mut String) {
    let tag = jsx.name.as_deref().unwrap_or("div");
    let attrs = jsx.attributes.iter().map(|attr| match &attr.value {
        Some(JsxAttrValue::Literal(value)) => (attr.name.as_str(), Some(value)),
        Some(JsxAttrValue::Expression(_)) | None => (attr.name.as_str(), None),
    });
    write_element(tag, attrs, &jsx.children, out);
}

/// `None` values are written as bare attribute names.
fn write_element<'a>(
    tag: &str,
    attrs: impl Iterator<Item = (&'a str, Option<&'a AttrValue>)>,
    children: &[MarkupNode],
    out: &mut String,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        match value {
            Some(AttrValue::Bool(false)) => continue,
            Some(AttrValue::Bool(true)) | None => {
                out.push(' ');
                out.push_str(name);
            }
            Some(value) => {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&value.to_string()));
                out.push('"');
            }
        }
    }
    out.push('>');

    if is_void(tag) {
        return;
    }
    for child in children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
