pub mod serialize;

use std::fmt;

/// An attribute value on a plain element.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Num(f64),
    /// `true` is a presence-only attribute, `false` is treated as absent.
    Bool(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Num(n) => write!(f, "{n}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Ordered attribute mapping. Names are unique; insertion order is kept for serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    /// Set `name`, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let index = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &AttrValue) -> bool) {
        self.0.retain(|(n, v)| keep(n, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut AttrValue)> {
        self.0.iter_mut().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<AttrValue>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Attributes,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<MarkupNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_children(vec![MarkupNode::Text(text.into())])
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs.get_str("class").unwrap_or_default().split_whitespace()
    }
}

/// A JSX attribute value as produced by the markup parser.
#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    Literal(AttrValue),
    /// `{...}` source text; never evaluated.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttribute {
    pub name: String,
    /// `None` for a bare attribute such as `allowfullscreen`.
    pub value: Option<JsxAttrValue>,
}

impl JsxAttribute {
    pub fn literal(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(JsxAttrValue::Literal(value.into())),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn expression(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(JsxAttrValue::Expression(source.into())),
        }
    }
}

/// Raw-HTML element as the parser first sees it. Only exists before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsxElement {
    /// `None` for a fragment (`<>...</>`).
    pub name: Option<String>,
    pub attributes: Vec<JsxAttribute>,
    pub children: Vec<MarkupNode>,
}

impl JsxElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, attribute: JsxAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_children(mut self, children: Vec<MarkupNode>) -> Self {
        self.children = children;
        self
    }
}

/// The parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Root(Vec<MarkupNode>),
    Element(Element),
    Text(String),
    /// Inline raw HTML; transient.
    JsxTextElement(JsxElement),
    /// Block-level raw HTML; transient.
    JsxFlowElement(JsxElement),
}

impl Default for MarkupNode {
    fn default() -> Self {
        MarkupNode::Text(String::new())
    }
}

impl From<Element> for MarkupNode {
    fn from(element: Element) -> Self {
        MarkupNode::Element(element)
    }
}

impl MarkupNode {
    pub fn text(text: impl Into<String>) -> Self {
        MarkupNode::Text(text.into())
    }

    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Root(children) => children,
            MarkupNode::Element(el) => &el.children,
            MarkupNode::JsxTextElement(jsx) | MarkupNode::JsxFlowElement(jsx) => &jsx.children,
            MarkupNode::Text(_) => &[],
        }
    }

    /// Child list of a container node, `None` for text.
    pub fn children_mut(&mut self) -> Option<&mut Vec<MarkupNode>> {
        match self {
            MarkupNode::Root(children) => Some(children),
            MarkupNode::Element(el) => Some(&mut el.children),
            MarkupNode::JsxTextElement(jsx) | MarkupNode::JsxFlowElement(jsx) => {
                Some(&mut jsx.children)
            }
            MarkupNode::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// True for an `Element` with the given tag.
    pub fn is_element(&self, tag: &str) -> bool {
        matches!(self, MarkupNode::Element(el) if el.tag == tag)
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarkupNode::JsxTextElement(_) | MarkupNode::JsxFlowElement(_)
        )
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            MarkupNode::Text(text) => out.push_str(text),
            other => other.children().iter().for_each(|c| c.collect_text(out)),
        }
    }

    /// Pre-order walk over every node.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MarkupNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Serialize to HTML.
    pub fn to_html(&self) -> String {
        serialize::to_html(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut attrs: Attributes = [("href", "a"), ("class", "x")].into_iter().collect();

        attrs.insert("href", "b");

        let names: Vec<_> = attrs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["href", "class"]);
        assert_eq!(attrs.get_str("href"), Some("b"));
    }

    #[test]
    fn test_remove_and_retain() {
        let mut attrs: Attributes = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();

        assert_eq!(attrs.remove("b"), Some(AttrValue::from("2")));
        attrs.retain(|name, _| name != "c");

        assert_eq!(attrs.len(), 1);
        assert!(attrs.contains("a"));
    }

    #[test]
    fn test_text_content_spans_descendants() {
        let tree = MarkupNode::Root(vec![
            Element::new("p")
                .with_children(vec![
                    MarkupNode::text("hello "),
                    Element::new("strong").with_text("world").into(),
                ])
                .into(),
            MarkupNode::JsxTextElement(JsxElement::new("u").with_children(vec![MarkupNode::text("!")])),
        ]);

        assert_eq!(tree.text_content(), "hello world!");
    }

    #[test]
    fn test_classes_split_on_whitespace() {
        let el = Element::new("code").with_attr("class", "language-rust  extra");
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["language-rust", "extra"]);
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let tree = MarkupNode::Root(vec![
            Element::new("h1").with_text("a").into(),
            Element::new("p").with_text("b").into(),
        ]);
        let mut texts = Vec::new();
        tree.walk(&mut |node| {
            if let MarkupNode::Text(t) = node {
                texts.push(t.as_str());
            }
        });
        assert_eq!(texts, vec!["a", "b"]);
    }
}
