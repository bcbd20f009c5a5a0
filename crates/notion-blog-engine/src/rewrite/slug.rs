use std::collections::HashMap;

use crate::markup::MarkupNode;

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// GitHub-style heading slugs, unique within one document.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `text`, suffixed `-1`, `-2`, ... when already handed out.
    pub fn slug(&mut self, text: &str) -> String {
        let original = slugify(text);
        let mut result = original.clone();
        while self.occurrences.contains_key(&result) {
            let count = self.occurrences.entry(original.clone()).or_insert(0);
            *count += 1;
            result = format!("{original}-{count}");
        }
        self.occurrences.insert(result.clone(), 0);
        result
    }
}

/// Lowercase, drop punctuation and symbols, turn whitespace into `-`.
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('-')
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Give every heading without an `id` one derived from its text.
pub fn assign_heading_ids(node: &mut MarkupNode) {
    let mut slugger = Slugger::new();
    assign(node, &mut slugger);
}

fn assign(node: &mut MarkupNode, slugger: &mut Slugger) {
    let needs_id = node
        .as_element()
        .is_some_and(|el| HEADING_TAGS.contains(&el.tag.as_str()) && !el.attrs.contains("id"));
    if needs_id {
        let id = slugger.slug(&node.text_content());
        if let MarkupNode::Element(el) = node {
            el.attrs.insert("id", id);
        }
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            assign(child, slugger);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Element;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Hello World", "hello-world")]
    #[case("What's new in v2.0?", "whats-new-in-v20")]
    #[case("  padded  ", "--padded--")]
    #[case("snake_case and-dash", "snake_case-and-dash")]
    #[case("한글 제목", "한글-제목")]
    #[case("C++ & Rust!", "c--rust")]
    fn test_slugify(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn test_duplicates_get_numbered_suffixes() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Intro"), "intro");
        assert_eq!(slugger.slug("Intro"), "intro-1");
        assert_eq!(slugger.slug("Intro"), "intro-2");
        assert_eq!(slugger.slug("intro-1"), "intro-1-1");
    }

    #[test]
    fn test_assign_heading_ids_keeps_existing() {
        // Given two headings, one with an id already
        let mut tree = MarkupNode::Root(vec![
            Element::new("h2").with_text("Setup").into(),
            Element::new("h2")
                .with_attr("id", "custom")
                .with_text("Setup")
                .into(),
            Element::new("h3").with_text("Setup").into(),
        ]);

        // When ids are assigned
        assign_heading_ids(&mut tree);

        // Then only headings without one get a fresh slug
        let ids: Vec<_> = tree
            .children()
            .iter()
            .filter_map(|n| n.as_element()?.attrs.get_str("id"))
            .collect();
        assert_eq!(ids, vec!["setup", "custom", "setup-1"]);
    }
}
