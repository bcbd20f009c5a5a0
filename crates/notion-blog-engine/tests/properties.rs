//! Properties of the security passes over generated trees.

use notion_blog_engine::rewrite::anchors::DEFAULT_MAX_ITERATIONS;
use notion_blog_engine::rewrite::{flatten_nested_anchors, has_nested_anchor, normalize_jsx, sanitize};
use notion_blog_engine::transform::escape::{escape_attribute, unescape_attribute};
use notion_blog_engine::{
    AttrValue, Element, JsxAttribute, JsxElement, MarkupNode, SanitizeSchema,
};
use pretty_assertions::assert_eq;

const CASES: u64 = 300;

const TAGS: &[&str] = &[
    "a", "a", "a", "p", "div", "span", "u", "img", "iframe", "video", "source", "table", "tr",
    "td", "input", "h2", "code", "pre", "script", "style", "form", "object", "x-widget",
];

const ATTRS: &[(&str, &str)] = &[
    ("href", "https://ok.example"),
    ("href", "javascript:alert(1)"),
    ("href", "/relative"),
    ("onclick", "steal()"),
    ("class", "language-rust note"),
    ("className", "note"),
    ("style", "color:red"),
    ("id", "top"),
    ("name", "user-content-top"),
    ("src", "https://img.example/a.png"),
    ("src", "data:text/html,boom"),
    ("type", "text"),
    ("alt", "a picture"),
    ("data-x", "1"),
    ("target", "_blank"),
    ("frameborder", "0"),
];

/// Small linear congruential generator, so failures reproduce from the seed.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }
}

fn gen_children(rng: &mut Lcg, depth: usize) -> Vec<MarkupNode> {
    if depth == 0 {
        return vec![MarkupNode::text("leaf")];
    }
    (0..rng.below(4)).map(|_| gen_node(rng, depth - 1)).collect()
}

fn gen_node(rng: &mut Lcg, depth: usize) -> MarkupNode {
    match rng.below(6) {
        0 => MarkupNode::text(format!("text {}", rng.below(100))),
        1 => {
            let mut jsx = JsxElement::new(*rng.pick(TAGS));
            for _ in 0..rng.below(3) {
                let (name, value) = *rng.pick(ATTRS);
                jsx = jsx.with_attribute(JsxAttribute::literal(name, value));
            }
            if rng.below(4) == 0 {
                jsx = jsx.with_attribute(JsxAttribute::expression("onload", "run()"));
            }
            MarkupNode::JsxTextElement(jsx.with_children(gen_children(rng, depth)))
        }
        _ => {
            let mut el = Element::new(*rng.pick(TAGS));
            for _ in 0..rng.below(4) {
                let (name, value) = *rng.pick(ATTRS);
                el.attrs.insert(name, value);
            }
            if rng.below(5) == 0 {
                el.attrs.insert("allowfullscreen", AttrValue::Bool(true));
            }
            el.with_children(gen_children(rng, depth)).into()
        }
    }
}

fn gen_tree(seed: u64) -> MarkupNode {
    let mut rng = Lcg(seed);
    let depth = 1 + rng.below(5);
    MarkupNode::Root((0..1 + rng.below(4)).map(|_| gen_node(&mut rng, depth)).collect())
}

fn clean(tree: MarkupNode, schema: &SanitizeSchema) -> MarkupNode {
    sanitize(normalize_jsx(tree), schema)
}

fn assert_allowed(node: &MarkupNode, schema: &SanitizeSchema, seed: u64) {
    node.walk(&mut |n| match n {
        MarkupNode::Element(el) => {
            assert!(schema.allows_tag(&el.tag), "seed {seed}: <{}> survived", el.tag);
            for (name, _) in el.attrs.iter() {
                assert!(
                    schema.allows_attribute(&el.tag, name),
                    "seed {seed}: {name} survived on <{}>",
                    el.tag
                );
            }
        }
        MarkupNode::JsxTextElement(_) | MarkupNode::JsxFlowElement(_) => {
            panic!("seed {seed}: transient node survived")
        }
        MarkupNode::Root(_) | MarkupNode::Text(_) => {}
    });
}

#[test]
fn sanitized_trees_only_contain_allowed_tags_and_attributes() {
    let schema = SanitizeSchema::blog();
    for seed in 0..CASES {
        // Given an arbitrary tree
        let tree = gen_tree(seed);

        // When normalized and sanitized
        let cleaned = clean(tree, &schema);

        // Then everything left is on the allow-list
        assert_allowed(&cleaned, &schema, seed);
        assert!(!cleaned.to_html().contains("javascript:"), "seed {seed}");
    }
}

#[test]
fn flattened_trees_have_no_nested_anchors() {
    let schema = SanitizeSchema::blog();
    for seed in 0..CASES {
        let mut tree = clean(gen_tree(seed), &schema);

        let report = flatten_nested_anchors(&mut tree, DEFAULT_MAX_ITERATIONS);

        assert!(report.converged, "seed {seed}: {report:?}");
        assert!(!has_nested_anchor(&tree), "seed {seed}");
    }
}

#[test]
fn sanitize_is_idempotent() {
    let schema = SanitizeSchema::blog();
    for seed in 0..CASES {
        let once = clean(gen_tree(seed), &schema);

        let twice = sanitize(once.clone(), &schema);

        assert_eq!(twice, once, "seed {seed}");
    }
}

#[test]
fn flatten_is_idempotent() {
    let schema = SanitizeSchema::blog();
    for seed in 0..CASES {
        let mut tree = clean(gen_tree(seed), &schema);
        flatten_nested_anchors(&mut tree, DEFAULT_MAX_ITERATIONS);
        let flattened = tree.clone();

        let report = flatten_nested_anchors(&mut tree, DEFAULT_MAX_ITERATIONS);

        assert_eq!(report.removed, 0, "seed {seed}");
        assert_eq!(tree, flattened, "seed {seed}");
    }
}

#[test]
fn attribute_escaping_round_trips() {
    const ALPHABET: &[char] = &['&', '<', '>', '"', '\'', 'a', ' ', '한', ';', '#', 'x'];
    let mut rng = Lcg(7);
    for case in 0..CASES {
        let input: String = (0..rng.below(24)).map(|_| *rng.pick(ALPHABET)).collect();

        let escaped = escape_attribute(&input);

        assert!(only_entities(&escaped), "case {case}: {escaped}");
        assert_eq!(unescape_attribute(&escaped), input, "case {case}");
    }
}

/// Every `&` starts an entity, and no other special character is raw.
fn only_entities(escaped: &str) -> bool {
    !escaped.contains(['<', '>', '"', '\''])
        && escaped
            .match_indices('&')
            .all(|(i, _)| escaped[i..].find(';').is_some_and(|end| end > 1))
}
