use std::collections::{BTreeMap, BTreeSet};

use crate::markup::{AttrValue, Attributes, Element, MarkupNode};

/// Key of the attribute rules that apply to every tag.
pub const GLOBAL: &str = "*";

const ARIA: &[&str] = &["aria-describedby", "aria-label", "aria-labelledby"];

/// Which values an allowed attribute may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedValues {
    Any,
    /// Exact values. For `class`, each token is checked on its own.
    OneOf(Vec<AttrValue>),
    /// `class` tokens that start with the prefix and are longer than it.
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRule {
    pub name: String,
    pub values: AllowedValues,
}

impl AttributeRule {
    pub fn any(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: AllowedValues::Any,
        }
    }

    pub fn one_of(name: &str, values: impl IntoIterator<Item = AttrValue>) -> Self {
        Self {
            name: name.to_string(),
            values: AllowedValues::OneOf(values.into_iter().collect()),
        }
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.name == name.to_ascii_lowercase()
    }
}

/// Allow-list of tags and attributes.
///
/// Anything not listed is removed: attributes one by one, elements either
/// with their whole subtree (`strip`) or by unwrapping them so their
/// children are sanitized in their place.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeSchema {
    pub tag_names: BTreeSet<String>,
    /// Per-tag rules, with [`GLOBAL`] applying to every tag.
    pub attributes: BTreeMap<String, Vec<AttributeRule>>,
    /// Allowed url schemes per attribute. Relative urls always pass.
    pub protocols: BTreeMap<String, Vec<String>>,
    /// Tags only allowed somewhere below one of the listed ancestors.
    pub ancestors: BTreeMap<String, Vec<String>>,
    /// Attributes forced onto a tag after filtering.
    pub required: BTreeMap<String, Vec<(String, AttrValue)>>,
    /// Tags dropped together with their content.
    pub strip: BTreeSet<String>,
    /// Attributes whose values get [`SanitizeSchema::clobber_prefix`].
    pub clobber: BTreeSet<String>,
    /// Values that already start with the prefix are kept as is, so a source
    /// id written as `user-content-x` is not namespaced a second time.
    pub clobber_prefix: String,
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rules(names: &[&str]) -> Vec<AttributeRule> {
    names.iter().map(|name| AttributeRule::any(name)).collect()
}

fn class_one_of(value: &str) -> AttributeRule {
    AttributeRule::one_of("class", [AttrValue::from(value)])
}

impl Default for SanitizeSchema {
    fn default() -> Self {
        Self::blog()
    }
}

impl SanitizeSchema {
    /// The conservative GitHub-style baseline: no scripts, no styles, no
    /// event handlers, a fixed set of document tags.
    pub fn default_safe() -> Self {
        let tag_names = set(&[
            "a", "b", "blockquote", "br", "code", "dd", "del", "details", "div", "dl", "dt", "em",
            "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input", "ins", "kbd", "li",
            "ol", "p", "picture", "pre", "q", "rp", "rt", "ruby", "s", "samp", "section", "source",
            "span", "strike", "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot",
            "th", "thead", "tr", "tt", "ul", "var",
        ]);

        let with_aria = |extra: Vec<AttributeRule>| {
            let mut all = rules(ARIA);
            all.extend(extra);
            all
        };

        let mut attributes = BTreeMap::new();
        attributes.insert(
            "a".to_string(),
            with_aria(vec![
                AttributeRule::any("data-footnote-backref"),
                AttributeRule::any("data-footnote-ref"),
                class_one_of("data-footnote-backref"),
                AttributeRule::any("href"),
            ]),
        );
        attributes.insert("blockquote".to_string(), rules(&["cite"]));
        attributes.insert(
            "code".to_string(),
            vec![AttributeRule {
                name: "class".to_string(),
                values: AllowedValues::Prefix("language-".to_string()),
            }],
        );
        attributes.insert("del".to_string(), rules(&["cite"]));
        attributes.insert("div".to_string(), rules(&["itemscope", "itemtype"]));
        attributes.insert("dl".to_string(), rules(ARIA));
        attributes.insert("h2".to_string(), vec![class_one_of("sr-only")]);
        attributes.insert(
            "img".to_string(),
            with_aria(rules(&["longdesc", "src"])),
        );
        attributes.insert(
            "input".to_string(),
            vec![
                AttributeRule::one_of("disabled", [AttrValue::Bool(true)]),
                AttributeRule::one_of("type", [AttrValue::from("checkbox")]),
            ],
        );
        attributes.insert("ins".to_string(), rules(&["cite"]));
        attributes.insert("li".to_string(), vec![class_one_of("task-list-item")]);
        attributes.insert(
            "ol".to_string(),
            with_aria(vec![class_one_of("contains-task-list")]),
        );
        attributes.insert("q".to_string(), rules(&["cite"]));
        attributes.insert(
            "section".to_string(),
            vec![AttributeRule::any("data-footnotes"), class_one_of("footnotes")],
        );
        attributes.insert("source".to_string(), rules(&["srcset"]));
        attributes.insert("summary".to_string(), rules(ARIA));
        attributes.insert("table".to_string(), rules(ARIA));
        attributes.insert(
            "ul".to_string(),
            with_aria(vec![class_one_of("contains-task-list")]),
        );
        attributes.insert(
            GLOBAL.to_string(),
            rules(&[
                "abbr", "accept", "accept-charset", "accesskey", "action", "align", "alt", "axis",
                "border", "cellpadding", "cellspacing", "char", "charoff", "charset", "checked",
                "clear", "colspan", "color", "cols", "compact", "coords", "datetime", "dir",
                "enctype", "frame", "hspace", "headers", "height", "hreflang", "for", "id", "ismap",
                "itemprop", "label", "lang", "maxlength", "media", "method", "multiple", "name",
                "nohref", "noshade", "nowrap", "open", "prompt", "readonly", "rev", "rowspan",
                "rows", "rules", "scope", "selected", "shape", "size", "span", "start", "summary",
                "tabindex", "title", "usemap", "valign", "value", "width",
            ]),
        );

        let mut protocols = BTreeMap::new();
        let web = || vec!["http".to_string(), "https".to_string()];
        protocols.insert("cite".to_string(), web());
        protocols.insert(
            "href".to_string(),
            ["http", "https", "irc", "ircs", "mailto", "xmpp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        protocols.insert("longdesc".to_string(), web());
        protocols.insert("src".to_string(), web());

        let ancestors = ["tbody", "td", "th", "thead", "tfoot", "tr"]
            .iter()
            .map(|tag| (tag.to_string(), vec!["table".to_string()]))
            .collect();

        let mut required = BTreeMap::new();
        required.insert(
            "input".to_string(),
            vec![
                ("disabled".to_string(), AttrValue::Bool(true)),
                ("type".to_string(), AttrValue::from("checkbox")),
            ],
        );

        Self {
            tag_names,
            attributes,
            protocols,
            ancestors,
            required,
            strip: set(&["script", "style"]),
            clobber: set(&["aria-describedby", "aria-labelledby", "id", "name"]),
            clobber_prefix: "user-content-".to_string(),
        }
    }

    /// The baseline extended for the media and embed markup blocks produce.
    pub fn blog() -> Self {
        let mut schema = Self::default_safe();
        schema.allow_tags(&["u", "img", "video", "source", "iframe", "div"]);

        let styled = ["class", "className", "style"];
        let with_styled = |names: &[&str]| {
            let mut all = names.to_vec();
            all.extend(styled);
            rules(&all)
        };
        schema.set_attributes("u", Vec::new());
        schema.set_attributes("img", with_styled(&["src", "alt"]));
        schema.set_attributes("video", with_styled(&["controls"]));
        schema.set_attributes("source", rules(&["src", "type"]));
        schema.set_attributes(
            "iframe",
            with_styled(&["src", "frameborder", "allow", "allowfullscreen"]),
        );
        schema.set_attributes("div", with_styled(&[]));
        schema.set_attributes("a", with_styled(&["href", "target", "rel"]));
        schema.set_attributes("p", with_styled(&[]));

        let global = schema.attributes.entry(GLOBAL.to_string()).or_default();
        global.extend(rules(&styled));
        schema
    }

    pub fn allow_tags(&mut self, tags: &[&str]) {
        self.tag_names.extend(tags.iter().map(|t| t.to_string()));
    }

    /// Replace the rules for one tag.
    pub fn set_attributes(&mut self, tag: &str, rules: Vec<AttributeRule>) {
        self.attributes.insert(tag.to_string(), rules);
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tag_names.contains(tag)
    }

    /// Whether `name` is in the tag's rules or the global rules, ignoring values.
    pub fn allows_attribute(&self, tag: &str, name: &str) -> bool {
        [tag, GLOBAL].iter().any(|key| {
            self.attributes
                .get(*key)
                .is_some_and(|rules| rules.iter().any(|rule| rule.matches_name(name)))
        })
    }

    fn rule(&self, key: &str, name: &str) -> Option<&AttributeRule> {
        self.attributes
            .get(key)?
            .iter()
            .find(|rule| rule.matches_name(name))
    }

    /// The value to keep for an attribute, or `None` to drop it.
    fn attribute_value(&self, tag: &str, name: &str, value: &AttrValue) -> Option<AttrValue> {
        if *value == AttrValue::Bool(false) {
            return None;
        }
        let allowed = [tag, GLOBAL]
            .iter()
            .filter_map(|key| self.rule(key, name))
            .find_map(|rule| allowed_value(rule, value))?;

        if let Some(schemes) = self.protocols.get(&name.to_ascii_lowercase()) {
            let url = allowed.as_str()?;
            if !safe_protocol(url, schemes) {
                return None;
            }
        }
        Some(allowed)
    }

    fn ancestors_allow(&self, tag: &str, ancestors: &[String]) -> bool {
        match self.ancestors.get(tag) {
            Some(required) => ancestors.iter().any(|a| required.contains(a)),
            None => true,
        }
    }
}

fn allowed_value(rule: &AttributeRule, value: &AttrValue) -> Option<AttrValue> {
    let is_class = rule.name == "class";
    match (&rule.values, value) {
        (AllowedValues::Any, _) => Some(value.clone()),
        (AllowedValues::OneOf(options), AttrValue::Str(s)) if is_class => {
            filter_tokens(s, |token| options.iter().any(|o| o.as_str() == Some(token)))
        }
        (AllowedValues::OneOf(options), _) => options.contains(value).then(|| value.clone()),
        (AllowedValues::Prefix(prefix), AttrValue::Str(s)) => filter_tokens(s, |token| {
            token.len() > prefix.len() && token.starts_with(prefix.as_str())
        }),
        (AllowedValues::Prefix(_), _) => None,
    }
}

fn filter_tokens(value: &str, keep: impl Fn(&str) -> bool) -> Option<AttrValue> {
    let kept: Vec<&str> = value.split_whitespace().filter(|t| keep(*t)).collect();
    (!kept.is_empty()).then(|| AttrValue::Str(kept.join(" ")))
}

/// Relative urls, and urls whose scheme is listed, are safe.
pub fn safe_protocol(url: &str, schemes: &[String]) -> bool {
    let url = url.trim();
    let Some(colon) = url.find(':') else {
        return true;
    };
    if url.find(['/', '?', '#']).is_some_and(|other| other < colon) {
        return true;
    }
    let scheme = &url[..colon];
    schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
}

/// Filter a tree through `schema`.
///
/// Transient JSX nodes are not understood here and are dropped, so callers
/// must normalize first.
pub fn sanitize(node: MarkupNode, schema: &SanitizeSchema) -> MarkupNode {
    let mut ancestors = Vec::new();
    match node {
        MarkupNode::Root(children) => {
            MarkupNode::Root(sanitize_children(children, schema, &mut ancestors))
        }
        other => {
            let mut nodes = sanitize_node(other, schema, &mut ancestors);
            if nodes.len() == 1 {
                nodes.remove(0)
            } else {
                MarkupNode::Root(nodes)
            }
        }
    }
}

fn sanitize_children(
    children: Vec<MarkupNode>,
    schema: &SanitizeSchema,
    ancestors: &mut Vec<String>,
) -> Vec<MarkupNode> {
    children
        .into_iter()
        .flat_map(|child| sanitize_node(child, schema, ancestors))
        .collect()
}

fn sanitize_node(
    node: MarkupNode,
    schema: &SanitizeSchema,
    ancestors: &mut Vec<String>,
) -> Vec<MarkupNode> {
    match node {
        MarkupNode::Text(_) => vec![node],
        MarkupNode::Root(children) => vec![MarkupNode::Root(sanitize_children(
            children, schema, ancestors,
        ))],
        MarkupNode::JsxTextElement(jsx) | MarkupNode::JsxFlowElement(jsx) => {
            log::debug!("Sanitizer dropped unnormalized element {:?}", jsx.name);
            Vec::new()
        }
        MarkupNode::Element(el) => sanitize_element(el, schema, ancestors),
    }
}

fn sanitize_element(
    mut el: Element,
    schema: &SanitizeSchema,
    ancestors: &mut Vec<String>,
) -> Vec<MarkupNode> {
    if schema.strip.contains(&el.tag) {
        log::debug!("Sanitizer removed <{}> and its content", el.tag);
        return Vec::new();
    }
    if !schema.allows_tag(&el.tag) || !schema.ancestors_allow(&el.tag, ancestors) {
        log::debug!("Sanitizer unwrapped <{}>", el.tag);
        return sanitize_children(el.children, schema, ancestors);
    }

    el.attrs = sanitize_attributes(&el.tag, &el.attrs, schema);

    ancestors.push(el.tag.clone());
    el.children = sanitize_children(std::mem::take(&mut el.children), schema, ancestors);
    ancestors.pop();

    vec![MarkupNode::Element(el)]
}

fn sanitize_attributes(tag: &str, attrs: &Attributes, schema: &SanitizeSchema) -> Attributes {
    let mut kept = Attributes::new();
    for (name, value) in attrs.iter() {
        match schema.attribute_value(tag, name, value) {
            Some(value) => kept.insert(name, clobber(name, value, schema)),
            None => log::debug!("Sanitizer stripped {name} from <{tag}>"),
        }
    }
    if let Some(required) = schema.required.get(tag) {
        for (name, value) in required {
            if !kept.contains(name) {
                kept.insert(name.clone(), value.clone());
            }
        }
    }
    kept
}

fn clobber(name: &str, value: AttrValue, schema: &SanitizeSchema) -> AttrValue {
    match value {
        AttrValue::Str(s)
            if schema.clobber.contains(&name.to_ascii_lowercase())
                && !s.starts_with(&schema.clobber_prefix) =>
        {
            AttrValue::Str(format!("{}{s}", schema.clobber_prefix))
        }
        other => other,
    }
}
