use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, LinkType, Tag, TagEnd};

use super::html::{HtmlToken, tokenize};
use crate::markup::serialize::is_void;
use crate::markup::{AttrValue, Element, JsxElement, MarkupNode};

#[derive(Debug, Clone, PartialEq)]
enum FrameKind {
    Document,
    /// Opened by a markdown start event.
    Markdown,
    /// Opened alongside a markdown frame (`code` inside `pre`, `tbody`).
    Implicit,
    /// Opened by a raw HTML tag.
    Html(String),
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    node: MarkupNode,
}

#[derive(Debug, Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

/// Builds a [`MarkupNode`] tree from a pulldown-cmark event stream.
///
/// Raw HTML is tokenized into transient JSX nodes: flow nodes for HTML blocks
/// and text nodes for inline HTML. HTML elements left open when their
/// enclosing markdown container ends are closed there.
#[derive(Debug)]
pub struct TreeBuilder {
    stack: Vec<Frame>,
    html_block: Option<String>,
    table: Option<TableState>,
    auto_closed: usize,
    dropped_closers: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![Frame {
                kind: FrameKind::Document,
                node: MarkupNode::Root(Vec::new()),
            }],
            html_block: None,
            table: None,
            auto_closed: 0,
            dropped_closers: 0,
        }
    }

    pub fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::HtmlBlock) => self.html_block = Some(String::new()),
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(html) = self.html_block.take() {
                    self.push_html(&html, true);
                }
            }
            Event::Html(html) => match self.html_block.as_mut() {
                Some(buffer) => buffer.push_str(&html),
                None => self.push_html(&html, true),
            },
            Event::InlineHtml(html) => self.push_html(&html, false),
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push(MarkupNode::text(text.into_string())),
            Event::Code(code) => self.push(Element::new("code").with_text(code.into_string()).into()),
            Event::InlineMath(math) => self.push(
                Element::new("code")
                    .with_attr("class", "language-math math-inline")
                    .with_text(math.into_string())
                    .into(),
            ),
            Event::DisplayMath(math) => self.push(
                Element::new("pre")
                    .with_children(vec![
                        Element::new("code")
                            .with_attr("class", "language-math math-display")
                            .with_text(math.into_string())
                            .into(),
                    ])
                    .into(),
            ),
            Event::FootnoteReference(label) => {
                self.push(Element::new("sup").with_text(label.into_string()).into())
            }
            Event::SoftBreak => self.push(MarkupNode::text("\n")),
            Event::HardBreak => self.push(Element::new("br").into()),
            Event::Rule => self.push(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", true);
                if checked {
                    input.attrs.insert("checked", true);
                }
                self.push(input.into());
            }
        }
    }

    /// Close everything still open and return the root.
    pub fn finish(mut self) -> MarkupNode {
        while self.stack.len() > 1 {
            if let Some(frame) = self.stack.pop() {
                if matches!(frame.kind, FrameKind::Html(_)) {
                    self.auto_closed += 1;
                }
                self.push(frame.node);
            }
        }
        if self.auto_closed > 0 {
            log::debug!("Auto-closed {} unclosed HTML elements", self.auto_closed);
        }
        if self.dropped_closers > 0 {
            log::debug!("Dropped {} unmatched closing tags", self.dropped_closers);
        }
        self.stack
            .pop()
            .map(|frame| frame.node)
            .unwrap_or_else(|| MarkupNode::Root(Vec::new()))
    }

    fn start(&mut self, tag: Tag<'_>) {
        let element = match tag {
            Tag::Paragraph => Element::new("p"),
            Tag::Heading { level, id, .. } => {
                let mut heading = Element::new(heading_tag(level));
                if let Some(id) = id {
                    heading.attrs.insert("id", id.into_string());
                }
                heading
            }
            Tag::BlockQuote(_) => Element::new("blockquote"),
            Tag::CodeBlock(kind) => {
                self.open(FrameKind::Markdown, Element::new("pre").into());
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind
                    && let Some(lang) = info.split_whitespace().next()
                {
                    code.attrs.insert("class", format!("language-{lang}"));
                }
                self.open(FrameKind::Implicit, code.into());
                return;
            }
            Tag::List(Some(start)) => {
                let mut list = Element::new("ol");
                if start != 1 {
                    list.attrs.insert("start", AttrValue::Num(start as f64));
                }
                list
            }
            Tag::List(None) => Element::new("ul"),
            Tag::Item => Element::new("li"),
            Tag::Table(alignments) => {
                self.table = Some(TableState {
                    alignments,
                    ..TableState::default()
                });
                Element::new("table")
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.cell = 0;
                }
                self.open(FrameKind::Markdown, Element::new("thead").into());
                self.open(FrameKind::Implicit, Element::new("tr").into());
                return;
            }
            Tag::TableRow => {
                if self.top_is_element("table") {
                    self.open(FrameKind::Implicit, Element::new("tbody").into());
                }
                if let Some(table) = self.table.as_mut() {
                    table.cell = 0;
                }
                Element::new("tr")
            }
            Tag::TableCell => {
                let (tag, align) = match self.table.as_mut() {
                    Some(table) => {
                        let align = table.alignments.get(table.cell).copied();
                        table.cell += 1;
                        (if table.in_head { "th" } else { "td" }, align)
                    }
                    None => ("td", None),
                };
                let mut cell = Element::new(tag);
                if let Some(align) = align.and_then(alignment_name) {
                    cell.attrs.insert("align", align);
                }
                cell
            }
            Tag::Emphasis => Element::new("em"),
            Tag::Strong => Element::new("strong"),
            Tag::Strikethrough => Element::new("del"),
            Tag::Superscript => Element::new("sup"),
            Tag::Subscript => Element::new("sub"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.to_string()
                };
                let mut link = Element::new("a").with_attr("href", href);
                if !title.is_empty() {
                    link.attrs.insert("title", title.into_string());
                }
                link
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut image = Element::new("img").with_attr("src", dest_url.into_string());
                if !title.is_empty() {
                    image.attrs.insert("title", title.into_string());
                }
                image
            }
            Tag::DefinitionList => Element::new("dl"),
            Tag::DefinitionListTitle => Element::new("dt"),
            Tag::DefinitionListDefinition => Element::new("dd"),
            _ => Element::new("div"),
        };
        self.open(FrameKind::Markdown, element.into());
    }

    fn end(&mut self, tag: TagEnd) {
        let Some(mut node) = self.close_markdown() else {
            return;
        };
        match tag {
            TagEnd::Image => {
                if let MarkupNode::Element(image) = &mut node {
                    let alt = std::mem::take(&mut image.children)
                        .iter()
                        .map(MarkupNode::text_content)
                        .collect::<String>();
                    // Keep alt right after src.
                    let title = image.attrs.remove("title");
                    image.attrs.insert("alt", alt);
                    if let Some(title) = title {
                        image.attrs.insert("title", title);
                    }
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = false;
                }
            }
            TagEnd::Table => self.table = None,
            _ => {}
        }
        self.push(node);
    }

    fn open(&mut self, kind: FrameKind, node: MarkupNode) {
        self.stack.push(Frame { kind, node });
    }

    /// Pop frames down to and including the innermost markdown frame, returning its node.
    fn close_markdown(&mut self) -> Option<MarkupNode> {
        loop {
            let kind = self.stack.last()?.kind.clone();
            match kind {
                FrameKind::Document => return None,
                FrameKind::Markdown => return self.stack.pop().map(|frame| frame.node),
                FrameKind::Implicit | FrameKind::Html(_) => {
                    if matches!(kind, FrameKind::Html(_)) {
                        self.auto_closed += 1;
                    }
                    if let Some(frame) = self.stack.pop() {
                        self.push(frame.node);
                    }
                }
            }
        }
    }

    fn top_is_element(&self, tag: &str) -> bool {
        self.stack.last().is_some_and(|frame| frame.node.is_element(tag))
    }

    /// Append a node to the innermost open element, merging adjacent text.
    fn push(&mut self, node: MarkupNode) {
        let Some(children) = self
            .stack
            .last_mut()
            .and_then(|frame| frame.node.children_mut())
        else {
            return;
        };
        if let MarkupNode::Text(text) = &node
            && let Some(MarkupNode::Text(previous)) = children.last_mut()
        {
            previous.push_str(text);
            return;
        }
        children.push(node);
    }

    fn push_html(&mut self, html: &str, flow: bool) {
        for token in tokenize(html) {
            match token {
                HtmlToken::Open {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let element = JsxElement {
                        name: Some(name.clone()),
                        attributes,
                        children: Vec::new(),
                    };
                    let node = if flow {
                        MarkupNode::JsxFlowElement(element)
                    } else {
                        MarkupNode::JsxTextElement(element)
                    };
                    if self_closing || is_void(&name) {
                        self.push(node);
                    } else {
                        self.open(FrameKind::Html(name), node);
                    }
                }
                HtmlToken::Close { name } => self.close_html(&name),
                HtmlToken::Text(text) => {
                    if flow && text.trim().is_empty() && text.contains('\n') {
                        continue;
                    }
                    self.push(MarkupNode::Text(text));
                }
            }
        }
    }

    /// Close the nearest open HTML element named `name`, auto-closing any
    /// HTML elements opened after it. Markdown containers are a barrier.
    fn close_html(&mut self, name: &str) {
        let target = self
            .stack
            .iter()
            .rev()
            .take_while(|frame| matches!(frame.kind, FrameKind::Html(_)))
            .position(|frame| frame.kind == FrameKind::Html(name.to_string()));

        let Some(depth) = target else {
            self.dropped_closers += 1;
            return;
        };
        self.auto_closed += depth;
        for _ in 0..=depth {
            if let Some(frame) = self.stack.pop() {
                self.push(frame.node);
            }
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn alignment_name(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}
