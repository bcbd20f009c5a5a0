use crate::models::block::{Annotations, BlockKind, ContentBlock, RichText, plain_text};

/// Markdown for a rich-text sequence, one span at a time.
pub fn rich_text_markdown(spans: &[RichText]) -> String {
    spans.iter().map(span_markdown).collect()
}

/// Wrap a span in its annotation markers, leaving edge whitespace outside
/// them so `** bold **` never appears.
fn span_markdown(span: &RichText) -> String {
    let text = span.plain_text.as_str();
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let leading = &text[..start];
    let trailing = &text[start + core.len()..];

    let mut inner = annotate(core, span.annotations);
    if let Some(href) = span.href.as_deref().filter(|h| !h.is_empty()) {
        inner = format!("[{inner}]({href})");
    }
    format!("{leading}{inner}{trailing}")
}

fn annotate(text: &str, annotations: Annotations) -> String {
    let mut out = text.to_string();
    if annotations.code {
        out = format!("`{out}`");
    }
    if annotations.bold {
        out = format!("**{out}**");
    }
    if annotations.italic {
        out = format!("_{out}_");
    }
    if annotations.strikethrough {
        out = format!("~~{out}~~");
    }
    if annotations.underline {
        out = format!("<u>{out}</u>");
    }
    out
}

/// True for list-like blocks whose fragments are joined without a blank line.
pub fn is_list_item(block: &ContentBlock) -> bool {
    matches!(
        block.kind,
        BlockKind::BulletedListItem(_) | BlockKind::NumberedListItem(_) | BlockKind::ToDo(_)
    )
}

/// Markdown for a block's own content, children excluded.
///
/// `None` for kinds that have no markdown form.
pub fn block_markdown(block: &ContentBlock) -> Option<String> {
    let markdown = match &block.kind {
        BlockKind::Paragraph(text) => rich_text_markdown(&text.rich_text),
        BlockKind::Heading { level, text } => format!(
            "{} {}",
            "#".repeat(usize::from(*level)),
            rich_text_markdown(&text.rich_text)
        ),
        BlockKind::BulletedListItem(text) => format!("- {}", rich_text_markdown(&text.rich_text)),
        BlockKind::NumberedListItem(text) => format!("1. {}", rich_text_markdown(&text.rich_text)),
        BlockKind::ToDo(todo) => format!(
            "- [{}] {}",
            if todo.checked { "x" } else { " " },
            rich_text_markdown(&todo.rich_text)
        ),
        BlockKind::Quote(text) => quote_lines(&rich_text_markdown(&text.rich_text)),
        BlockKind::Callout(callout) => {
            let body = rich_text_markdown(&callout.rich_text);
            match callout.icon.as_ref().and_then(|icon| icon.emoji.as_deref()) {
                Some(emoji) => quote_lines(&format!("{emoji} {body}")),
                None => quote_lines(&body),
            }
        }
        BlockKind::Code(code) => format!(
            "```{}\n{}\n```",
            code.language,
            plain_text(&code.rich_text)
        ),
        BlockKind::Divider => "---".to_string(),
        BlockKind::Image(media) => {
            let url = media.url()?;
            format!("![{}]({})", plain_text(&media.caption), url)
        }
        BlockKind::Video(media) => {
            let url = media.url()?;
            link_markdown(&plain_text(&media.caption), url)
        }
        BlockKind::Embed(link) | BlockKind::Bookmark(link) => {
            if link.url.is_empty() {
                return None;
            }
            link_markdown(&plain_text(&link.caption), &link.url)
        }
        BlockKind::Unsupported { kind } => {
            log::debug!("No markdown conversion for block kind {kind}");
            return None;
        }
    };
    Some(markdown)
}

fn link_markdown(caption: &str, url: &str) -> String {
    let label = if caption.is_empty() { url } else { caption };
    format!("[{label}]({url})")
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indent every non-empty line by two spaces.
pub fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
