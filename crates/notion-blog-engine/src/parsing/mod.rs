pub mod builder;
pub mod cleanup;
pub mod cursor;
pub mod html;

use pulldown_cmark::{Options, Parser};

use crate::markup::MarkupNode;
use builder::TreeBuilder;

pub use cleanup::{post_process, strip_pseudo_tags};

/// Markdown extensions the block converter can emit.
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Parse markdown with embedded HTML into a tree.
///
/// Raw HTML becomes transient JSX nodes that must be normalized before any
/// stage that only understands plain elements.
pub fn parse_markup(markdown: &str) -> MarkupNode {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(markdown, parser_options()) {
        builder.push_event(event);
    }
    builder.finish()
}
