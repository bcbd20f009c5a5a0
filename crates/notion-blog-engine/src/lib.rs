pub mod markup;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod rewrite;
pub mod source;
pub mod transform;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use markup::{AttrValue, Attributes, Element, JsxAttrValue, JsxAttribute, JsxElement, MarkupNode};
pub use models::{block::*, fragment::*, post::*};
pub use pipeline::*;
pub use rewrite::{anchors::FlattenReport, sanitize::SanitizeSchema, toc::TocEntry};
pub use source::*;
pub use transform::TransformerTable;
