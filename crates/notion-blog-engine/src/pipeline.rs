//! Blocks in, sanitized tree and table of contents out.
//!
//! Stage order matters: the sanitizer only understands plain elements, so
//! JSX normalization runs first, and the anchor flattener runs after the
//! sanitizer because unwrapping disallowed tags can expose new nesting.

use serde::Serialize;

use crate::markup::MarkupNode;
use crate::models::{ContentBlock, MarkupFragment, Post};
use crate::parsing::{parse_markup, post_process};
use crate::rewrite::anchors::DEFAULT_MAX_ITERATIONS;
use crate::rewrite::highlight::DEFAULT_THEME;
use crate::rewrite::{
    FlattenReport, Highlighter, SanitizeSchema, TocEntry, assign_heading_ids, autolink,
    count_transient, extract_toc, flatten_nested_anchors, normalize_jsx, sanitize,
};
use crate::source::{ContentSource, SourceError};
use crate::transform::TransformerTable;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("Content source error: {0}")]
    Source(SourceError),
}

impl From<SourceError> for RenderError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(slug) => RenderError::NotFound(slug),
            other => RenderError::Source(other),
        }
    }
}

/// Switches for the stages around the core passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Bound on anchor flattening passes.
    pub anchor_flatten_limit: usize,
    pub autolink: bool,
    pub heading_ids: bool,
    pub highlight: bool,
    pub highlight_theme: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            anchor_flatten_limit: DEFAULT_MAX_ITERATIONS,
            autolink: true,
            heading_ids: true,
            highlight: true,
            highlight_theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    #[serde(skip)]
    pub tree: MarkupNode,
    pub toc: Vec<TocEntry>,
    #[serde(skip)]
    pub flatten: FlattenReport,
}

impl RenderedDocument {
    pub fn html(&self) -> String {
        self.tree.to_html()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPost {
    pub post: Post,
    pub document: RenderedDocument,
}

/// The fixed stage sequence plus the tables it runs with.
///
/// Holds no per-document state; one instance can render any number of
/// documents.
#[derive(Debug)]
pub struct Pipeline {
    transformers: TransformerTable,
    schema: SanitizeSchema,
    highlighter: Option<Highlighter>,
    options: PipelineOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        let highlighter = if options.highlight {
            Highlighter::new(&options.highlight_theme)
        } else {
            None
        };
        Self {
            transformers: TransformerTable::default(),
            schema: SanitizeSchema::blog(),
            highlighter,
            options,
        }
    }

    pub fn with_transformers(mut self, transformers: TransformerTable) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_schema(mut self, schema: SanitizeSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn schema(&self) -> &SanitizeSchema {
        &self.schema
    }

    /// Block-to-markdown half of the pipeline, post-processed.
    pub fn to_markdown(&self, blocks: &[ContentBlock]) -> MarkupFragment {
        let fragment = self.transformers.transform_blocks(blocks);
        log::trace!("Transformed {} blocks", blocks.len());
        post_process(&fragment)
    }

    pub fn render_blocks(&self, blocks: &[ContentBlock]) -> RenderedDocument {
        self.render_markdown(self.to_markdown(blocks).as_str())
    }

    /// Run every stage from parsing onwards over already-converted markdown.
    pub fn render_markdown(&self, markdown: &str) -> RenderedDocument {
        let mut tree = parse_markup(markdown);
        log::trace!("Parsed {} bytes of markdown", markdown.len());

        if self.options.autolink {
            autolink(&mut tree);
            log::trace!("Autolinked bare urls");
        }

        let transient = count_transient(&tree);
        let mut tree = sanitize(normalize_jsx(tree), &self.schema);
        log::trace!("Normalized {transient} jsx nodes and sanitized");

        let flatten = flatten_nested_anchors(&mut tree, self.options.anchor_flatten_limit);
        log::trace!(
            "Flattened {} nested anchors in {} passes",
            flatten.removed,
            flatten.iterations
        );

        if self.options.heading_ids {
            assign_heading_ids(&mut tree);
        }
        let toc = extract_toc(&tree);
        log::trace!("Extracted {} top-level toc entries", toc.len());

        if let Some(highlighter) = &self.highlighter {
            highlighter.highlight_tree(&mut tree);
            log::trace!("Highlighted code blocks");
        }

        RenderedDocument { tree, toc, flatten }
    }
}

/// Fetch the post addressed by `slug` and render its body.
pub fn render_post(
    source: &impl ContentSource,
    slug: &str,
    pipeline: &Pipeline,
) -> Result<RenderedPost, RenderError> {
    let content = source.fetch_by_slug(slug)?;
    let document = pipeline.render_blocks(&content.blocks);
    Ok(RenderedPost {
        post: content.post,
        document,
    })
}
