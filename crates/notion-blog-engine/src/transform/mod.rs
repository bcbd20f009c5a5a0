pub mod escape;
pub mod media;
pub mod text;

use std::collections::HashMap;
use std::fmt;

use crate::models::{BlockType, ContentBlock, MarkupFragment};

/// Converts one block into markup. Must not fail: a block with nothing to
/// render yields an empty fragment.
pub type BlockTransformer = fn(&ContentBlock) -> MarkupFragment;

/// Dispatch table from block kind to transformer.
///
/// Built once and handed to the pipeline. Kinds without an entry fall back to
/// plain markdown conversion; kinds with no markdown form render as nothing.
#[derive(Clone)]
pub struct TransformerTable {
    transformers: HashMap<BlockType, BlockTransformer>,
}

impl Default for TransformerTable {
    fn default() -> Self {
        Self::empty()
            .with(BlockType::Image, media::image)
            .with(BlockType::Video, media::video)
            .with(BlockType::Embed, media::embed)
            .with(BlockType::Bookmark, media::bookmark)
    }
}

impl fmt::Debug for TransformerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerTable")
            .field("kinds", &self.transformers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformerTable {
    /// A table with no custom transformers.
    pub fn empty() -> Self {
        Self {
            transformers: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: BlockType, transformer: BlockTransformer) -> Self {
        self.transformers.insert(kind, transformer);
        self
    }

    pub fn get(&self, kind: BlockType) -> Option<BlockTransformer> {
        self.transformers.get(&kind).copied()
    }

    /// Fragment for one block and its children.
    pub fn transform_block(&self, block: &ContentBlock) -> MarkupFragment {
        if let Some(transformer) = self.get(block.block_type()) {
            return transformer(block);
        }

        let own = text::block_markdown(block).unwrap_or_default();
        if block.children.is_empty() {
            return own.into();
        }

        let children = self.transform_blocks(&block.children);
        if children.is_empty() {
            return own.into();
        }
        if text::is_list_item(block) {
            format!("{own}\n{}", text::indent(children.as_str())).into()
        } else if own.is_empty() {
            children
        } else {
            format!("{own}\n\n{children}").into()
        }
    }

    /// Concatenated fragment for a block sequence.
    ///
    /// Fragments are separated by a blank line, except between consecutive
    /// list items, which share one list. Empty fragments are skipped.
    pub fn transform_blocks(&self, blocks: &[ContentBlock]) -> MarkupFragment {
        let mut out = String::new();
        let mut previous_was_list = false;

        for block in blocks {
            let fragment = self.transform_block(block);
            if fragment.is_empty() {
                continue;
            }
            let is_list = text::is_list_item(block) && self.get(block.block_type()).is_none();
            if !out.is_empty() {
                out.push_str(if is_list && previous_was_list { "\n" } else { "\n\n" });
            }
            out.push_str(fragment.as_str());
            previous_was_list = is_list;
        }

        out.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::block::{BlockKind, MediaPayload, RichText, TextPayload};
    use pretty_assertions::assert_eq;

    fn text_block(kind: fn(TextPayload) -> BlockKind, text: &str) -> ContentBlock {
        ContentBlock::new(kind(TextPayload {
            rich_text: vec![RichText::plain(text)],
        }))
    }

    #[test]
    fn test_default_table_registers_media_kinds() {
        let table = TransformerTable::default();
        for kind in [
            BlockType::Image,
            BlockType::Video,
            BlockType::Embed,
            BlockType::Bookmark,
        ] {
            assert!(table.get(kind).is_some(), "{kind:?} missing");
        }
        assert!(table.get(BlockType::Paragraph).is_none());
    }

    #[test]
    fn test_blocks_joined_by_blank_line_and_lists_kept_together() {
        // Given a paragraph, two list items and an image
        let blocks = vec![
            text_block(BlockKind::Paragraph, "intro"),
            text_block(BlockKind::BulletedListItem, "one"),
            text_block(BlockKind::BulletedListItem, "two"),
            ContentBlock::new(BlockKind::Image(MediaPayload::external("https://x/y.png"))),
        ];

        // When transformed
        let fragment = TransformerTable::default().transform_blocks(&blocks);

        // Then list items share a line break, other fragments a blank line
        assert_eq!(
            fragment.as_str(),
            "intro\n\n- one\n- two\n\n<img src=\"https://x/y.png\" alt=\"\" />"
        );
    }

    #[test]
    fn test_unknown_and_empty_blocks_are_skipped() {
        let blocks = vec![
            text_block(BlockKind::Paragraph, "a"),
            ContentBlock::new(BlockKind::Unsupported {
                kind: "child_database".to_string(),
            }),
            ContentBlock::new(BlockKind::Image(MediaPayload::default())),
            text_block(BlockKind::Paragraph, "b"),
        ];

        let fragment = TransformerTable::default().transform_blocks(&blocks);

        assert_eq!(fragment.as_str(), "a\n\nb");
    }

    #[test]
    fn test_list_children_are_indented() {
        let blocks = vec![
            text_block(BlockKind::BulletedListItem, "parent")
                .with_children(vec![text_block(BlockKind::BulletedListItem, "child")]),
        ];

        let fragment = TransformerTable::default().transform_blocks(&blocks);

        assert_eq!(fragment.as_str(), "- parent\n  - child");
    }

    #[test]
    fn test_custom_transformer_overrides_default() {
        fn shout(_: &ContentBlock) -> MarkupFragment {
            MarkupFragment::new("LOUD")
        }
        let table = TransformerTable::empty().with(BlockType::Paragraph, shout);

        let fragment = table.transform_blocks(&[text_block(BlockKind::Paragraph, "quiet")]);

        assert_eq!(fragment.as_str(), "LOUD");
    }

    #[test]
    fn test_empty_table_uses_markdown_for_media() {
        let block = ContentBlock::new(BlockKind::Image(
            MediaPayload::external("https://x/y.png").with_caption("cat"),
        ));
        let fragment = TransformerTable::empty().transform_block(&block);
        assert_eq!(fragment.as_str(), "![cat](https://x/y.png)");
    }
}
