pub mod block;
pub mod fragment;
pub mod post;

pub use block::{BlockKind, BlockType, ContentBlock};
pub use fragment::MarkupFragment;
pub use post::{Post, PostContent};
