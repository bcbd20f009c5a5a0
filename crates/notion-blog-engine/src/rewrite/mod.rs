//! Tree passes run between parsing and rendering.

pub mod anchors;
pub mod autolink;
pub mod highlight;
pub mod jsx;
pub mod sanitize;
pub mod slug;
pub mod toc;

pub use anchors::{FlattenReport, flatten_nested_anchors, has_nested_anchor};
pub use autolink::autolink;
pub use highlight::Highlighter;
pub use jsx::{count_transient, normalize_jsx};
pub use sanitize::{SanitizeSchema, sanitize};
pub use slug::assign_heading_ids;
pub use toc::{TocEntry, extract_toc, format_toc};
