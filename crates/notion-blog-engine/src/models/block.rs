use serde::Deserialize;
use serde_json::{Map, Value};

/// Block kinds the deserializer recognises, in Notion's own naming.
const KNOWN_KINDS: &[&str] = &[
    "paragraph",
    "heading_1",
    "heading_2",
    "heading_3",
    "bulleted_list_item",
    "numbered_list_item",
    "to_do",
    "quote",
    "callout",
    "code",
    "divider",
    "image",
    "video",
    "embed",
    "bookmark",
];

#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("Invalid {kind} block payload: {source}")]
    Payload {
        kind: String,
        source: serde_json::Error,
    },
    #[error("Invalid block JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One structural unit of a source document, as fetched from the content source.
///
/// Blocks are immutable snapshots: the pipeline reads them and produces new
/// markup, it never edits a block in place.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct ContentBlock {
    pub id: Option<String>,
    pub kind: BlockKind,
    pub children: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextPayload),
    Heading { level: u8, text: TextPayload },
    BulletedListItem(TextPayload),
    NumberedListItem(TextPayload),
    ToDo(ToDoPayload),
    Quote(TextPayload),
    Callout(CalloutPayload),
    Code(CodePayload),
    Divider,
    Image(MediaPayload),
    Video(MediaPayload),
    Embed(LinkPayload),
    Bookmark(LinkPayload),
    /// Any block type this pipeline has no conversion for.
    Unsupported { kind: String },
}

/// Dispatch key for a [`BlockKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading,
    BulletedListItem,
    NumberedListItem,
    ToDo,
    Quote,
    Callout,
    Code,
    Divider,
    Image,
    Video,
    Embed,
    Bookmark,
    Unsupported,
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Paragraph(_) => BlockType::Paragraph,
            BlockKind::Heading { .. } => BlockType::Heading,
            BlockKind::BulletedListItem(_) => BlockType::BulletedListItem,
            BlockKind::NumberedListItem(_) => BlockType::NumberedListItem,
            BlockKind::ToDo(_) => BlockType::ToDo,
            BlockKind::Quote(_) => BlockType::Quote,
            BlockKind::Callout(_) => BlockType::Callout,
            BlockKind::Code(_) => BlockType::Code,
            BlockKind::Divider => BlockType::Divider,
            BlockKind::Image(_) => BlockType::Image,
            BlockKind::Video(_) => BlockType::Video,
            BlockKind::Embed(_) => BlockType::Embed,
            BlockKind::Bookmark(_) => BlockType::Bookmark,
            BlockKind::Unsupported { .. } => BlockType::Unsupported,
        }
    }
}

impl ContentBlock {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: None,
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ContentBlock>) -> Self {
        self.children = children;
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }
}

/// Parse a JSON array of Notion block objects.
pub fn parse_blocks(json: &str) -> Result<Vec<ContentBlock>, BlockError> {
    Ok(serde_json::from_str(json)?)
}

/// A rich-text span. Only the fields the pipeline renders are kept.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

/// Concatenated plain text of a rich-text sequence.
pub fn plain_text(spans: &[RichText]) -> String {
    spans.iter().map(|span| span.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ToDoPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CalloutPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Icon {
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CodePayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub url: String,
}

/// Payload of image and video blocks: exactly one of `file` (hosted by the
/// content source) or `external` is expected to carry the locator.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MediaPayload {
    #[serde(default)]
    pub file: Option<FileRef>,
    #[serde(default)]
    pub external: Option<FileRef>,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

impl MediaPayload {
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            external: Some(FileRef { url: url.into() }),
            ..Self::default()
        }
    }

    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = vec![RichText::plain(caption)];
        self
    }

    /// The resource locator, preferring the hosted file. Empty urls count as absent.
    pub fn url(&self) -> Option<&str> {
        [self.file.as_ref(), self.external.as_ref()]
            .into_iter()
            .flatten()
            .map(|file| file.url.as_str())
            .find(|url| !url.is_empty())
    }
}

/// Payload of embed and bookmark blocks.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LinkPayload {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

impl LinkPayload {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: Vec::new(),
        }
    }

    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = vec![RichText::plain(caption)];
        self
    }
}

/// Wire shape of a Notion block: `{"type": k, k: {..payload..}, "children": [..]}`.
#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    children: Vec<ContentBlock>,
    #[serde(flatten)]
    payloads: Map<String, Value>,
}

impl TryFrom<RawBlock> for ContentBlock {
    type Error = BlockError;

    fn try_from(mut raw: RawBlock) -> Result<Self, Self::Error> {
        let kind = raw
            .kind
            .take()
            .or_else(|| {
                KNOWN_KINDS
                    .iter()
                    .find(|kind| raw.payloads.contains_key(**kind))
                    .map(|kind| kind.to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let payload = raw
            .payloads
            .remove(&kind)
            .filter(|value| !value.is_null())
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(ContentBlock {
            id: raw.id,
            kind: decode_kind(&kind, payload)?,
            children: raw.children,
        })
    }
}

fn decode_kind(kind: &str, payload: Value) -> Result<BlockKind, BlockError> {
    fn decode<T: serde::de::DeserializeOwned>(kind: &str, payload: Value) -> Result<T, BlockError> {
        serde_json::from_value(payload).map_err(|source| BlockError::Payload {
            kind: kind.to_string(),
            source,
        })
    }

    let block = match kind {
        "paragraph" => BlockKind::Paragraph(decode(kind, payload)?),
        "heading_1" => BlockKind::Heading {
            level: 1,
            text: decode(kind, payload)?,
        },
        "heading_2" => BlockKind::Heading {
            level: 2,
            text: decode(kind, payload)?,
        },
        "heading_3" => BlockKind::Heading {
            level: 3,
            text: decode(kind, payload)?,
        },
        "bulleted_list_item" => BlockKind::BulletedListItem(decode(kind, payload)?),
        "numbered_list_item" => BlockKind::NumberedListItem(decode(kind, payload)?),
        "to_do" => BlockKind::ToDo(decode(kind, payload)?),
        "quote" => BlockKind::Quote(decode(kind, payload)?),
        "callout" => BlockKind::Callout(decode(kind, payload)?),
        "code" => BlockKind::Code(decode(kind, payload)?),
        "divider" => BlockKind::Divider,
        "image" => BlockKind::Image(decode(kind, payload)?),
        "video" => BlockKind::Video(decode(kind, payload)?),
        "embed" => BlockKind::Embed(decode(kind, payload)?),
        "bookmark" => BlockKind::Bookmark(decode(kind, payload)?),
        other => BlockKind::Unsupported {
            kind: other.to_string(),
        },
    };
    Ok(block)
}
