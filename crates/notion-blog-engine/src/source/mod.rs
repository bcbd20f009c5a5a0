//! Read side of the posts database: look a post up by slug, list published posts.

pub mod directory;
pub mod memory;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::block::ContentBlock;
use crate::models::post::{NotionPage, Post, PostContent};

pub use directory::DirectorySource;
pub use memory::MemorySource;

pub const DEFAULT_PAGE_SIZE: usize = 2;

/// Page size used when counting tags across the whole database.
const TAG_LIST_PAGE_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid post record {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid posts directory: {0}")]
    InvalidRoot(String),
}

/// Where posts come from.
pub trait ContentSource {
    /// The published post addressed by `slug`, with its body blocks.
    fn fetch_by_slug(&self, slug: &str) -> Result<PostContent, SourceError>;

    /// One page of published posts.
    fn query_published(&self, query: &PostQuery) -> Result<PostPage, SourceError>;
}

/// One stored page and the blocks of its body.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub page: NotionPage,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl PostRecord {
    pub fn new(page: NotionPage, blocks: Vec<ContentBlock>) -> Self {
        Self { page, blocks }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Latest,
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "oldest" => Ok(Self::Oldest),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latest => "latest",
            Self::Oldest => "oldest",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Only posts carrying this tag.
    pub tag: Option<String>,
    pub sort: SortOrder,
    pub page_size: usize,
    /// Opaque resume point returned as `next_cursor` by the previous page.
    pub cursor: Option<String>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            tag: None,
            sort: SortOrder::default(),
            page_size: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

impl PostQuery {
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPage {
    pub items: Vec<Post>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub id: String,
    pub name: String,
    pub count: usize,
}

/// Published record whose slug is `slug`.
pub(crate) fn find_by_slug(records: &[PostRecord], slug: &str) -> Result<PostContent, SourceError> {
    records
        .iter()
        .find(|record| record.page.is_published() && record.page.slug() == slug)
        .map(|record| PostContent {
            post: record.page.to_post(),
            blocks: record.blocks.clone(),
        })
        .ok_or_else(|| SourceError::NotFound(slug.to_string()))
}

/// Filter, sort and page `records` the way the database query does.
pub(crate) fn query_records(
    records: &[PostRecord],
    query: &PostQuery,
) -> Result<PostPage, SourceError> {
    let mut posts: Vec<Post> = records
        .iter()
        .filter(|record| record.page.is_published())
        .map(|record| record.page.to_post())
        .filter(|post| {
            query
                .tag
                .as_ref()
                .is_none_or(|tag| post.tags.iter().any(|t| t == tag))
        })
        .collect();

    match query.sort {
        SortOrder::Latest => posts.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Oldest => posts.sort_by(|a, b| a.date.cmp(&b.date)),
    }

    let start = match &query.cursor {
        None => 0,
        Some(cursor) => cursor
            .parse::<usize>()
            .ok()
            .filter(|index| *index <= posts.len())
            .ok_or_else(|| SourceError::InvalidCursor(cursor.clone()))?,
    };
    let end = start.saturating_add(query.page_size.max(1)).min(posts.len());
    let has_more = end < posts.len();

    posts.truncate(end);
    let items = posts.split_off(start);

    Ok(PostPage {
        items,
        has_more,
        next_cursor: has_more.then(|| end.to_string()),
    })
}

/// Tag id as used in urls: lowercase, whitespace runs become `-`.
pub fn tag_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                id.push('-');
            }
            in_space = true;
        } else {
            id.push(c);
            in_space = false;
        }
    }
    id
}

/// Every tag with its post count, led by a synthetic entry covering all posts.
pub fn tag_list(
    source: &impl ContentSource,
    all_label: &str,
) -> Result<Vec<TagSummary>, SourceError> {
    let page = source.query_published(&PostQuery::default().with_page_size(TAG_LIST_PAGE_SIZE))?;

    let mut tags: Vec<TagSummary> = Vec::new();
    for name in page.items.iter().flat_map(|post| post.tags.iter()) {
        match tags.iter_mut().find(|tag| tag.name == *name) {
            Some(tag) => tag.count += 1,
            None => tags.push(TagSummary {
                id: tag_id(name),
                name: name.clone(),
                count: 1,
            }),
        }
    }

    let mut list = vec![TagSummary {
        id: "all".to_string(),
        name: all_label.to_string(),
        count: page.items.len(),
    }];
    list.extend(tags);
    Ok(list)
}
