use super::{ContentSource, PostPage, PostQuery, PostRecord, SourceError, find_by_slug, query_records};
use crate::models::post::PostContent;

/// Posts held in memory, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<PostRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<PostRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: PostRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PostRecord] {
        &self.records
    }
}

impl ContentSource for MemorySource {
    fn fetch_by_slug(&self, slug: &str) -> Result<PostContent, SourceError> {
        find_by_slug(&self.records, slug)
    }

    fn query_published(&self, query: &PostQuery) -> Result<PostPage, SourceError> {
        query_records(&self.records, query)
    }
}
