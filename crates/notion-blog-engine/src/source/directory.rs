use std::fs;
use std::path::{Path, PathBuf};

use relative_path::RelativePathBuf;

use super::{ContentSource, PostPage, PostQuery, PostRecord, SourceError, find_by_slug, query_records};
use crate::models::post::PostContent;

/// Posts stored as one `<name>.json` record per page under a root directory.
///
/// The directory is re-read on every call, so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SourceError::InvalidRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record files relative to the root, in path order.
    pub fn record_files(&self) -> Result<Vec<RelativePathBuf>, SourceError> {
        let mut files = Vec::new();
        scan_directory_recursive(&self.root, &mut files)?;
        let mut relative: Vec<RelativePathBuf> = files
            .iter()
            .filter_map(|path| path.strip_prefix(&self.root).ok())
            .filter_map(|path| RelativePathBuf::from_path(path).ok())
            .collect();
        relative.sort();
        Ok(relative)
    }

    pub fn load_records(&self) -> Result<Vec<PostRecord>, SourceError> {
        self.record_files()?
            .iter()
            .map(|file| {
                let content = fs::read_to_string(file.to_path(&self.root))?;
                serde_json::from_str(&content).map_err(|source| SourceError::Json {
                    path: file.to_string(),
                    source,
                })
            })
            .collect()
    }
}

impl ContentSource for DirectorySource {
    fn fetch_by_slug(&self, slug: &str) -> Result<PostContent, SourceError> {
        find_by_slug(&self.load_records()?, slug)
    }

    fn query_published(&self, query: &PostQuery) -> Result<PostPage, SourceError> {
        query_records(&self.load_records()?, query)
    }
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "json"
        {
            files.push(path);
        }
    }

    Ok(())
}
