use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

use crate::source::PostRecord;

/// Create a temporary posts directory
pub fn create_test_posts_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Write a file under the posts directory, creating parent folders
pub fn create_test_file(posts_dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = posts_dir.path().join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}

/// JSON for a stored post with one paragraph of body text
pub fn sample_record_json(slug: &str, date: &str, tags: &[&str], published: bool) -> String {
    let status = if published { "Published" } else { "Draft" };
    let tags: Vec<_> = tags.iter().map(|name| json!({ "name": name })).collect();
    json!({
        "page": {
            "id": format!("id-{slug}"),
            "properties": {
                "Title": { "title": [{ "plain_text": format!("Title of {slug}") }] },
                "Slug": { "rich_text": [{ "plain_text": slug }] },
                "Tags": { "multi_select": tags },
                "Date": { "date": { "start": date } },
                "Status": { "select": { "name": status } }
            }
        },
        "blocks": [
            { "type": "paragraph", "paragraph": { "rich_text": [{ "plain_text": format!("Body of {slug}") }] } }
        ]
    })
    .to_string()
}

pub fn sample_record(slug: &str, date: &str, tags: &[&str], published: bool) -> PostRecord {
    serde_json::from_str(&sample_record_json(slug, date, tags, published)).unwrap()
}
