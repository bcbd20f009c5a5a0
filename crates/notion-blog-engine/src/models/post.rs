use serde::{Deserialize, Serialize};

use super::block::{ContentBlock, FileRef, RichText};

const PUBLISHED_STATUS: &str = "Published";

/// Listing metadata for one post, built fresh from a page on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub tags: Vec<String>,
    /// ISO date, empty when the page has none.
    pub date: String,
    pub modified_date: Option<String>,
    /// Empty when no author is set.
    pub author: String,
    pub cover_image: Option<String>,
}

/// A post together with the blocks of its body.
#[derive(Debug, Clone, PartialEq)]
pub struct PostContent {
    pub post: Post,
    pub blocks: Vec<ContentBlock>,
}

/// A page object from the posts database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub properties: PageProperties,
    #[serde(default)]
    pub cover: Option<Cover>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "Title", default)]
    pub title: Option<TitleProperty>,
    #[serde(rename = "Description", default)]
    pub description: Option<RichTextProperty>,
    #[serde(rename = "Slug", default)]
    pub slug: Option<RichTextProperty>,
    #[serde(rename = "Tags", default)]
    pub tags: Option<MultiSelectProperty>,
    #[serde(rename = "Date", default)]
    pub date: Option<DateProperty>,
    #[serde(rename = "Modified Date", default)]
    pub modified_date: Option<DateProperty>,
    #[serde(rename = "Author", default)]
    pub author: Option<PeopleProperty>,
    #[serde(rename = "Status", default)]
    pub status: Option<SelectProperty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleProperty {
    #[serde(default)]
    pub title: Vec<RichText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextProperty {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiSelectProperty {
    #[serde(default)]
    pub multi_select: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectProperty {
    #[serde(default)]
    pub select: Option<SelectOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateProperty {
    #[serde(default)]
    pub date: Option<DateValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeopleProperty {
    #[serde(default)]
    pub people: Vec<Person>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cover {
    #[serde(default)]
    pub external: Option<FileRef>,
    #[serde(default)]
    pub file: Option<FileRef>,
}

fn first_text(spans: &[RichText]) -> Option<&str> {
    spans
        .first()
        .map(|span| span.plain_text.as_str())
        .filter(|text| !text.is_empty())
}

fn start_date(property: &Option<DateProperty>) -> Option<&str> {
    property
        .as_ref()
        .and_then(|p| p.date.as_ref())
        .map(|d| d.start.as_str())
        .filter(|start| !start.is_empty())
}

impl NotionPage {
    pub fn is_published(&self) -> bool {
        self.properties
            .status
            .as_ref()
            .and_then(|status| status.select.as_ref())
            .is_some_and(|select| select.name == PUBLISHED_STATUS)
    }

    /// The slug the page is addressed by; pages without one use their id.
    pub fn slug(&self) -> &str {
        self.properties
            .slug
            .as_ref()
            .and_then(|slug| first_text(&slug.rich_text))
            .unwrap_or(&self.id)
    }

    pub fn tags(&self) -> Vec<String> {
        self.properties
            .tags
            .as_ref()
            .map(|tags| tags.multi_select.iter().map(|tag| tag.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn to_post(&self) -> Post {
        let props = &self.properties;

        let author = match props.author.as_ref().and_then(|a| a.people.first()) {
            Some(person) => person
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            None => String::new(),
        };

        let cover_image = self.cover.as_ref().and_then(|cover| {
            [cover.external.as_ref(), cover.file.as_ref()]
                .into_iter()
                .flatten()
                .map(|file| file.url.clone())
                .find(|url| !url.is_empty())
        });

        Post {
            id: self.id.clone(),
            title: props
                .title
                .as_ref()
                .and_then(|t| first_text(&t.title))
                .unwrap_or_default()
                .to_string(),
            description: props
                .description
                .as_ref()
                .and_then(|d| first_text(&d.rich_text))
                .unwrap_or_default()
                .to_string(),
            slug: self.slug().to_string(),
            tags: self.tags(),
            date: start_date(&props.date).unwrap_or_default().to_string(),
            modified_date: start_date(&props.modified_date).map(str::to_string),
            author,
            cover_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(json: &str) -> NotionPage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_page_maps_to_post() {
        // Given a published page with every property set
        let page = page(
            r#"{
                "id": "p1",
                "properties": {
                    "Title": {"title": [{"plain_text": "Hello"}]},
                    "Description": {"rich_text": [{"plain_text": "First post"}]},
                    "Slug": {"rich_text": [{"plain_text": "hello"}]},
                    "Tags": {"multi_select": [{"name": "Rust"}, {"name": "Web Dev"}]},
                    "Date": {"date": {"start": "2024-03-01"}},
                    "Modified Date": {"date": {"start": "2024-03-05"}},
                    "Author": {"people": [{"name": "Joo"}]},
                    "Status": {"select": {"name": "Published"}}
                },
                "cover": {"external": {"url": "https://img/cover.png"}}
            }"#,
        );

        // When mapping it
        let post = page.to_post();

        // Then every field is carried over
        assert!(page.is_published());
        assert_eq!(
            post,
            Post {
                id: "p1".to_string(),
                title: "Hello".to_string(),
                description: "First post".to_string(),
                slug: "hello".to_string(),
                tags: vec!["Rust".to_string(), "Web Dev".to_string()],
                date: "2024-03-01".to_string(),
                modified_date: Some("2024-03-05".to_string()),
                author: "Joo".to_string(),
                cover_image: Some("https://img/cover.png".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_slug_falls_back_to_id() {
        let page = page(r#"{"id": "abc-123", "properties": {}}"#);

        let post = page.to_post();

        assert_eq!(post.slug, "abc-123");
        assert_eq!(post.title, "");
        assert_eq!(post.date, "");
        assert_eq!(post.modified_date, None);
        assert_eq!(post.cover_image, None);
    }

    #[test]
    fn test_nameless_author_is_unknown() {
        let page = page(r#"{"id": "p", "properties": {"Author": {"people": [{"id": "u1"}]}}}"#);
        assert_eq!(page.to_post().author, "Unknown");
    }

    #[test]
    fn test_no_author_is_empty() {
        let page = page(r#"{"id": "p", "properties": {"Author": {"people": []}}}"#);
        assert_eq!(page.to_post().author, "");
    }

    #[test]
    fn test_cover_prefers_external_then_file() {
        let page = page(r#"{"id": "p", "cover": {"file": {"url": "https://hosted/c.png"}}}"#);
        assert_eq!(
            page.to_post().cover_image.as_deref(),
            Some("https://hosted/c.png")
        );
    }

    #[test]
    fn test_draft_and_null_status_are_not_published() {
        let draft = page(r#"{"id": "p", "properties": {"Status": {"select": {"name": "Draft"}}}}"#);
        let unset = page(r#"{"id": "p", "properties": {"Status": {"select": null}}}"#);

        assert!(!draft.is_published());
        assert!(!unset.is_published());
    }

    #[test]
    fn test_null_date_is_empty() {
        let page = page(r#"{"id": "p", "properties": {"Date": {"date": null}}}"#);
        assert_eq!(page.to_post().date, "");
    }
}
