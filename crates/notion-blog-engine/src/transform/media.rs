use std::sync::OnceLock;

use regex::Regex;

use super::escape::escape_attribute as esc;
use crate::models::MarkupFragment;
use crate::models::block::{BlockKind, ContentBlock, LinkPayload, MediaPayload, plain_text};

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];
const CARD_FALLBACK_TEXT: &str = "Open link";

fn drive_file_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("valid regex"))
}

/// `<img>` for an image block. Empty when the block has no url.
pub fn image(block: &ContentBlock) -> MarkupFragment {
    let BlockKind::Image(media) = &block.kind else {
        return MarkupFragment::empty();
    };
    image_markup(media)
}

/// Drive preview iframe, or a `<video>` element for any other url.
pub fn video(block: &ContentBlock) -> MarkupFragment {
    let BlockKind::Video(media) = &block.kind else {
        return MarkupFragment::empty();
    };
    video_markup(media)
}

/// First matching of Drive, YouTube, Vimeo, image file, else a link card.
pub fn embed(block: &ContentBlock) -> MarkupFragment {
    let BlockKind::Embed(link) = &block.kind else {
        return MarkupFragment::empty();
    };
    embed_markup(link)
}

/// Always a link card.
pub fn bookmark(block: &ContentBlock) -> MarkupFragment {
    let BlockKind::Bookmark(link) = &block.kind else {
        return MarkupFragment::empty();
    };
    if link.url.is_empty() {
        return MarkupFragment::empty();
    }
    link_card(&link.url, &plain_text(&link.caption)).into()
}

pub fn image_markup(media: &MediaPayload) -> MarkupFragment {
    let Some(url) = media.url() else {
        return MarkupFragment::empty();
    };
    let alt = plain_text(&media.caption);
    format!(r#"<img src="{}" alt="{}" />"#, esc(url), esc(&alt)).into()
}

pub fn video_markup(media: &MediaPayload) -> MarkupFragment {
    let Some(url) = media.url() else {
        return MarkupFragment::empty();
    };
    let caption = plain_text(&media.caption);

    if let Some(id) = drive_file_id(url) {
        let preview = format!("https://drive.google.com/file/d/{id}/preview");
        return responsive_iframe(&preview, "autoplay; fullscreen; picture-in-picture", &caption)
            .into();
    }

    let mut out = String::from("<video controls class=\"w-full rounded-lg\">\n");
    out.push_str(&format!(
        "  <source src=\"{}\" type=\"{}\" />\n",
        esc(url),
        video_mime_type(url)
    ));
    if !caption.is_empty() {
        out.push_str(&format!("  <p>{}</p>\n", esc(&caption)));
    }
    out.push_str("  Your browser does not support the video tag.\n</video>");
    out.into()
}

pub fn embed_markup(link: &LinkPayload) -> MarkupFragment {
    let url = link.url.as_str();
    if url.is_empty() {
        return MarkupFragment::empty();
    }
    let caption = plain_text(&link.caption);

    if let Some(id) = drive_file_id(url) {
        let preview = format!("https://drive.google.com/file/d/{id}/preview");
        return responsive_iframe(&preview, "autoplay; fullscreen; picture-in-picture", &caption)
            .into();
    }

    if let Some(id) = youtube_video_id(url) {
        let src = format!("https://www.youtube.com/embed/{id}");
        return responsive_iframe(
            &src,
            "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture",
            &caption,
        )
        .into();
    }

    if let Some(id) = vimeo_video_id(url) {
        let src = format!("https://player.vimeo.com/video/{id}");
        return responsive_iframe(&src, "autoplay; fullscreen; picture-in-picture", &caption)
            .into();
    }

    if is_image_url(url) {
        return format!(
            r#"<img src="{}" alt="{}" class="w-full rounded-lg" />"#,
            esc(url),
            esc(&caption)
        )
        .into();
    }

    link_card(url, &caption).into()
}

/// File id of a Google Drive `/file/d/<id>` url.
pub fn drive_file_id(url: &str) -> Option<&str> {
    if !url.contains("drive.google.com") {
        return None;
    }
    drive_file_id_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Video id of a `youtube.com/watch?v=` or `youtu.be/` url.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    let rest = if url.contains("youtube.com/watch?v=") {
        url.split_once("v=")?.1
    } else {
        url.split_once("youtu.be/")?.1
    };
    let id = rest.split(['&', '?']).next().unwrap_or_default();
    (!id.is_empty()).then_some(id)
}

pub fn vimeo_video_id(url: &str) -> Option<&str> {
    let rest = url.split_once("vimeo.com/")?.1;
    let id = rest.split('?').next().unwrap_or_default();
    (!id.is_empty()).then_some(id)
}

pub fn is_image_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

/// `video/webm` for `.webm` files, `video/mp4` for everything else.
pub fn video_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if extension == "webm" {
        "video/webm"
    } else {
        "video/mp4"
    }
}

fn responsive_iframe(src: &str, allow: &str, caption: &str) -> String {
    let caption = if caption.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="mt-2 text-sm text-muted-foreground">{}</p>"#,
            esc(caption)
        )
    };
    format!(
        r#"<div class="aspect-video w-full rounded-lg overflow-hidden"><iframe src="{}" frameborder="0" allow="{}" allowfullscreen class="w-full h-full"></iframe>{}</div>"#,
        esc(src),
        allow,
        caption
    )
}

/// Link preview card. The raw url sits in a sibling `<div>` after the anchor,
/// never inside it, so linking bare urls later cannot nest an anchor.
fn link_card(url: &str, caption: &str) -> String {
    let display = if caption.is_empty() {
        CARD_FALLBACK_TEXT
    } else {
        caption
    };
    let mut out = String::from(
        "<div class=\"border rounded-lg p-4 hover:bg-muted/50 transition-colors\">\n",
    );
    out.push_str(&format!(
        "  <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"block no-underline\">\n",
        esc(url)
    ));
    out.push_str(&format!(
        "    <p class=\"font-medium text-sm break-words\">{}</p>\n",
        esc(display)
    ));
    out.push_str("  </a>\n");
    if caption.is_empty() {
        out.push_str(&format!(
            "  <div class=\"mt-1 text-xs text-muted-foreground break-all\">{}</div>\n",
            esc(url)
        ));
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn embed_block(url: &str) -> ContentBlock {
        ContentBlock::new(BlockKind::Embed(LinkPayload::new(url)))
    }

    #[test]
    fn test_image_with_caption() {
        // Given an external image with a caption
        let block = ContentBlock::new(BlockKind::Image(
            MediaPayload::external("https://x/y.png").with_caption("cat"),
        ));

        // When transformed
        let fragment = image(&block);

        // Then it is a single self-closing img
        assert_eq!(fragment.as_str(), r#"<img src="https://x/y.png" alt="cat" />"#);
    }

    #[test]
    fn test_image_escapes_caption() {
        let block = ContentBlock::new(BlockKind::Image(
            MediaPayload::external("https://x/y.png?a=1&b=2").with_caption(r#""><script>"#),
        ));

        let fragment = image(&block);

        assert_eq!(
            fragment.as_str(),
            r#"<img src="https://x/y.png?a=1&amp;b=2" alt="&quot;&gt;&lt;script&gt;" />"#
        );
    }

    #[test]
    fn test_missing_url_yields_empty_fragment() {
        let image_block = ContentBlock::new(BlockKind::Image(MediaPayload::default()));
        let video_block = ContentBlock::new(BlockKind::Video(MediaPayload::default()));
        let embed_block = embed_block("");
        let bookmark_block = ContentBlock::new(BlockKind::Bookmark(LinkPayload::new("")));

        assert!(image(&image_block).is_empty());
        assert!(video(&video_block).is_empty());
        assert!(embed(&embed_block).is_empty());
        assert!(bookmark(&bookmark_block).is_empty());
    }

    #[test]
    fn test_transformer_ignores_other_kinds() {
        let divider = ContentBlock::new(BlockKind::Divider);
        assert!(image(&divider).is_empty());
        assert!(embed(&divider).is_empty());
    }

    #[test]
    fn test_video_file_fallback() {
        let block = ContentBlock::new(BlockKind::Video(
            MediaPayload::external("https://cdn/clip.WEBM").with_caption("demo"),
        ));

        let fragment = video(&block);

        assert_eq!(
            fragment.as_str(),
            "<video controls class=\"w-full rounded-lg\">\n  <source src=\"https://cdn/clip.WEBM\" type=\"video/webm\" />\n  <p>demo</p>\n  Your browser does not support the video tag.\n</video>"
        );
    }

    #[test]
    fn test_video_without_caption_has_no_paragraph() {
        let block = ContentBlock::new(BlockKind::Video(MediaPayload::external("https://cdn/a.mp4")));
        let fragment = video(&block);
        assert!(!fragment.as_str().contains("<p>"));
        assert!(!fragment.as_str().contains("\n\n"));
    }

    #[test]
    fn test_drive_video_uses_preview_iframe() {
        let block = ContentBlock::new(BlockKind::Video(
            MediaPayload::external("https://drive.google.com/file/d/AbC_12-x/view?usp=sharing")
                .with_caption("clip"),
        ));

        let fragment = video(&block);

        assert_eq!(
            fragment.as_str(),
            r#"<div class="aspect-video w-full rounded-lg overflow-hidden"><iframe src="https://drive.google.com/file/d/AbC_12-x/preview" frameborder="0" allow="autoplay; fullscreen; picture-in-picture" allowfullscreen class="w-full h-full"></iframe><p class="mt-2 text-sm text-muted-foreground">clip</p></div>"#
        );
    }

    #[rstest]
    #[case("https://cdn/a.webm", "video/webm")]
    #[case("https://cdn/a.webm?sig=1", "video/webm")]
    #[case("https://cdn/a.mp4", "video/mp4")]
    #[case("https://cdn/a.mov", "video/mp4")]
    #[case("https://cdn/noext", "video/mp4")]
    fn test_video_mime_type(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(video_mime_type(url), expected);
    }

    #[rstest]
    #[case("https://youtube.com/watch?v=abc123&t=5", Some("abc123"))]
    #[case("https://www.youtube.com/watch?v=xyz", Some("xyz"))]
    #[case("https://youtu.be/short1?t=3", Some("short1"))]
    #[case("https://youtu.be/", None)]
    #[case("https://youtube.com/channel/abc", None)]
    fn test_youtube_video_id(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(youtube_video_id(url), expected);
    }

    #[rstest]
    #[case("https://youtube.com/watch?v=abc123&t=5", "https://www.youtube.com/embed/abc123\"")]
    #[case("https://vimeo.com/76979871?share=copy", "https://player.vimeo.com/video/76979871\"")]
    #[case("https://drive.google.com/file/d/F1/view", "https://drive.google.com/file/d/F1/preview\"")]
    #[case("https://pics.example/Photo.JPG", "class=\"w-full rounded-lg\" />")]
    #[case("https://example.com/article", "<div class=\"border rounded-lg")]
    fn test_embed_dispatch(#[case] url: &str, #[case] expected: &str) {
        let fragment = embed(&embed_block(url));
        assert!(
            fragment.as_str().contains(expected),
            "{expected} not in {fragment}"
        );
    }

    #[test]
    fn test_drive_url_without_file_id_falls_through_to_card() {
        let fragment = embed(&embed_block("https://drive.google.com/drive/folders/xyz"));
        assert!(fragment.as_str().starts_with("<div class=\"border rounded-lg"));
    }

    #[test]
    fn test_card_keeps_raw_url_outside_anchor() {
        // Given a bookmark without caption
        let block = ContentBlock::new(BlockKind::Bookmark(LinkPayload::new("https://a.dev/x?q=1&r=2")));

        // When transformed
        let fragment = bookmark(&block);

        // Then the raw url appears only after the anchor closes
        let text = fragment.as_str();
        let close = text.find("</a>").unwrap();
        let raw = text.find(">https://a.dev/x?q=1&amp;r=2</div>").unwrap();
        assert!(raw > close);
        assert!(text.contains("break-words\">Open link</p>"));
    }

    #[test]
    fn test_card_with_caption_omits_raw_url() {
        let block = ContentBlock::new(BlockKind::Bookmark(
            LinkPayload::new("https://a.dev").with_caption("Read <this>"),
        ));

        let fragment = bookmark(&block);

        assert_eq!(
            fragment.as_str(),
            "<div class=\"border rounded-lg p-4 hover:bg-muted/50 transition-colors\">\n  <a href=\"https://a.dev\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"block no-underline\">\n    <p class=\"font-medium text-sm break-words\">Read &lt;this&gt;</p>\n  </a>\n</div>"
        );
    }
}
