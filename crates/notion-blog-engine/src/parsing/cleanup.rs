use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::MarkupFragment;

/// `<...>` whose inner text has no letter, `/` or `!`, or whose inner text
/// opens with a line break after optional blanks.
fn pseudo_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<([^A-Za-z/!<>]*|[^\S\n]*\n[^<>]*)>").expect("valid regex")
    })
}

/// Unwrap stray angle brackets left behind by block conversion.
///
/// `<\n\nhello\n>` becomes `hello`. Real tags, closing tags, comments and
/// declarations start with a letter, `/` or `!` and are never touched, and
/// neither are single-line comparisons or generics like `Option<&str>`.
pub fn strip_pseudo_tags(markdown: &str) -> Cow<'_, str> {
    pseudo_tag_regex().replace_all(markdown, |caps: &Captures| {
        caps.get(1)
            .map(|inner| inner.as_str().trim().to_string())
            .unwrap_or_default()
    })
}

/// [`strip_pseudo_tags`] over a whole document fragment.
pub fn post_process(fragment: &MarkupFragment) -> MarkupFragment {
    MarkupFragment::new(strip_pseudo_tags(fragment.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<\n\nhello\n>", "hello")]
    #[case("a < b > c", "a < b > c")]
    #[case("`Option<&str>`", "`Option<&str>`")]
    #[case("`x < 3 && y > 2`", "`x < 3 && y > 2`")]
    #[case("< \nnote\n>", "note")]
    #[case("before <> after", "before  after")]
    #[case("< 42 >", "42")]
    #[case("<u>x</u>", "<u>x</u>")]
    #[case("<img src=\"a\" />", "<img src=\"a\" />")]
    #[case("<!-- note -->", "<!-- note -->")]
    #[case("<https://example.com>", "<https://example.com>")]
    #[case("no tags", "no tags")]
    fn test_strip_pseudo_tags(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_pseudo_tags(input), expected);
    }

    #[test]
    fn test_clean_input_is_borrowed() {
        assert!(matches!(strip_pseudo_tags("<p>ok</p>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_inline_code_with_angle_brackets_is_kept() {
        // Given prose whose inline code holds a generic and a comparison
        let markdown = "`Option<&str>` and `x < 3 && y > 2`";

        // When stray brackets are stripped
        let cleaned = strip_pseudo_tags(markdown);

        // Then nothing changes and the input is borrowed back
        assert_eq!(cleaned, markdown);
        assert!(matches!(cleaned, Cow::Borrowed(_)));
    }

    #[test]
    fn test_post_process_fragment() {
        // Given a fragment with a stray bracket pair between real tags
        let fragment = MarkupFragment::new("<u>ok</u>\n\n< \nnote\n>");

        // When post-processed
        let cleaned = post_process(&fragment);

        // Then only the stray pair is unwrapped
        assert_eq!(cleaned.as_str(), "<u>ok</u>\n\nnote");
    }
}
