/// Escape a value for interpolation into a quoted HTML attribute.
///
/// `&`, `"`, `'`, `<` and `>` are all replaced, so the result is safe inside
/// either quote style and never double-escapes an existing entity's `&`.
pub fn escape_attribute(value: &str) -> String {
    html_escape::encode_quoted_attribute(value).into_owned()
}

/// Inverse of [`escape_attribute`].
pub fn unescape_attribute(value: &str) -> String {
    html_escape::decode_html_entities(value).into_owned()
}
