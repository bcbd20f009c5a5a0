use std::fmt;

/// Markdown with embedded HTML, passed opaquely from the block transformer to
/// the post-processor. Nothing looks inside it until it is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupFragment(String);

impl MarkupFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for MarkupFragment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for MarkupFragment {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl AsRef<str> for MarkupFragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkupFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
