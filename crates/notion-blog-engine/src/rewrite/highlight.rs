use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::markup::{Element, MarkupNode};

pub const DEFAULT_THEME: &str = "InspiredGitHub";

const FALLBACK_THEMES: &[&str] = &["InspiredGitHub", "Solarized (light)", "base16-ocean.light"];

/// Syntax highlighter for fenced code blocks, colouring tokens with inline styles.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("theme", &self.theme.name)
            .finish()
    }
}

impl Highlighter {
    /// Load the default syntaxes and the named theme, falling back to a
    /// light default when the name is unknown.
    pub fn new(theme_name: &str) -> Option<Self> {
        let mut theme_set = ThemeSet::load_defaults();
        let name = std::iter::once(theme_name)
            .chain(FALLBACK_THEMES.iter().copied())
            .find(|name| theme_set.themes.contains_key(*name))
            .map(str::to_string)
            .or_else(|| theme_set.themes.keys().next().cloned())?;
        if name != theme_name {
            log::warn!("Unknown highlight theme {theme_name:?}, using {name:?}");
        }
        let theme = theme_set.themes.remove(&name)?;

        Some(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    /// Rewrite every `pre > code.language-*` whose language is known.
    pub fn highlight_tree(&self, node: &mut MarkupNode) {
        let is_pre = matches!(node, MarkupNode::Element(el) if el.tag == "pre");
        let Some(children) = node.children_mut() else {
            return;
        };
        for child in children.iter_mut() {
            if is_pre
                && let MarkupNode::Element(code) = child
                && code.tag == "code"
            {
                self.highlight_code(code);
            } else {
                self.highlight_tree(child);
            }
        }
    }

    fn highlight_code(&self, code: &mut Element) {
        let Some(language) = code
            .classes()
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string)
        else {
            return;
        };
        let Some(syntax) = self.syntax_set.find_syntax_by_token(&language) else {
            log::debug!("No syntax for language {language:?}, leaving code plain");
            return;
        };

        let source = MarkupNode::Root(std::mem::take(&mut code.children)).text_content();
        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut spans = Vec::new();

        for line in LinesWithEndings::from(&source) {
            match lines.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => spans.extend(
                    ranges
                        .into_iter()
                        .filter(|(_, text)| !text.is_empty())
                        .map(|(style, text)| styled_span(style, text)),
                ),
                Err(err) => {
                    log::debug!("Highlighting {language} failed: {err}");
                    code.children = vec![MarkupNode::text(source)];
                    return;
                }
            }
        }
        code.children = spans;
    }
}

fn styled_span(style: Style, text: &str) -> MarkupNode {
    let color = style.foreground;
    Element::new("span")
        .with_attr(
            "style",
            format!("color:#{:02x}{:02x}{:02x}", color.r, color.g, color.b),
        )
        .with_text(text)
        .into()
}
