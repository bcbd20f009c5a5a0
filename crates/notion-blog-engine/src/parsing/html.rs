use super::cursor::Cursor;
use crate::markup::{AttrValue, JsxAttribute};

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlToken {
    Open {
        name: String,
        attributes: Vec<JsxAttribute>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(String),
}

/// Split raw HTML into tags and text.
///
/// Tag names are lowercased; attribute names keep their case. Comments,
/// doctypes and processing instructions produce no token. A `<` that does not
/// start a tag is kept as text.
pub fn tokenize(src: &str) -> Vec<HtmlToken> {
    let mut cur = Cursor::new(src);
    let mut tokens = Vec::new();
    let mut text = String::new();

    while !cur.eof() {
        if cur.peek() != Some(b'<') {
            text.push_str(cur.eat_until("<"));
            continue;
        }

        if cur.starts_with(b"<!--") {
            cur.bump_n(4);
            cur.eat_until("-->");
            cur.bump_n(3);
            continue;
        }
        if cur.starts_with(b"<!") || cur.starts_with(b"<?") {
            cur.eat_until(">");
            cur.bump();
            continue;
        }

        if cur.peek_at(1) == Some(b'/') && cur.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic())
        {
            cur.bump_n(2);
            let name = tag_name(&mut cur);
            cur.eat_until(">");
            cur.bump();
            flush_text(&mut text, &mut tokens);
            tokens.push(HtmlToken::Close { name });
            continue;
        }

        if cur.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic()) {
            cur.bump();
            let name = tag_name(&mut cur);
            let (attributes, self_closing) = attributes(&mut cur);
            flush_text(&mut text, &mut tokens);

            let raw_text = !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str());
            tokens.push(HtmlToken::Open {
                name: name.clone(),
                attributes,
                self_closing,
            });
            if raw_text {
                let body = raw_text_until_close(&mut cur, &name);
                if !body.is_empty() {
                    tokens.push(HtmlToken::Text(body.to_string()));
                }
            }
            continue;
        }

        // Not a tag: keep the bracket as text.
        cur.bump();
        text.push('<');
    }

    flush_text(&mut text, &mut tokens);
    tokens
}

fn flush_text(text: &mut String, tokens: &mut Vec<HtmlToken>) {
    if !text.is_empty() {
        let decoded = html_escape::decode_html_entities(text.as_str()).into_owned();
        tokens.push(HtmlToken::Text(decoded));
        text.clear();
    }
}

fn tag_name(cur: &mut Cursor) -> String {
    cur.eat_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        .to_ascii_lowercase()
}

/// Content of a raw-text element up to its closing tag, case-insensitively.
fn raw_text_until_close<'a>(cur: &mut Cursor<'a>, name: &str) -> &'a str {
    let closer = format!("</{name}");
    let rest = cur.rest();
    let len = rest
        .to_ascii_lowercase()
        .find(&closer)
        .unwrap_or(rest.len());
    cur.bump_n(len);
    &rest[..len]
}

/// Attributes up to and including the tag's `>`. Returns whether the tag self-closed.
fn attributes(cur: &mut Cursor) -> (Vec<JsxAttribute>, bool) {
    let mut attributes = Vec::new();

    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => return (attributes, false),
            Some(b'>') => {
                cur.bump();
                return (attributes, false);
            }
            Some(b'/') if cur.peek_at(1) == Some(b'>') => {
                cur.bump_n(2);
                return (attributes, true);
            }
            Some(b'/') => {
                cur.bump();
                continue;
            }
            _ => {}
        }

        let name = cur.eat_while(|b| {
            !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'')
        });
        if name.is_empty() {
            // Stray quote where a name should be.
            cur.bump();
            continue;
        }

        cur.skip_whitespace();
        if cur.peek() != Some(b'=') {
            attributes.push(JsxAttribute::bare(name));
            continue;
        }
        cur.bump();
        cur.skip_whitespace();

        let attribute = match cur.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                cur.bump();
                let raw = cur.eat_until(if quote == b'"' { "\"" } else { "'" });
                cur.bump();
                literal(name, raw)
            }
            Some(b'{') => JsxAttribute::expression(name, expression(cur)),
            _ => {
                let raw = cur.eat_while(|b| !b.is_ascii_whitespace() && b != b'>');
                literal(name, raw)
            }
        };
        attributes.push(attribute);
    }
}

fn literal(name: &str, raw: &str) -> JsxAttribute {
    let value = html_escape::decode_html_entities(raw).into_owned();
    JsxAttribute::literal(name, AttrValue::Str(value))
}

/// Source of a `{...}` attribute value with balanced braces, without the outer pair.
fn expression<'a>(cur: &mut Cursor<'a>) -> &'a str {
    let start = cur.i + 1;
    let mut depth = 0usize;
    while let Some(b) = cur.bump() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return cur.s.get(start..cur.i - 1).unwrap_or_default();
                }
            }
            _ => {}
        }
    }
    cur.s.get(start..).unwrap_or_default()
}
