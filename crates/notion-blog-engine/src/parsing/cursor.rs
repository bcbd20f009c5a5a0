/// A byte cursor over raw HTML source.
///
/// Every method that advances stops on an ASCII byte boundary or at the end,
/// so slices taken between two positions are always valid UTF-8.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The source being tokenized.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Peeks `n` bytes ahead of the current one.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + n).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.rest().as_bytes().starts_with(pat)
    }

    /// ASCII case-insensitive [`Cursor::starts_with`].
    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        let rest = self.rest().as_bytes();
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    /// Advances by `n` bytes, clamped to the end.
    pub fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    /// Remaining unconsumed input.
    pub fn rest(&self) -> &'a str {
        self.s.get(self.i..).unwrap_or_default()
    }

    /// Consumes bytes while `pred` holds and returns them.
    ///
    /// `pred` must only accept ASCII bytes or reject every non-ASCII byte
    /// consistently, which keeps the returned slice on char boundaries.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
        self.s.get(start..self.i).unwrap_or_default()
    }

    /// Consumes up to (not including) the first occurrence of `pat`, or to the end.
    pub fn eat_until(&mut self, pat: &str) -> &'a str {
        let rest = self.rest();
        let len = rest.find(pat).unwrap_or(rest.len());
        self.i += len;
        &rest[..len]
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(|b| b.is_ascii_whitespace());
    }
}
