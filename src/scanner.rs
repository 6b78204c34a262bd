//! # Structural Scanner
//!
//! A byte cursor over C# source that understands just enough of the lexical grammar to
//! match delimiters reliably: string literals (regular, verbatim, interpolated and raw),
//! character literals and comments are skipped so that a `}` inside `"..."` or `// ...`
//! never closes a block.
//!
//! All positions are byte offsets into the scanned text. Every delimiter the scanner
//! stops on is ASCII, so offsets it returns are always valid `str` slice boundaries.

/// A forward-only cursor over source text.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    /// Skips whitespace and comments.
    pub fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => {
                    self.skip_comment();
                }
                _ => break,
            }
        }
    }

    /// Consumes `expected` if the text continues with it.
    pub fn eat(&mut self, expected: &str) -> bool {
        if self.text[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    /// Reads a C# identifier, including a leading `@` for verbatim identifiers.
    pub fn identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let rest = &self.text[self.pos..];
        let mut chars = rest.char_indices().peekable();
        let mut end = 0;

        if let Some(&(_, '@')) = chars.peek() {
            chars.next();
            end = 1;
        }
        match chars.peek() {
            Some(&(_, c)) if c == '_' || c.is_alphabetic() => {}
            _ => return None,
        }
        for (i, c) in chars {
            if c == '_' || c.is_alphanumeric() {
                end = i + c.len_utf8();
            } else {
                break;
            }
        }

        self.pos += end;
        Some(&self.text[start..self.pos])
    }

    /// With the cursor on `open`, finds the offset of the matching `close`.
    ///
    /// On success the cursor is left just past the closing delimiter. Returns `None` when
    /// the cursor is not on `open` or the text ends before the delimiters balance.
    pub fn find_matching(&mut self, open: u8, close: u8) -> Option<usize> {
        if self.peek() != Some(open) {
            return None;
        }
        self.pos += 1;
        let mut depth = 1usize;

        while let Some(b) = self.peek() {
            if self.skip_literal_or_comment() {
                continue;
            }
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    let found = self.pos;
                    self.pos += 1;
                    return Some(found);
                }
            }
            self.pos += 1;
        }
        None
    }

    /// Skips a string literal, character literal or comment starting at the cursor.
    /// Returns `false` (without moving) if none starts here.
    fn skip_literal_or_comment(&mut self) -> bool {
        match self.peek() {
            Some(b'/') if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => {
                self.skip_comment();
                true
            }
            Some(b'"') => {
                self.skip_string(false);
                true
            }
            Some(b'\'') => {
                self.skip_char_literal();
                true
            }
            Some(b'@') | Some(b'$') => {
                // `@"..."`, `$"..."`, `$@"..."`, `@$"..."`, `$$"""..."""`
                let mut offset = 0;
                let mut verbatim = false;
                while let Some(prefix) = self.peek_at(offset) {
                    match prefix {
                        b'@' => verbatim = true,
                        b'$' => {}
                        _ => break,
                    }
                    offset += 1;
                }
                if offset > 0 && self.peek_at(offset) == Some(b'"') {
                    self.pos += offset;
                    self.skip_string(verbatim);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn skip_comment(&mut self) {
        if self.peek_at(1) == Some(b'/') {
            match self.text[self.pos..].find('\n') {
                Some(i) => self.pos += i + 1,
                None => self.pos = self.text.len(),
            }
        } else {
            match self.text[self.pos + 2..].find("*/") {
                Some(i) => self.pos += 2 + i + 2,
                None => self.pos = self.text.len(),
            }
        }
    }

    /// Cursor is on the opening quote.
    ///
    /// Three or more quotes open a raw string only without `@`: in a verbatim string `""`
    /// is an escaped quote, so `@"""x"" y"` is an ordinary verbatim literal.
    fn skip_string(&mut self, verbatim: bool) {
        let quotes = self.bytes()[self.pos..]
            .iter()
            .take_while(|&&b| b == b'"')
            .count();

        if quotes >= 3 && !verbatim {
            let fence = &self.text[self.pos..self.pos + quotes];
            self.pos += quotes;
            match self.text[self.pos..].find(fence) {
                Some(i) => self.pos += i + quotes,
                None => self.pos = self.text.len(),
            }
            return;
        }

        self.pos += 1;
        while let Some(b) = self.peek() {
            match b {
                b'\\' if !verbatim => self.pos += 2,
                b'"' if verbatim && self.peek_at(1) == Some(b'"') => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return;
                }
                b'\n' if !verbatim => {
                    // Regular strings cannot span lines; stop rather than swallow the file.
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.text.len());
    }

    fn skip_char_literal(&mut self) {
        self.pos += 1;
        while let Some(b) = self.peek() {
            match b {
                b'\\' => self.pos += 2,
                b'\'' => {
                    self.pos += 1;
                    return;
                }
                b'\n' => return,
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.text.len());
    }
}

/// Net count of `{` minus `}` outside literals and comments.
pub fn brace_balance(text: &str) -> i64 {
    let mut scanner = Scanner::new(text, 0);
    let mut balance = 0i64;
    while let Some(b) = scanner.peek() {
        if scanner.skip_literal_or_comment() {
            continue;
        }
        match b {
            b'{' => balance += 1,
            b'}' => balance -= 1,
            _ => {}
        }
        scanner.pos += 1;
    }
    balance
}
