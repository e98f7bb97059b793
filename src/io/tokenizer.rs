//! Whitespace tokenizer with quoted strings.
//!
//! Tokens are separated by whitespace. A token starting with `"` runs to the
//! matching unescaped `"`; inside it `\"` is a quote, `\\` a backslash and
//! `\n`/`\r` are line breaks, so a quoted token never spans lines.
//! [`quote`] produces text this tokenizer reads back unchanged.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

/// Why a line could not be split into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("unterminated quoted string")]
    UnterminatedQuote,
}

/// `true` if `s` would not survive as a bare token.
#[must_use]
pub fn needs_quoting(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\')
}

/// Quotes and escapes `s` when needed; returns it borrowed otherwise.
#[must_use]
pub fn quote(s: &str) -> Cow<'_, str> {
    if !needs_quoting(s) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

/// Iterator over the tokens of one line.
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn quoted(&mut self) -> Result<String, TokenError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(s),
                Some('\\') => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('r') => s.push('\r'),
                    Some(escaped) => s.push(escaped),
                    None => return Err(TokenError::UnterminatedQuote),
                },
                Some(c) => s.push(c),
                None => return Err(TokenError::UnterminatedQuote),
            }
        }
    }

    fn bare(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        s
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<String, TokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_ws();
        let c = self.chars.next()?;
        if c == '"' {
            Some(self.quoted())
        } else {
            Some(Ok(self.bare(c)))
        }
    }
}

/// Splits a whole line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenError> {
    Tokenizer::new(line).collect()
}
