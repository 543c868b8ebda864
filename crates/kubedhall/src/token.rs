//! tokenizer for type expressions
//!
//! Produces identifiers, back-quoted labels and the punctuation `: { } < > , |`.
//! Whitespace and round parentheses are skipped: `Optional (List Text)` yields the
//! same tokens as `Optional List Text`. The printer puts the parentheses back.
use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    QuotedLabel,
    Punctuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub kind: TokenKind,
    pub text: &'s str,
    /// byte offset into the source
    pub position: usize,
}

impl<'s> Token<'s> {
    pub fn is_punctuation(&self, punctuation: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == punctuation
    }
}

/// Lazily splits a source into [Token]s
///
/// Iteration stops after the first [LexError].
pub struct Tokenizer<'s> {
    source: &'s str,
    position: usize,
    failed: bool,
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            position: 0,
            failed: false,
        }
    }

    /// Byte length of the source, used as position of "end of input"
    pub fn end(&self) -> usize {
        self.source.len()
    }

    fn skip_ignored(&mut self) {
        let rest = &self.source[self.position..];
        let skipped = rest
            .find(|c: char| !(c.is_whitespace() || c == '(' || c == ')'))
            .unwrap_or(rest.len());
        self.position += skipped;
    }

    fn take(&mut self, kind: TokenKind, len: usize) -> Token<'s> {
        let token = Token {
            kind,
            text: &self.source[self.position..self.position + len],
            position: self.position,
        };
        self.position += len;
        tracing::trace!(?token, "token");
        token
    }

    fn fail(&mut self, unexpected: &str) -> LexError {
        self.failed = true;
        LexError {
            position: self.position,
            unexpected: unexpected.to_string(),
        }
    }
}

impl<'s> Iterator for Tokenizer<'s> {
    type Item = Result<Token<'s>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.skip_ignored();
        let rest = &self.source[self.position..];
        let first = rest.chars().next()?;

        if first.is_ascii_alphabetic() {
            let len = rest
                .find(|c: char| !is_identifier_continue(c))
                .unwrap_or(rest.len());
            return Some(Ok(self.take(TokenKind::Identifier, len)));
        }

        if first == '`' {
            // shortest back-quoted run on a single line, at least one character inside
            let body = &rest[1..];
            return match body.find(|c: char| c == '`' || c == '\n') {
                Some(close) if close > 0 && body[close..].starts_with('`') => {
                    Some(Ok(self.take(TokenKind::QuotedLabel, close + 2)))
                }
                _ => {
                    let line = rest.lines().next().unwrap_or(rest);
                    Some(Err(self.fail(line)))
                }
            };
        }

        if is_punctuation(first) {
            return Some(Ok(self.take(TokenKind::Punctuation, first.len_utf8())));
        }

        let unexpected = &rest[..first.len_utf8()];
        Some(Err(self.fail(unexpected)))
    }
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_punctuation(c: char) -> bool {
    matches!(c, ':' | '{' | '}' | '<' | '>' | ',' | '|')
}

/// Tokenize a complete source
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Tokenizer::new(source).collect()
}
