//! error types shared by the type expression and import catalog parsers
use std::fmt;

/// Tokenizer could not classify the input at `position` (byte offset)
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected `{unexpected}` at position {position}")]
pub struct LexError {
    pub position: usize,
    pub unexpected: String,
}

/// Grammar mismatch or premature end of input
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected}, found {found} at position {position}")]
pub struct ParseError {
    pub expected: Expected,
    pub found: Found,
    pub position: usize,
}

/// What the parser was looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// A specific punctuation token such as `:` or `}`
    Token(&'static str),
    /// Any token of a class, e.g. "field label"
    Class(&'static str),
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(token) => write!(f, "`{token}`"),
            Expected::Class(class) => f.write_str(class),
            Expected::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// What the parser got instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Token(String),
    EndOfInput,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Token(text) => write!(f, "`{text}`"),
            Found::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Failure of [crate::parser::parse_record_type]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unable to tokenize type expression")]
    Lex(#[from] LexError),
    #[error("unable to parse type expression")]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display() {
        let err = ParseError {
            expected: Expected::Token(":"),
            found: Found::Token("Text".to_string()),
            position: 6,
        };
        assert_eq!(err.to_string(), "expected `:`, found `Text` at position 6");

        let err = ParseError {
            expected: Expected::Class("field label"),
            found: Found::EndOfInput,
            position: 1,
        };
        assert_eq!(
            err.to_string(),
            "expected field label, found end of input at position 1"
        );
    }
}
