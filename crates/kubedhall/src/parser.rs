//! recursive descent parser for type expressions
//!
//! ```text
//! RecordType  := '{' [ Field (',' Field)* ] '}'
//! UnionType   := '<' [ Field ('|' Field)* ] '>'
//! Field       := (Identifier | QuotedLabel) ':' Value
//! Value       := Identifier* [ (RecordType | UnionType) ]
//! ```
//!
//! One token of lookahead, no backtracking, no recovery: the first mismatch aborts.
//!
//! Record and union literals nest at most [MAX_NESTING] levels deep, the root record included.
use crate::ast::{FieldType, LastValueType, RecordType, UnionType, ValueType};
use crate::error::{Error, Expected, Found, ParseError};
use crate::token::{Token, TokenKind, Tokenizer};

/// Deepest accepted nesting of record and union literals
pub const MAX_NESTING: usize = 256;

/// Parse a complete source into a [RecordType]
///
/// ```
/// let record = kubedhall::parser::parse_record_type("{ name : Text, port : Optional Natural }").unwrap();
/// assert_eq!(record.fields.len(), 2);
/// assert_eq!(record.fields[1].value.atoms, vec!["Optional", "Natural"]);
/// ```
#[tracing::instrument(level = "trace", skip_all)]
pub fn parse_record_type(source: &str) -> Result<RecordType, Error> {
    let mut parser = Parser::new(source);
    let record = parser.record()?;
    parser.end()?;

    tracing::debug!(fields = record.fields.len(), "parsed record type");
    Ok(record)
}

struct Parser<'s> {
    tokens: Tokenizer<'s>,
    peeked: Option<Token<'s>>,
    /// literals currently open
    depth: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            tokens: Tokenizer::new(source),
            peeked: None,
            depth: 0,
        }
    }

    fn peek(&mut self) -> Result<Option<Token<'s>>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.tokens.next().transpose()?;
        }
        Ok(self.peeked)
    }

    fn consume(&mut self) -> Result<Option<Token<'s>>, Error> {
        self.peek()?;
        Ok(self.peeked.take())
    }

    fn peek_punctuation(&mut self, punctuation: &str) -> Result<bool, Error> {
        Ok(self
            .peek()?
            .is_some_and(|token| token.is_punctuation(punctuation)))
    }

    fn mismatch(&self, expected: Expected, found: Option<Token<'s>>) -> Error {
        let (found, position) = match found {
            Some(token) => (Found::Token(token.text.to_string()), token.position),
            None => (Found::EndOfInput, self.tokens.end()),
        };

        ParseError {
            expected,
            found,
            position,
        }
        .into()
    }

    fn expect(&mut self, punctuation: &'static str) -> Result<(), Error> {
        match self.consume()? {
            Some(token) if token.is_punctuation(punctuation) => Ok(()),
            other => Err(self.mismatch(Expected::Token(punctuation), other)),
        }
    }

    fn end(&mut self) -> Result<(), Error> {
        match self.consume()? {
            None => Ok(()),
            other => Err(self.mismatch(Expected::EndOfInput, other)),
        }
    }

    /// `open fields close`, one nesting level deeper
    fn literal(
        &mut self,
        open: &'static str,
        separator: &str,
        close: &'static str,
    ) -> Result<Vec<FieldType>, Error> {
        if self.depth == MAX_NESTING {
            let found = self.consume()?;
            return Err(self.mismatch(Expected::Class("at most 256 nested literals"), found));
        }
        self.expect(open)?;

        self.depth += 1;
        let fields = self.fields(separator, close);
        self.depth -= 1;

        let fields = fields?;
        self.expect(close)?;
        Ok(fields)
    }

    fn record(&mut self) -> Result<RecordType, Error> {
        Ok(RecordType::new(self.literal("{", ",", "}")?))
    }

    fn union(&mut self) -> Result<UnionType, Error> {
        Ok(UnionType::new(self.literal("<", "|", ">")?))
    }

    /// `[ Field (separator Field)* ]`, stops in front of `close`
    fn fields(&mut self, separator: &str, close: &str) -> Result<Vec<FieldType>, Error> {
        let mut fields = vec![];
        if self.peek_punctuation(close)? {
            return Ok(fields);
        }

        fields.push(self.field()?);
        while self.peek_punctuation(separator)? {
            self.consume()?;
            fields.push(self.field()?);
        }

        Ok(fields)
    }

    fn field(&mut self) -> Result<FieldType, Error> {
        let key = match self.consume()? {
            Some(token) if matches!(token.kind, TokenKind::Identifier | TokenKind::QuotedLabel) => {
                token.text.to_string()
            }
            other => return Err(self.mismatch(Expected::Class("field label"), other)),
        };

        self.expect(":")?;
        let value = self.value()?;
        Ok(FieldType::new(key, value))
    }

    fn value(&mut self) -> Result<ValueType, Error> {
        let mut atoms = vec![];
        while let Some(token) = self.peek()? {
            if token.kind != TokenKind::Identifier {
                break;
            }
            atoms.push(token.text.to_string());
            self.consume()?;
        }

        let tail = if self.peek_punctuation("{")? {
            Some(LastValueType::Record(self.record()?))
        } else if self.peek_punctuation("<")? {
            Some(LastValueType::Union(self.union()?))
        } else {
            None
        };

        Ok(ValueType::new(atoms, tail))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_error(source: &str) -> ParseError {
        match parse_record_type(source) {
            Err(Error::Parse(err)) => err,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn nested_record_and_union() {
        let record = parse_record_type(
            "{ metadata : { name : Text }, image : < asText : Text | asRecord : { name : Text } > }",
        )
        .unwrap();

        let expected = RecordType::new(vec![
            FieldType::new(
                "metadata",
                RecordType::new(vec![FieldType::new("name", ValueType::from_atoms(["Text"]))])
                    .into(),
            ),
            FieldType::new(
                "image",
                UnionType::new(vec![
                    FieldType::new("asText", ValueType::from_atoms(["Text"])),
                    FieldType::new(
                        "asRecord",
                        RecordType::new(vec![FieldType::new(
                            "name",
                            ValueType::from_atoms(["Text"]),
                        )])
                        .into(),
                    ),
                ])
                .into(),
            ),
        ]);

        assert_eq!(record, expected);
    }

    #[test]
    fn atoms_followed_by_literal() {
        let record =
            parse_record_type("{ additionalEnv : Optional (List { name : Text, value : Text }) }")
                .unwrap();

        let value = &record.fields[0].value;
        assert_eq!(value.atoms, vec!["Optional", "List"]);
        assert_eq!(value.record().map(|r| r.fields.len()), Some(2));
    }

    #[test]
    fn empty_literals() {
        let record = parse_record_type("{ a : {}, b : <> }").unwrap();
        assert_eq!(record.fields[0].value, ValueType::from(RecordType::default()));
        assert_eq!(record.fields[1].value, ValueType::from(UnionType::default()));

        assert_eq!(parse_record_type("{}").unwrap(), RecordType::default());
    }

    #[test]
    fn quoted_labels_keep_their_quotes() {
        let record = parse_record_type("{ `app.kubernetes.io/name` : Text }").unwrap();
        assert_eq!(record.fields[0].key, "`app.kubernetes.io/name`");
    }

    #[test]
    fn duplicate_keys_are_preserved() {
        let record = parse_record_type("{ a : Text, a : Natural }").unwrap();
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[1].value.atoms, vec!["Natural"]);
    }

    #[test]
    fn missing_colon() {
        let err = parse_error("{ foo Text }");
        assert_eq!(
            err,
            ParseError {
                expected: Expected::Token(":"),
                found: Found::Token("Text".to_string()),
                position: 6,
            }
        );
    }

    #[test]
    fn empty_input() {
        let err = parse_error("");
        assert_eq!(err.expected, Expected::Token("{"));
        assert_eq!(err.found, Found::EndOfInput);
        assert_eq!(err.position, 0);
    }

    #[test]
    fn top_level_must_be_record() {
        let err = parse_error("< a : Text >");
        assert_eq!(err.expected, Expected::Token("{"));

        let err = parse_error("Text");
        assert_eq!(err.found, Found::Token("Text".to_string()));
    }

    #[test]
    fn premature_end() {
        let err = parse_error("{ a : Text");
        assert_eq!(err.expected, Expected::Token("}"));
        assert_eq!(err.found, Found::EndOfInput);
        assert_eq!(err.position, 10);
    }

    #[test]
    fn trailing_input() {
        let err = parse_error("{ a : Text } }");
        assert_eq!(err.expected, Expected::EndOfInput);
        assert_eq!(err.position, 13);
    }

    #[test]
    fn wrong_separator_in_union() {
        let err = parse_error("{ a : < x : Text , y : Text > }");
        assert_eq!(err.expected, Expected::Token(">"));
        assert_eq!(err.found, Found::Token(",".to_string()));
    }

    #[test]
    fn missing_label() {
        let err = parse_error("{ a : Text, }");
        assert_eq!(err.expected, Expected::Class("field label"));
        assert_eq!(err.found, Found::Token("}".to_string()));
    }

    fn nested(depth: usize) -> String {
        format!("{}Text{}", "{ a : ".repeat(depth), " }".repeat(depth))
    }

    #[test]
    fn nesting_limit() {
        let record = parse_record_type(&nested(MAX_NESTING)).unwrap();
        assert_eq!(record.fields[0].key, "a");

        let err = parse_error(&nested(MAX_NESTING + 1));
        assert_eq!(err.expected, Expected::Class("at most 256 nested literals"));
        assert_eq!(err.found, Found::Token("{".to_string()));
        assert_eq!(err.position, MAX_NESTING * "{ a : ".len());
    }

    #[test]
    fn deep_nesting_fails_without_overflow() {
        let err = parse_error(&nested(5000));
        assert_eq!(err.expected, Expected::Class("at most 256 nested literals"));

        let union = format!("{{ a : {}Text{} }}", "< a : ".repeat(300), " >".repeat(300));
        assert_eq!(parse_error(&union).found, Found::Token("<".to_string()));
    }

    #[test]
    fn lex_errors_abort() {
        let err = parse_record_type("{ a : Text = }").expect_err("must fail");
        assert!(matches!(err, Error::Lex(lex) if lex.position == 11));
    }
}
