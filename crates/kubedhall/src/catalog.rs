//! import catalogs
//!
//! A schema library like dhall-kubernetes ships a `types.dhall` listing every type as a local
//! import, optionally pinned by an integrity hash:
//!
//! ```text
//! { DaemonSet =
//!     ./types/io.k8s.api.apps.v1.DaemonSet.dhall sha256:d7c19aff4e38...
//! , DaemonSetList =
//!     ./types/io.k8s.api.apps.v1.DaemonSetList.dhall
//! }
//! ```
//!
//! [parse_import_catalog] turns this into a name → path mapping. Hashes are checked for shape
//! only and then dropped.
use crate::error::{Expected, Found, ParseError};
use indexmap::IndexMap;

const SHA256_PREFIX: &str = "sha256:";

/// One `name = path` line of a catalog
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub name: String,
    pub path: String,
}

/// Name → import path, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ImportCatalog {
    entries: IndexMap<String, String>,
}

impl ImportCatalog {
    /// Add an entry, replacing the path of an existing name in place
    pub fn insert(&mut self, entry: ImportEntry) -> Option<String> {
        let replaced = self.entries.insert(entry.name, entry.path);
        if let Some(previous) = &replaced {
            tracing::debug!(%previous, "duplicate catalog entry");
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ImportEntry> + '_ {
        self.entries
            .iter()
            .map(|(name, path)| ImportEntry::new(name.clone(), path.clone()))
    }
}

impl FromIterator<ImportEntry> for ImportCatalog {
    fn from_iter<T: IntoIterator<Item = ImportEntry>>(iter: T) -> Self {
        let mut catalog = ImportCatalog::default();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

/// Parse `{ Name = ./path.dhall [sha256:hex], ... }`
///
/// ```
/// let catalog = kubedhall::catalog::parse_import_catalog(
///     "{ A = ./a.dhall sha256:deadbeef, B = ./b.dhall }",
/// ).unwrap();
/// assert_eq!(catalog.get("A"), Some("./a.dhall"));
/// assert_eq!(catalog.get("B"), Some("./b.dhall"));
/// ```
pub fn parse_import_catalog(source: &str) -> Result<ImportCatalog, ParseError> {
    let mut parser = CatalogParser::new(source);
    let catalog = parser.catalog()?;
    tracing::debug!(entries = catalog.len(), "parsed import catalog");
    Ok(catalog)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordKind {
    /// names, paths and hashes
    Word,
    /// any other single character
    Symbol,
}

#[derive(Debug, Clone, Copy)]
struct Word<'s> {
    kind: WordKind,
    text: &'s str,
    position: usize,
}

/// Splits a catalog into [Word]s
///
/// Words start with a letter or `.` and continue with letters, digits, `.`, `_`, `-`, `:` and
/// `/`, so `./types/io.k8s.api.apps.v1.DaemonSet.dhall` and `sha256:<hex>` are single words.
struct Scanner<'s> {
    source: &'s str,
    position: usize,
}

impl<'s> Iterator for Scanner<'s> {
    type Item = Word<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.position..];
        let start = rest.find(|c: char| !c.is_whitespace())?;
        self.position += start;
        let rest = &rest[start..];

        let first = rest.chars().next()?;
        let (kind, len) = if first.is_alphabetic() || first == '.' {
            let len = rest
                .char_indices()
                .skip(1)
                .find(|&(_, c)| !is_word_continue(c))
                .map(|(index, _)| index)
                .unwrap_or(rest.len());
            (WordKind::Word, len)
        } else {
            (WordKind::Symbol, first.len_utf8())
        };

        let word = Word {
            kind,
            text: &rest[..len],
            position: self.position,
        };
        self.position += len;
        Some(word)
    }
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ':' | '/')
}

struct CatalogParser<'s> {
    words: Scanner<'s>,
    peeked: Option<Word<'s>>,
}

impl<'s> CatalogParser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            words: Scanner {
                source,
                position: 0,
            },
            peeked: None,
        }
    }

    fn peek(&mut self) -> Option<Word<'s>> {
        if self.peeked.is_none() {
            self.peeked = self.words.next();
        }
        self.peeked
    }

    fn consume(&mut self) -> Option<Word<'s>> {
        self.peek();
        self.peeked.take()
    }

    fn peek_symbol(&mut self, symbol: &str) -> bool {
        self.peek()
            .is_some_and(|word| word.kind == WordKind::Symbol && word.text == symbol)
    }

    fn mismatch(&self, expected: Expected, found: Option<Word<'s>>) -> ParseError {
        let (found, position) = match found {
            Some(word) => (Found::Token(word.text.to_string()), word.position),
            None => (Found::EndOfInput, self.words.source.len()),
        };
        ParseError {
            expected,
            found,
            position,
        }
    }

    fn expect(&mut self, symbol: &'static str) -> Result<(), ParseError> {
        match self.consume() {
            Some(word) if word.kind == WordKind::Symbol && word.text == symbol => Ok(()),
            other => Err(self.mismatch(Expected::Token(symbol), other)),
        }
    }

    fn word(&mut self, class: &'static str) -> Result<&'s str, ParseError> {
        match self.consume() {
            Some(word) if word.kind == WordKind::Word => Ok(word.text),
            other => Err(self.mismatch(Expected::Class(class), other)),
        }
    }

    fn catalog(&mut self) -> Result<ImportCatalog, ParseError> {
        let mut catalog = ImportCatalog::default();

        self.expect("{")?;
        if !self.peek_symbol("}") {
            catalog.insert(self.entry()?);
            while self.peek_symbol(",") {
                self.consume();
                catalog.insert(self.entry()?);
            }
        }
        self.expect("}")?;

        match self.consume() {
            None => Ok(catalog),
            other => Err(self.mismatch(Expected::EndOfInput, other)),
        }
    }

    fn entry(&mut self) -> Result<ImportEntry, ParseError> {
        let name = self.word("type name")?;
        self.expect("=")?;
        let path = self.word("import path")?;

        if let Some(hash) = self
            .peek()
            .filter(|word| word.kind == WordKind::Word && word.text.starts_with(SHA256_PREFIX))
        {
            tracing::trace!(name, hash = hash.text, "dropping integrity hash");
            self.consume();
        }

        Ok(ImportEntry::new(name.to_string(), path.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const TYPES: &str = r#"
{ MutatingWebhook =
    ./types/io.k8s.api.admissionregistration.v1.MutatingWebhook.dhall sha256:efd9982e7e8a60db4df6ba7347a877073fa6efaed429e99569978d4d0b1cc630
, ValidatingWebhook =
    ./types/io.k8s.api.admissionregistration.v1.ValidatingWebhook.dhall
, DaemonSet =
    ./types/io.k8s.api.apps.v1.DaemonSet.dhall sha256:d7c19aff4e38a8fa4f1f0a65710a21d49767f8349011039a0fcebf678201db55
}
"#;

    #[test]
    fn schema_library_types() {
        let catalog = parse_import_catalog(TYPES).unwrap();

        let entries: Vec<_> = catalog.iter().collect();
        assert_eq!(
            entries,
            vec![
                ImportEntry::new(
                    "MutatingWebhook".to_string(),
                    "./types/io.k8s.api.admissionregistration.v1.MutatingWebhook.dhall".to_string()
                ),
                ImportEntry::new(
                    "ValidatingWebhook".to_string(),
                    "./types/io.k8s.api.admissionregistration.v1.ValidatingWebhook.dhall"
                        .to_string()
                ),
                ImportEntry::new(
                    "DaemonSet".to_string(),
                    "./types/io.k8s.api.apps.v1.DaemonSet.dhall".to_string()
                ),
            ]
        );
    }

    #[test]
    fn hash_directly_followed_by_comma() {
        let catalog = parse_import_catalog("{ A = ./a.dhall sha256:deadbeef, B = ./b.dhall }").unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("A"), Some("./a.dhall"));
        assert_eq!(catalog.get("B"), Some("./b.dhall"));
    }

    #[test]
    fn empty_catalog() {
        assert!(parse_import_catalog("{}").unwrap().is_empty());
    }

    #[test]
    fn later_duplicate_wins() {
        let catalog = parse_import_catalog("{ A = ./one.dhall, B = ./b.dhall, A = ./two.dhall }").unwrap();
        assert_eq!(catalog.get("A"), Some("./two.dhall"));
        assert_eq!(catalog.iter().next().map(|entry| entry.name), Some("A".to_string()));
    }

    #[test]
    fn missing_equals() {
        let err = parse_import_catalog("{ A ./a.dhall }").expect_err("must fail");
        assert_eq!(err.expected, Expected::Token("="));
        assert_eq!(err.found, Found::Token("./a.dhall".to_string()));
        assert_eq!(err.position, 4);
    }

    #[test]
    fn missing_path() {
        let err = parse_import_catalog("{ A = }").expect_err("must fail");
        assert_eq!(err.expected, Expected::Class("import path"));
        assert_eq!(err.found, Found::Token("}".to_string()));
    }

    #[test]
    fn unterminated() {
        let err = parse_import_catalog("{ A = ./a.dhall").expect_err("must fail");
        assert_eq!(err.expected, Expected::Token("}"));
        assert_eq!(err.found, Found::EndOfInput);
        assert_eq!(err.position, 15);
    }

    #[test]
    fn serializes_as_mapping() {
        let catalog = parse_import_catalog("{ A = ./a.dhall, B = ./b.dhall }").unwrap();
        assert_eq!(
            serde_json::to_string(&catalog).unwrap(),
            r#"{"A":"./a.dhall","B":"./b.dhall"}"#
        );
    }
}
