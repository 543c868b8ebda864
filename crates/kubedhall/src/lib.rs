//! # kubedhall - dhall schemas for kubernetes manifests
//!
//! ## Introduction for developers
//!
//! Read this to understand how `kubedhall` works internally.
//!
//! ### Type expression terms
//!
//! `dhall type` prints the inferred type of a value. We only deal with the structural subset of
//! those expressions:
//!
//! - a `record type` is a list of `fields` enclosed in `{` and `}`, separated by `,`
//! - a `union type` is a list of `fields` enclosed in `<` and `>`, separated by `|`
//! - a `field` is a `label`, a `:` and a `value`
//! - a `value` is a chain of zero or more `atoms` (`Optional`, `List`, `Text`, ...)
//!   optionally ending in a record or union literal
//!
//! This is a valid input:
//! ```text
//! { metadata : { name : Text }
//! , spec :
//!     { containers :
//!         List { image : Text, env : Optional (List { name : Text, value : Text }) }
//!     }
//! , `app.kubernetes.io/part-of` : < frontend : Text | backend : Text >
//! }
//! ```
//!
//! ### Tokenizing
//!
//! see [token::Tokenizer]
//!
//! Whitespace and round parentheses are dropped. An application chain is flat in the tree, the
//! printer decides where parentheses go again. Labels in backticks keep their backticks.
//!
//! ### Parsing
//!
//! see [parser::parse_record_type]
//!
//! A recursive descent over the tokens builds the [ast]. The root has to be a record. Field
//! order and duplicate labels are kept as written.
//!
//! ### Strengthening
//!
//! see [strengthen::strengthen]
//!
//! The inferred type is as loose as the manifests it came from. A single pass over the tree
//! swaps in stricter types for container resources, images, metadata and environment
//! variables.
//!
//! ### Output
//!
//! see [printer::ToSource]
//!
//! The tree is rendered as tab indented source that `dhall format` can pick up.
//!
//! ### Manifests and catalogs
//!
//! [manifest] loads kubernetes manifests into a [value::Value] tree, normalizes them and
//! composes the type expressions pointing at the dhall-kubernetes schemas. [catalog] reads the
//! `types.dhall` import catalog shipped with such a schema library.
pub mod ast;
pub mod catalog;
pub mod error;
pub mod manifest;
pub mod parser;
pub mod printer;
pub mod strengthen;
pub mod token;
pub mod value;
mod visit;

pub use error::Error;
