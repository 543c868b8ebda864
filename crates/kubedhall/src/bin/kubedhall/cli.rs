//! kubedhall cli interface

use clap::{Parser, Subcommand, ValueEnum};
use kubedhall::manifest::DEFAULT_SCHEMA_URL;
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; kubedhall ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Strengthen a type expression printed by `dhall type`
    ///
    /// Reads from stdin unless --input-file is provided
    Type(TypeCommand),

    /// List the imports of a schema library's types.dhall
    ///
    /// Reads from stdin unless --input-file is provided
    Catalog(CatalogCommand),

    /// Collect kubernetes manifests into a single record
    #[command(alias = "mf")]
    Manifests(ManifestsCommand),

    /// Split a component record back into one YAML document per resource
    ///
    /// Reads from stdin unless --input-file is provided
    Split(SplitCommand),
}

#[derive(Parser, Debug)]
pub struct TypeCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Print the parsed expression without strengthening it
    #[clap(long = "raw")]
    pub raw: bool,
}

#[derive(Parser, Debug)]
pub struct CatalogCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ManifestsCommand {
    /// YAML files, each may contain multiple documents
    #[clap(required = true)]
    pub files: Vec<PathBuf>,

    /// Location of the dhall-kubernetes schemas
    #[clap(long = "schema-url", default_value = DEFAULT_SCHEMA_URL)]
    pub schema_url: String,

    /// What to print
    #[arg(short = 'e', long = "emit", default_value_t)]
    pub emit: Emit,

    /// Keep lists of named objects as lists
    #[clap(long = "no-index-lists")]
    pub no_index_lists: bool,

    /// Keep image references as plain strings
    #[clap(long = "no-expand-images")]
    pub no_expand_images: bool,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct SplitCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Write <component>/<component>.<kind>.<name>.yaml files below this directory
    ///
    /// Prints a multi-document stream when omitted
    #[clap(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a file
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum Emit {
    /// component → kind → name → manifest
    #[default]
    Record,
    /// type expression of the record
    Type,
    /// union over all kinds
    Union,
    /// component → kind → name → containers skeleton
    Components,
}

impl std::fmt::Display for Emit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Emit::Record => f.write_str("record"),
            Emit::Type => f.write_str("type"),
            Emit::Union => f.write_str("union"),
            Emit::Components => f.write_str("components"),
        }
    }
}
