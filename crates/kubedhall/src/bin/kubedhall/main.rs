mod cli;

use anyhow::Context;
use kubedhall::manifest::{self, Resource, ResourceSet};
use kubedhall::printer::ToSource;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("KUBEDHALL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Type(type_cli) => type_expression(type_cli),
        cli::Command::Catalog(catalog_cli) => catalog(catalog_cli),
        cli::Command::Manifests(manifests_cli) => manifests(manifests_cli),
        cli::Command::Split(split_cli) => split(split_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn type_expression(cli: cli::TypeCommand) -> anyhow::Result<()> {
    let source = load(&cli.input)?;

    let mut record = kubedhall::parser::parse_record_type(&source)?;
    if !cli.raw {
        kubedhall::strengthen::strengthen(&mut record);
    }

    println!("{}", record.to_source(1));
    Ok(())
}

pub fn catalog(cli: cli::CatalogCommand) -> anyhow::Result<()> {
    let source = load(&cli.input)?;
    let catalog = kubedhall::catalog::parse_import_catalog(&source)?;

    output(&cli.output, &catalog)
}

pub fn manifests(cli: cli::ManifestsCommand) -> anyhow::Result<()> {
    let mut resources = ResourceSet::default();

    for path in &cli.files {
        load_manifests(path, &mut resources)
            .with_context(|| format!("Failed to load manifests from {}", path.display()))?;
    }

    anyhow::ensure!(!resources.is_empty(), "No manifests loaded");
    tracing::info!(resources = resources.len(), "loaded manifests");

    match cli.emit {
        cli::Emit::Type => println!("{}", resources.record_type(&cli.schema_url)),
        cli::Emit::Union => println!("{}", resources.union_type(&cli.schema_url)),
        cli::Emit::Components => output(&cli.output, &resources.components())?,
        cli::Emit::Record => {
            let mut record = resources.record();
            if !cli.no_expand_images {
                manifest::expand_image_references(&mut record);
            }
            if !cli.no_index_lists {
                manifest::index_named_lists(&mut record)?;
            }
            output(&cli.output, &record)?;
        }
    }

    Ok(())
}

pub fn split(cli: cli::SplitCommand) -> anyhow::Result<()> {
    let source = load(&cli.input)?;
    let record: kubedhall::value::Value = serde_yaml::from_str(&source)?;
    let resources = ResourceSet::from_record(record)?;

    for resource in resources.resources() {
        match &cli.output_dir {
            Some(directory) => {
                let directory = directory.join(&resource.component);
                std::fs::create_dir_all(&directory)?;

                let path = directory.join(resource.file_name());
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut writer = std::io::BufWriter::new(file);
                serde_yaml::to_writer(&mut writer, &resource.contents)?;
                writer.flush()?;
                tracing::info!(path = %path.display(), "wrote resource");
            }
            None => {
                println!("---");
                serde_yaml::to_writer(std::io::stdout(), &resource.contents)?;
            }
        }
    }

    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<String> {
    match &input.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => Ok(std::io::read_to_string(std::io::stdin())?),
    }
}

/// Add every document of a YAML file
///
/// Resources without a component label are assigned to the name of the file's directory.
fn load_manifests(path: &Path, resources: &mut ResourceSet) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)?;
    let fallback_component = path
        .canonicalize()?
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    for document in serde_yaml::Deserializer::from_str(&source) {
        let document = serde_yaml::Value::deserialize(document)?;
        if document.is_null() {
            continue;
        }

        let mut resource = Resource::from_yaml(document, &fallback_component)?;
        resource.patch()?;
        tracing::debug!(kind = %resource.kind, name = %resource.name, "loaded resource");
        resources.insert(resource);
    }

    Ok(())
}

fn output<T: serde::Serialize>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
