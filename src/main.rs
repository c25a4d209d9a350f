use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use dslcheck::{DslFormat, DslValidator, ValidatorConfig};

#[derive(Parser)]
#[command(name = "dslcheck")]
#[command(about = "Validate a Dify app DSL document", long_about = None)]
struct Cli {
    /// Document to validate; reads stdin when omitted
    file: Option<PathBuf>,
    /// Document format (yaml, json, toml); defaults to the file extension
    #[arg(short, long)]
    format: Option<DslFormat>,
    /// Validator configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Also run the editor layout checks
    #[arg(long)]
    frontend: bool,
    /// Print the registry entry for a node type instead of validating
    #[arg(long, value_name = "TYPE")]
    node_schema: Option<String>,
    /// Print the id, type and title of every node instead of validating
    #[arg(long)]
    list_nodes: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut builder = DslValidator::builder();
    if let Some(path) = &cli.config {
        let config = ValidatorConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        builder = builder.config(config);
    }
    if cli.frontend {
        builder = builder.frontend_checks(true);
    }
    let validator = builder.build();

    if let Some(node_type) = &cli.node_schema {
        let info = validator.node_schema(node_type);
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(info.known || info.plugin);
    }

    let (content, format) = match &cli.file {
        Some(path) => {
            let content = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let format = cli.format.unwrap_or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(DslFormat::from_extension)
                    .unwrap_or_default()
            });
            (content, format)
        }
        None => {
            let mut content = Vec::new();
            std::io::stdin()
                .read_to_end(&mut content)
                .context("failed to read stdin")?;
            (content, cli.format.unwrap_or_default())
        }
    };

    if cli.list_nodes {
        let text = String::from_utf8(content).context("document is not valid UTF-8")?;
        let listing = validator.list_nodes(&text, format)?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(true);
    }

    let result = validator.validate_bytes(&content, format);
    tracing::info!(format = format.name(), "{}", result.summary());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}
