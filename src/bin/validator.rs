//! Schema Validator CLI
//!
//! Lints schema files, checks values against a schema the way a paste
//! would, and lists foreign key choices.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use master_schema::clipboard::{copy_at, paste, schema_at};
use master_schema::lint::{lint_schemas, LintResult};
use master_schema::loader::{load_data_file, load_schema_file};
use master_schema::{resolve_options, EditorConfig, SchemaError, SchemaLinter, Validator};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "master-validator")]
#[command(about = "Lint schemas and validate pasted values")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint schema files or directories (default: the schema directory)
    Lint {
        paths: Vec<PathBuf>,

        /// Fail on warnings too
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Check clipboard text against a schema
    Paste {
        /// Schema file, or schema name inside the schema directory
        schema: String,

        /// File holding the pasted text (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the clipboard payload for a value in a data file
    Copy {
        /// Schema file, or schema name inside the schema directory
        schema: String,

        /// Data file
        #[arg(short, long)]
        data: PathBuf,

        /// JSON pointer of the value to copy
        #[arg(short, long, default_value = "")]
        pointer: String,
    },

    /// List the records a foreign key field can point to
    Options {
        /// Schema file, or schema name inside the schema directory
        schema: String,

        /// JSON pointer of the field in the data file
        #[arg(short, long)]
        pointer: String,

        /// Data file (default: <data dir>/<schema id>.json)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = EditorConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Lint { paths, deny_warnings } => {
            let deny_warnings = deny_warnings || config.lint.deny_warnings;
            let paths = if paths.is_empty() {
                vec![config.schema_dir()]
            } else {
                paths
            };

            let linter = SchemaLinter::new();
            let mut results = Vec::new();
            for path in &paths {
                if path.is_dir() {
                    results.extend(lint_schemas(path)?);
                } else {
                    let document = load_schema_file(path)?;
                    results.push(linter.lint(&document));
                }
            }

            println!("🔍 Linted {} schema(s)\n", results.len());
            let mut failed = false;
            for result in &results {
                report(result);
                failed |= !result.is_clean() || (deny_warnings && result.has_warnings());
            }

            if failed {
                std::process::exit(1);
            }
            println!("✅ All schemas passed");
        }

        Commands::Paste { schema, input } => {
            let document = config.load_schema(&schema)?;
            let text = match input {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            let validator = Validator::from_schema(&document.schema)?;
            match paste(&text, &validator) {
                Ok(value) => {
                    eprintln!("✅ Value matches schema '{}'", document.id);
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Copy { schema, data, pointer } => {
            let document = config.load_schema(&schema)?;
            let data = load_data_file(&data)?;
            println!("{}", copy_at(&data, &document.schema, &pointer)?);
        }

        Commands::Options { schema, pointer, data } => {
            let document = config.load_schema(&schema)?;
            let data_path = data.unwrap_or_else(|| config.data_file(&document.id));
            let data = load_data_file(&data_path)?;

            let node = schema_at(&document.schema, &data, &pointer)
                .ok_or_else(|| SchemaError::NotFound(format!("no schema for {}", pointer)))?;
            let key = node
                .as_value()
                .and_then(|value| value.kind.foreign_key())
                .ok_or_else(|| SchemaError::InvalidFormat(format!("{} has no foreignKey", pointer)))?;

            let target = load_data_file(config.data_file(&key.schema_id))?;
            let current = data.pointer(&pointer);
            let options = resolve_options(&target, key);

            println!("🔗 {} -> {} ({} option(s))\n", pointer, key.schema_id, options.len());
            for option in &options {
                let marker = if Some(&option.id) == current { "*" } else { " " };
                println!("  {} {}  {}", marker, option.id, option.display);
            }
        }
    }

    Ok(())
}

fn report(result: &LintResult) {
    if result.is_clean() && !result.has_warnings() {
        println!("  ✅ {}", result.schema_id);
        return;
    }

    let icon = if result.is_clean() { "⚠️ " } else { "❌" };
    println!("  {} {}", icon, result.schema_id);
    for error in &result.errors {
        println!("      error[{}] {}: {}", error.code, error.path, error.message);
    }
    for warning in &result.warnings {
        println!("      warning[{}] {}: {}", warning.code, warning.path, warning.message);
    }
}
