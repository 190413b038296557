//! Master Data Fill CLI
//!
//! Fills required fields missing from master data files and prints schema
//! skeletons.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use master_schema::loader::{load_data_file, write_data_file};
use master_schema::{fill, synthesize, EditorConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "master-fill")]
#[command(about = "Fill required fields in master data files")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill missing required fields in a data file
    Fill {
        /// Schema file, or schema name inside the schema directory
        schema: String,

        /// Data file (default: <data dir>/<schema id>.json)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Write the filled data back to the data file
        #[arg(long)]
        write: bool,
    },

    /// Print the skeleton of a schema
    Skeleton {
        /// Schema file, or schema name inside the schema directory
        schema: String,
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
        Commands::Fill { schema, data, write } => {
            let document = config.load_schema(&schema)?;
            let data_path = data.unwrap_or_else(|| config.data_file(&document.id));
            let existing = load_data_file(&data_path)?;

            let outcome = fill(&existing, &document.schema, &[]);

            if outcome.is_unchanged() {
                println!("✅ {} - nothing to fill", data_path.display());
                return Ok(());
            }

            println!("📝 {} - {} field(s) added:", data_path.display(), outcome.added_fields.len());
            for field in &outcome.added_fields {
                println!("  + {}", field);
            }

            if write {
                write_data_file(&data_path, &outcome.data, config.pretty_output())?;
                println!("\n✅ Wrote {}", data_path.display());
            } else {
                println!("\n(dry run, pass --write to save)");
            }
        }

        Commands::Skeleton { schema } => {
            let document = config.load_schema(&schema)?;
            let skeleton = synthesize(&document.schema, None).unwrap_or(serde_json::Value::Null);
            let output = if config.pretty_output() {
                serde_json::to_string_pretty(&skeleton)?
            } else {
                serde_json::to_string(&skeleton)?
            };
            println!("{}", output);
        }
    }

    Ok(())
}
