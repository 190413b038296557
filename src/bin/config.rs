//! Master Schema Config CLI
//!
//! View and manage tool configuration.

use clap::{Parser, Subcommand};
use master_schema::EditorConfig;

#[derive(Parser)]
#[command(name = "master-config")]
#[command(about = "View and manage master-schema configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: master-schema.toml)
        #[arg(short, long, default_value = "master-schema.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = EditorConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 Master Schema Configuration\n");
                println!("Schema:");
                println!("  Dir: {:?}", cfg.schema_dir());
                println!("  Extensions: {}", cfg.schema.extensions.join(", "));

                println!("\nData:");
                println!("  Dir: {:?}", cfg.data_dir());

                println!("\nOutput:");
                println!("  Format: {:?}", cfg.output.format);

                println!("\nLint:");
                println!("  Deny warnings: {}", cfg.lint.deny_warnings);
            }
        }

        Commands::Init { output } => {
            let cfg = EditorConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match EditorConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Schema dir: {:?}", cfg.schema_dir());
                println!("   Data dir: {:?}", cfg.data_dir());
                if !cfg.schema_dir().is_dir() {
                    println!("   ⚠️  schema directory does not exist");
                }
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
