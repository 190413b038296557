//! Configuration for the master data tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (master-schema.toml)
//! - Environment variables (MASTER_SCHEMA__*)
//!
//! ## Example config file (master-schema.toml):
//! ```toml
//! [schema]
//! dir = "schema"
//! extensions = ["yml", "yaml"]
//!
//! [data]
//! dir = "master"
//!
//! [output]
//! format = "pretty"
//!
//! [lint]
//! deny_warnings = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result as SchemaResult;
use crate::loader::{self, SchemaDocument, DEFAULT_EXTENSIONS};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Where schema files live
    #[serde(default)]
    pub schema: SchemaDirConfig,

    /// Where master data files live
    #[serde(default)]
    pub data: DataDirConfig,

    /// How data files are written back
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub lint: LintConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDirConfig {
    /// Schema directory, scanned recursively for definitions
    #[serde(default = "default_schema_dir")]
    pub dir: PathBuf,

    /// File extensions treated as schema files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDirConfig {
    /// Master data directory; `<schema id>.json` lives here
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintConfig {
    /// Treat lint warnings as failures
    #[serde(default)]
    pub deny_warnings: bool,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schema")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("master")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for SchemaDirConfig {
    fn default() -> Self {
        Self {
            dir: default_schema_dir(),
            extensions: default_extensions(),
        }
    }
}

impl Default for DataDirConfig {
    fn default() -> Self {
        Self { dir: default_data_dir() }
    }
}

impl EditorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding `config_path` as a required file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["master-schema.toml", ".master-schema.toml", "config/master-schema.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "moorestech", "master-schema") {
            let xdg_config = config_dir.config_dir().join("master-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("MASTER_SCHEMA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The schema directory, resolved against the working directory
    pub fn schema_dir(&self) -> PathBuf {
        absolute(&self.schema.dir)
    }

    /// The data directory, resolved against the working directory
    pub fn data_dir(&self) -> PathBuf {
        absolute(&self.data.dir)
    }

    /// Path of the data file for schema `id`
    pub fn data_file(&self, id: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", id))
    }

    /// Load schema `name` (a file path or a name in the schema directory)
    pub fn load_schema(&self, name: &str) -> SchemaResult<SchemaDocument> {
        loader::load_schema_in(&self.schema_dir(), name, &self.schema.extensions)
    }

    pub fn pretty_output(&self) -> bool {
        self.output.format == OutputFormat::Pretty
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}
