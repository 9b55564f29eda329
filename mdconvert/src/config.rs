//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` and can be changed with the `-f` flag or the `MDCONVERT_CONFIG`
//! environment variable. A missing file is not an error: every key has a default.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. **YAML config file**
//! 2. **Environment variables** prefixed with `MDCONVERT_`
//!
//! Nested keys use double underscores, e.g. `MDCONVERT_DOCUMENT_CONVERTER__PROGRAM=/opt/bin/markitdown`.
//!
//! ```bash
//! MDCONVERT_PORT=8080
//! MDCONVERT_MAX_UPLOAD_SIZE=10485760
//! MDCONVERT_STAGING_DIR=/var/tmp/mdconvert
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "MDCONVERT_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_upload_size: usize,
    /// Directory for staged uploads; the OS temp dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
    /// Expose Prometheus metrics at `/internal/metrics`
    pub enable_metrics: bool,
    /// Export traces over OTLP (configured through the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
    /// External converter for rich document formats; `null` disables it
    pub document_converter: Option<DocumentConverterConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_size: 50 * 1024 * 1024,
            staging_dir: None,
            enable_metrics: true,
            enable_otel_export: false,
            document_converter: Some(DocumentConverterConfig::Command(CommandConverterConfig::default())),
        }
    }
}

/// Document converter backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentConverterConfig {
    /// An external program invoked as `<program> [args...] <file>` that prints Markdown on stdout
    Command(CommandConverterConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConverterConfig {
    /// Program name (looked up on `PATH`) or path to the executable
    pub program: String,
    /// Arguments placed before the file path
    pub args: Vec<String>,
    /// Extensions (without the dot) routed to this converter
    pub extensions: Vec<String>,
}

impl Default for CommandConverterConfig {
    fn default() -> Self {
        Self {
            program: "markitdown".to_string(),
            args: vec![],
            extensions: ["pdf", "docx", "xlsx", "pptx"].map(String::from).to_vec(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_upload_size == 0 {
            return Err(invalid("max_upload_size must be greater than 0"));
        }

        if let Some(DocumentConverterConfig::Command(command)) = &self.document_converter {
            if command.program.trim().is_empty() {
                return Err(invalid("document_converter.program must not be empty"));
            }
            if command.extensions.is_empty() {
                return Err(invalid("document_converter.extensions must list at least one extension"));
            }
            if let Some(bad) = command
                .extensions
                .iter()
                .find(|ext| ext.is_empty() || ext.starts_with('.'))
            {
                return Err(invalid(&format!(
                    "document_converter.extensions entry '{bad}' must be a non-empty extension without a leading dot"
                )));
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // MDCONVERT_CONFIG names the file itself, it is not a key
            .merge(Env::prefixed("MDCONVERT_").split("__").ignore(&["config"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Directory uploads are staged in.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn invalid(reason: &str) -> Error {
    Error::Internal {
        operation: format!("validate config: {reason}"),
    }
}
