//! Document converter abstraction layer
//!
//! Rich formats (PDF, Office documents) are handed to an external document
//! converter. The converter is optional: it is built once at startup from
//! configuration, and when it is absent every format falls back to the
//! built-in strategies in [`crate::conversion`].

use std::{
    fmt,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{CommandConverterConfig, DocumentConverterConfig};

/// Create a document converter from configuration.
///
/// Returns `None` when no converter is configured or the configured one cannot
/// be used on this host. Callers treat that as "capability absent".
pub fn create_converter(config: Option<&DocumentConverterConfig>) -> Option<Arc<dyn DocumentConverter>> {
    let Some(config) = config else {
        info!("No document converter configured, using built-in conversions only");
        return None;
    };

    match config {
        DocumentConverterConfig::Command(command) => match CommandConverter::from_config(command) {
            Some(converter) => {
                info!(
                    program = %converter.program.display(),
                    extensions = ?converter.extensions,
                    "Document converter available"
                );
                Some(Arc::new(converter))
            }
            None => {
                warn!(
                    program = %command.program,
                    "Document converter program not found, rich formats will not be converted"
                );
                None
            }
        },
    }
}

/// Errors returned by a document converter
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Extracts text from a document on disk.
#[async_trait]
pub trait DocumentConverter: Send + Sync + fmt::Debug {
    /// Short name used in logs and user-facing messages
    fn name(&self) -> &str;

    /// Whether this converter should be tried for files with this (lowercase, dotless) extension
    fn handles(&self, extension: &str) -> bool;

    /// Convert the file at `path`, returning its text (usually Markdown already).
    async fn convert(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Runs an external program as `<program> [args...] <path>` and takes its stdout.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    extensions: Vec<String>,
}

impl CommandConverter {
    /// Build from configuration, resolving the program on `PATH`.
    pub fn from_config(config: &CommandConverterConfig) -> Option<Self> {
        let program = locate_program(&config.program)?;
        Some(Self {
            name: config.program.clone(),
            program,
            args: config.args.clone(),
            extensions: config.extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
        })
    }
}

#[async_trait]
impl DocumentConverter for CommandConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }

    async fn convert(&self, path: &Path) -> Result<String, DocumentError> {
        debug!(program = %self.program.display(), path = %path.display(), "Running document converter");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DocumentError::Spawn {
                program: self.name.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DocumentError::Failed {
                program: self.name.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Resolve `program` to an executable path, searching `PATH` for bare names.
fn locate_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let path = dir.join(program);
        if path.is_file() {
            return Some(path);
        }
        #[cfg(windows)]
        {
            let exe = path.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn command_config(program: &str) -> CommandConverterConfig {
        CommandConverterConfig {
            program: program.to_string(),
            args: vec![],
            extensions: vec!["PDF".to_string(), "docx".to_string()],
        }
    }

    #[test]
    fn absent_when_not_configured() {
        assert!(create_converter(None).is_none());
    }

    #[test]
    fn absent_when_program_is_missing() {
        let config = DocumentConverterConfig::Command(command_config("definitely-not-a-real-converter-binary"));
        assert!(create_converter(Some(&config)).is_none());

        let config = DocumentConverterConfig::Command(command_config("/nonexistent/dir/converter"));
        assert!(create_converter(Some(&config)).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_the_program_with_the_path() {
        let converter = CommandConverter::from_config(&command_config("cat")).expect("cat should be on PATH");
        assert_eq!(converter.name(), "cat");
        assert!(converter.handles("pdf"));
        assert!(converter.handles("docx"));
        assert!(!converter.handles("txt"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# Extracted\n\nbody").unwrap();

        let text = converter.convert(file.path()).await.unwrap();
        assert_eq!(text, "# Extracted\n\nbody");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let converter = CommandConverter::from_config(&command_config("false")).expect("false should be on PATH");
        let file = tempfile::NamedTempFile::new().unwrap();

        let error = converter.convert(file.path()).await.unwrap_err();
        assert!(matches!(error, DocumentError::Failed { .. }));
        assert!(error.to_string().starts_with("false exited with"));
    }
}
