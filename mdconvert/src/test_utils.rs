//! Test helpers: configuration, application constructors and a fake document converter.

use std::path::Path;

use async_trait::async_trait;
use axum_test::TestServer;
use tempfile::TempDir;

use crate::config::Config;
use crate::conversion::{
    MarkdownConverter,
    document::{DocumentConverter, DocumentError},
};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        // The Prometheus recorder is process-global and can only be installed once
        enable_metrics: false,
        document_converter: None,
        ..Default::default()
    }
}

/// A test server without a document converter, staging into a fresh directory.
///
/// The returned [`TempDir`] must be kept alive for the duration of the test.
pub fn create_test_app() -> (TestServer, TempDir) {
    create_test_app_with(create_test_config(), MarkdownConverter::default())
}

/// A test server with the given converter. `config.staging_dir` is pointed at the
/// returned directory unless already set.
pub fn create_test_app_with(mut config: Config, converter: MarkdownConverter) -> (TestServer, TempDir) {
    let staging = tempfile::tempdir().expect("Failed to create staging directory");
    if config.staging_dir.is_none() {
        config.staging_dir = Some(staging.path().to_path_buf());
    }

    let app = crate::Application::with_converter(config, converter).expect("Failed to create application");
    (app.into_test_server(), staging)
}

/// Document converter returning a canned result for the default rich extensions.
#[derive(Debug)]
pub struct FakeDocumentConverter {
    result: Result<String, String>,
    extensions: Vec<String>,
}

impl FakeDocumentConverter {
    pub fn ok(markdown: &str) -> Self {
        Self::new(Ok(markdown.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Err(message.to_string()))
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|ext| ext.to_string()).collect();
        self
    }

    fn new(result: Result<String, String>) -> Self {
        Self {
            result,
            extensions: ["pdf", "docx", "xlsx", "pptx"].map(String::from).to_vec(),
        }
    }
}

#[async_trait]
impl DocumentConverter for FakeDocumentConverter {
    fn name(&self) -> &str {
        "fake"
    }

    fn handles(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }

    async fn convert(&self, path: &Path) -> Result<String, DocumentError> {
        assert!(path.exists(), "converter called with a missing file");
        self.result.clone().map_err(|stderr| DocumentError::Failed {
            program: "fake".to_string(),
            status: failed_status(),
            stderr,
        })
    }
}

#[cfg(unix)]
fn failed_status() -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(1 << 8)
}

#[cfg(windows)]
fn failed_status() -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(1)
}
