//! Turning a staged upload into Markdown.
//!
//! [`MarkdownConverter`] dispatches on the lowercased extension of the original
//! filename:
//!
//! | Extension | Strategy |
//! |---|---|
//! | handled by the document converter | [`document::DocumentConverter`] |
//! | `txt` | decoded text under a heading |
//! | `html`, `htm` | [`html::html_to_markdown`] |
//! | `csv` | [`csv::csv_to_markdown`] |
//! | rich formats without a converter | explanatory message |
//! | anything else | binary sniff, then a decoded preview in a code block |
//!
//! Problems that can be explained in the document itself (unsupported format,
//! binary data, an empty CSV, a failing converter) produce a
//! successful result whose Markdown says what went wrong. Only failures to read
//! the staged file are returned as errors.

pub mod csv;
pub mod document;
pub mod html;
pub mod text;

use std::{io, path::Path, sync::Arc};

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
};
use tracing::{debug, instrument, warn};

use crate::errors::{Error, Result};
use document::DocumentConverter;

/// Bytes inspected for NUL when sniffing unknown files.
pub const SNIFF_BYTES: usize = 1024;

/// Characters of decoded text kept for unknown files.
pub const MAX_PREVIEW_CHARS: usize = 5000;

/// Bytes read for the preview; enough for [`MAX_PREVIEW_CHARS`] characters in any supported encoding.
const PREVIEW_WINDOW_BYTES: usize = MAX_PREVIEW_CHARS * 4;

/// Formats that need the document converter; without it they are reported as unsupported.
const RICH_EXTENSIONS: [&str; 7] = ["pdf", "docx", "xlsx", "pptx", "doc", "xls", "ppt"];

/// Which strategy produced a conversion result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DocumentConverter,
    PlainText,
    Html,
    Csv,
    TextSniff,
    Binary,
    Unsupported,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DocumentConverter => "document_converter",
            Strategy::PlainText => "plain_text",
            Strategy::Html => "html",
            Strategy::Csv => "csv",
            Strategy::TextSniff => "text_sniff",
            Strategy::Binary => "binary",
            Strategy::Unsupported => "unsupported",
        }
    }
}

/// Markdown produced for one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub markdown: String,
    pub strategy: Strategy,
}

impl ConversionResult {
    fn new(strategy: Strategy, markdown: String) -> Self {
        Self { markdown, strategy }
    }
}

/// Converts staged files to Markdown, optionally backed by a document converter.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter {
    document: Option<Arc<dyn DocumentConverter>>,
}

impl MarkdownConverter {
    pub fn new(document: Option<Arc<dyn DocumentConverter>>) -> Self {
        Self { document }
    }

    pub fn document_converter_available(&self) -> bool {
        self.document.is_some()
    }

    /// Convert the file staged at `path`, originally uploaded as `filename`.
    #[instrument(skip(self, path), fields(extension))]
    pub async fn convert(&self, path: &Path, filename: &str) -> Result<ConversionResult> {
        let extension = extension_of(filename);
        tracing::Span::current().record("extension", extension.as_str());

        let result = self.dispatch(path, filename, &extension).await?;
        debug!(strategy = result.strategy.as_str(), "Conversion finished");
        metrics::counter!("mdconvert_conversions_total", "strategy" => result.strategy.as_str()).increment(1);
        Ok(result)
    }

    async fn dispatch(&self, path: &Path, filename: &str, extension: &str) -> Result<ConversionResult> {
        let document = self.document.as_ref().filter(|converter| converter.handles(extension));
        let Some(document) = document else {
            return self.convert_builtin(path, filename, extension).await;
        };

        match document.convert(path).await {
            Ok(text) => Ok(ConversionResult::new(Strategy::DocumentConverter, ensure_heading(filename, text))),
            Err(e) => {
                warn!(converter = document.name(), error = %e, "Document converter failed");
                metrics::counter!("mdconvert_document_converter_errors_total").increment(1);

                if has_builtin_strategy(extension) {
                    debug!("Falling back to built-in conversion");
                    self.convert_builtin(path, filename, extension).await
                } else {
                    let body = format!(
                        "The `.{extension}` format could not be converted: the document converter ({}) failed.\n\nError: {e}",
                        document.name()
                    );
                    Ok(ConversionResult::new(Strategy::Unsupported, with_heading(filename, &body)))
                }
            }
        }
    }

    async fn convert_builtin(&self, path: &Path, filename: &str, extension: &str) -> Result<ConversionResult> {
        if RICH_EXTENSIONS.contains(&extension) {
            return Ok(self.unsupported(filename, extension));
        }

        let result = match extension {
            "txt" => {
                let decoded = text::decode(&read_all(path).await?);
                ConversionResult::new(Strategy::PlainText, with_heading(filename, &decoded.text))
            }
            "html" | "htm" => {
                let markdown = html::html_to_markdown(&text::decode_lossy(&read_all(path).await?));
                ConversionResult::new(Strategy::Html, with_heading(filename, &markdown))
            }
            "csv" => {
                let decoded = text::decode(&read_lines(path, csv::MAX_LINES).await?);
                let table = csv::csv_to_markdown(&decoded.text).unwrap_or_else(|| "Empty CSV file".to_string());
                ConversionResult::new(Strategy::Csv, with_heading(filename, &table))
            }
            _ => sniff(filename, &read_prefix(path, PREVIEW_WINDOW_BYTES).await?),
        };
        Ok(result)
    }

    fn unsupported(&self, filename: &str, extension: &str) -> ConversionResult {
        let body = if self.document_converter_available() {
            format!("The `.{extension}` format is not supported: the configured document converter does not handle it.")
        } else {
            format!("The `.{extension}` format is not supported: no document converter is available on this server.")
        };
        ConversionResult::new(Strategy::Unsupported, with_heading(filename, &body))
    }
}

/// The first bytes of a staged file.
#[derive(Debug)]
struct Prefix {
    bytes: Vec<u8>,
    /// The file continues past `bytes`
    truncated: bool,
}

/// Binary check followed by a best-effort text preview.
fn sniff(filename: &str, prefix: &Prefix) -> ConversionResult {
    let head = &prefix.bytes[..prefix.bytes.len().min(SNIFF_BYTES)];
    if head.contains(&0) {
        return ConversionResult::new(
            Strategy::Binary,
            with_heading(filename, "Binary file detected; this format is not supported."),
        );
    }

    let decoded = if prefix.truncated {
        text::decode_prefix(&prefix.bytes)
    } else {
        text::decode(&prefix.bytes)
    };
    let preview = text::truncate_chars(&decoded.text, MAX_PREVIEW_CHARS);
    let body = format!("Detected encoding: {}\n\n```\n{preview}\n```", decoded.encoding);
    ConversionResult::new(Strategy::TextSniff, with_heading(filename, &body))
}

fn read_failed(e: io::Error) -> Error {
    Error::ConversionFailed { message: e.to_string() }
}

async fn read_all(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(read_failed)
}

/// Read at most `limit` bytes.
async fn read_prefix(path: &Path, limit: usize) -> Result<Prefix> {
    let file = File::open(path).await.map_err(read_failed)?;
    let mut bytes = Vec::with_capacity(limit + 1);
    file.take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .await
        .map_err(read_failed)?;

    let truncated = bytes.len() > limit;
    bytes.truncate(limit);
    Ok(Prefix { bytes, truncated })
}

/// Read the first `max_lines` lines, line endings included.
async fn read_lines(path: &Path, max_lines: usize) -> Result<Vec<u8>> {
    let file = File::open(path).await.map_err(read_failed)?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    for _ in 0..max_lines {
        if reader.read_until(b'\n', &mut bytes).await.map_err(read_failed)? == 0 {
            break;
        }
    }
    Ok(bytes)
}

fn has_builtin_strategy(extension: &str) -> bool {
    matches!(extension, "txt" | "html" | "htm" | "csv")
}

fn with_heading(filename: &str, body: &str) -> String {
    format!("# {filename}\n\n{body}")
}

/// Converter output keeps its own heading if it starts with one.
fn ensure_heading(filename: &str, text: String) -> String {
    if text.trim_start().starts_with('#') {
        text
    } else {
        with_heading(filename, &text)
    }
}

/// The part of an uploaded filename after the last path separator.
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Split a base name into stem and extension; dotfiles have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}

/// Lowercased extension of `filename` without the dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    split_extension(base_name(filename))
        .1
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Output filename for a conversion: the base name with its extension replaced by `.md`.
pub fn markdown_filename(filename: &str) -> String {
    let (stem, _) = split_extension(base_name(filename));
    format!("{stem}.md")
}
