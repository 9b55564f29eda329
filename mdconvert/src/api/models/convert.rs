use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of a conversion request.
///
/// Exactly one of (`markdown` + `filename`) or `error` is populated; the unset
/// fields are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversionOutcome {
    pub success: bool,
    /// Converted Markdown text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// Suggested output filename (input base name with a `.md` extension)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Error message when the conversion failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionOutcome {
    pub fn converted(markdown: String, filename: String) -> Self {
        Self {
            success: true,
            markdown: Some(markdown),
            filename: Some(filename),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            markdown: None,
            filename: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converted_omits_error() {
        let outcome = ConversionOutcome::converted("# a.txt\n\nhello".to_string(), "a.md".to_string());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": true, "markdown": "# a.txt\n\nhello", "filename": "a.md" })
        );
    }

    #[test]
    fn failed_omits_markdown_and_filename() {
        let outcome = ConversionOutcome::failed("Conversion failed: boom");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": false, "error": "Conversion failed: boom" })
        );
    }
}
