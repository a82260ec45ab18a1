//! Error types for payload rendering

use thiserror::Error;

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering a payload template
///
/// These never escape [`crate::render`]; they surface as the `reason` of a
/// [`crate::RenderOutcome::FellBackToLiteral`].
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template is not valid JSON
    #[error("failed to parse JSON template: {0}")]
    Json(#[from] serde_json::Error),

    /// Template is not valid XML
    #[error("failed to parse XML template: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Writing the rendered XML failed
    #[error("failed to write rendered XML: {0}")]
    Write(#[from] std::io::Error),

    /// Rendered output was not valid UTF-8
    #[error("rendered payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Structurally invalid document (unbalanced tags, several roots, ...)
    #[error("malformed template: {message}")]
    Malformed { message: String },
}

impl TemplateError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        TemplateError::Malformed {
            message: message.into(),
        }
    }
}
