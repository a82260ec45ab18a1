//! Parse failures raised while comparing

use drift_core::xml::XmlError;
use thiserror::Error;

/// A response body that could not be parsed in its declared format
#[derive(Debug, Error)]
pub(crate) enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] XmlError),
}
