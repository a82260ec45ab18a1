//! Core types for apidrift
//!
//! This crate provides the value types passed between the apidrift
//! components: token specifications, iteration assignments, the payload
//! format of an API under test, and the XML tree model used by both the
//! payload templater and the comparison engine.

mod format;
mod token;
pub mod xml;

pub use format::{ApiKind, ApiKindError, PayloadFormat};
pub use token::{IterationAssignment, TokenSpec, TokenValue};

/// Suffix appended to the operation name of the untouched first iteration
pub const ORIGINAL_PAYLOAD_LABEL: &str = "(Original Input Payload)";
