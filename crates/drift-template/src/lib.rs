//! Payload templating for apidrift
//!
//! Request bodies are plain JSON or XML documents. Tokens are not written as
//! placeholders; instead every object member (JSON) or element (XML) whose
//! name contains a token name, compared case-insensitively, gets its content
//! replaced by that token's value. The first token in assignment order that
//! matches wins.
//!
//! - JSON: a numeric token replacing a field that already holds a number
//!   stays numeric; every other replacement becomes a string.
//! - XML: the matched element's whole content becomes the value text. The
//!   root element itself is never matched.
//!
//! Rendering never fails. If the template cannot be parsed the original text
//! is returned as a [`RenderOutcome::FellBackToLiteral`] so callers can tell
//! degraded output apart from a real render.
//!
//! # Example
//!
//! ```
//! use drift_core::{IterationAssignment, PayloadFormat, TokenValue};
//! use drift_template::render;
//!
//! let tokens = IterationAssignment::empty().with_value("id", TokenValue::Integer(7));
//! let out = render(r#"{"accountId": 1, "name": "x"}"#, PayloadFormat::Json, &tokens);
//! assert_eq!(out.text(), r#"{"accountId":7,"name":"x"}"#);
//! ```

mod error;
mod json;
mod source;
mod xml;

pub use error::{TemplateError, TemplateResult};
pub use source::resolve_template;

use drift_core::{IterationAssignment, PayloadFormat, TokenValue};
use tracing::warn;

/// Result of rendering a template
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Template parsed and tokens were applied
    Rendered(String),
    /// Template could not be processed; `text` is the unmodified template
    FellBackToLiteral { text: String, reason: String },
}

impl RenderOutcome {
    pub fn text(&self) -> &str {
        match self {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::FellBackToLiteral { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::FellBackToLiteral { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RenderOutcome::FellBackToLiteral { .. })
    }
}

/// A template loaded once and rendered for many iterations
#[derive(Debug, Clone)]
pub struct PayloadTemplate {
    content: String,
    format: PayloadFormat,
}

impl PayloadTemplate {
    /// Load from a file path or literal text, see [`resolve_template`]
    pub fn load(source: &str, format: PayloadFormat) -> Self {
        Self {
            content: resolve_template(source),
            format,
        }
    }

    /// Use `content` verbatim, without the filesystem lookup
    pub fn from_content(content: impl Into<String>, format: PayloadFormat) -> Self {
        Self {
            content: content.into(),
            format,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Apply `assignment`, reporting failures as errors
    pub fn try_render(&self, assignment: &IterationAssignment) -> TemplateResult<String> {
        if self.content.trim().is_empty() {
            return Ok(String::new());
        }
        match self.format {
            PayloadFormat::Json => json::render(&self.content, assignment),
            PayloadFormat::Xml => xml::render(&self.content, assignment),
        }
    }

    /// Apply `assignment`, falling back to the literal template on failure
    pub fn render(&self, assignment: &IterationAssignment) -> RenderOutcome {
        match self.try_render(assignment) {
            Ok(text) => RenderOutcome::Rendered(text),
            Err(e) => {
                warn!(
                    "Error processing {} payload, returning original template: {}",
                    self.format, e
                );
                RenderOutcome::FellBackToLiteral {
                    text: self.content.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Resolve `template_source` and render it with `assignment`
pub fn render(
    template_source: &str,
    format: PayloadFormat,
    assignment: &IterationAssignment,
) -> RenderOutcome {
    PayloadTemplate::load(template_source, format).render(assignment)
}

/// First token whose name is contained in `field`, ignoring case
pub(crate) fn matching_token<'a>(
    field: &str,
    assignment: &'a IterationAssignment,
) -> Option<&'a TokenValue> {
    let field = field.to_lowercase();
    assignment
        .iter()
        .find(|(name, _)| field.contains(&name.to_lowercase()))
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, TokenValue)]) -> IterationAssignment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_matching_token_is_case_insensitive_substring() {
        let assignment = tokens(&[("Account", TokenValue::Integer(1))]);
        assert!(matching_token("customerACCOUNTNumber", &assignment).is_some());
        assert!(matching_token("acct", &assignment).is_none());
    }

    #[test]
    fn test_first_matching_token_wins() {
        let assignment = tokens(&[
            ("id", TokenValue::from("first")),
            ("userid", TokenValue::from("second")),
        ]);
        assert_eq!(
            matching_token("userId", &assignment),
            Some(&TokenValue::from("first"))
        );
    }

    #[test]
    fn test_blank_template_renders_empty() {
        let out = render("   ", PayloadFormat::Json, &IterationAssignment::empty());
        assert_eq!(out, RenderOutcome::Rendered(String::new()));
    }

    #[test]
    fn test_unparseable_template_falls_back() {
        let assignment = tokens(&[("id", TokenValue::Integer(2))]);
        let out = render("{not json", PayloadFormat::Json, &assignment);
        assert!(out.is_fallback());
        assert_eq!(out.text(), "{not json");

        let out = render("<a><id>1</a>", PayloadFormat::Xml, &assignment);
        assert!(out.is_fallback());
        assert_eq!(out.into_text(), "<a><id>1</a>");
    }
}
