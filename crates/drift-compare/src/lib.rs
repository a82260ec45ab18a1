//! Response comparison for apidrift
//!
//! Compares two response bodies of the same [`PayloadFormat`] and produces a
//! [`ComparisonVerdict`]: MATCH, MISMATCH with an ordered list of
//! path-addressed [`Difference`]s, or ERROR with a message.
//!
//! - JSON: deep equality first; on mismatch a recursive diff in left-tree
//!   member order. Arrays compare by index. Uncapped.
//! - XML: tree diff ignoring whitespace between elements (and optionally
//!   comments), in document order, capped at
//!   [`CompareOptions::xml_diff_limit`] entries.
//!
//! Nothing here panics or returns `Err`; every failure is folded into an
//! ERROR verdict, or into a literal text comparison when
//! [`CompareOptions::lenient_parse`] is set.

mod error;
mod json;
mod verdict;
mod xml;

pub use verdict::{ComparisonStatus, ComparisonVerdict, DiffKind, Difference};

use drift_core::PayloadFormat;
use tracing::{debug, warn};

/// Default number of XML differences kept in a verdict
pub const DEFAULT_XML_DIFF_LIMIT: usize = 5;

/// Options for comparing responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    /// Maximum XML differences reported; `None` keeps all of them
    pub xml_diff_limit: Option<usize>,
    /// Drop XML comments before comparing
    pub ignore_comments: bool,
    /// On a parse failure compare trimmed text instead of returning ERROR
    pub lenient_parse: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self::live()
    }
}

impl CompareOptions {
    /// Two live APIs: strict parsing, comments significant
    pub fn live() -> Self {
        Self {
            xml_diff_limit: Some(DEFAULT_XML_DIFF_LIMIT),
            ignore_comments: false,
            lenient_parse: false,
        }
    }

    /// Live API against a stored baseline: comments ignored, text fallback
    pub fn baseline() -> Self {
        Self {
            xml_diff_limit: Some(DEFAULT_XML_DIFF_LIMIT),
            ignore_comments: true,
            lenient_parse: true,
        }
    }

    pub fn with_xml_diff_limit(mut self, limit: Option<usize>) -> Self {
        self.xml_diff_limit = limit;
        self
    }
}

/// Compare two responses with [`CompareOptions::live`]
pub fn compare(left: Option<&str>, right: Option<&str>, format: PayloadFormat) -> ComparisonVerdict {
    compare_with_options(left, right, format, &CompareOptions::default())
}

/// Compare two responses; a missing response on either side is an ERROR
pub fn compare_with_options(
    left: Option<&str>,
    right: Option<&str>,
    format: PayloadFormat,
    options: &CompareOptions,
) -> ComparisonVerdict {
    let (Some(left), Some(right)) = (left, right) else {
        return ComparisonVerdict::error("One or both API responses are null.");
    };

    let outcome = match format {
        PayloadFormat::Json => json::compare(left, right),
        PayloadFormat::Xml => xml::compare(left, right, options),
    };

    match outcome {
        Ok(differences) => {
            debug!(
                "{} comparison finished with {} differences",
                format,
                differences.len()
            );
            ComparisonVerdict::from_differences(differences)
        }
        Err(parse_error) if options.lenient_parse => {
            warn!(
                "{} parsing failed, falling back to text comparison: {}",
                format, parse_error
            );
            literal_fallback(left, right, format)
        }
        Err(parse_error) => {
            warn!("Failed to parse or compare responses: {}", parse_error);
            ComparisonVerdict::error(format!(
                "Error during response comparison: {}",
                parse_error
            ))
        }
    }
}

fn literal_fallback(left: &str, right: &str, format: PayloadFormat) -> ComparisonVerdict {
    if left.trim() == right.trim() {
        return ComparisonVerdict::matched();
    }
    let (path, detail) = match format {
        PayloadFormat::Json => (
            "$",
            "JSON Parsing failed (possible HTML response?), and strings differ.",
        ),
        PayloadFormat::Xml => ("/", "XML Parsing failed, and strings differ."),
    };
    ComparisonVerdict::from_differences(vec![Difference::new(
        path,
        DiffKind::ValueMismatch,
        detail,
    )])
}
