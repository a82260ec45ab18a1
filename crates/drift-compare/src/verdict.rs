//! Comparison outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall classification of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComparisonStatus {
    Match,
    Mismatch,
    Error,
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonStatus::Match => write!(f, "MATCH"),
            ComparisonStatus::Mismatch => write!(f, "MISMATCH"),
            ComparisonStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// What kind of difference was found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    /// Both sides have a node here but it differs
    ValueMismatch,
    /// Only the right-hand response has this node
    MissingInLeft,
    /// Only the left-hand response has this node
    MissingInRight,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::ValueMismatch => write!(f, "value-mismatch"),
            DiffKind::MissingInLeft => write!(f, "missing-in-left"),
            DiffKind::MissingInRight => write!(f, "missing-in-right"),
        }
    }
}

/// A single path-addressed difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// `$.a.b[2]` for JSON, `/root[1]/b[1]/text()[1]` for XML
    pub path: String,
    pub kind: DiffKind,
    /// Human readable description, includes both values where applicable
    pub detail: String,
}

impl Difference {
    pub fn new(path: impl Into<String>, kind: DiffKind, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.detail)
    }
}

/// Verdict plus supporting detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonVerdict {
    pub status: ComparisonStatus,
    /// Empty for MATCH and ERROR
    pub differences: Vec<Difference>,
    /// Only set for ERROR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonVerdict {
    pub fn matched() -> Self {
        Self {
            status: ComparisonStatus::Match,
            differences: Vec::new(),
            error: None,
        }
    }

    /// MATCH when `differences` is empty, MISMATCH otherwise
    pub fn from_differences(differences: Vec<Difference>) -> Self {
        if differences.is_empty() {
            return Self::matched();
        }
        Self {
            status: ComparisonStatus::Mismatch,
            differences,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ComparisonStatus::Error,
            differences: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_match(&self) -> bool {
        self.status == ComparisonStatus::Match
    }

    /// Difference details in report order
    pub fn descriptions(&self) -> Vec<String> {
        self.differences.iter().map(|d| d.detail.clone()).collect()
    }
}
