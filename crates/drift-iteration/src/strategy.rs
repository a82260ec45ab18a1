//! Iteration strategy names as they appear in config files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How token candidates are combined into iterations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationStrategy {
    /// Truncated Cartesian product of every token's candidates
    #[default]
    AllCombinations,
    /// All-defaults baseline followed by one deviation per extra candidate
    OneByOne,
}

#[derive(Debug, Error)]
#[error("unknown iteration strategy '{0}', expected ALL_COMBINATIONS or ONE_BY_ONE")]
pub struct UnknownStrategy(pub String);

impl IterationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            IterationStrategy::AllCombinations => "ALL_COMBINATIONS",
            IterationStrategy::OneByOne => "ONE_BY_ONE",
        }
    }
}

impl FromStr for IterationStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("ALL_COMBINATIONS") {
            Ok(IterationStrategy::AllCombinations)
        } else if s.eq_ignore_ascii_case("ONE_BY_ONE") {
            Ok(IterationStrategy::OneByOne)
        } else {
            Err(UnknownStrategy(s.to_string()))
        }
    }
}

impl fmt::Display for IterationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
