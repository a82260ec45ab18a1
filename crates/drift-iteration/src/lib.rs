//! Iteration generation
//!
//! Expands a [`TokenSpec`] into the ordered list of [`IterationAssignment`]s
//! a comparison run executes. Two strategies are supported:
//!
//! - `ALL_COMBINATIONS` - truncated Cartesian product, built token by token
//!   in declaration order
//! - `ONE_BY_ONE` - the all-defaults assignment followed by single-token
//!   deviations from it
//!
//! Output order is stable: it fixes iteration numbering in reports and the
//! alignment between a captured baseline and a later replay.
//!
//! # Example
//!
//! ```
//! use drift_core::TokenSpec;
//! use drift_iteration::{generate, IterationStrategy};
//!
//! let tokens = TokenSpec::new()
//!     .with_token("A", [1, 2])
//!     .with_token("B", [3, 4, 5]);
//!
//! assert_eq!(generate(&tokens, 100, IterationStrategy::AllCombinations).len(), 6);
//! assert_eq!(generate(&tokens, 100, IterationStrategy::OneByOne).len(), 4);
//! ```

mod strategy;

pub use strategy::{IterationStrategy, UnknownStrategy};

use drift_core::{IterationAssignment, TokenSpec};
use tracing::{debug, warn};

/// Expand `tokens` into at most `max_iterations` assignments.
///
/// An empty token spec always yields exactly one empty assignment (the
/// "no substitution" run), regardless of `max_iterations`.
pub fn generate(
    tokens: &TokenSpec,
    max_iterations: usize,
    strategy: IterationStrategy,
) -> Vec<IterationAssignment> {
    if tokens.is_empty() {
        return vec![IterationAssignment::empty()];
    }

    let iterations = match strategy {
        IterationStrategy::AllCombinations => all_combinations(tokens, max_iterations),
        IterationStrategy::OneByOne => one_by_one(tokens, max_iterations),
    };
    debug!(
        "Generated {} iterations from {} tokens ({})",
        iterations.len(),
        tokens.len(),
        strategy
    );
    iterations
}

fn all_combinations(tokens: &TokenSpec, max_iterations: usize) -> Vec<IterationAssignment> {
    if max_iterations == 0 {
        return Vec::new();
    }

    let mut iterations = vec![IterationAssignment::empty()];

    for (name, values) in tokens.iter() {
        let mut expanded = Vec::with_capacity(iterations.len().saturating_mul(values.len()));

        for partial in &iterations {
            for value in values {
                expanded.push(partial.with_value(name, value.clone()));

                if expanded.len() >= max_iterations {
                    warn!(
                        "Maximum number of iterations ({}) reached, halting combination generation",
                        max_iterations
                    );
                    return expanded;
                }
            }
        }

        iterations = expanded;
    }

    iterations
}

fn one_by_one(tokens: &TokenSpec, max_iterations: usize) -> Vec<IterationAssignment> {
    if max_iterations == 0 {
        return Vec::new();
    }

    // Tokens without candidates have no default and no deviations
    let defaults: IterationAssignment = tokens
        .iter()
        .filter_map(|(name, values)| values.first().map(|v| (name.to_string(), v.clone())))
        .collect();

    let mut iterations = vec![defaults.clone()];

    for (name, values) in tokens.iter() {
        let Some(default) = values.first() else {
            continue;
        };

        for value in values.iter().filter(|v| *v != default) {
            if iterations.len() >= max_iterations {
                warn!(
                    "Maximum number of iterations ({}) reached via ONE_BY_ONE",
                    max_iterations
                );
                return iterations;
            }
            iterations.push(defaults.with_value(name, value.clone()));
        }
    }

    iterations
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::TokenValue;

    fn spec_ab() -> TokenSpec {
        TokenSpec::new()
            .with_token("A", [1, 2])
            .with_token("B", [3, 4, 5])
    }

    fn pairs(assignment: &IterationAssignment) -> Vec<(String, String)> {
        assignment
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_spec_yields_single_empty_assignment() {
        for strategy in [IterationStrategy::AllCombinations, IterationStrategy::OneByOne] {
            let iterations = generate(&TokenSpec::new(), 10, strategy);
            assert_eq!(iterations, vec![IterationAssignment::empty()]);
        }
    }

    #[test]
    fn test_all_combinations_full_product() {
        let iterations = generate(&spec_ab(), 100, IterationStrategy::AllCombinations);
        assert_eq!(iterations.len(), 6);

        // Earlier tokens vary slowest
        assert_eq!(
            pairs(&iterations[0]),
            vec![("A".into(), "1".into()), ("B".into(), "3".into())]
        );
        assert_eq!(
            pairs(&iterations[1]),
            vec![("A".into(), "1".into()), ("B".into(), "4".into())]
        );
        assert_eq!(
            pairs(&iterations[5]),
            vec![("A".into(), "2".into()), ("B".into(), "5".into())]
        );
    }

    #[test]
    fn test_all_combinations_truncates_at_limit() {
        for limit in 1..6 {
            let iterations = generate(&spec_ab(), limit, IterationStrategy::AllCombinations);
            assert_eq!(iterations.len(), limit, "limit {}", limit);
        }
    }

    #[test]
    fn test_all_combinations_truncation_mid_first_token() {
        // Limit reached while still expanding A: partial assignments are returned
        let iterations = generate(&spec_ab(), 2, IterationStrategy::AllCombinations);
        assert_eq!(iterations.len(), 2);
        assert!(iterations.iter().all(|it| it.get("B").is_none()));
    }

    #[test]
    fn test_one_by_one_order() {
        let iterations = generate(&spec_ab(), 100, IterationStrategy::OneByOne);
        let rendered: Vec<_> = iterations.iter().map(|it| it.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["{A=1, B=3}", "{A=2, B=3}", "{A=1, B=4}", "{A=1, B=5}"]
        );
    }

    #[test]
    fn test_one_by_one_skips_values_equal_to_default() {
        let tokens = TokenSpec::new().with_token("A", ["a1", "a2", "a1"]);
        let iterations = generate(&tokens, 100, IterationStrategy::OneByOne);
        assert_eq!(iterations.len(), 2);
        assert_eq!(iterations[0].get("A"), Some(&TokenValue::from("a1")));
        assert_eq!(iterations[1].get("A"), Some(&TokenValue::from("a2")));
    }

    #[test]
    fn test_one_by_one_stops_mid_token() {
        let iterations = generate(&spec_ab(), 3, IterationStrategy::OneByOne);
        let rendered: Vec<_> = iterations.iter().map(|it| it.to_string()).collect();
        assert_eq!(rendered, vec!["{A=1, B=3}", "{A=2, B=3}", "{A=1, B=4}"]);
    }

    #[test]
    fn test_one_by_one_ignores_tokens_without_candidates() {
        let tokens = TokenSpec::new()
            .with_token("A", [1, 2])
            .with_token("EMPTY", Vec::<TokenValue>::new());
        let iterations = generate(&tokens, 100, IterationStrategy::OneByOne);
        assert_eq!(iterations.len(), 2);
        assert!(iterations.iter().all(|it| it.get("EMPTY").is_none()));
    }

    #[test]
    fn test_zero_limit_with_tokens_yields_nothing() {
        assert!(generate(&spec_ab(), 0, IterationStrategy::AllCombinations).is_empty());
        assert!(generate(&spec_ab(), 0, IterationStrategy::OneByOne).is_empty());
    }
}
