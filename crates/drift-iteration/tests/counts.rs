//! Iteration count laws for both strategies
//!
//! ALL_COMBINATIONS yields min(product of candidate counts, limit);
//! ONE_BY_ONE yields min(1 + sum of (count - 1), limit) when every
//! token's candidates are distinct, and always starts with the defaults.

use drift_core::{TokenSpec, TokenValue};
use drift_iteration::{generate, IterationStrategy};

fn spec(sizes: &[usize]) -> TokenSpec {
    let mut spec = TokenSpec::new();
    for (i, size) in sizes.iter().enumerate() {
        let values: Vec<TokenValue> = (0..*size)
            .map(|v| TokenValue::Text(format!("t{}v{}", i, v)))
            .collect();
        spec.insert(format!("token{}", i), values);
    }
    spec
}

const SHAPES: &[&[usize]] = &[&[1], &[3], &[2, 3], &[1, 1, 1], &[4, 1, 2], &[2, 2, 2, 2]];

#[test]
fn test_all_combinations_count_law() {
    for sizes in SHAPES {
        let product: usize = sizes.iter().product();
        for limit in [1, 3, 8, 100] {
            let iterations = generate(&spec(sizes), limit, IterationStrategy::AllCombinations);
            assert_eq!(
                iterations.len(),
                product.min(limit),
                "sizes {:?} limit {}",
                sizes,
                limit
            );
        }
    }
}

#[test]
fn test_one_by_one_count_law() {
    for sizes in SHAPES {
        let expected = 1 + sizes.iter().map(|s| s - 1).sum::<usize>();
        for limit in [1, 3, 100] {
            let tokens = spec(sizes);
            let iterations = generate(&tokens, limit, IterationStrategy::OneByOne);
            assert_eq!(iterations.len(), expected.min(limit), "sizes {:?}", sizes);

            for (name, values) in tokens.iter() {
                assert_eq!(iterations[0].get(name), values.first());
            }
        }
    }
}

#[test]
fn test_one_by_one_deviates_in_exactly_one_token() {
    let tokens = spec(&[3, 2, 4]);
    let iterations = generate(&tokens, 100, IterationStrategy::OneByOne);
    let defaults = &iterations[0];

    for iteration in &iterations[1..] {
        let changed = iteration
            .iter()
            .filter(|(name, value)| defaults.get(name) != Some(*value))
            .count();
        assert_eq!(changed, 1, "{}", iteration);
    }
}

#[test]
fn test_generation_is_deterministic() {
    let tokens = spec(&[2, 3, 2]);
    for strategy in [IterationStrategy::AllCombinations, IterationStrategy::OneByOne] {
        assert_eq!(
            generate(&tokens, 50, strategy),
            generate(&tokens, 50, strategy)
        );
    }
}
