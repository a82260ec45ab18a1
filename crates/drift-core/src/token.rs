//! Tokens, token specifications and per-iteration assignments

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single scalar candidate value for a token
///
/// Config files carry plain YAML/JSON scalars, so the representation is
/// untagged: `true`, `42`, `1.5` and `"abc"` all deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TokenValue {
    pub fn is_number(&self) -> bool {
        matches!(self, TokenValue::Integer(_) | TokenValue::Float(_))
    }

    /// JSON number for this value, if it is numeric and representable
    pub fn as_json_number(&self) -> Option<Value> {
        match self {
            TokenValue::Integer(i) => Some(Value::from(*i)),
            TokenValue::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
            _ => None,
        }
    }

    /// Rebuild a typed value from its recorded text form.
    ///
    /// Baselines store tokens as strings. A string is only turned back into a
    /// bool or number when formatting that value reproduces the exact text,
    /// so `"007"` or `"1.0"` stay text.
    pub fn from_recorded(text: &str) -> Self {
        match text {
            "true" => return TokenValue::Bool(true),
            "false" => return TokenValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            if i.to_string() == text {
                return TokenValue::Integer(i);
            }
        }
        if let Ok(f) = text.parse::<f64>() {
            if f.is_finite() && f.to_string() == text {
                return TokenValue::Float(f);
            }
        }
        TokenValue::Text(text.to_string())
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Bool(b) => write!(f, "{}", b),
            TokenValue::Integer(i) => write!(f, "{}", i),
            TokenValue::Float(x) => write!(f, "{}", x),
            TokenValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TokenValue {
    fn from(s: &str) -> Self {
        TokenValue::Text(s.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(s: String) -> Self {
        TokenValue::Text(s)
    }
}

impl From<i64> for TokenValue {
    fn from(i: i64) -> Self {
        TokenValue::Integer(i)
    }
}

impl From<i32> for TokenValue {
    fn from(i: i32) -> Self {
        TokenValue::Integer(i64::from(i))
    }
}

impl From<f64> for TokenValue {
    fn from(f: f64) -> Self {
        TokenValue::Float(f)
    }
}

impl From<bool> for TokenValue {
    fn from(b: bool) -> Self {
        TokenValue::Bool(b)
    }
}

/// Token name -> ordered candidate values, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSpec(IndexMap<String, Vec<TokenValue>>);

impl TokenSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic callers
    pub fn with_token<V>(mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<TokenValue>,
    {
        self.insert(name, values);
        self
    }

    /// Insert or replace a token; the position of an existing token is kept
    pub fn insert<V>(&mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>)
    where
        V: Into<TokenValue>,
    {
        self.0
            .insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, name: &str) -> Option<&[TokenValue]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TokenValue])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One concrete choice of value per token for a single iteration
///
/// Produced by the iteration generator and never modified afterwards;
/// [`IterationAssignment::with_value`] returns a new assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IterationAssignment(IndexMap<String, TokenValue>);

impl IterationAssignment {
    /// The "no substitution" assignment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copy of this assignment with `name` set to `value`
    pub fn with_value(&self, name: &str, value: TokenValue) -> Self {
        let mut values = self.0.clone();
        values.insert(name.to_string(), value);
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&TokenValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String form stored in baseline request metadata (`tokensUsed`)
    pub fn to_recorded(&self) -> IndexMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Inverse of [`IterationAssignment::to_recorded`]
    pub fn from_recorded(recorded: &IndexMap<String, String>) -> Self {
        recorded
            .iter()
            .map(|(k, v)| (k.clone(), TokenValue::from_recorded(v)))
            .collect()
    }
}

impl FromIterator<(String, TokenValue)> for IterationAssignment {
    fn from_iter<I: IntoIterator<Item = (String, TokenValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for IterationAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_spec_from_yaml_keeps_order_and_types() {
        let yaml = "zeta: [1, 2]\nalpha: [\"a\", true, 1.5]\n";
        let spec: TokenSpec = serde_yaml::from_str(yaml).unwrap();

        let names: Vec<_> = spec.names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(
            spec.get("alpha").unwrap(),
            &[
                TokenValue::Text("a".into()),
                TokenValue::Bool(true),
                TokenValue::Float(1.5)
            ]
        );
        assert_eq!(spec.get("zeta").unwrap()[0], TokenValue::Integer(1));
    }

    #[test]
    fn test_token_spec_rejects_nested_values() {
        let yaml = "account: [[1, 2]]\n";
        assert!(serde_yaml::from_str::<TokenSpec>(yaml).is_err());
    }

    #[test]
    fn test_from_recorded_only_round_trips_exact_text() {
        assert_eq!(TokenValue::from_recorded("42"), TokenValue::Integer(42));
        assert_eq!(TokenValue::from_recorded("2.5"), TokenValue::Float(2.5));
        assert_eq!(TokenValue::from_recorded("true"), TokenValue::Bool(true));
        assert_eq!(TokenValue::from_recorded("007"), TokenValue::Text("007".into()));
        assert_eq!(TokenValue::from_recorded("1.0"), TokenValue::Text("1.0".into()));
        assert_eq!(TokenValue::from_recorded("abc"), TokenValue::Text("abc".into()));
    }

    #[test]
    fn test_assignment_with_value_leaves_original_untouched() {
        let base: IterationAssignment = [("A".to_string(), TokenValue::Integer(1))]
            .into_iter()
            .collect();
        let changed = base.with_value("A", TokenValue::Integer(2));

        assert_eq!(base.get("A"), Some(&TokenValue::Integer(1)));
        assert_eq!(changed.get("A"), Some(&TokenValue::Integer(2)));
    }

    #[test]
    fn test_assignment_recorded_round_trip() {
        let assignment: IterationAssignment = [
            ("id".to_string(), TokenValue::Integer(7)),
            ("name".to_string(), TokenValue::Text("bob".into())),
        ]
        .into_iter()
        .collect();

        let recorded = assignment.to_recorded();
        assert_eq!(recorded.get("id").map(String::as_str), Some("7"));
        assert_eq!(IterationAssignment::from_recorded(&recorded), assignment);
        assert_eq!(assignment.to_string(), "{id=7, name=bob}");
    }
}
