/*!
# Conditions

A [`Condition`] is a predicate over one node of a document: it names a key
(possibly dot-notation, descending from the node under test), a match type,
and a value to compare against.

Conditions are validated and compiled when they are built, so a malformed
query is rejected before any document is walked, and evaluating a built
condition cannot fail.

```
use jsonorm::query::{Condition, Op};
use serde_json::json;

let adult = Condition::eval("age", Op::Gte, json!(18)).expect("valid condition");
assert!(adult.evaluate(&json!({ "name": "Bob", "age": 35 })));
assert!(!adult.evaluate(&json!({ "name": "Eve" })));
```
*/
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;

use super::op::{Op, strict_eq};
use super::pattern;
use crate::error::{Error, Result};
use crate::path;

/// Value that matches any present property regardless of match type.
pub const WILDCARD: &str = "*";

/// How a condition compares the addressed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchType {
    /// Strict equality.
    Normal,
    /// One of the whitelisted [`Op`]s against an operand.
    Eval,
    /// A bounded regular expression.
    Regexp,
    /// Any other type name; compared by strict equality like `Normal`.
    Other(String),
}

impl From<&str> for MatchType {
    fn from(name: &str) -> Self {
        match name {
            "normal" => Self::Normal,
            "eval" => Self::Eval,
            "regexp" => Self::Regexp,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Eval => write!(f, "eval"),
            Self::Regexp => write!(f, "regexp"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// The compiled form of a condition's value.
#[derive(Debug, Clone)]
enum Predicate {
    Present,
    Equals(Value),
    Compare(Op, Value),
    Pattern(Regex),
}

/// A single predicate over a document node.
#[derive(Debug, Clone)]
pub struct Condition {
    key_name: String,
    match_type: MatchType,
    value: Value,
    predicate: Predicate,
}

/// Wire shape of a condition, before validation.
#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "keyName")]
    key_name: Option<Value>,
    #[serde(rename = "type")]
    match_type: Option<Value>,
    #[serde(default)]
    value: Value,
}

/// Wire shape of an `eval` value.
#[derive(Deserialize)]
struct Comparison {
    op: String,
    operand: Value,
}

impl Condition {
    /// Builds and validates a condition.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCondition`] if `key_name` is empty or uses
    ///   characters outside `[A-Za-z0-9._-]`.
    /// - [`Error::ForbiddenPath`] if `key_name` has a reserved segment.
    /// - [`Error::InvalidOperation`] for an `eval` value that is not
    ///   `{op, operand}` with a whitelisted `op`.
    /// - [`Error::InvalidCondition`] for a `regexp` value that is not a
    ///   string, and [`Error::UnsafePattern`] for a rejected pattern.
    pub fn new(
        key_name: impl Into<String>,
        match_type: MatchType,
        value: Value,
    ) -> Result<Self> {
        let key_name = key_name.into();
        validate_key_name(&key_name)?;

        let predicate = if value.as_str() == Some(WILDCARD) {
            Predicate::Present
        } else {
            match &match_type {
                MatchType::Normal | MatchType::Other(_) => {
                    Predicate::Equals(value.clone())
                }
                MatchType::Eval => {
                    let Comparison { op, operand } =
                        Comparison::deserialize(&value).map_err(|_| {
                            Error::InvalidOperation(format!(
                                "eval conditions take {{op, operand}}, got {value}"
                            ))
                        })?;
                    Predicate::Compare(op.parse()?, operand)
                }
                MatchType::Regexp => {
                    let source = value.as_str().ok_or_else(|| {
                        Error::InvalidCondition(format!(
                            "regexp conditions take a string pattern, got {value}"
                        ))
                    })?;
                    Predicate::Pattern(pattern::compile(source)?)
                }
            }
        };

        Ok(Self { key_name, match_type, value, predicate })
    }

    /// Strict-equality condition.
    ///
    /// # Errors
    ///
    /// See [`Condition::new`].
    pub fn normal(key_name: impl Into<String>, value: Value) -> Result<Self> {
        Self::new(key_name, MatchType::Normal, value)
    }

    /// Whitelisted-operation condition.
    ///
    /// # Errors
    ///
    /// See [`Condition::new`].
    pub fn eval(
        key_name: impl Into<String>,
        op: Op,
        operand: Value,
    ) -> Result<Self> {
        let value = serde_json::json!({ "op": op.to_string(), "operand": operand });
        Self::new(key_name, MatchType::Eval, value)
    }

    /// Regular-expression condition.
    ///
    /// # Errors
    ///
    /// See [`Condition::new`].
    pub fn regexp(key_name: impl Into<String>, pattern: &str) -> Result<Self> {
        Self::new(key_name, MatchType::Regexp, Value::from(pattern))
    }

    /// Parses a condition from its JSON form
    /// `{ "keyName": ..., "type": ..., "value": ... }`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCondition`] if `value` is not an object, or
    /// `keyName` or `type` is missing or not a string; otherwise as
    /// [`Condition::new`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawCondition::deserialize(value).map_err(|e| {
            Error::InvalidCondition(format!("expected a condition object: {e}"))
        })?;
        let key_name = match raw.key_name {
            Some(Value::String(key_name)) => key_name,
            Some(_) => {
                return Err(Error::InvalidCondition(
                    "keyName must be a string".into(),
                ));
            }
            None => {
                return Err(Error::InvalidCondition("keyName is required".into()));
            }
        };
        let match_type = match raw.match_type {
            Some(Value::String(name)) => MatchType::from(name.as_str()),
            Some(_) => {
                return Err(Error::InvalidCondition("type must be a string".into()));
            }
            None => return Err(Error::InvalidCondition("type is required".into())),
        };
        Self::new(key_name, match_type, raw.value)
    }

    /// The key (or dot-notation path) compared on each node.
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// The match type.
    #[must_use]
    pub const fn match_type(&self) -> &MatchType {
        &self.match_type
    }

    /// The value as supplied.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Decides whether `node` satisfies the condition.
    ///
    /// The addressed value must be present: a missing key never matches,
    /// while an explicit `null` is a value like any other.
    #[must_use]
    pub fn evaluate(&self, node: &Value) -> bool {
        let Some(target) = self
            .key_name
            .split('.')
            .try_fold(node, |current, segment| path::child(current, segment))
        else {
            return false;
        };

        match &self.predicate {
            Predicate::Present => true,
            Predicate::Equals(expected) => strict_eq(target, expected),
            Predicate::Compare(op, operand) => op.apply(target, operand),
            Predicate::Pattern(re) => re.is_match(&pattern::subject(target)),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) {}", self.key_name, self.match_type, self.value)
    }
}

fn validate_key_name(key_name: &str) -> Result<()> {
    path::validate(key_name).map_err(|_| {
        Error::InvalidCondition(format!("Invalid keyName format: {key_name:?}"))
    })?;
    path::ensure_allowed(key_name)
}
