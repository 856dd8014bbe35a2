/*!
# Comparison Operations

The closed set of operations an `eval` condition may apply. Operation names
are looked up in a fixed table; nothing supplied by a caller is ever
executed.
*/
use serde_json::Value;
use std::{cmp::Ordering, fmt::Display, str::FromStr};

use crate::error::Error;

/// A whitelisted comparison between a document value and an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Target is greater than the operand.
    Gt,
    /// Target is less than the operand.
    Lt,
    /// Target is greater than or equal to the operand.
    Gte,
    /// Target is less than or equal to the operand.
    Lte,
    /// Target strictly equals the operand.
    Eq,
    /// Target does not strictly equal the operand.
    Neq,
    /// Target string contains the operand, or target sequence holds it.
    Contains,
    /// Target string starts with the operand.
    StartsWith,
    /// Target string ends with the operand.
    EndsWith,
}

/// Wire names of every operation.
const OPERATIONS: [(&str, Op); 9] = [
    ("gt", Op::Gt),
    ("lt", Op::Lt),
    ("gte", Op::Gte),
    ("lte", Op::Lte),
    ("eq", Op::Eq),
    ("neq", Op::Neq),
    ("contains", Op::Contains),
    ("startsWith", Op::StartsWith),
    ("endsWith", Op::EndsWith),
];

impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OPERATIONS
            .iter()
            .find_map(|&(name, op)| (name == s).then_some(op))
            .ok_or_else(|| Error::InvalidOperation(s.to_owned()))
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = OPERATIONS
            .iter()
            .find_map(|&(name, op)| (op == *self).then_some(name))
            .unwrap_or_default();
        write!(f, "{name}")
    }
}

impl Op {
    /// Applies the operation with `target` on the left-hand side.
    ///
    /// Relational operations compare numbers numerically and strings
    /// lexicographically; any other pairing does not match.
    #[must_use]
    pub fn apply(self, target: &Value, operand: &Value) -> bool {
        match self {
            Self::Gt => order(target, operand) == Some(Ordering::Greater),
            Self::Lt => order(target, operand) == Some(Ordering::Less),
            Self::Gte => matches!(
                order(target, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lte => matches!(
                order(target, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Eq => strict_eq(target, operand),
            Self::Neq => !strict_eq(target, operand),
            Self::Contains => match (target, operand) {
                (Value::String(s), Value::String(needle)) => s.contains(needle),
                (Value::Array(items), needle) => {
                    items.iter().any(|item| strict_eq(item, needle))
                }
                _ => false,
            },
            Self::StartsWith => match (target, operand) {
                (Value::String(s), Value::String(prefix)) => s.starts_with(prefix),
                _ => false,
            },
            Self::EndsWith => match (target, operand) {
                (Value::String(s), Value::String(suffix)) => s.ends_with(suffix),
                _ => false,
            },
        }
    }
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Equality without type coercion. Numbers compare by value, so `25` equals
/// `25.0`; everything else compares structurally.
#[must_use]
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || x.as_f64().is_some_and(|x| y.as_f64() == Some(x))
        }
        _ => a == b,
    }
}
