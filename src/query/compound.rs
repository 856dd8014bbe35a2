/*!
# Compound Queries

A [`Query`] is a single [`Condition`], a conjunction or disjunction of
conditions, or a batch of independent conditions whose results are merged.

Queries are usually parsed from their JSON form:

```
use jsonorm::query::Query;

let query: Query = r#"{ "and": [
    { "keyName": "age", "type": "eval", "value": { "op": "gte", "operand": 18 } },
    { "keyName": "name", "type": "regexp", "value": "^A" }
] }"#
    .parse()
    .expect("valid query");
assert!(matches!(query, Query::And(ref conditions) if conditions.len() == 2));
```
*/
use serde_json::Value;
use std::str::FromStr;

use super::condition::Condition;
use crate::error::{Error, Result};

/// A condition or a combination of conditions.
#[derive(Debug, Clone)]
pub enum Query {
    /// One condition.
    Single(Condition),
    /// Nodes satisfying every condition, e.g. `{ "and": [...] }`.
    And(Vec<Condition>),
    /// Nodes satisfying at least one condition, e.g. `{ "or": [...] }`.
    Or(Vec<Condition>),
    /// Independent lookups whose results are merged without any
    /// cross-filtering, e.g. `[cond, cond]`. Unlike [`Query::Or`] the
    /// candidates are not re-checked against the other conditions.
    Batch(Vec<Condition>),
}

impl Query {
    /// Parses a query from its JSON form.
    ///
    /// An object with an `and` key is a conjunction, one with an `or` key a
    /// disjunction, any other object a single condition, and an array a
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCondition`] for anything else, or any error
    /// raised while building the individual conditions.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                if let Some(conditions) = map.get("and") {
                    Ok(Self::And(conditions_from(conditions, "and")?))
                } else if let Some(conditions) = map.get("or") {
                    Ok(Self::Or(conditions_from(conditions, "or")?))
                } else {
                    Condition::from_value(value).map(Self::Single)
                }
            }
            Value::Array(items) => items
                .iter()
                .map(Condition::from_value)
                .collect::<Result<Vec<_>>>()
                .map(Self::Batch),
            other => Err(Error::InvalidCondition(format!(
                "a query must be an object or an array, got {other}"
            ))),
        }
    }

    /// Conjunction of `conditions`.
    #[must_use]
    pub const fn and(conditions: Vec<Condition>) -> Self {
        Self::And(conditions)
    }

    /// Disjunction of `conditions`.
    #[must_use]
    pub const fn or(conditions: Vec<Condition>) -> Self {
        Self::Or(conditions)
    }

    /// All conditions making up the query, in order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        match self {
            Self::Single(condition) => std::slice::from_ref(condition),
            Self::And(conditions)
            | Self::Or(conditions)
            | Self::Batch(conditions) => conditions,
        }
    }
}

fn conditions_from(value: &Value, combinator: &str) -> Result<Vec<Condition>> {
    value
        .as_array()
        .ok_or_else(|| {
            Error::InvalidCondition(format!(
                "`{combinator}` takes an array of conditions"
            ))
        })?
        .iter()
        .map(Condition::from_value)
        .collect()
}

impl From<Condition> for Query {
    fn from(condition: Condition) -> Self {
        Self::Single(condition)
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s).map_err(|e| {
            Error::InvalidCondition(format!("query is not valid JSON: {e}"))
        })?;
        Self::from_value(&value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_each_shape() {
        let cond = json!({ "keyName": "a", "type": "normal", "value": 1 });

        let single = Query::from_value(&cond).unwrap();
        assert!(matches!(single, Query::Single(_)));

        let and = Query::from_value(&json!({ "and": [cond, cond] })).unwrap();
        assert!(matches!(and, Query::And(ref c) if c.len() == 2));

        let or = Query::from_value(&json!({ "or": [cond] })).unwrap();
        assert!(matches!(or, Query::Or(ref c) if c.len() == 1));

        let batch = Query::from_value(&json!([cond, cond, cond])).unwrap();
        assert_eq!(batch.conditions().len(), 3);
    }

    #[test]
    fn rejects_malformed_queries() {
        for bad in [
            json!("string"),
            json!(null),
            json!(42),
            json!({ "and": "nope" }),
            json!([{ "keyName": "a" }]),
        ] {
            assert!(
                matches!(Query::from_value(&bad), Err(Error::InvalidCondition(_))),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn from_str() {
        let query: Query =
            r#"{"keyName":"email","type":"regexp","value":"^test@"}"#.parse().unwrap();
        assert_eq!(query.conditions()[0].key_name(), "email");

        assert!(matches!(
            "{not json".parse::<Query>(),
            Err(Error::InvalidCondition(_))
        ));
    }
}
