/*!
# Tree Finder

Depth-first, pre-order search over a whole document. Every container reached
below the root is tested against the query; the dot-notation paths of the
matching nodes are returned in traversal order.

Keys equal to reserved structural names are never descended into, and the
traversal aborts once it nests deeper than the configured ceiling.
*/
use serde_json::Value;
use std::collections::HashSet;

use super::{Condition, Query, QueryEngine};
use crate::error::{Error, Result};
use crate::limits::MAX_DEPTH;
use crate::path;

/// A node that satisfied a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    /// Dot-notation path from the document root, e.g. `users.1`
    pub path: String,
    /// The matching node
    pub node: &'a Value,
}

/// How the candidates of a compound query are filtered.
#[derive(Debug, Clone, Copy)]
enum Combinator {
    All,
    Any,
    Unfiltered,
}

/// A query engine walking the document recursively with a depth counter.
#[derive(Debug, Clone, Copy)]
pub struct TreeFinder {
    max_depth: usize,
}

impl Default for TreeFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeFinder {
    /// Finder with the default [`MAX_DEPTH`] ceiling.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_depth: MAX_DEPTH }
    }

    /// Finder with a custom depth ceiling.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Collects every node below the root that satisfies `condition`.
    fn search<'a>(
        &self,
        doc: &'a Value,
        condition: &Condition,
    ) -> Result<Vec<Match<'a>>> {
        let mut results = Vec::new();
        let mut path = String::new();
        self.traverse(condition, doc, &mut path, 0, &mut results)?;
        Ok(results)
    }

    fn traverse<'a>(
        &self,
        condition: &Condition,
        node: &'a Value,
        path: &mut String,
        depth: usize,
        results: &mut Vec<Match<'a>>,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded(self.max_depth));
        }

        if !path.is_empty() && condition.evaluate(node) {
            log::trace!("`{condition}` matched at `{path}`");
            results.push(Match { path: path.clone(), node });
        }

        match node {
            Value::Object(map) => {
                for (key, child) in map {
                    if path::is_reserved(key) {
                        continue;
                    }
                    self.visit(condition, key, child, path, depth, results)?;
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let segment = index.to_string();
                    self.visit(condition, &segment, child, path, depth, results)?;
                }
            }
            // Leaves are only ever compared through their parent
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
        Ok(())
    }

    /// Extends the path by one segment and recurses into container children.
    fn visit<'a>(
        &self,
        condition: &Condition,
        segment: &str,
        child: &'a Value,
        path: &mut String,
        depth: usize,
        results: &mut Vec<Match<'a>>,
    ) -> Result<()> {
        if !matches!(child, Value::Object(_) | Value::Array(_)) {
            return Ok(());
        }
        let len = path.len();
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(segment);

        let outcome = self.traverse(condition, child, path, depth + 1, results);

        // Backtrack
        path.truncate(len);
        outcome
    }

    /// Unions the per-condition candidates and keeps those passing the
    /// combinator, in first-seen order without duplicates.
    fn combine<'a>(
        &self,
        doc: &'a Value,
        conditions: &[Condition],
        combinator: Combinator,
    ) -> Result<Vec<Match<'a>>> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for condition in conditions {
            for candidate in self.search(doc, condition)? {
                if !seen.insert(candidate.path.clone()) {
                    continue;
                }
                let keep = match combinator {
                    Combinator::All => {
                        conditions.iter().all(|c| c.evaluate(candidate.node))
                    }
                    Combinator::Any => {
                        conditions.iter().any(|c| c.evaluate(candidate.node))
                    }
                    Combinator::Unfiltered => true,
                };
                if keep {
                    results.push(candidate);
                }
            }
        }
        Ok(results)
    }
}

impl QueryEngine for TreeFinder {
    fn find_matches<'a>(
        &self,
        doc: &'a Value,
        query: &Query,
    ) -> Result<Vec<Match<'a>>> {
        let results = match query {
            Query::Single(condition) => self.search(doc, condition)?,
            Query::And(conditions) => {
                self.combine(doc, conditions, Combinator::All)?
            }
            Query::Or(conditions) => {
                self.combine(doc, conditions, Combinator::Any)?
            }
            Query::Batch(conditions) => {
                self.combine(doc, conditions, Combinator::Unfiltered)?
            }
        };
        log::debug!("query matched {} node(s)", results.len());
        Ok(results)
    }
}
