//! # Document Queries
//!
//! Predicate matching over whole JSON documents:
//! - Conditions on a key or dot-notation key path of each node
//! - Strict equality, whitelisted comparison operations, bounded regexes
//! - Conjunctions, disjunctions, and batches of conditions
//! - Results as dot-notation paths in pre-order, with matched nodes

pub mod compound;
pub mod condition;
pub mod finder;
pub mod op;
pub mod pattern;

use serde_json::Value;

use crate::error::Result;

/// Interface for query engine implementations.
pub trait QueryEngine {
    /// Finds every node of `doc` below the root that satisfies `query`,
    /// paired with its dot-notation path.
    ///
    /// # Errors
    ///
    /// Implementations report traversal limits, e.g.
    /// [`crate::Error::DepthExceeded`].
    fn find_matches<'a>(
        &self,
        doc: &'a Value,
        query: &Query,
    ) -> Result<Vec<Match<'a>>>;

    /// Like [`QueryEngine::find_matches`], keeping only the paths.
    ///
    /// # Errors
    ///
    /// See [`QueryEngine::find_matches`].
    fn find(&self, doc: &Value, query: &Query) -> Result<Vec<String>> {
        Ok(self
            .find_matches(doc, query)?
            .into_iter()
            .map(|found| found.path)
            .collect())
    }
}

// Re-exports
pub use compound::Query;
pub use condition::{Condition, MatchType};
pub use finder::{Match, TreeFinder};
pub use op::Op;
