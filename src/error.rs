/*!
# Errors

Every failure the library can report, from path validation through
persistence. All operations return [`Result`] and never swallow an error: a
failed operation leaves the document as it was before the call.
*/
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by document queries, mutations, and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// The document source was neither parseable JSON nor a container.
    #[error("Input must be a valid JSON object or string: {0}")]
    InvalidInput(String),

    /// An operation was attempted before any document was loaded.
    #[error("You need to load the json first")]
    NotLoaded,

    /// The path is empty or contains characters outside `[A-Za-z0-9._-]`.
    #[error("Invalid path format: {0}")]
    InvalidPath(String),

    /// The path touches a reserved structural name such as `__proto__`.
    #[error("Access to `{0}` is not allowed")]
    ForbiddenPath(String),

    /// The query does not have the shape of a condition or compound query.
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// An `eval` condition named an operation outside the whitelist.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A regular expression is too long, malformed, or prone to
    /// catastrophic backtracking.
    #[error("Rejected dangerous regex pattern: {0}")]
    UnsafePattern(String),

    /// The document is nested deeper than the traversal ceiling.
    #[error("Maximum recursion depth of {0} exceeded")]
    DepthExceeded(usize),

    /// `update` was called without a usable instruction list.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The addressed node cannot take part in the edit, e.g. an insert whose
    /// parent is not a sequence.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The file name failed the extension, null-byte, or traversal checks.
    #[error("Invalid file path {}: {reason}", path.display())]
    InvalidFile {
        /// The offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A document exceeds the persistence size ceiling.
    #[error("Document of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Size of the file or serialized document in bytes.
        size: u64,
        /// The configured ceiling in bytes.
        limit: u64,
    },

    /// Reading or writing a document file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A document file is not valid JSON.
    #[error("JSON syntax error in {}: {source}", path.display())]
    Syntax {
        /// The file being parsed.
        path: PathBuf,
        /// The parser error, carrying line and column.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
