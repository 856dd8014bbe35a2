//! Fixed ceilings that bound the work a single operation can do.

/// Deepest nesting level the finder will descend to.
pub const MAX_DEPTH: usize = 100;

/// Longest accepted `regexp` condition pattern, in characters.
pub const MAX_PATTERN_LEN: usize = 100;

/// Regex subjects are truncated to this many characters before matching.
pub const MAX_SUBJECT_LEN: usize = 10_000;

/// Largest document file that will be loaded or saved (10 MiB).
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Segment names that would reach object machinery rather than data.
pub const RESERVED_NAMES: [&str; 3] = ["__proto__", "constructor", "prototype"];
