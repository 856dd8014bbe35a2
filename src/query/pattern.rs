//! Bounded regular expressions for `regexp` conditions.
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::limits::{MAX_PATTERN_LEN, MAX_SUBJECT_LEN};

/// Compiled program size ceiling handed to the regex builder.
const COMPILED_SIZE_LIMIT: usize = 1 << 20;

/// Shapes known for catastrophic backtracking in backtracking engines.
static DANGEROUS_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // quantified group whose body is itself quantified: (a+)+, (a*)*, (a+){2,}
        r"\([^()]*[+*][^()]*\)[+*{]",
        // optional group of an optional: (a?)?
        r"\([^()]*\?\)\?",
        // bounded repetition inside a quantified group: (a{1,9})+
        r"\([^()]*\{\d+(?:,\d*)?\}[^()]*\)[+*{]",
        // stacked bounded repetitions on one atom: a{1,9}{1,9}, x{2}{3,}.
        // Separately quantified neighbours such as \d{1,9}\d{1,9} are
        // linear in the regex crate and stay allowed.
        r"\{\d+(?:,\d*)?\}\{\d+(?:,\d*)?\}",
    ]
    .into_iter()
    .map(|shape| Regex::new(shape).expect("hardcoded shape"))
    .collect()
});

/// Validates and compiles a caller-supplied pattern.
///
/// # Errors
///
/// Returns [`Error::UnsafePattern`] if the pattern is longer than
/// [`MAX_PATTERN_LEN`] characters, has a catastrophic-backtracking shape, or
/// does not compile.
pub fn compile(pattern: &str) -> Result<Regex> {
    if pattern.chars().count() > MAX_PATTERN_LEN {
        return Err(Error::UnsafePattern(format!(
            "pattern is longer than {MAX_PATTERN_LEN} characters"
        )));
    }
    if DANGEROUS_SHAPES.iter().any(|shape| shape.is_match(pattern)) {
        log::warn!("rejected regex pattern with nested quantifiers: {pattern}");
        return Err(Error::UnsafePattern(pattern.to_owned()));
    }
    log::trace!("compiling regex pattern {pattern:?}");
    RegexBuilder::new(pattern)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| Error::UnsafePattern(format!("{pattern}: {e}")))
}

/// The text a pattern is tested against: strings as-is, other values as
/// compact JSON, truncated to [`MAX_SUBJECT_LEN`] characters.
#[must_use]
pub fn subject(value: &Value) -> Cow<'_, str> {
    let text = match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    };
    let cut = text.char_indices().nth(MAX_SUBJECT_LEN).map(|(i, _)| i);
    match cut {
        Some(cut) => Cow::Owned(text[..cut].to_owned()),
        None => text,
    }
}
