/*!
# Dot-notation Paths

Resolves, assigns, and removes values in a JSON document addressed by paths
such as `users.1.name`. Each segment is either a mapping key or a decimal
sequence index.

Reserved structural names (see [`RESERVED_NAMES`]) are rejected wherever they
appear in a path, for reads as well as writes, before any container is
touched.

```
use jsonorm::path;
use serde_json::json;

let mut doc = json!({ "users": [{ "name": "Alice" }] });
path::assign(&mut doc, "users.0.age", json!(25)).expect("valid path");
assert_eq!(path::resolve(&doc, "users.0.age").unwrap(), Some(&json!(25)));
```
*/
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::limits::RESERVED_NAMES;

/// Checks that `path` is non-empty and only uses `[A-Za-z0-9._-]`.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] otherwise. Null bytes, slashes, and other
/// traversal-style input are caught here.
pub fn validate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidPath("path must not be empty".into()));
    }
    if !path.chars().all(is_safe_char) {
        return Err(Error::InvalidPath(format!(
            "{path:?} contains characters outside [A-Za-z0-9._-]"
        )));
    }
    Ok(())
}

const fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Returns `true` if `segment` is a reserved structural name.
#[must_use]
pub fn is_reserved(segment: &str) -> bool {
    RESERVED_NAMES.contains(&segment)
}

/// Rejects any path with a reserved segment.
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] naming the first reserved segment.
pub fn ensure_allowed(path: &str) -> Result<()> {
    match path.split('.').find(|segment| is_reserved(segment)) {
        Some(segment) => Err(Error::ForbiddenPath(segment.to_owned())),
        None => Ok(()),
    }
}

/// Returns `true` if `segment` is a canonical sequence index: decimal digits
/// without a leading zero (other than `0` itself).
#[must_use]
pub fn is_index(segment: &str) -> bool {
    match segment.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

/// Parses `segment` as a sequence index if [`is_index`] accepts it.
#[must_use]
pub fn parse_index(segment: &str) -> Option<usize> {
    if is_index(segment) { segment.parse().ok() } else { None }
}

const fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Returns the direct child of `value` named by `segment`, if any.
#[must_use]
pub fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => {
            parse_index(segment).and_then(|i| items.get_mut(i))
        }
        _ => None,
    }
}

/// Returns the path without its final segment, or `None` when the path has
/// a single segment and its parent is the document root.
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

/// Returns the final segment of `path`.
#[must_use]
pub fn last_segment(path: &str) -> &str {
    path.rsplit_once('.').map_or(path, |(_, last)| last)
}

/// Appends `segment` to `base`, treating an empty base as the root.
#[must_use]
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_owned()
    } else {
        format!("{base}.{segment}")
    }
}

/// Orders two paths segment by segment. Indices compare numerically and
/// sort before mapping keys, which compare as text; a path sorts after its
/// own prefixes.
///
/// Sorting in reverse therefore visits deeper paths before their ancestors
/// and higher indices before lower ones within a sequence.
#[must_use]
pub fn cmp_paths(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let (x, y) = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => (x, y),
        };
        let order = match (parse_index(x), parse_index(y)) {
            (Some(i), Some(j)) => i.cmp(&j),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.cmp(y),
        };
        if order != Ordering::Equal {
            return order;
        }
    }
}

/// Resolves `path` against `doc`.
///
/// Returns `Ok(None)` when a segment is absent or a scalar is reached before
/// the path is exhausted.
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] if any segment is a reserved name, even
/// when the walk would have stopped earlier.
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Result<Option<&'a Value>> {
    ensure_allowed(path)?;
    Ok(path
        .split('.')
        .try_fold(doc, |current, segment| child(current, segment)))
}

/// Mutable counterpart of [`resolve`].
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] if any segment is a reserved name.
pub fn resolve_mut<'a>(
    doc: &'a mut Value,
    path: &str,
) -> Result<Option<&'a mut Value>> {
    ensure_allowed(path)?;
    Ok(path
        .split('.')
        .try_fold(doc, |current, segment| child_mut(current, segment)))
}

/// Like [`resolve`], but yields `default` when nothing lives at `path`.
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] if any segment is a reserved name.
pub fn resolve_or<'a>(
    doc: &'a Value,
    path: &str,
    default: &'a Value,
) -> Result<&'a Value> {
    Ok(resolve(doc, path)?.unwrap_or(default))
}

/// Sets `value` at `path`, creating intermediate mappings as needed.
///
/// Missing intermediates, and intermediates holding scalars, become empty
/// mappings. Inside a sequence a segment must be an index no greater than
/// the sequence length; the length itself appends.
///
/// # Errors
///
/// - [`Error::ForbiddenPath`] if any segment is a reserved name.
/// - [`Error::InvalidPath`] if a segment addresses an existing sequence with
///   something other than an in-range index.
///
/// Both are detected before the document is modified.
pub fn assign(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    ensure_allowed(path)?;
    preflight(doc, path)?;

    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };

    let mut current = doc;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        current = descend_or_create(current, segment, path)?;
    }

    match as_container(current) {
        Value::Object(map) => {
            map.insert(last.to_owned(), value);
        }
        Value::Array(items) => {
            let index = sequence_slot(items.len(), last, path)?;
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
        }
        _ => return Err(not_a_container(path)),
    }
    log::trace!("assigned value at `{path}`");
    Ok(())
}

/// Walks the existing structure along `path` and fails if a write would hit
/// a sequence with an unusable segment.
fn preflight(doc: &Value, path: &str) -> Result<()> {
    let mut current = doc;
    for segment in path.split('.') {
        if let Value::Array(items) = current {
            sequence_slot(items.len(), segment, path)?;
        }
        match child(current, segment) {
            Some(next) if is_container(next) => current = next,
            // Everything past here is created fresh as mappings.
            _ => break,
        }
    }
    Ok(())
}

fn sequence_slot(len: usize, segment: &str, path: &str) -> Result<usize> {
    match parse_index(segment) {
        Some(index) if index <= len => Ok(index),
        Some(index) => Err(Error::InvalidPath(format!(
            "index {index} in `{path}` is past the end of a sequence of \
             length {len}"
        ))),
        None => Err(Error::InvalidPath(format!(
            "segment `{segment}` in `{path}` is not a sequence index"
        ))),
    }
}

/// Replaces a scalar with an empty mapping so it can hold children.
fn as_container(value: &mut Value) -> &mut Value {
    if !is_container(value) {
        *value = Value::Object(Map::new());
    }
    value
}

fn descend_or_create<'a>(
    current: &'a mut Value,
    segment: &str,
    path: &str,
) -> Result<&'a mut Value> {
    match as_container(current) {
        Value::Object(map) => Ok(as_container(
            map.entry(segment).or_insert(Value::Null),
        )),
        Value::Array(items) => {
            let index = sequence_slot(items.len(), segment, path)?;
            if index == items.len() {
                items.push(Value::Null);
            }
            Ok(as_container(&mut items[index]))
        }
        _ => Err(not_a_container(path)),
    }
}

fn not_a_container(path: &str) -> Error {
    Error::InvalidPath(format!("cannot descend into a scalar along `{path}`"))
}

/// Removes the value at `path`.
///
/// Always returns `Ok(true)`: an absent intermediate makes this a no-op, so
/// calling it twice is harmless. A removed sequence slot is left empty
/// (`null`) rather than shifting its neighbours; see
/// [`crate::mutate::remove`] for the compacting variant.
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] if any segment is a reserved name.
pub fn remove(doc: &mut Value, path: &str) -> Result<bool> {
    ensure_allowed(path)?;

    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };

    let mut current = doc;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        match child_mut(current, segment) {
            Some(next) => current = next,
            None => return Ok(true),
        }
    }

    match current {
        Value::Object(map) => {
            map.shift_remove(last);
        }
        Value::Array(items) => {
            if let Some(slot) = parse_index(last).and_then(|i| items.get_mut(i))
            {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
    log::trace!("removed value at `{path}`");
    Ok(true)
}
