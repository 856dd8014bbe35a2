/*!
# Structural Edits

Edits that keep a document's shape intact:

- [`insert`] places a value next to an anchor inside a sequence;
- [`remove`] deletes a value and compacts the sequence it lived in;
- [`update`] applies a list of field-level [`UpdateInstruction`]s to a node.

[`insert_all`], [`remove_all`], and [`update_all`] make the same edit at
several paths at once, such as every result of a find. Each edit either succeeds completely or leaves the document untouched.
*/
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::num::FpCategory;

use crate::error::{Error, Result};
use crate::path;
use crate::query::op::strict_eq;

/// Which side of the anchor an inserted value lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Immediately before the anchor.
    Before,
    /// Immediately after the anchor.
    #[default]
    After,
}

impl From<bool> for Placement {
    /// `true` means [`Placement::Before`].
    fn from(before: bool) -> Self {
        if before { Self::Before } else { Self::After }
    }
}

/// Inserts `value` next to the element at `path`.
///
/// The parent of `path` (the document root for single-segment paths) must be
/// a sequence holding an element at the final index. Besides that element,
/// every other element that is an equal scalar also counts as an anchor and
/// receives its own copy of `value`; containers only anchor at their own
/// index.
///
/// # Errors
///
/// - [`Error::ForbiddenPath`] if the path has a reserved segment.
/// - [`Error::InvalidTarget`] if the parent is not a sequence or has no
///   element at `path`.
pub fn insert(
    doc: &mut Value,
    path: &str,
    value: Value,
    placement: Placement,
) -> Result<()> {
    path::ensure_allowed(path)?;
    let anchor_segment = path::last_segment(path);

    let items = match path::parent(path) {
        Some(parent) => path::resolve_mut(doc, parent)?,
        None => Some(doc),
    };
    let Some(Value::Array(items)) = items else {
        return Err(Error::InvalidTarget(format!(
            "the parent of `{path}` is not a sequence"
        )));
    };
    let Some(anchor_index) = path::parse_index(anchor_segment)
        .filter(|&index| index < items.len())
    else {
        return Err(Error::InvalidTarget(format!(
            "nothing to insert next to at `{path}`"
        )));
    };

    let anchor = items[anchor_index].clone();
    let is_anchor = |index: usize, item: &Value| {
        index == anchor_index
            || (!matches!(item, Value::Object(_) | Value::Array(_))
                && strict_eq(item, &anchor))
    };

    let old = std::mem::take(items);
    let mut rebuilt = Vec::with_capacity(old.len() + 1);
    for (index, item) in old.into_iter().enumerate() {
        let anchored = is_anchor(index, &item);
        if anchored && placement == Placement::Before {
            rebuilt.push(value.clone());
        }
        rebuilt.push(item);
        if anchored && placement == Placement::After {
            rebuilt.push(value.clone());
        }
    }
    *items = rebuilt;

    log::debug!("inserted value {placement:?} `{path}`");
    Ok(())
}

/// Inserts `value` next to each element named in `paths`.
///
/// Anchors are visited deepest first and from the highest index down, so an
/// insertion never shifts an anchor still waiting its turn. Repeated paths
/// count once. Either every insertion succeeds or the document is left
/// untouched.
///
/// # Errors
///
/// As [`insert`], for the first path that fails.
pub fn insert_all(
    doc: &mut Value,
    paths: &[impl AsRef<str>],
    value: &Value,
    placement: Placement,
) -> Result<()> {
    let mut anchors: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
    for anchor in &anchors {
        path::ensure_allowed(anchor)?;
    }
    anchors.sort_by(|a, b| path::cmp_paths(b, a));
    anchors.dedup();

    let mut working = doc.clone();
    for anchor in anchors {
        insert(&mut working, anchor, value.clone(), placement)?;
    }
    *doc = working;
    Ok(())
}

/// Removes the value at `path`.
///
/// When the final segment is a sequence index, the sequence is compacted
/// afterwards: falsy slots (`null`, `false`, `0`, `""`) are dropped so
/// indices stay contiguous.
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] if the path has a reserved segment.
pub fn remove(doc: &mut Value, path: &str) -> Result<()> {
    remove_all(doc, &[path])
}

/// Removes the value at every path in `paths`, e.g. all results of a find.
///
/// Every path addresses the document as it was before the call. Values are
/// first cleared in place, then each affected sequence is compacted once,
/// innermost first.
///
/// # Errors
///
/// Returns [`Error::ForbiddenPath`] if any path has a reserved segment, in
/// which case nothing is removed.
pub fn remove_all(doc: &mut Value, paths: &[impl AsRef<str>]) -> Result<()> {
    for path in paths {
        path::ensure_allowed(path.as_ref())?;
    }

    let mut sequences = Vec::new();
    for path in paths {
        let path = path.as_ref();
        path::remove(doc, path)?;
        if path::is_index(path::last_segment(path)) {
            sequences.push(path::parent(path));
        }
        log::debug!("removed `{path}`");
    }

    // The root has no parent path and is compacted last.
    sequences.sort_by(|a, b| match (a, b) {
        (Some(a), Some(b)) => path::cmp_paths(b, a),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    });
    sequences.dedup();
    for sequence in sequences {
        compact(doc, sequence)?;
    }
    Ok(())
}

/// Drops the falsy slots of the sequence at `path` (the root for `None`).
fn compact(doc: &mut Value, path: Option<&str>) -> Result<()> {
    let target = match path {
        Some(path) => path::resolve_mut(doc, path)?,
        None => Some(doc),
    };
    if let Some(Value::Array(items)) = target {
        let before = items.len();
        items.retain(|item| !is_falsy(item));
        log::trace!("compacted {} slot(s)", before - items.len());
    }
    Ok(())
}

/// `null`, `false`, zero, and the empty string.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => {
            n.as_f64().is_some_and(|f| f.classify() == FpCategory::Zero)
        }
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// The edit an [`UpdateInstruction`] makes.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Set the field to this value, creating it if needed.
    Literal(Value),
    /// If the field equals `src[i]`, replace it with `dst[i]` for the first
    /// such `i`; otherwise leave it alone.
    Substitute {
        /// Values to look for.
        src: Vec<Value>,
        /// Replacement for the value at the same position in `src`.
        dst: Vec<Value>,
    },
}

/// A field-level edit: `{ "keyName": ..., "type": "normal", "value": ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInstruction {
    key_name: String,
    value: UpdateValue,
}

#[derive(Deserialize)]
struct RawInstruction {
    #[serde(rename = "keyName")]
    key_name: String,
    #[serde(rename = "type", default = "normal_type")]
    kind: String,
    #[serde(default)]
    value: Value,
}

fn normal_type() -> String {
    "normal".into()
}

#[derive(Deserialize)]
struct RawSubstitution {
    src: Vec<Value>,
    dst: Vec<Value>,
}

impl UpdateInstruction {
    /// Sets `key_name` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for a malformed key name and
    /// [`Error::ForbiddenPath`] for a reserved one.
    pub fn set(key_name: impl Into<String>, value: Value) -> Result<Self> {
        Self::new(key_name.into(), UpdateValue::Literal(value))
    }

    /// Replaces `src[i]` with `dst[i]` at `key_name`.
    ///
    /// # Errors
    ///
    /// As [`UpdateInstruction::set`], plus [`Error::InvalidArguments`] if
    /// `src` and `dst` differ in length.
    pub fn substitute(
        key_name: impl Into<String>,
        src: Vec<Value>,
        dst: Vec<Value>,
    ) -> Result<Self> {
        if src.len() != dst.len() {
            return Err(Error::InvalidArguments(format!(
                "src has {} value(s) but dst has {}",
                src.len(),
                dst.len()
            )));
        }
        Self::new(key_name.into(), UpdateValue::Substitute { src, dst })
    }

    fn new(key_name: String, value: UpdateValue) -> Result<Self> {
        path::validate(&key_name)?;
        path::ensure_allowed(&key_name)?;
        Ok(Self { key_name, value })
    }

    /// Parses one instruction from its JSON form. A `value` object carrying
    /// a `src` key is a substitution; anything else is a literal.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] for a malformed instruction or a `type`
    /// other than `normal`; otherwise as [`UpdateInstruction::substitute`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawInstruction::deserialize(value).map_err(|e| {
            Error::InvalidArguments(format!("malformed update instruction: {e}"))
        })?;
        if raw.kind != "normal" {
            return Err(Error::InvalidArguments(format!(
                "unsupported update type `{}`",
                raw.kind
            )));
        }
        match raw.value {
            Value::Object(ref map) if map.contains_key("src") => {
                let RawSubstitution { src, dst } =
                    RawSubstitution::deserialize(&raw.value).map_err(|e| {
                        Error::InvalidArguments(format!(
                            "substitutions take src and dst arrays: {e}"
                        ))
                    })?;
                Self::substitute(raw.key_name, src, dst)
            }
            literal => Self::set(raw.key_name, literal),
        }
    }

    /// Parses a JSON array of instructions.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] unless `value` is a non-empty array of
    /// valid instructions.
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(items) if !items.is_empty() => {
                items.iter().map(Self::from_value).collect()
            }
            _ => Err(Error::InvalidArguments(
                "expected a non-empty array of update instructions".into(),
            )),
        }
    }

    /// The field (or dot-notation path) this instruction edits.
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// The edit itself.
    #[must_use]
    pub const fn value(&self) -> &UpdateValue {
        &self.value
    }

    /// Applies the instruction to `target`, returning whether it changed.
    fn apply(&self, target: &mut Value) -> Result<bool> {
        match &self.value {
            UpdateValue::Literal(value) => {
                path::assign(target, &self.key_name, value.clone())?;
                Ok(true)
            }
            UpdateValue::Substitute { src, dst } => {
                let replacement = path::resolve(target, &self.key_name)?
                    .and_then(|current| {
                        src.iter().position(|from| strict_eq(from, current))
                    })
                    .map(|i| dst[i].clone());
                match replacement {
                    Some(replacement) => {
                        path::assign(target, &self.key_name, replacement)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }
}

/// Applies `instructions` in order to the node at `path`.
///
/// Each instruction sees the results of the ones before it. The edits are
/// made on a copy of the node, which replaces the original only once every
/// instruction succeeded and at least one changed something. A missing node
/// starts out as an empty mapping.
///
/// # Errors
///
/// - [`Error::InvalidArguments`] if `instructions` is empty.
/// - [`Error::ForbiddenPath`] if the path has a reserved segment.
/// - [`Error::InvalidPath`] if an instruction's key cannot be written.
pub fn update(
    doc: &mut Value,
    path: &str,
    instructions: &[UpdateInstruction],
) -> Result<()> {
    if instructions.is_empty() {
        return Err(Error::InvalidArguments(
            "update needs at least one instruction".into(),
        ));
    }

    let mut target = path::resolve(doc, path)?
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let mut changed = false;
    for instruction in instructions {
        changed |= instruction.apply(&mut target)?;
    }

    if changed {
        path::assign(doc, path, target)?;
    }
    log::debug!(
        "applied {} instruction(s) at `{path}` (changed: {changed})",
        instructions.len()
    );
    Ok(())
}

/// Applies `instructions` to the node at every path in `paths`.
///
/// The paths are edited in the order given, on a copy of the document that
/// replaces it only once every path succeeded.
///
/// # Errors
///
/// As [`update`], for the first path that fails.
pub fn update_all(
    doc: &mut Value,
    paths: &[impl AsRef<str>],
    instructions: &[UpdateInstruction],
) -> Result<()> {
    if instructions.is_empty() {
        return Err(Error::InvalidArguments(
            "update needs at least one instruction".into(),
        ));
    }
    for path in paths {
        path::ensure_allowed(path.as_ref())?;
    }

    let mut working = doc.clone();
    for path in paths {
        update(&mut working, path.as_ref(), instructions)?;
    }
    *doc = working;
    Ok(())
}
