/*!
# Document Files

Loads and saves whole documents as `.json` files, bounded to
[`MAX_DOCUMENT_BYTES`]. I/O failures ([`Error::Io`]) are reported separately
from malformed JSON ([`Error::Syntax`]).
*/
use memmap2::Mmap;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Component, Path};

use crate::error::{Error, Result};
use crate::limits::MAX_DOCUMENT_BYTES;

/// Reads and parses the document stored at `path`.
///
/// # Errors
///
/// - [`Error::InvalidFile`] if the name has a null byte or does not end in
///   `.json`.
/// - [`Error::Io`] if the file is missing or unreadable.
/// - [`Error::TooLarge`] if the file exceeds [`MAX_DOCUMENT_BYTES`].
/// - [`Error::Syntax`] if the contents are not valid JSON.
/// - [`Error::InvalidInput`] if the root is not a mapping or sequence.
pub fn load(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    check_file_name(path)?;

    let io_error = |source| Error::Io { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(io_error)?;
    let size = file.metadata().map_err(io_error)?.len();
    if size > MAX_DOCUMENT_BYTES {
        return Err(Error::TooLarge { size, limit: MAX_DOCUMENT_BYTES });
    }

    let parsed = if size == 0 {
        serde_json::from_slice(&[])
    } else {
        // SAFETY: the map is read-only and dropped before this function
        // returns; truncation by another process surfaces as a read error.
        let map = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        serde_json::from_slice(&map)
    };
    let document: Value = parsed
        .map_err(|source| Error::Syntax { path: path.to_path_buf(), source })?;

    if !matches!(document, Value::Object(_) | Value::Array(_)) {
        return Err(Error::InvalidInput(format!(
            "{} does not hold a JSON object or array",
            path.display()
        )));
    }
    log::debug!("loaded {} ({size} bytes)", path.display());
    Ok(document)
}

/// Writes `document` to `path` as pretty-printed JSON, creating missing
/// parent directories.
///
/// # Errors
///
/// - [`Error::InvalidFile`] if the name has a null byte, a `..` component,
///   or does not end in `.json`.
/// - [`Error::TooLarge`] if the serialized document exceeds
///   [`MAX_DOCUMENT_BYTES`].
/// - [`Error::Io`] if the directories or the file cannot be written.
pub fn save(document: &Value, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    check_file_name(path)?;
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::InvalidFile {
            path: path.to_path_buf(),
            reason: "parent directory components are not allowed",
        });
    }

    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|source| Error::Syntax { path: path.to_path_buf(), source })?;
    let size = bytes.len() as u64;
    if size > MAX_DOCUMENT_BYTES {
        return Err(Error::TooLarge { size, limit: MAX_DOCUMENT_BYTES });
    }

    let io_error = |source| Error::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, bytes).map_err(io_error)?;
    log::debug!("saved {} ({size} bytes)", path.display());
    Ok(())
}

fn check_file_name(path: &Path) -> Result<()> {
    let reason = if path.as_os_str().as_encoded_bytes().contains(&0) {
        "null bytes are not allowed"
    } else if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        "only .json files are supported"
    } else {
        return Ok(());
    };
    Err(Error::InvalidFile { path: path.to_path_buf(), reason })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("deeper").join("doc.json");
        let doc = json!({ "Id": 100_751, "items": [1, 2, { "a": null }] });

        save(&doc, &file).unwrap();
        assert!(file.exists());
        assert_eq!(load(&file).unwrap(), doc);

        let text = fs::read_to_string(&file).unwrap();
        assert!(text.starts_with("{\n  \"Id\""));
    }

    #[test]
    fn rejects_bad_file_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["README.md", "doc", "doc.json.bak"] {
            assert!(matches!(
                load(dir.path().join(name)),
                Err(Error::InvalidFile { .. })
            ));
        }
        assert!(matches!(
            save(&json!({}), dir.path().join("a\0b.json")),
            Err(Error::InvalidFile { .. })
        ));
        assert!(matches!(
            save(&json!({}), dir.path().join("..").join("escape.json")),
            Err(Error::InvalidFile { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("test2.json")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn syntax_errors_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ \"a\": ").unwrap();
        assert!(matches!(load(&broken), Err(Error::Syntax { .. })));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "").unwrap();
        assert!(matches!(load(&empty), Err(Error::Syntax { .. })));
    }

    #[test]
    fn scalar_documents_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let scalar = dir.path().join("scalar.json");
        fs::write(&scalar, "42").unwrap();
        assert!(matches!(load(&scalar), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn oversized_documents_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let limit = usize::try_from(MAX_DOCUMENT_BYTES).unwrap();
        let doc = json!({ "blob": "x".repeat(limit) });
        assert!(matches!(
            save(&doc, dir.path().join("big.json")),
            Err(Error::TooLarge { .. })
        ));
        assert!(!dir.path().join("big.json").exists());
    }
}
