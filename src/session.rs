/*!
# Sessions

A [`Session`] owns one document and exposes every query and edit on it.
Operations on a session without a document fail with [`Error::NotLoaded`];
every path is checked with [`path::validate`] before the document is
touched.

```
use jsonorm::{Query, Session};
use serde_json::json;

let mut session: Session = r#"{ "users": [{ "age": 25 }, { "age": 35 }] }"#
    .parse()
    .unwrap();
let query: Query = r#"{ "keyName": "age", "type": "eval",
                        "value": { "op": "gt", "operand": 25 } }"#
    .parse()
    .unwrap();

assert_eq!(session.find(&query).unwrap(), ["users.1"]);

session.remove("users.0").unwrap();
assert_eq!(session.get_object("users.0.age").unwrap(), Some(&json!(35)));
```
*/
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::mutate::{self, Placement, UpdateInstruction};
use crate::path;
use crate::query::{Match, Query, QueryEngine, TreeFinder};
use crate::store;

/// An owned document plus the engine used to search it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    document: Option<Value>,
    finder: TreeFinder,
}

impl Session {
    /// Session without a document. Load one with [`Session::load`] or
    /// [`Session::replace`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `finder` for all subsequent queries, e.g. to lower the depth
    /// ceiling.
    #[must_use]
    pub fn with_finder(mut self, finder: TreeFinder) -> Self {
        self.finder = finder;
        self
    }

    /// Session over an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `document` is not a mapping or a
    /// sequence.
    pub fn from_value(document: Value) -> Result<Self> {
        let mut session = Self::new();
        session.replace(document)?;
        Ok(session)
    }

    /// Session over the document stored at `file`.
    ///
    /// # Errors
    ///
    /// See [`store::load`].
    pub fn open(file: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(store::load(file)?)
    }

    /// Replaces the current document with the one stored at `file`. On
    /// failure the current document is kept.
    ///
    /// # Errors
    ///
    /// See [`store::load`].
    pub fn load(&mut self, file: impl AsRef<Path>) -> Result<()> {
        self.document = Some(store::load(file)?);
        Ok(())
    }

    /// Writes the document to `file`.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], or any error of [`store::save`].
    pub fn save(&self, file: impl AsRef<Path>) -> Result<()> {
        store::save(self.document()?, file)
    }

    /// Swaps in a new document, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `document` is not a mapping or a
    /// sequence; the current document is kept.
    pub fn replace(&mut self, document: Value) -> Result<Option<Value>> {
        if !matches!(document, Value::Object(_) | Value::Array(_)) {
            return Err(Error::InvalidInput(format!(
                "expected an object or array, got {document}"
            )));
        }
        Ok(self.document.replace(document))
    }

    /// Whether a document is present.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// The current document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoaded`] if there is none.
    pub fn document(&self) -> Result<&Value> {
        self.document.as_ref().ok_or(Error::NotLoaded)
    }

    fn document_mut(&mut self) -> Result<&mut Value> {
        self.document.as_mut().ok_or(Error::NotLoaded)
    }

    /// Consumes the session, handing back its document.
    #[must_use]
    pub fn into_document(self) -> Option<Value> {
        self.document
    }

    /// Paths of every node satisfying `query`, in pre-order.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`] or [`Error::DepthExceeded`].
    pub fn find(&self, query: &Query) -> Result<Vec<String>> {
        self.finder.find(self.document()?, query)
    }

    /// Like [`Session::find`], also borrowing each matching node.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`] or [`Error::DepthExceeded`].
    pub fn find_matches(&self, query: &Query) -> Result<Vec<Match<'_>>> {
        self.finder.find_matches(self.document()?, query)
    }

    /// Applies `instructions` to the node at `path`. See [`mutate::update`].
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`], or any error of
    /// [`mutate::update`].
    pub fn update(
        &mut self,
        path: &str,
        instructions: &[UpdateInstruction],
    ) -> Result<()> {
        let document = self.document_mut()?;
        path::validate(path)?;
        mutate::update(document, path, instructions)
    }

    /// Inserts `value` next to the element at `path`. See
    /// [`mutate::insert`].
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`], or any error of
    /// [`mutate::insert`].
    pub fn insert(
        &mut self,
        path: &str,
        value: Value,
        placement: Placement,
    ) -> Result<()> {
        let document = self.document_mut()?;
        path::validate(path)?;
        mutate::insert(document, path, value, placement)
    }

    /// Removes the value at `path`, compacting its sequence. See
    /// [`mutate::remove`].
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`], or
    /// [`Error::ForbiddenPath`].
    pub fn remove(&mut self, path: &str) -> Result<()> {
        let document = self.document_mut()?;
        path::validate(path)?;
        mutate::remove(document, path)
    }

    /// Applies `instructions` at every path in `paths`. See
    /// [`mutate::update_all`].
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`] if any path is
    /// malformed, or any error of [`mutate::update_all`]. The document is
    /// unchanged on failure.
    pub fn update_all(
        &mut self,
        paths: &[impl AsRef<str>],
        instructions: &[UpdateInstruction],
    ) -> Result<()> {
        let document = self.document_mut()?;
        validate_all(paths)?;
        mutate::update_all(document, paths, instructions)
    }

    /// Inserts `value` next to every element named in `paths`. See
    /// [`mutate::insert_all`].
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`] if any path is
    /// malformed, or any error of [`mutate::insert_all`]. The document is
    /// unchanged on failure.
    pub fn insert_all(
        &mut self,
        paths: &[impl AsRef<str>],
        value: &Value,
        placement: Placement,
    ) -> Result<()> {
        let document = self.document_mut()?;
        validate_all(paths)?;
        mutate::insert_all(document, paths, value, placement)
    }

    /// Removes the value at every path in `paths`, all read against the
    /// document as it is now. Passing the result of [`Session::find`]
    /// removes every match.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`], or
    /// [`Error::ForbiddenPath`]. The document is unchanged on failure.
    pub fn remove_all(&mut self, paths: &[impl AsRef<str>]) -> Result<()> {
        let document = self.document_mut()?;
        validate_all(paths)?;
        mutate::remove_all(document, paths)
    }

    /// The value at `path`, or `None` if nothing lives there.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`], or
    /// [`Error::ForbiddenPath`].
    pub fn get_object(&self, path: &str) -> Result<Option<&Value>> {
        let document = self.document()?;
        path::validate(path)?;
        path::resolve(document, path)
    }

    /// Sets `value` at `path` and returns the updated document.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoaded`], [`Error::InvalidPath`], or
    /// [`Error::ForbiddenPath`].
    pub fn set_object(&mut self, path: &str, value: Value) -> Result<&Value> {
        let document = self.document_mut()?;
        path::validate(path)?;
        path::assign(document, path, value)?;
        Ok(document)
    }

    /// Path of the container holding `path`; empty for top-level paths.
    /// Works without a document.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] or [`Error::ForbiddenPath`].
    pub fn get_parent(&self, path: &str) -> Result<String> {
        path::validate(path)?;
        path::ensure_allowed(path)?;
        Ok(path::parent(path).unwrap_or_default().to_owned())
    }
}

fn validate_all(paths: &[impl AsRef<str>]) -> Result<()> {
    paths.iter().try_for_each(|path| path::validate(path.as_ref()))
}

impl FromStr for Session {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let document = serde_json::from_str(s)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::from_value(document)
    }
}

impl TryFrom<Value> for Session {
    type Error = Error;

    fn try_from(document: Value) -> Result<Self> {
        Self::from_value(document)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session::from_value(json!({
            "users": [
                { "name": "Alice", "age": 25 },
                { "name": "Bob", "age": 35 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn rejects_scalar_sources() {
        assert!(matches!(
            "42".parse::<Session>(),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            "{ not json".parse::<Session>(),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Session::from_value(json!("text")),
            Err(Error::InvalidInput(_))
        ));
        assert!("[1, 2]".parse::<Session>().is_ok());
    }

    #[test]
    fn empty_session_is_not_loaded() {
        let mut empty = Session::new();
        let query = Query::from_value(&json!({
            "keyName": "a", "type": "normal", "value": 1
        }))
        .unwrap();
        let set = [UpdateInstruction::set("a", json!(1)).unwrap()];

        assert!(!empty.is_loaded());
        assert!(matches!(empty.find(&query), Err(Error::NotLoaded)));
        assert!(matches!(empty.update("a", &set), Err(Error::NotLoaded)));
        assert!(matches!(
            empty.insert("a.0", json!(1), Placement::After),
            Err(Error::NotLoaded)
        ));
        assert!(matches!(empty.remove("a"), Err(Error::NotLoaded)));
        assert!(matches!(empty.get_object("a"), Err(Error::NotLoaded)));
        assert!(matches!(
            empty.set_object("a", json!(1)),
            Err(Error::NotLoaded)
        ));
        assert_eq!(empty.get_parent("a.b").unwrap(), "a");
    }

    #[test]
    fn paths_are_validated_first() {
        let mut session = session();
        for bad in ["", "users[0]", "users/0", "a\0b", "../etc"] {
            assert!(
                matches!(session.get_object(bad), Err(Error::InvalidPath(_))),
                "{bad:?}"
            );
            assert!(matches!(
                session.set_object(bad, json!(1)),
                Err(Error::InvalidPath(_))
            ));
        }
        assert!(matches!(
            session.set_object("__proto__.polluted", json!(true)),
            Err(Error::ForbiddenPath(_))
        ));
        assert!(matches!(
            session.get_parent("constructor.prototype"),
            Err(Error::ForbiddenPath(_))
        ));
    }

    #[test]
    fn set_object_returns_the_document() {
        let mut session = session();
        let doc = session.set_object("meta.count", json!(2)).unwrap();
        assert_eq!(doc["meta"], json!({ "count": 2 }));
        assert_eq!(
            session.get_object("users.1.name").unwrap(),
            Some(&json!("Bob"))
        );
        assert_eq!(session.get_object("users.7").unwrap(), None);
    }

    #[test]
    fn parents() {
        let session = Session::new();
        assert_eq!(session.get_parent("users.1.name").unwrap(), "users.1");
        assert_eq!(session.get_parent("users").unwrap(), "");
    }

    #[test]
    fn find_then_edit() {
        let mut session = session();
        let query = Query::from_value(&json!({
            "keyName": "name", "type": "regexp", "value": "^B"
        }))
        .unwrap();
        let found = session.find(&query).unwrap();
        assert_eq!(found, ["users.1"]);

        session
            .insert(&found[0], json!({ "name": "Carol" }), Placement::Before)
            .unwrap();
        assert_eq!(session.find(&query).unwrap(), ["users.2"]);

        session.remove("users.0").unwrap();
        let names: Vec<_> = session.document().unwrap()["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|user| user["name"].clone())
            .collect();
        assert_eq!(names, [json!("Carol"), json!("Bob")]);
    }

    #[test]
    fn remove_every_match() {
        let mut session = Session::from_value(json!({
            "users": [
                { "name": "Alice", "role": "admin" },
                { "name": "Bob", "role": "guest" },
                { "name": "Carol", "role": "admin" }
            ],
            "owner": { "profile": { "role": "admin" } }
        }))
        .unwrap();
        let admins = Query::from_value(&json!({
            "keyName": "role", "type": "normal", "value": "admin"
        }))
        .unwrap();

        let found = session.find(&admins).unwrap();
        assert_eq!(found, ["users.0", "users.2", "owner.profile"]);
        session.remove_all(&found).unwrap();

        assert!(session.find(&admins).unwrap().is_empty());
        assert_eq!(
            session.document().unwrap(),
            &json!({ "users": [{ "name": "Bob", "role": "guest" }], "owner": {} })
        );
    }

    #[test]
    fn multi_path_edits_validate_every_path() {
        let mut session = session();
        let before = session.document().unwrap().clone();
        let set = [UpdateInstruction::set("age", json!(1)).unwrap()];

        assert!(matches!(
            session.update_all(&["users.0", "users/1"], &set),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            session.insert_all(&["users.0", ""], &json!(1), Placement::After),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            session.remove_all(&["users.0", "users.0.constructor"]),
            Err(Error::ForbiddenPath(_))
        ));
        assert_eq!(session.document().unwrap(), &before);

        session.update_all(&["users.0", "users.1"], &set).unwrap();
        assert_eq!(session.get_object("users.1.age").unwrap(), Some(&json!(1)));

        let mut empty = Session::new();
        assert!(matches!(empty.remove_all(&["a"]), Err(Error::NotLoaded)));
    }

    #[test]
    fn replace_keeps_document_on_failure() {
        let mut session = session();
        assert!(session.replace(json!(null)).is_err());
        assert!(session.get_object("users.0").unwrap().is_some());

        let previous = session.replace(json!([])).unwrap();
        assert!(previous.is_some());
        assert_eq!(session.into_document(), Some(json!([])));
    }
}
