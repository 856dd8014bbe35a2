//! Integration tests for the public `jsonorm` API.
use jsonorm::path;
use jsonorm::{Error, Placement, Query, Session, UpdateInstruction};
use serde_json::{Value, json};

fn users() -> Session {
    Session::open("tests/data/users.json").expect("fixture loads")
}

fn query(value: &Value) -> Query {
    Query::from_value(value).expect("valid query")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_then_resolve() {
        let mut doc = json!({ "x": 1 });
        path::assign(&mut doc, "a.b.c", json!([1, 2])).unwrap();
        assert_eq!(path::resolve(&doc, "a.b.c").unwrap(), Some(&json!([1, 2])));
        assert_eq!(doc["x"], 1);
    }

    #[test]
    fn reserved_segments_are_forbidden() {
        let mut session = users();
        for bad in ["__proto__.x", "constructor.prototype.x", "users.0.prototype"] {
            assert!(
                matches!(session.get_object(bad), Err(Error::ForbiddenPath(_))),
                "read of {bad}"
            );
            assert!(
                matches!(
                    session.set_object(bad, json!(true)),
                    Err(Error::ForbiddenPath(_))
                ),
                "write of {bad}"
            );
            assert!(matches!(session.remove(bad), Err(Error::ForbiddenPath(_))));
        }
        assert_eq!(session.document().unwrap(), users().document().unwrap());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut doc = json!({ "a": { "b": 1, "c": 2 } });
        assert!(path::remove(&mut doc, "a.b").unwrap());
        let after_first = doc.clone();
        assert!(path::remove(&mut doc, "a.b").unwrap());
        assert!(path::remove(&mut doc, "missing.b").unwrap());
        assert_eq!(doc, after_first);
        assert_eq!(doc, json!({ "a": { "c": 2 } }));
    }

    #[test]
    fn remove_compacts_sequences() {
        let mut session = users();
        session.remove("tags.1").unwrap();
        assert_eq!(session.get_object("tags").unwrap(), Some(&json!(["a", "c"])));

        session.remove("users.0").unwrap();
        let names: Vec<_> = session.document().unwrap()["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["name"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["Bob", "Carol"]);
    }

    #[test]
    fn eval_gt_finds_older_users() {
        let session = Session::from_value(json!({
            "users": [{ "name": "Alice", "age": 25 }, { "name": "Bob", "age": 35 }]
        }))
        .unwrap();
        let gt = query(&json!({
            "keyName": "age", "type": "eval", "value": { "op": "gt", "operand": 25 }
        }));
        assert_eq!(session.find(&gt).unwrap(), ["users.1"]);
    }

    #[test]
    fn and_intersects_or_unites() {
        let session = users();
        let paris = json!({ "keyName": "address.city", "type": "normal", "value": "Paris" });
        let older = json!({
            "keyName": "age", "type": "eval", "value": { "op": "gte", "operand": 35 }
        });

        let both = query(&json!({ "and": [paris, older] }));
        assert_eq!(session.find(&both).unwrap(), ["users.2"]);

        let either = query(&json!({ "or": [paris, older] }));
        let mut found = session.find(&either).unwrap();
        found.sort();
        assert_eq!(found, ["users.0", "users.1", "users.2"]);
    }

    #[test]
    fn batch_is_an_unfiltered_union() {
        let session = users();
        let batch = query(&json!([
            { "keyName": "name", "type": "normal", "value": "Alice" },
            { "keyName": "count", "type": "normal", "value": 3 },
            { "keyName": "name", "type": "normal", "value": "Alice" }
        ]));
        assert_eq!(session.find(&batch).unwrap(), ["users.0", "meta"]);
    }

    #[test]
    fn regex_conditions() {
        let session = users();
        let unsafe_pattern = json!({ "keyName": "email", "type": "regexp", "value": "^(a+)+" });
        assert!(matches!(
            Query::from_value(&unsafe_pattern),
            Err(Error::UnsafePattern(_))
        ));

        let test_at = query(&json!({ "keyName": "email", "type": "regexp", "value": "^test@" }));
        assert_eq!(session.find(&test_at).unwrap(), ["users.1"]);
    }

    #[test]
    fn insert_before_places_value() {
        let mut session = users();
        let before = session.get_object("users").unwrap().unwrap().clone();

        session
            .insert("users.1", json!({ "name": "Dave" }), Placement::Before)
            .unwrap();
        let users = session.get_object("users").unwrap().unwrap().as_array().unwrap();
        assert_eq!(users.len(), before.as_array().unwrap().len() + 1);
        assert_eq!(users[1], json!({ "name": "Dave" }));
        assert_eq!(users[2], before[1]);
    }

    #[test]
    fn failed_insert_leaves_document() {
        let mut session = users();
        let original = session.document().unwrap().clone();
        assert!(matches!(
            session.insert("meta.count", json!(1), Placement::After),
            Err(Error::InvalidTarget(_))
        ));
        assert!(matches!(
            session.insert("tags.9", json!("z"), Placement::After),
            Err(Error::InvalidTarget(_))
        ));
        assert_eq!(session.document().unwrap(), &original);
    }

    #[test]
    fn update_substitutes_matching_values() {
        let mut session = users();
        let swap = UpdateInstruction::list_from_value(&json!([
            { "keyName": "o", "value": { "src": [3], "dst": [4] } }
        ]))
        .unwrap();

        session.update("meta", &swap).unwrap();
        assert_eq!(session.get_object("meta.o").unwrap(), Some(&json!(4)));

        // 4 is not in src, so a second pass changes nothing.
        session.update("meta", &swap).unwrap();
        assert_eq!(session.get_object("meta.o").unwrap(), Some(&json!(4)));
        assert_eq!(session.get_object("meta.count").unwrap(), Some(&json!(3)));
    }

    #[test]
    fn update_requires_instructions() {
        let mut session = users();
        assert!(matches!(
            session.update("meta", &[]),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            UpdateInstruction::list_from_value(&json!({})),
            Err(Error::InvalidArguments(_))
        ));
    }

    #[test]
    fn operations_need_a_document() {
        let mut session = Session::new();
        let any = query(&json!({ "keyName": "a", "type": "normal", "value": "*" }));
        let set = [UpdateInstruction::set("a", json!(1)).unwrap()];

        assert!(matches!(session.find(&any), Err(Error::NotLoaded)));
        assert!(matches!(session.update("a", &set), Err(Error::NotLoaded)));
        assert!(matches!(
            session.insert("a.0", json!(1), Placement::Before),
            Err(Error::NotLoaded)
        ));
        assert!(matches!(session.remove("a"), Err(Error::NotLoaded)));
        assert!(matches!(
            session.save("unused.json"),
            Err(Error::NotLoaded)
        ));
    }

    #[test]
    fn depth_ceiling_aborts_search() {
        let mut doc = json!({ "leaf": true });
        for _ in 0..150 {
            doc = json!({ "n": doc });
        }
        let session = Session::from_value(doc).unwrap();
        let leaf = query(&json!({ "keyName": "leaf", "type": "normal", "value": true }));
        assert!(matches!(session.find(&leaf), Err(Error::DepthExceeded(100))));
    }

    #[test]
    fn saved_documents_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out").join("users.json");

        let mut session = users();
        session.set_object("meta.saved", json!(true)).unwrap();
        session.save(&file).unwrap();

        let reloaded = Session::open(&file).unwrap();
        assert_eq!(reloaded.document().unwrap(), session.document().unwrap());
    }

    #[test]
    fn rejected_files() {
        let mut session = users();
        assert!(matches!(
            session.load("tests/data/missing.json"),
            Err(Error::Io { .. })
        ));
        assert!(matches!(
            session.load("Cargo.toml"),
            Err(Error::InvalidFile { .. })
        ));
        // A failed load keeps the current document.
        assert!(session.get_object("users.0").unwrap().is_some());
    }
}
