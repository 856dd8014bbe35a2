/*!
# Deferred Operations

Completion-returning forms of the [`Session`] operations, for callers that
compose with `async` code. Each `*_async` method runs its synchronous
counterpart to completion and hands back an already-resolved
[`Ready`] future holding the very same [`Result`]; nothing is
scheduled and nothing runs concurrently.

```
use jsonorm::Session;

# block_on_ready(async {
let mut session: Session = r#"{ "a": { "b": 1 } }"#.parse().unwrap();
session.set_object_async("a.c", serde_json::json!(2)).await.unwrap();
assert_eq!(session.get_parent_async("a.c").await.unwrap(), "a");
# });
# fn block_on_ready(f: impl std::future::Future<Output = ()>) {
#     let mut f = std::pin::pin!(f);
#     let waker = std::task::Waker::noop();
#     let mut cx = std::task::Context::from_waker(waker);
#     assert!(f.as_mut().poll(&mut cx).is_ready());
# }
```
*/
use serde_json::Value;
use std::future::{Ready, ready};
use std::path::Path;

use crate::error::Result;
use crate::mutate::{Placement, UpdateInstruction};
use crate::query::Query;
use crate::session::Session;

/// Generates `name_async` wrappers that resolve immediately with the result
/// of the synchronous method.
macro_rules! deferred {
    (
        shared {
            $( $(#[$s_meta:meta])*
               $s_async:ident => $s_sync:ident($($s_arg:ident: $s_ty:ty),*) -> $s_ret:ty; )*
        }
        exclusive {
            $( $(#[$x_meta:meta])*
               $x_async:ident => $x_sync:ident($($x_arg:ident: $x_ty:ty),*) -> $x_ret:ty; )*
        }
    ) => {
        impl Session {
            $(
                $(#[$s_meta])*
                #[doc = concat!("Deferred form of [`Session::", stringify!($s_sync), "`].")]
                pub fn $s_async(&self, $($s_arg: $s_ty),*) -> Ready<$s_ret> {
                    ready(self.$s_sync($($s_arg),*))
                }
            )*
            $(
                $(#[$x_meta])*
                #[doc = concat!("Deferred form of [`Session::", stringify!($x_sync), "`].")]
                pub fn $x_async(&mut self, $($x_arg: $x_ty),*) -> Ready<$x_ret> {
                    ready(self.$x_sync($($x_arg),*))
                }
            )*
        }
    };
}

deferred! {
    shared {
        find_async => find(query: &Query) -> Result<Vec<String>>;
        get_object_async => get_object(path: &str) -> Result<Option<&Value>>;
        get_parent_async => get_parent(path: &str) -> Result<String>;
        save_async => save(file: impl AsRef<Path>) -> Result<()>;
    }
    exclusive {
        update_async => update(
            path: &str,
            instructions: &[UpdateInstruction]
        ) -> Result<()>;
        insert_async => insert(
            path: &str,
            value: Value,
            placement: Placement
        ) -> Result<()>;
        remove_async => remove(path: &str) -> Result<()>;
        update_all_async => update_all(
            paths: &[impl AsRef<str>],
            instructions: &[UpdateInstruction]
        ) -> Result<()>;
        insert_all_async => insert_all(
            paths: &[impl AsRef<str>],
            value: &Value,
            placement: Placement
        ) -> Result<()>;
        remove_all_async => remove_all(paths: &[impl AsRef<str>]) -> Result<()>;
        set_object_async => set_object(
            path: &str,
            value: Value
        ) -> Result<&Value>;
        load_async => load(file: impl AsRef<Path>) -> Result<()>;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn resolves_with_the_sync_result() {
        let mut session = Session::from_value(json!({
            "list": [1, 2, 3],
            "meta": { "list": "tags" }
        }))
        .unwrap();

        session
            .insert_async("list.0", json!(9), Placement::Before)
            .into_inner()
            .unwrap();
        session.remove_async("list.2").into_inner().unwrap();
        assert_eq!(
            session.get_object_async("list").into_inner().unwrap(),
            Some(&json!([9, 1, 3]))
        );

        let query = Query::from_value(&json!({
            "keyName": "list", "type": "normal", "value": "*"
        }))
        .unwrap();
        assert_eq!(session.find_async(&query).into_inner().unwrap(), ["meta"]);
    }

    #[test]
    fn rejects_with_the_sync_error() {
        let mut empty = Session::new();
        assert!(matches!(
            empty.remove_async("a").into_inner(),
            Err(Error::NotLoaded)
        ));
        assert!(matches!(
            empty.update_async("a", &[]).into_inner(),
            Err(Error::NotLoaded)
        ));

        let mut session = Session::from_value(json!({ "o": 3 })).unwrap();
        assert!(matches!(
            session.update_async("o", &[]).into_inner(),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            session.set_object_async("__proto__", json!(1)).into_inner(),
            Err(Error::ForbiddenPath(_))
        ));
    }

    #[test]
    fn multi_path_forms() {
        let mut session = Session::from_value(json!({
            "list": ["a", "b", "c"],
            "n": [{ "v": 1 }, { "v": 2 }]
        }))
        .unwrap();

        session
            .insert_all_async(&["list.0", "list.2"], &json!("x"), Placement::After)
            .into_inner()
            .unwrap();
        session
            .remove_all_async(&["list.0", "list.2"])
            .into_inner()
            .unwrap();
        assert_eq!(
            session.get_object("list").unwrap(),
            Some(&json!(["x", "c", "x"]))
        );

        let set = [UpdateInstruction::set("v", json!(0)).unwrap()];
        session
            .update_all_async(&["n.0", "n.1"], &set)
            .into_inner()
            .unwrap();
        assert_eq!(
            session.get_object("n").unwrap(),
            Some(&json!([{ "v": 0 }, { "v": 0 }]))
        );
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.json");
        let session = Session::from_value(json!({ "Id": 1 })).unwrap();
        session.save_async(&file).into_inner().unwrap();

        let mut reloaded = Session::new();
        reloaded.load_async(&file).into_inner().unwrap();
        assert_eq!(
            reloaded.get_parent_async("Id.x").into_inner().unwrap(),
            "Id"
        );
        assert_eq!(reloaded.document().unwrap(), &json!({ "Id": 1 }));
    }
}
