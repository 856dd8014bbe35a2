/*!
# `jsonorm` Library

Path-addressed queries and structural edits over in-memory JSON documents.

A document is searched with [`Query`] values made of conditions on the keys
of each node, and edited through dot-notation paths such as `users.1.name`.
Every edit either succeeds completely or leaves the document untouched, and
paths that touch reserved names such as `__proto__` are always rejected.

```
use jsonorm::{Placement, Query, Session, UpdateInstruction};
use serde_json::json;

let mut session = Session::from_value(json!({
    "users": [{ "name": "Alice", "age": 25 }, { "name": "Bob", "age": 35 }]
}))
.unwrap();

let bob: Query = r#"{ "keyName": "name", "type": "normal", "value": "Bob" }"#
    .parse()
    .unwrap();
let found = session.find(&bob).unwrap();
assert_eq!(found, ["users.1"]);

session
    .insert(&found[0], json!({ "name": "Carol" }), Placement::Before)
    .unwrap();
session
    .update("users.2", &[UpdateInstruction::set("age", json!(36)).unwrap()])
    .unwrap();
assert_eq!(session.get_object("users.2.age").unwrap(), Some(&json!(36)));
```
*/

pub mod commands;
pub mod deferred;
pub mod error;
pub mod limits;
pub mod mutate;
pub mod path;
pub mod query;
pub mod session;
pub mod store;
pub mod utils;

// Re-exports
pub use error::{Error, Result};
pub use mutate::{Placement, UpdateInstruction};
pub use query::{Condition, Op, Query};
pub use session::Session;
pub use utils::depth;
