//! Resource - typed records served from a collection path.
//!
//! ## Example
//!
//! ```ignore
//! use console_sync::Resource;
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct City {
//!     #[serde(deserialize_with = "console_sync::resource::id_string")]
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! impl Resource for City {
//!     const PATH: &'static str = "/api/cities/";
//!     fn id(&self) -> &str { &self.id }
//! }
//! ```

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How an edit is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMethod {
    /// `PUT`: the body replaces every writable field.
    Full,
    /// `PATCH`: the body is merged into the stored record.
    Partial,
}

/// Trait for records that live in a remote, paginated collection.
///
/// Identity is by [`id`](Resource::id); every other field is replaceable.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path, e.g. `"/api/trips/"`. Detail paths append `{id}/`.
    const PATH: &'static str;

    const UPDATE: UpdateMethod = UpdateMethod::Partial;

    /// Field carrying an ordered child collection, submitted as one batch.
    const NESTED_FIELD: Option<&'static str> = None;

    fn id(&self) -> &str;

    /// Body sent on create and update.
    fn to_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Binary relationship edges the console can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Operator follows an account; paired with the account's follower count.
    Follow,
    /// Operator likes a place; paired with the place's like count.
    Like,
}

/// One relationship edge as seen by the current operator.
///
/// The subject is always the authenticated operator, so only the object
/// side is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub object_id: String,
    pub active: bool,
    pub counter: u64,
}

impl Edge {
    /// The edge after one flip: flag inverted, counter moved by exactly one.
    pub fn flipped(&self) -> Edge {
        let active = !self.active;
        let counter = if active {
            self.counter + 1
        } else {
            self.counter.saturating_sub(1)
        };
        Edge {
            active,
            counter,
            ..self.clone()
        }
    }
}

/// Records that carry a relationship edge.
pub trait Relatable: Resource {
    const EDGE: EdgeKind;

    fn edge(&self) -> Edge;
}

/// Deserialize an id that may arrive as a JSON string or number.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Like [`id_string`], but `null` or a missing field is `None`.
pub fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Object(map)) => match map.get("id") {
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            _ => Err(de::Error::custom("reference object without id")),
        },
        Some(other) => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}
