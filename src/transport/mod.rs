//! Transport - the remote service contract every controller talks through.
//!
//! Calls speak JSON (`serde_json::Value`); typed decoding happens in the
//! controllers so that a malformed payload surfaces as
//! [`TransportError::Decode`] and is never partially applied.
//!
//! ## Implementations
//!
//! - [`InMemoryTransport`] - shared in-process backend for tests and demos
//! - `HttpTransport` - REST client over `reqwest` (requires the `http` feature)

mod in_memory;

#[cfg(feature = "http")]
mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::query::PageQuery;

pub use in_memory::{Call, InMemoryTransport};

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Remote operations consumed by the console controllers.
///
/// Paths are collection paths such as `/api/trips/`. Relationship and
/// nested-collection calls address their fixed endpoints directly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch one page: `{ "results": [...], "count": n }`.
    async fn list(&self, path: &str, query: &PageQuery) -> Result<Value, TransportError>;

    async fn get_by_id(&self, path: &str, id: &str) -> Result<Value, TransportError>;

    async fn create(&self, path: &str, body: Value) -> Result<Value, TransportError>;

    /// Replace every writable field.
    async fn update(&self, path: &str, id: &str, body: Value) -> Result<Value, TransportError>;

    /// Merge the given fields. Also the batch path for nested collections.
    async fn partial_update(
        &self,
        path: &str,
        id: &str,
        body: Value,
    ) -> Result<Value, TransportError>;

    async fn remove(&self, path: &str, id: &str) -> Result<(), TransportError>;

    async fn follow(&self, user_id: &str) -> Result<(), TransportError>;

    async fn unfollow(&self, user_id: &str) -> Result<(), TransportError>;

    async fn like(&self, record_id: &str) -> Result<(), TransportError>;

    async fn unlike(&self, record_id: &str) -> Result<(), TransportError>;

    /// Stops of one itinerary, either a bare array or a page envelope.
    async fn list_nested(&self, parent_id: &str) -> Result<Value, TransportError>;

    async fn remove_nested(&self, item_id: &str) -> Result<(), TransportError>;
}
