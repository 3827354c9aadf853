//! Resource list - the authoritative client-side view of one paginated collection.
//!
//! A [`ResourceList`] owns the rows for one resource type and is the only
//! writer of them. Every fetch is stamped with a generation token; a
//! response that completes after a newer fetch was issued is dropped, so
//! the rows on screen always belong to the most recent intent (page change,
//! filter, committed search or refresh).
//!
//! ## Example
//!
//! ```ignore
//! use console_sync::{InMemoryTransport, ResourceList, SyncConfig};
//! use console_sync::resources::Landmark;
//!
//! let list = ResourceList::<Landmark, _>::new(Arc::new(transport), &SyncConfig::default());
//! list.refresh().await;
//! list.apply_filter("city", Some("rome".into())).await;
//! list.input_search("colos"); // committed after the search delay
//! ```

mod controller;
mod state;

pub use controller::ResourceList;
pub use state::{ListSnapshot, LoadOutcome};
