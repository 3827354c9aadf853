mod config;
mod dashboard;
mod error;
mod feed;
mod form;
mod list;
mod pagination;
mod query;
mod search;
mod session;
mod toggle;

pub mod nested;
pub mod resource;
pub mod resources;
pub mod transport;

pub use config::{ConfigError, SyncConfig};
pub use dashboard::DashboardSummary;
pub use error::{ErrorClass, FormError, TransportError};
pub use feed::{ChangeFeed, ListEvent, ListStatus, LIST_CHANGED};
pub use form::{CloseReason, DeleteOutcome, FormMode, FormSession, FormStatus, SubmitOutcome};
pub use list::{ListSnapshot, LoadOutcome, ResourceList};
pub use nested::{NestedEditor, NestedItem};
pub use pagination::{PageSummary, Pagination};
pub use query::{PageQuery, PageResult};
pub use resource::{Edge, EdgeKind, Relatable, Resource, UpdateMethod};
pub use search::SearchDebouncer;
pub use session::{Credentials, Session};
pub use toggle::{FlipOutcome, RelationshipToggle};
pub use transport::{Call, InMemoryTransport, Transport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
