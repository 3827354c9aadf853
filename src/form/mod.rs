//! Form session - one create, edit or view workflow over a single record.
//!
//! ```text
//! Closed -> Opening -> Open -> Submitting -> Closed(Committed | Uncertain)
//!                        \-> Closed(Cancelled)
//! ```
//!
//! Opening an edit or view fetches the full record; when that fails the
//! list row is used instead. A successful submit closes the session and
//! refreshes the list. A 5xx closes and refreshes as well, since the write
//! may have landed. A 4xx keeps the session open with the server's field
//! messages attached.
//!
//! Deletion is a separate two-step flow: `request_delete`, then
//! `confirm_delete` or `cancel_delete`.
//!
//! ## Example
//!
//! ```ignore
//! let form = FormSession::new(trips.clone());
//! form.open_edit(row).await?;
//! form.edit_draft(|trip| trip.title = "Rome in spring".into())?;
//! form.edit_nested(|stops| stops.remove("s2"))?;
//! match form.submit().await {
//!     Ok(SubmitOutcome::Committed(_)) => {}
//!     Ok(SubmitOutcome::Uncertain(err)) => log::warn!("saved?: {}", err),
//!     Err(err) => show_inline(form.field_errors(), err),
//! }
//! ```

mod session;
mod state;

pub use session::FormSession;
pub use state::{CloseReason, DeleteOutcome, FormMode, FormStatus, SubmitOutcome};
