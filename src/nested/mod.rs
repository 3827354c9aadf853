//! Nested collections - ordered child records edited as one batch.
//!
//! A [`NestedEditor`] stages changes to the stops of one itinerary while the
//! itinerary's form is open. Nothing reaches the server until
//! [`NestedEditor::commit`]: removals of persisted stops go out as separate
//! deletions, then the remaining draft list is submitted with the parent's
//! fields in a single partial update.

mod editor;
mod item;

pub use editor::NestedEditor;
pub use item::NestedItem;
