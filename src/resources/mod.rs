//! The console's resource catalogue.
//!
//! Each type maps one REST collection. List rows may be summarized
//! projections of the detail record, so every non-identity field is
//! defaulted when absent.

mod account;
mod city;
mod landmark;
mod message;
mod product;
mod trip;

pub use account::Account;
pub use city::City;
pub use landmark::Landmark;
pub use message::ContactMessage;
pub use product::Product;
pub use trip::{Trip, TripStatus};
