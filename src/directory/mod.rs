//! Directory Service Module
//!
//! Owns the two (index, log) pairs of the service and combines index
//! mutations with log writes.
//!
//! ```text
//!              Directory
//!     ┌──────────────┴──────────────┐
//!     ▼                             ▼
//! entries: OrderedIndex<String>   credentials: OrderedIndex<Credential>
//! entry_log: DurableLog           credential_log: DurableLog
//! ```
//!
//! The directory is not synchronized; [`crate::service::PhonebookService`]
//! wraps it in a reader/writer lock.

mod credential;
mod service;
pub mod validate;

pub use credential::{Credential, Operation, Permissions};
pub use service::{Directory, Entry, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
