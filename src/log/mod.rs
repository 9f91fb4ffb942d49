//! Durable Log Module
//!
//! Append-only text record store, one file per logical collection.
//!
//! ## Responsibilities
//! - Append records and return the offset they start at
//! - Tombstone records in place without changing their length
//! - Replay the file in fixed-size blocks at startup
//!
//! ## File Format
//! ```text
//! Anna;1234567890\n            <- live entry record at offset 0
//! |ob;5550001\n                <- tombstoned record (first byte overwritten)
//! admin;0000;RW\n              <- credential record
//! ```
//! Fields are joined by `;` and a record ends at `\n`. A record whose first
//! byte is `|` has been removed. Fields never contain `;`, `|` or `\n`.

mod durable;
mod record;
mod replay;

pub use durable::DurableLog;
pub use record::{encode_record, LogRecord, NEWLINE, SEPARATOR, TOMBSTONE};
pub use replay::{LogReplay, ReplayStats, MAX_RECORD_LEN, REPLAY_BLOCK_SIZE};
