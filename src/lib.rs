//! # Phonebook
//!
//! A single-writer, multi-reader phonebook directory service with:
//! - An in-memory ordered index per collection (entries, credentials)
//! - An append-only text log per collection with in-place tombstones
//! - Username/password login granting read and/or write capability
//! - A fixed worker pool serving fixed-size UDP datagrams
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 UDP Transport (dispatch loop)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ next free worker
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Worker Pool (N threads)                      │
//! │      permission check -> operation -> response               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ RwLock: GET shared / ADD, REMOVE exclusive
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Directory                               │
//! └──────────┬───────────────────────────────────┬──────────────┘
//!            ▼                                   ▼
//!   ┌─────────────────┐                 ┌─────────────────┐
//!   │ entries index   │                 │ credential index│
//!   │ entry log       │                 │ credential log  │
//!   └─────────────────┘                 └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod directory;
pub mod index;
pub mod log;
pub mod network;
pub mod protocol;
pub mod service;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use directory::{Directory, Entry, Operation, Permissions};
pub use error::{PhonebookError, Result};
pub use service::PhonebookService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the phonebook service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
