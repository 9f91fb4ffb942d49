//! Network Module
//!
//! UDP transport, worker pool and client.
//!
//! ## Architecture
//! - Single dispatch thread owns the receive path
//! - Fixed pool of worker threads, one request each at a time
//! - Responses sent by workers through a shared, serialized send path

mod client;
mod dispatcher;
mod server;
mod transport;

pub use client::{Client, ANONYMOUS_CLIENT};
pub use dispatcher::{Job, WorkerPool, WorkerSlot, WorkerState};
pub use server::{Server, ShutdownHandle};
pub use transport::Transport;
