//! Request Service
//!
//! Executes one decoded request against the directory and builds the
//! correlated response.
//!
//! ## Concurrency Model: Multiple-Reader / Single-Writer
//!
//! The directory sits behind a `parking_lot::RwLock`:
//!
//! - **GET / LOGIN**: shared guard, any number run at once
//! - **ADD / REMOVE**: upgradable guard for the permission check (readers
//!   keep running, other writers wait), then upgraded to exclusive for the
//!   mutation, so a writer never overlaps a reader or another writer
//!
//! Every request is handled permission check -> operation -> response, in
//! that order, on the calling thread.

use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::directory::{Directory, Operation};
use crate::error::{PhonebookError, Result};
use crate::protocol::Message;

/// Message of a Rejected response to an unknown request kind
pub const INVALID_REQUEST: &str = "Invalid request";

/// Service context shared by every worker
pub struct PhonebookService {
    directory: RwLock<Directory>,
}

impl PhonebookService {
    /// Wrap an already opened directory
    pub fn new(directory: Directory) -> Self {
        Self {
            directory: RwLock::new(directory),
        }
    }

    /// Open the directory described by `config`
    pub fn bootstrap(config: &Config) -> Result<Self> {
        Ok(Self::new(Directory::bootstrap(config)?))
    }

    /// Handle a request, turning every failure into a Rejected response
    pub fn handle(&self, request: &Message) -> Message {
        let op = match request.kind.operation() {
            Some(op) => op,
            None => {
                tracing::warn!(
                    client = %request.client_name,
                    kind = request.kind.code(),
                    "invalid request kind"
                );
                return Message::rejected(INVALID_REQUEST);
            }
        };

        match self.execute(op, request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(client = %request.client_name, ?op, error = %e, "request rejected");
                Message::rejected(e.rejection_message())
            }
        }
    }

    /// Check the caller's permission and run `op`
    pub fn execute(&self, op: Operation, request: &Message) -> Result<Message> {
        tracing::debug!(
            client = %request.client_name,
            ?op,
            name = %request.name,
            "handling request"
        );

        match op {
            Operation::GetContact => {
                let directory = self.directory.read();
                ensure_permission(&directory, &request.client_name, op)?;

                let entry = directory.get_entry(&request.name)?;
                Ok(Message::accepted(entry.name).with_number(entry.number))
            }
            Operation::Login => {
                let directory = self.directory.read();
                directory.authenticate(&request.name, &request.number)?;
                Ok(Message::accepted("Logged in"))
            }
            Operation::AddContact | Operation::RemoveContact => {
                let directory = self.directory.upgradable_read();
                ensure_permission(&directory, &request.client_name, op)?;

                let mut directory = RwLockUpgradableReadGuard::upgrade(directory);
                if op == Operation::AddContact {
                    directory.add_entry(&request.name, &request.number)?;
                    tracing::info!(client = %request.client_name, name = %request.name, "added contact");
                    Ok(Message::accepted("Added contact"))
                } else {
                    directory.remove_entry(&request.name)?;
                    tracing::info!(client = %request.client_name, name = %request.name, "removed contact");
                    Ok(Message::accepted("Contact removed"))
                }
            }
        }
    }

    /// Shared access to the directory
    pub fn read(&self) -> RwLockReadGuard<'_, Directory> {
        self.directory.read()
    }

    /// Exclusive access to the directory (administration, tests)
    pub fn write(&self) -> RwLockWriteGuard<'_, Directory> {
        self.directory.write()
    }
}

fn ensure_permission(directory: &Directory, client_name: &str, op: Operation) -> Result<()> {
    if directory.has_permission(client_name, op) {
        Ok(())
    } else {
        Err(PhonebookError::PermissionDenied)
    }
}
