//! Error types for the phonebook service
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PhonebookError
pub type Result<T> = std::result::Result<T, PhonebookError>;

/// Unified error type for phonebook operations
#[derive(Debug, Error)]
pub enum PhonebookError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Directory Errors
    // -------------------------------------------------------------------------
    #[error("Name already present")]
    DuplicateName,

    #[error("Name not found")]
    NotFound,

    #[error("Invalid field: {0}")]
    InvalidField(String),

    // -------------------------------------------------------------------------
    // Access Errors
    // -------------------------------------------------------------------------
    /// Unknown username or wrong password
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is known but lacks the capability for the request
    #[error("Permission denied")]
    PermissionDenied,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out waiting for a response")]
    Timeout,

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PhonebookError {
    /// Message carried in the `name` field of a Rejected response.
    ///
    /// Stays under the 63 byte limit of the wire text field.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            PhonebookError::DuplicateName => "Add contact failed",
            PhonebookError::NotFound => "Contact not found",
            PhonebookError::InvalidField(_) => "Invalid name or number",
            PhonebookError::Unauthorized(reason) if reason == WRONG_PASSWORD => "Wrong password",
            PhonebookError::Unauthorized(_) => "Username unrecognized",
            PhonebookError::PermissionDenied => "You don't have permission",
            PhonebookError::MalformedMessage(_) => "Invalid request",
            _ => "Internal server error",
        }
    }
}

/// Reason attached to `Unauthorized` when the username exists but the password differs
pub const WRONG_PASSWORD: &str = "wrong password";

/// Reason attached to `Unauthorized` when the username is not registered
pub const UNKNOWN_USER: &str = "unknown username";
