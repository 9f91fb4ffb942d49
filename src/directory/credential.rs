//! Credential model

use std::fmt;
use std::str::FromStr;

use crate::error::{PhonebookError, Result};

/// Operations a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddContact,
    GetContact,
    RemoveContact,
    Login,
}

impl Operation {
    /// Whether the operation mutates the directory
    pub fn is_write(self) -> bool {
        matches!(self, Operation::AddContact | Operation::RemoveContact)
    }
}

/// Capabilities granted to a username
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
}

impl Permissions {
    pub const READ: Permissions = Permissions { read: true, write: false };
    pub const WRITE: Permissions = Permissions { read: false, write: true };
    pub const READ_WRITE: Permissions = Permissions { read: true, write: true };

    /// Whether these permissions allow `op`
    ///
    /// Login needs no capability; get needs read; add and remove need write.
    pub fn allows(self, op: Operation) -> bool {
        match op {
            Operation::Login => true,
            Operation::GetContact => self.read,
            Operation::AddContact | Operation::RemoveContact => self.write,
        }
    }

    /// On-disk form: `R`, `W` or `RW`
    pub fn as_str(self) -> &'static str {
        match (self.read, self.write) {
            (true, true) => "RW",
            (true, false) => "R",
            (false, true) => "W",
            (false, false) => "",
        }
    }
}

impl FromStr for Permissions {
    type Err = PhonebookError;

    /// Only `R`, `W` and `RW` (in that order) are accepted
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "R" => Ok(Permissions::READ),
            "W" => Ok(Permissions::WRITE),
            "RW" => Ok(Permissions::READ_WRITE),
            other => Err(PhonebookError::InvalidField(format!(
                "permissions must be R, W or RW, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value stored in the credential index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub password: String,
    pub permissions: Permissions,
}
