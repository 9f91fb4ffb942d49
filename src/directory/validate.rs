//! Field validation
//!
//! Keeps reserved log bytes out of names and enforces the field sizes of
//! the wire format.

use crate::error::{PhonebookError, Result};
use crate::log::{NEWLINE, SEPARATOR, TOMBSTONE};

/// Longest entry name or username, in bytes
pub const MAX_NAME_LEN: usize = 63;

/// Longest phone number, in digits
pub const MAX_NUMBER_LEN: usize = 10;

/// Longest password, in digits
pub const MAX_PASSWORD_LEN: usize = 7;

/// Entry names and usernames: 1..=63 bytes, no `;`, `|`, newline or NUL
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(PhonebookError::InvalidField(format!(
            "name must be 1 to {} bytes long",
            MAX_NAME_LEN
        )));
    }
    if name
        .bytes()
        .any(|b| b == SEPARATOR || b == TOMBSTONE || b == NEWLINE || b == 0)
    {
        return Err(PhonebookError::InvalidField(format!(
            "name cannot contain '{}' or '{}'",
            SEPARATOR as char, TOMBSTONE as char
        )));
    }
    Ok(())
}

/// Phone numbers: 1..=10 ASCII digits
pub fn validate_number(number: &str) -> Result<()> {
    validate_digits("number", number, MAX_NUMBER_LEN)
}

/// Passwords: 1..=7 ASCII digits
pub fn validate_password(password: &str) -> Result<()> {
    validate_digits("password", password, MAX_PASSWORD_LEN)
}

fn validate_digits(what: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() || value.len() > max_len {
        return Err(PhonebookError::InvalidField(format!(
            "{} must be 1 to {} digits long",
            what, max_len
        )));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PhonebookError::InvalidField(format!("{} can only contain digits", what)));
    }
    Ok(())
}
