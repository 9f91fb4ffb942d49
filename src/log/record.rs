//! Log record format

use crate::error::{PhonebookError, Result};

/// Separates the fields of a record
pub const SEPARATOR: u8 = b';';

/// First byte of a removed record
pub const TOMBSTONE: u8 = b'|';

/// Terminates a record
pub const NEWLINE: u8 = b'\n';

/// A well-formed record read back from a log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Byte offset of the first byte of the record
    pub offset: u64,

    /// Record fields, in write order
    pub fields: Vec<String>,
}

impl LogRecord {
    /// First field (the record key)
    pub fn name(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }
}

/// Encode fields as `f1;f2;...\n`
///
/// Rejects empty fields and fields holding a reserved byte, since either
/// would break replay.
pub fn encode_record(fields: &[&str]) -> Result<Vec<u8>> {
    if fields.is_empty() {
        return Err(PhonebookError::InvalidField("record has no fields".to_string()));
    }

    let len = fields.iter().map(|f| f.len() + 1).sum();
    let mut buf = Vec::with_capacity(len);

    for (i, field) in fields.iter().enumerate() {
        if field.is_empty() {
            return Err(PhonebookError::InvalidField(format!("field {} is empty", i)));
        }
        if field.bytes().any(|b| b == SEPARATOR || b == TOMBSTONE || b == NEWLINE) {
            return Err(PhonebookError::InvalidField(format!(
                "field {} contains a reserved byte",
                i
            )));
        }
        if i > 0 {
            buf.push(SEPARATOR);
        }
        buf.extend_from_slice(field.as_bytes());
    }
    buf.push(NEWLINE);

    Ok(buf)
}
