//! Protocol codec
//!
//! Encoding and decoding of the fixed-size datagram.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Message, MessageKind};
use crate::error::{PhonebookError, Result};

/// Size of the `name` field
pub const NAME_FIELD_LEN: usize = 64;

/// Size of the `number` field
pub const NUMBER_FIELD_LEN: usize = 11;

/// Size of the `client_name` field
pub const CLIENT_NAME_FIELD_LEN: usize = 64;

/// Trailing alignment padding
const PAD_LEN: usize = 1;

/// Size of every datagram
pub const MESSAGE_SIZE: usize = 4 + NAME_FIELD_LEN + NUMBER_FIELD_LEN + CLIENT_NAME_FIELD_LEN + PAD_LEN;

/// Encode a message into exactly `MESSAGE_SIZE` bytes
///
/// Text longer than its field (minus the terminating NUL) is truncated at
/// a character boundary.
pub fn encode_message(message: &Message) -> Bytes {
    let mut buf = BytesMut::with_capacity(MESSAGE_SIZE);

    buf.put_u32_le(message.kind.code());
    put_text(&mut buf, &message.name, NAME_FIELD_LEN);
    put_text(&mut buf, &message.number, NUMBER_FIELD_LEN);
    put_text(&mut buf, &message.client_name, CLIENT_NAME_FIELD_LEN);
    buf.put_bytes(0, PAD_LEN);

    buf.freeze()
}

/// Decode a datagram
///
/// Anything but exactly `MESSAGE_SIZE` bytes is `MalformedMessage`.
/// Unknown kind codes decode to `MessageKind::Unknown`.
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    if bytes.len() != MESSAGE_SIZE {
        return Err(PhonebookError::MalformedMessage(format!(
            "expected {} bytes, got {}",
            MESSAGE_SIZE,
            bytes.len()
        )));
    }

    let mut buf = bytes;
    let kind = MessageKind::from_code(buf.get_u32_le());
    let name = take_text(&mut buf, NAME_FIELD_LEN);
    let number = take_text(&mut buf, NUMBER_FIELD_LEN);
    let client_name = take_text(&mut buf, CLIENT_NAME_FIELD_LEN);

    Ok(Message {
        kind,
        name,
        number,
        client_name,
    })
}

fn put_text(buf: &mut BytesMut, text: &str, field_len: usize) {
    let text = truncate_at_char_boundary(text, field_len - 1);
    buf.put_slice(text.as_bytes());
    buf.put_bytes(0, field_len - text.len());
}

fn take_text(buf: &mut &[u8], field_len: usize) -> String {
    let field = &buf[..field_len];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field_len);
    let text = String::from_utf8_lossy(&field[..end]).into_owned();
    buf.advance(field_len);
    text
}

fn truncate_at_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
