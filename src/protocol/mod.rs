//! Protocol Module
//!
//! Defines the datagram exchanged between clients and the server.
//!
//! ## Message Format (fixed 144 bytes, little-endian)
//! ```text
//! ┌──────────┬──────────────┬─────────────┬──────────────────┬─────────┐
//! │ Kind (4) │  Name (64)   │ Number (11) │ Client Name (64) │ Pad (1) │
//! └──────────┴──────────────┴─────────────┴──────────────────┴─────────┘
//! ```
//! Text fields are NUL-padded and always keep at least one NUL.
//!
//! ### Kinds
//! - 0: ADD_CONTACT    - name + number
//! - 1: GET_CONTACT    - name
//! - 2: REMOVE_CONTACT - name
//! - 3: LOGIN          - name = username, number = password
//! - 4: ACCEPTED       - name = message (or contact name), number = phone number for GET
//! - 5: REJECTED       - name = reason
//!
//! Requests and responses share the layout; `client_name` carries the
//! identity used for the permission check.

mod codec;
mod message;

pub use codec::{
    decode_message, encode_message, CLIENT_NAME_FIELD_LEN, MESSAGE_SIZE, NAME_FIELD_LEN,
    NUMBER_FIELD_LEN,
};
pub use message::{Message, MessageKind};
