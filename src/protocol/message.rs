//! Message definitions

use crate::directory::Operation;

/// Message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    AddContact,
    GetContact,
    RemoveContact,
    Login,
    Accepted,
    Rejected,

    /// Kind code outside the known range, kept so it can be rejected
    Unknown(u32),
}

impl MessageKind {
    /// Wire code
    pub fn code(self) -> u32 {
        match self {
            MessageKind::AddContact => 0,
            MessageKind::GetContact => 1,
            MessageKind::RemoveContact => 2,
            MessageKind::Login => 3,
            MessageKind::Accepted => 4,
            MessageKind::Rejected => 5,
            MessageKind::Unknown(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0 => MessageKind::AddContact,
            1 => MessageKind::GetContact,
            2 => MessageKind::RemoveContact,
            3 => MessageKind::Login,
            4 => MessageKind::Accepted,
            5 => MessageKind::Rejected,
            other => MessageKind::Unknown(other),
        }
    }

    /// Directory operation requested by this kind, `None` for responses
    /// and unknown kinds
    pub fn operation(self) -> Option<Operation> {
        match self {
            MessageKind::AddContact => Some(Operation::AddContact),
            MessageKind::GetContact => Some(Operation::GetContact),
            MessageKind::RemoveContact => Some(Operation::RemoveContact),
            MessageKind::Login => Some(Operation::Login),
            _ => None,
        }
    }
}

impl From<Operation> for MessageKind {
    fn from(op: Operation) -> Self {
        match op {
            Operation::AddContact => MessageKind::AddContact,
            Operation::GetContact => MessageKind::GetContact,
            Operation::RemoveContact => MessageKind::RemoveContact,
            Operation::Login => MessageKind::Login,
        }
    }
}

/// A request or response datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,

    /// Entry name, username, or response message
    pub name: String,

    /// Phone number, or password for LOGIN
    pub number: String,

    /// Identity of the requesting caller
    pub client_name: String,
}

impl Message {
    /// Build a request
    pub fn request(
        op: Operation,
        name: impl Into<String>,
        number: impl Into<String>,
        client_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: op.into(),
            name: name.into(),
            number: number.into(),
            client_name: client_name.into(),
        }
    }

    /// Build an ACCEPTED response
    pub fn accepted(message: impl Into<String>) -> Self {
        Self::response(MessageKind::Accepted, message)
    }

    /// Build a REJECTED response
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::response(MessageKind::Rejected, message)
    }

    fn response(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: message.into(),
            number: String::new(),
            client_name: String::new(),
        }
    }

    /// Attach a phone number to a response
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn is_accepted(&self) -> bool {
        self.kind == MessageKind::Accepted
    }
}
