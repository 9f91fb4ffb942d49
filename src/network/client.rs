//! Phonebook Client
//!
//! Blocking UDP client used by the CLI and by tests.

use std::io::ErrorKind;
use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;

use crate::directory::Operation;
use crate::error::{PhonebookError, Result};
use crate::protocol::{decode_message, encode_message, Message, MESSAGE_SIZE};

/// Identity used before a successful login
pub const ANONYMOUS_CLIENT: &str = "user";

/// Client for a phonebook server
pub struct Client {
    socket: UdpSocket,

    /// Identity sent with every request
    client_name: String,
}

impl Client {
    /// Create a client talking to `server`
    ///
    /// Responses that take longer than `timeout` fail with `Timeout`.
    pub fn connect(server: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let server = server
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| PhonebookError::Network("server address did not resolve".to_string()))?;

        let bind_addr = if server.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(server)?;
        socket.set_read_timeout(Some(timeout))?;

        Ok(Self {
            socket,
            client_name: ANONYMOUS_CLIENT.to_string(),
        })
    }

    /// Use `name` as the identity of subsequent requests
    pub fn with_identity(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn identity(&self) -> &str {
        &self.client_name
    }

    pub fn add_contact(&self, name: &str, number: &str) -> Result<Message> {
        self.request(Operation::AddContact, name, number)
    }

    pub fn get_contact(&self, name: &str) -> Result<Message> {
        self.request(Operation::GetContact, name, "")
    }

    pub fn remove_contact(&self, name: &str) -> Result<Message> {
        self.request(Operation::RemoveContact, name, "")
    }

    /// Log in; on success later requests are sent as `username`
    pub fn login(&mut self, username: &str, password: &str) -> Result<Message> {
        let response = self.request(Operation::Login, username, password)?;
        if response.is_accepted() {
            self.client_name = username.to_string();
        }
        Ok(response)
    }

    fn request(&self, op: Operation, name: &str, number: &str) -> Result<Message> {
        let request = Message::request(op, name, number, self.client_name.as_str());
        self.send_raw(&encode_message(&request))?;
        self.receive()
    }

    /// Send arbitrary bytes to the server
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        let sent = self.socket.send(bytes)?;
        if sent != bytes.len() {
            return Err(PhonebookError::Network(format!(
                "short send: {} of {} bytes",
                sent,
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Wait for the next response datagram
    pub fn receive(&self) -> Result<Message> {
        let mut buf = [0u8; MESSAGE_SIZE + 1];
        match self.socket.recv(&mut buf) {
            Ok(len) => decode_message(&buf[..len]),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(PhonebookError::Timeout)
            }
            Err(e) => Err(e.into()),
        }
    }
}
