//! UDP Transport
//!
//! One datagram per request and per response. The receive path belongs to
//! the dispatch loop; the send path is shared by every worker and
//! serialized by `send_lock`.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{PhonebookError, Result};
use crate::protocol::{encode_message, Message};

/// Server side of the UDP transport
pub struct Transport {
    socket: UdpSocket,

    /// Serializes outbound sends
    send_lock: Mutex<()>,
}

impl Transport {
    /// Bind the server socket
    ///
    /// `poll_interval` bounds how long a receive blocks, so the dispatch loop
    /// can notice a shutdown request.
    pub fn bind(addr: &str, poll_interval: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(poll_interval))?;

        tracing::info!(addr = %socket.local_addr()?, "socket ready");

        Ok(Self {
            socket,
            send_lock: Mutex::new(()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive one datagram into `buf`
    ///
    /// Returns `None` when the poll interval elapses without traffic.
    pub fn recv(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, peer)) => Ok(Some((len, peer))),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Send a response to `peer`
    pub fn send(&self, message: &Message, peer: SocketAddr) -> Result<()> {
        let bytes = encode_message(message);

        let _guard = self.send_lock.lock();
        let sent = self.socket.send_to(&bytes, peer)?;
        if sent != bytes.len() {
            return Err(PhonebookError::Network(format!(
                "short send to {}: {} of {} bytes",
                peer,
                sent,
                bytes.len()
            )));
        }

        tracing::trace!(%peer, kind = message.kind.code(), "sent response");
        Ok(())
    }
}
