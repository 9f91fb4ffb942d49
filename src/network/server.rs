//! UDP Server
//!
//! Receives datagrams and dispatches them to the worker pool.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::dispatcher::{Job, WorkerPool, WorkerSlot};
use super::transport::Transport;
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{decode_message, MESSAGE_SIZE};
use crate::service::PhonebookService;

/// Requests a running server to stop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Stop assigning new work; in-flight requests still complete
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// UDP server for the phonebook service
pub struct Server {
    config: Config,
    service: Arc<PhonebookService>,
    transport: Arc<Transport>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listen socket
    pub fn bind(config: Config, service: Arc<PhonebookService>) -> Result<Self> {
        config.validate()?;

        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let transport = Transport::bind(&config.listen_addr, poll_interval)?;

        Ok(Self {
            config,
            service,
            transport: Arc::new(transport),
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle that stops [`Server::run`]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the dispatch loop (blocking) until shutdown is requested
    ///
    /// Each iteration waits for a free worker, then for a datagram. A
    /// datagram of the wrong size is dropped without a response and the
    /// worker goes back to the free set.
    pub fn run(&self) -> Result<()> {
        let pool = WorkerPool::spawn(
            self.config.workers,
            Arc::clone(&self.service),
            Arc::clone(&self.transport),
        )?;
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        // One spare byte so oversized datagrams show up as the wrong size
        let mut buf = vec![0u8; MESSAGE_SIZE + 1];

        tracing::info!("waiting for clients");

        while !self.shutdown.is_shutdown() {
            let slot = match pool.next_free(poll_interval) {
                Some(slot) => slot,
                None => continue,
            };

            let (len, peer) = match self.transport.recv(&mut buf) {
                Ok(Some(received)) => received,
                Ok(None) => {
                    pool.release(slot);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "receive failed");
                    pool.release(slot);
                    continue;
                }
            };

            match decode_message(&buf[..len]) {
                Ok(request) => {
                    dispatch(&pool, slot, Job { request, peer });
                }
                Err(e) => {
                    tracing::warn!(%peer, error = %e, "dropping datagram");
                    pool.release(slot);
                }
            }
        }

        tracing::info!("shutting down, waiting for in-flight requests");
        pool.shutdown();
        Ok(())
    }
}

/// Hand a request to a worker; a worker that cannot take it costs only that request
fn dispatch(pool: &WorkerPool, slot: WorkerSlot, job: Job) -> bool {
    let worker = slot.id();
    let peer = job.peer;
    tracing::trace!(%peer, worker, "assigning request");

    match pool.assign(slot, job) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(%peer, worker, error = %e, "dropping request");
            false
        }
    }
}
