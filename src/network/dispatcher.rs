//! Worker Pool
//!
//! Fixed set of worker threads fed by the dispatch loop.
//!
//! ## Worker States
//! ```text
//!        announce free            job assigned
//!   ┌──────────────────► Idle ───────────────────► Busy
//!   │                                               │
//!   └───────────────────── response sent ◄──────────┘
//! ```
//! A worker announces itself on the shared free channel when idle and then
//! blocks on its own job channel. The dispatch loop takes a free worker
//! before receiving a datagram, and hands the slot back if the datagram is
//! dropped.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use super::transport::Transport;
use crate::error::{PhonebookError, Result};
use crate::protocol::Message;
use crate::service::PhonebookService;

/// A decoded request and the address to answer
#[derive(Debug, Clone)]
pub struct Job {
    pub request: Message,
    pub peer: SocketAddr,
}

/// State of a single worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
}

/// Handle to a worker that announced itself free
#[derive(Debug, PartialEq, Eq)]
pub struct WorkerSlot(pub(super) usize);

impl WorkerSlot {
    pub fn id(&self) -> usize {
        self.0
    }
}

/// Fixed-size pool of worker threads
pub struct WorkerPool {
    job_txs: Vec<Sender<Job>>,
    free_tx: Sender<usize>,
    free_rx: Receiver<usize>,
    busy: Arc<[AtomicBool]>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers sharing the service and the transport
    pub fn spawn(
        count: usize,
        service: Arc<PhonebookService>,
        transport: Arc<Transport>,
    ) -> Result<Self> {
        if count == 0 {
            return Err(PhonebookError::Config("worker pool needs at least one worker".to_string()));
        }

        let (free_tx, free_rx) = channel::unbounded();
        let busy: Arc<[AtomicBool]> = (0..count).map(|_| AtomicBool::new(false)).collect();

        let mut pool = Self {
            job_txs: Vec::with_capacity(count),
            free_tx,
            free_rx,
            busy,
            handles: Vec::with_capacity(count),
        };

        for id in 0..count {
            let (job_tx, job_rx) = channel::bounded(1);
            let worker = Worker {
                id,
                jobs: job_rx,
                free: pool.free_tx.clone(),
                busy: Arc::clone(&pool.busy),
                service: Arc::clone(&service),
                transport: Arc::clone(&transport),
            };

            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker.run())
                .map_err(|e| {
                    PhonebookError::ResourceExhausted(format!("cannot spawn worker {}: {}", id, e))
                });

            match handle {
                Ok(handle) => {
                    pool.job_txs.push(job_tx);
                    pool.handles.push(handle);
                }
                Err(e) => {
                    pool.shutdown();
                    return Err(e);
                }
            }
        }

        tracing::info!(workers = count, "workers ready");
        Ok(pool)
    }

    /// Number of workers
    pub fn size(&self) -> usize {
        self.job_txs.len()
    }

    /// Wait up to `timeout` for a free worker
    pub fn next_free(&self, timeout: Duration) -> Option<WorkerSlot> {
        match self.free_rx.recv_timeout(timeout) {
            Ok(id) => Some(WorkerSlot(id)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Hand a job to a free worker
    pub fn assign(&self, slot: WorkerSlot, job: Job) -> Result<()> {
        let tx = self
            .job_txs
            .get(slot.0)
            .ok_or_else(|| PhonebookError::Network(format!("no worker {}", slot.0)))?;

        self.busy[slot.0].store(true, Ordering::Release);
        tx.send(job).map_err(|_| {
            self.busy[slot.0].store(false, Ordering::Release);
            PhonebookError::Network(format!("worker {} has stopped", slot.0))
        })
    }

    /// Give back a slot that received no job
    pub fn release(&self, slot: WorkerSlot) {
        let _ = self.free_tx.send(slot.0);
    }

    /// Current state of every worker
    pub fn states(&self) -> Vec<WorkerState> {
        self.busy
            .iter()
            .map(|busy| {
                if busy.load(Ordering::Acquire) {
                    WorkerState::Busy
                } else {
                    WorkerState::Idle
                }
            })
            .collect()
    }

    /// Stop accepting jobs and wait for every worker to finish its current one
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Workers exit once their job channel disconnects
        self.job_txs.clear();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop();
            tracing::info!("workers destroyed");
        }
    }
}

struct Worker {
    id: usize,
    jobs: Receiver<Job>,
    free: Sender<usize>,
    busy: Arc<[AtomicBool]>,
    service: Arc<PhonebookService>,
    transport: Arc<Transport>,
}

impl Worker {
    fn run(self) {
        loop {
            // Idle: announce availability, then wait for work
            if self.free.send(self.id).is_err() {
                break;
            }
            let job = match self.jobs.recv() {
                Ok(job) => job,
                Err(_) => break,
            };

            // Busy
            let response = self.service.handle(&job.request);
            if let Err(e) = self.transport.send(&response, job.peer) {
                tracing::warn!(worker = self.id, peer = %job.peer, error = %e, "failed to send response");
            }
            self.busy[self.id].store(false, Ordering::Release);
        }

        tracing::debug!(worker = self.id, "worker stopped");
    }
}
