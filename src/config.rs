//! Configuration for the phonebook service
//!
//! Centralized configuration with sensible defaults. Can be built in code
//! through [`ConfigBuilder`] or loaded from a TOML file with [`Config::load`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PhonebookError, Result};
use crate::index::KeyOrdering;

/// Default number of workers (max clients served concurrently)
pub const DEFAULT_WORKERS: usize = 4;

/// Well-known UDP port of the service
pub const DEFAULT_PORT: u16 = 9090;

/// Main configuration for a phonebook server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Log file holding directory entries (`name;number`)
    pub entry_log_path: PathBuf,

    /// Log file holding credentials (`username;password;permissions`)
    pub credential_log_path: PathBuf,

    /// When appended records and tombstones are synced to disk
    pub log_sync: LogSyncStrategy,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Descent rule used by both ordered indexes
    pub key_ordering: KeyOrdering,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// UDP listen address
    pub listen_addr: String,

    /// Number of worker threads (max requests in flight)
    pub workers: usize,

    /// How often the receive loop wakes up to check for shutdown (milliseconds)
    pub poll_interval_ms: u64,

    /// Receive timeout used by the companion client (milliseconds)
    pub client_timeout_ms: u64,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSyncStrategy {
    /// fsync after every append and tombstone (safest, slowest)
    EveryWrite,

    /// Leave flushing to the OS page cache
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_log_path: PathBuf::from("./phonebook.txt"),
            credential_log_path: PathBuf::from("./credentials.txt"),
            log_sync: LogSyncStrategy::EveryWrite,
            key_ordering: KeyOrdering::FirstChar,
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            workers: DEFAULT_WORKERS,
            poll_interval_ms: 200,
            client_timeout_ms: 2000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhonebookError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            PhonebookError::Config(format!("failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all fields, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.workers == 0 {
            errors.push("workers must be positive".to_string());
        }
        if self.poll_interval_ms == 0 {
            errors.push("poll_interval_ms must be positive".to_string());
        }
        if self.entry_log_path.as_os_str().is_empty() {
            errors.push("entry_log_path must not be empty".to_string());
        }
        if self.credential_log_path.as_os_str().is_empty() {
            errors.push("credential_log_path must not be empty".to_string());
        }
        if self.entry_log_path == self.credential_log_path {
            errors.push("entry and credential logs must be different files".to_string());
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("listen_addr '{}' is not a socket address", self.listen_addr));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PhonebookError::Config(errors.join("; ")))
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the entry log path
    pub fn entry_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.entry_log_path = path.into();
        self
    }

    /// Set the credential log path
    pub fn credential_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credential_log_path = path.into();
        self
    }

    /// Set the log sync strategy
    pub fn log_sync(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.log_sync = strategy;
        self
    }

    /// Set the index descent rule
    pub fn key_ordering(mut self, ordering: KeyOrdering) -> Self {
        self.config.key_ordering = ordering;
        self
    }

    /// Set the UDP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of workers
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the shutdown polling interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the client receive timeout (in milliseconds)
    pub fn client_timeout_ms(mut self, ms: u64) -> Self {
        self.config.client_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
