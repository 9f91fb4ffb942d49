//! Directory Service implementation

use std::path::Path;

use super::credential::{Credential, Operation, Permissions};
use super::validate::{validate_name, validate_number, validate_password};
use crate::config::{Config, LogSyncStrategy};
use crate::error::{PhonebookError, Result, UNKNOWN_USER, WRONG_PASSWORD};
use crate::index::{KeyOrdering, OrderedIndex};
use crate::log::{DurableLog, LogRecord, ReplayStats};

/// Username seeded when the credential log holds no credential
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the seeded administrator
pub const DEFAULT_ADMIN_PASSWORD: &str = "0000";

/// A directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub number: String,

    /// Offset of the entry's record in the entry log
    pub offset: u64,
}

/// Phonebook entries and credentials, each backed by a durable log
pub struct Directory {
    entries: OrderedIndex<String>,
    entry_log: DurableLog,

    credentials: OrderedIndex<Credential>,
    credential_log: DurableLog,
}

impl Directory {
    /// Open both logs from a config and replay them
    pub fn bootstrap(config: &Config) -> Result<Self> {
        Self::open(
            &config.entry_log_path,
            &config.credential_log_path,
            config.key_ordering,
            config.log_sync,
        )
    }

    /// Open or create both logs and replay each into its index
    ///
    /// Seeds the default administrator (`admin` / `0000`, RW) when no
    /// credential survives replay.
    pub fn open(
        entry_log_path: &Path,
        credential_log_path: &Path,
        ordering: KeyOrdering,
        sync: LogSyncStrategy,
    ) -> Result<Self> {
        let entry_log = DurableLog::open(entry_log_path, sync)?;
        let credential_log = DurableLog::open(credential_log_path, sync)?;

        let mut directory = Self {
            entries: OrderedIndex::new(ordering),
            entry_log,
            credentials: OrderedIndex::new(ordering),
            credential_log,
        };

        let (records, stats) = directory.entry_log.replay()?;
        let loaded = directory.load_entries(records);
        log_replay("entries", directory.entry_log.path(), &stats, loaded);

        let (records, stats) = directory.credential_log.replay()?;
        let loaded = directory.load_credentials(records);
        log_replay("credentials", directory.credential_log.path(), &stats, loaded);

        if directory.credentials.is_empty() {
            tracing::info!("no credentials found, seeding default administrator");
            directory.add_credential(
                DEFAULT_ADMIN_USERNAME,
                DEFAULT_ADMIN_PASSWORD,
                Permissions::READ_WRITE,
            )?;
        }

        Ok(directory)
    }

    fn load_entries(&mut self, records: Vec<LogRecord>) -> usize {
        let mut loaded = 0;
        for record in records {
            let LogRecord { offset, mut fields } = record;
            if fields.len() != 2
                || validate_name(&fields[0]).is_err()
                || validate_number(&fields[1]).is_err()
            {
                tracing::warn!(offset, "skipping invalid entry record");
                continue;
            }

            let number = fields.pop().unwrap_or_default();
            let name = fields.pop().unwrap_or_default();
            match self.entries.insert(name, number, offset) {
                Ok(_) => loaded += 1,
                Err(_) => tracing::warn!(offset, "skipping duplicate entry record"),
            }
        }
        loaded
    }

    fn load_credentials(&mut self, records: Vec<LogRecord>) -> usize {
        let mut loaded = 0;
        for record in records {
            let LogRecord { offset, fields } = record;
            let parsed = match fields.as_slice() {
                [username, password, permissions] => validate_name(username)
                    .and_then(|_| validate_password(password))
                    .and_then(|_| permissions.parse::<Permissions>())
                    .map(|permissions| (username, password, permissions)),
                _ => Err(PhonebookError::InvalidField("wrong field count".to_string())),
            };

            let (username, password, permissions) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(offset, error = %e, "skipping invalid credential record");
                    continue;
                }
            };

            let credential = Credential {
                password: password.clone(),
                permissions,
            };
            match self.credentials.insert(username.clone(), credential, offset) {
                Ok(_) => loaded += 1,
                Err(_) => tracing::warn!(offset, "skipping duplicate credential record"),
            }
        }
        loaded
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Add an entry; fails with `DuplicateName` if the name is present
    pub fn add_entry(&mut self, name: &str, number: &str) -> Result<()> {
        validate_name(name)?;
        validate_number(number)?;

        let offset = self.entry_log.len();
        let id = self.entries.insert(name, number.to_string(), offset)?;

        if let Err(e) = self.entry_log.append_fields(&[name, number]) {
            self.entries.delete(id);
            return Err(e);
        }
        Ok(())
    }

    /// Look up an entry by name
    pub fn get_entry(&self, name: &str) -> Result<Entry> {
        self.entries
            .lookup(name)
            .map(|record| Entry {
                name: record.name.clone(),
                number: record.value.clone(),
                offset: record.offset,
            })
            .ok_or(PhonebookError::NotFound)
    }

    /// Remove an entry and tombstone its log record
    pub fn remove_entry(&mut self, name: &str) -> Result<()> {
        let id = self.entries.find(name).ok_or(PhonebookError::NotFound)?;
        let removed = self.entries.delete(id).ok_or(PhonebookError::NotFound)?;
        tombstone_or_warn(&mut self.entry_log, removed.offset, &removed.name);
        Ok(())
    }

    /// Snapshot of all entries in index traversal order
    pub fn entries(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .map(|record| Entry {
                name: record.name.clone(),
                number: record.value.clone(),
                offset: record.offset,
            })
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Add a credential; fails with `DuplicateName` if the username is present
    pub fn add_credential(
        &mut self,
        username: &str,
        password: &str,
        permissions: Permissions,
    ) -> Result<()> {
        validate_name(username)?;
        validate_password(password)?;
        if permissions == Permissions::default() {
            return Err(PhonebookError::InvalidField(
                "permissions must grant R, W or RW".to_string(),
            ));
        }

        let credential = Credential {
            password: password.to_string(),
            permissions,
        };
        let offset = self.credential_log.len();
        let id = self.credentials.insert(username, credential, offset)?;

        if let Err(e) = self
            .credential_log
            .append_fields(&[username, password, permissions.as_str()])
        {
            self.credentials.delete(id);
            return Err(e);
        }
        Ok(())
    }

    /// Remove a credential and tombstone its log record
    pub fn remove_credential(&mut self, username: &str) -> Result<()> {
        let id = self.credentials.find(username).ok_or(PhonebookError::NotFound)?;
        let removed = self.credentials.delete(id).ok_or(PhonebookError::NotFound)?;
        tombstone_or_warn(&mut self.credential_log, removed.offset, &removed.name);
        Ok(())
    }

    /// Check a username/password pair and return the granted permissions
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Permissions> {
        let record = self
            .credentials
            .lookup(username)
            .ok_or_else(|| PhonebookError::Unauthorized(UNKNOWN_USER.to_string()))?;

        if record.value.password != password {
            return Err(PhonebookError::Unauthorized(WRONG_PASSWORD.to_string()));
        }
        Ok(record.value.permissions)
    }

    /// Whether `username` may perform `op`
    ///
    /// Login is always allowed; unknown usernames are denied everything else.
    pub fn has_permission(&self, username: &str, op: Operation) -> bool {
        if op == Operation::Login {
            return true;
        }
        self.credentials
            .lookup(username)
            .map(|record| record.value.permissions.allows(op))
            .unwrap_or(false)
    }

    /// Snapshot of all usernames with their permissions
    pub fn credentials(&self) -> Vec<(String, Permissions)> {
        self.credentials
            .iter()
            .map(|record| (record.name.clone(), record.value.permissions))
            .collect()
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Sync both logs to disk
    pub fn sync(&mut self) -> Result<()> {
        self.entry_log.sync()?;
        self.credential_log.sync()
    }
}

/// Tombstone a removed record; the index stays authoritative on failure
fn tombstone_or_warn(log: &mut DurableLog, offset: u64, name: &str) {
    match log.tombstone(offset, name) {
        Ok(true) => {}
        Ok(false) => tracing::warn!(
            path = %log.path().display(),
            offset,
            record = name,
            "log record not tombstoned, it will reappear after restart"
        ),
        Err(e) => tracing::warn!(
            path = %log.path().display(),
            offset,
            record = name,
            error = %e,
            "failed to tombstone log record"
        ),
    }
}

fn log_replay(what: &str, path: &Path, stats: &ReplayStats, loaded: usize) {
    tracing::info!(
        path = %path.display(),
        bytes = stats.bytes_scanned,
        loaded,
        tombstoned = stats.records_tombstoned,
        malformed = stats.records_malformed,
        "loaded {}",
        what
    );
}
