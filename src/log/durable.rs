//! Durable log file
//!
//! Handles appends, in-place tombstones and replay of a single log file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::record::{encode_record, LogRecord, SEPARATOR, TOMBSTONE};
use super::replay::{LogReplay, ReplayStats};
use crate::config::LogSyncStrategy;
use crate::error::Result;

/// Bytes read at a record offset to recover its name before tombstoning
const NAME_PEEK_LEN: usize = 64;

/// An append-only record file
///
/// The file cursor is kept at end-of-file between operations.
pub struct DurableLog {
    path: PathBuf,
    file: File,

    /// Current end of file (offset of the next append)
    end: u64,

    sync: LogSyncStrategy,
}

impl DurableLog {
    /// Open or create a log file
    pub fn open(path: &Path, sync: LogSyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let end = file.seek(SeekFrom::End(0))?;

        tracing::debug!(path = %path.display(), size = end, "opened log");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            end,
            sync,
        })
    }

    /// Append an encoded record, returning the offset it starts at
    ///
    /// The record is on stable storage before this returns when the sync
    /// strategy is `EveryWrite`.
    pub fn append(&mut self, record: &[u8]) -> Result<u64> {
        let offset = self.end;

        self.file.seek(SeekFrom::Start(offset))?;
        if let Err(e) = self.file.write_all(record) {
            // A short write leaves garbage past `end`; the next append
            // starts at `end` again.
            let _ = self.file.seek(SeekFrom::Start(self.end));
            return Err(e.into());
        }
        self.sync_if_needed()?;

        self.end += record.len() as u64;
        Ok(offset)
    }

    /// Encode and append a record made of `fields`
    pub fn append_fields(&mut self, fields: &[&str]) -> Result<u64> {
        let record = encode_record(fields)?;
        self.append(&record)
    }

    /// Mark the record at `offset` as removed
    ///
    /// The name stored at `offset` must equal `expected_name`, otherwise the
    /// file is left untouched and `false` is returned. The cursor is moved
    /// back to end-of-file in every case.
    pub fn tombstone(&mut self, offset: u64, expected_name: &str) -> Result<bool> {
        let result = self.tombstone_at(offset, expected_name);
        let restored = self.file.seek(SeekFrom::Start(self.end));

        let marked = result?;
        restored?;
        Ok(marked)
    }

    fn tombstone_at(&mut self, offset: u64, expected_name: &str) -> Result<bool> {
        if offset >= self.end {
            return Ok(false);
        }

        let mut head = [0u8; NAME_PEEK_LEN];
        self.file.seek(SeekFrom::Start(offset))?;
        let read = read_up_to(&mut self.file, &mut head)?;

        // The stored name ends at the first separator or at the peek bound
        let head = &head[..read];
        let name_len = head
            .iter()
            .position(|&b| b == SEPARATOR)
            .unwrap_or_else(|| read.min(NAME_PEEK_LEN - 1));
        if &head[..name_len] != expected_name.as_bytes() {
            tracing::warn!(
                path = %self.path.display(),
                offset,
                expected = expected_name,
                "record at offset does not match, not tombstoning"
            );
            return Ok(false);
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&[TOMBSTONE])?;
        self.sync_if_needed()?;
        Ok(true)
    }

    /// Read every live record from the start of the file
    ///
    /// A partial record at the end (torn by a crash) is cut off, so the
    /// next append starts on a fresh line.
    pub fn replay(&mut self) -> Result<(Vec<LogRecord>, ReplayStats)> {
        self.file.seek(SeekFrom::Start(0))?;

        let mut records = Vec::new();
        let mut replay = LogReplay::new(&mut self.file);
        let outcome = replay.by_ref().try_for_each(|record| {
            records.push(record?);
            Ok::<(), crate::error::PhonebookError>(())
        });
        let stats = replay.stats();

        let restored = self.file.seek(SeekFrom::Start(self.end));
        outcome?;
        restored?;

        if stats.truncated_tail {
            self.truncate(stats.complete_len)?;
        }
        Ok((records, stats))
    }

    /// Drop everything from `len` to the end of the file
    fn truncate(&mut self, len: u64) -> Result<()> {
        if len >= self.end {
            return Ok(());
        }

        tracing::warn!(
            path = %self.path.display(),
            offset = len,
            dropped = self.end - len,
            "cutting partial record at end of log"
        );
        self.file.set_len(len)?;
        self.end = len;
        self.file.seek(SeekFrom::Start(self.end))?;
        self.sync_if_needed()
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn sync_if_needed(&mut self) -> Result<()> {
        match self.sync {
            LogSyncStrategy::EveryWrite => self.sync(),
            LogSyncStrategy::OsBuffered => Ok(()),
        }
    }

    /// Size of the file in bytes
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Fill `buf` as far as the file allows
fn read_up_to(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match file.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(read)
}
