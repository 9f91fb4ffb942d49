//! Log replay
//!
//! Streams a log in fixed-size blocks and yields every live, well-formed
//! record together with the offset it starts at.

use std::io::{ErrorKind, Read};
use std::mem;

use super::record::{LogRecord, NEWLINE, SEPARATOR, TOMBSTONE};
use crate::error::Result;

/// Size of each read from the underlying file
pub const REPLAY_BLOCK_SIZE: usize = 4096;

/// Longest record accepted by replay (longer lines are skipped)
pub const MAX_RECORD_LEN: usize = 256;

/// Counters gathered while replaying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Total bytes read from the file
    pub bytes_scanned: u64,

    /// Records yielded
    pub records_loaded: u64,

    /// Records skipped because they were tombstoned
    pub records_tombstoned: u64,

    /// Records skipped because they were empty, overlong, had an empty
    /// field or were not UTF-8
    pub records_malformed: u64,

    /// Whether the file ended in the middle of a record
    pub truncated_tail: bool,

    /// Length of the file up to the end of the last complete line
    pub complete_len: u64,
}

/// Iterator over the records of a log
pub struct LogReplay<R> {
    reader: R,
    block: Vec<u8>,
    filled: usize,
    pos: usize,

    /// Offset of the next unread byte
    offset: u64,

    /// Offset of the first byte of `line`
    line_start: u64,
    line: Vec<u8>,
    overlong: bool,

    eof: bool,
    stats: ReplayStats,
}

impl<R: Read> LogReplay<R> {
    /// Replay from the current position of `reader`, which must be the
    /// start of the log
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            block: vec![0u8; REPLAY_BLOCK_SIZE],
            filled: 0,
            pos: 0,
            offset: 0,
            line_start: 0,
            line: Vec::new(),
            overlong: false,
            eof: false,
            stats: ReplayStats::default(),
        }
    }

    /// Counters so far (final once the iterator is exhausted)
    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Read the next block, returning false at end of file
    fn fill_block(&mut self) -> Result<bool> {
        loop {
            match self.reader.read(&mut self.block) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.filled = n;
                    self.pos = 0;
                    self.stats.bytes_scanned += n as u64;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Append bytes to the current line, discarding it once it is too long
    fn extend_line(&mut self, bytes: &[u8]) {
        if self.overlong {
            return;
        }
        if self.line.len() + bytes.len() > MAX_RECORD_LEN {
            self.overlong = true;
            self.line.clear();
        } else {
            self.line.extend_from_slice(bytes);
        }
    }

    fn finish_line(&mut self, start: u64) -> Option<LogRecord> {
        let line = mem::take(&mut self.line);

        if mem::replace(&mut self.overlong, false) {
            tracing::warn!(offset = start, "skipping overlong log record");
            self.stats.records_malformed += 1;
            return None;
        }
        if line.first() == Some(&TOMBSTONE) {
            self.stats.records_tombstoned += 1;
            return None;
        }

        match parse_fields(&line) {
            Some(fields) => {
                self.stats.records_loaded += 1;
                Some(LogRecord { offset: start, fields })
            }
            None => {
                tracing::warn!(offset = start, "skipping malformed log record");
                self.stats.records_malformed += 1;
                None
            }
        }
    }
}

fn parse_fields(line: &[u8]) -> Option<Vec<String>> {
    if line.is_empty() {
        return None;
    }
    line.split(|&b| b == SEPARATOR)
        .map(|field| {
            if field.is_empty() {
                None
            } else {
                String::from_utf8(field.to_vec()).ok()
            }
        })
        .collect()
}

impl<R: Read> Iterator for LogReplay<R> {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos == self.filled {
                if self.eof {
                    return None;
                }
                match self.fill_block() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.eof = true;
                        self.stats.complete_len = self.line_start;
                        if !self.line.is_empty() || self.overlong {
                            tracing::warn!(offset = self.line_start, "log ends with a partial record");
                            self.stats.truncated_tail = true;
                            self.stats.records_malformed += 1;
                            self.line.clear();
                            self.overlong = false;
                        }
                        return None;
                    }
                    Err(e) => {
                        self.eof = true;
                        return Some(Err(e));
                    }
                }
            }

            let pending = self.filled - self.pos;
            let newline = self.block[self.pos..self.filled]
                .iter()
                .position(|&b| b == NEWLINE);

            match newline {
                None => {
                    let chunk = self.block[self.pos..self.filled].to_vec();
                    self.extend_line(&chunk);
                    self.pos = self.filled;
                    self.offset += pending as u64;
                }
                Some(i) => {
                    let chunk = self.block[self.pos..self.pos + i].to_vec();
                    self.extend_line(&chunk);
                    self.pos += i + 1;
                    self.offset += (i + 1) as u64;

                    let start = mem::replace(&mut self.line_start, self.offset);
                    if let Some(record) = self.finish_line(start) {
                        return Some(Ok(record));
                    }
                }
            }
        }
    }
}
