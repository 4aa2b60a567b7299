// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines log of ticker operations

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tk_core::Operation;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line of the log
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    seq: u64,
    op: Operation,
}

/// Result of scanning a log file
struct Scan {
    ops: Vec<Operation>,
    last_seq: u64,
    /// Byte length of the intact prefix
    intact: u64,
    torn: bool,
}

/// Scan raw log contents. Only the final line may be damaged.
fn scan(contents: &str) -> Result<Scan, WalError> {
    let mut out = Scan {
        ops: Vec::new(),
        last_seq: 0,
        intact: 0,
        torn: false,
    };
    let mut offset = 0usize;
    let mut lines = contents.split_inclusive('\n').peekable();

    while let Some(line) = lines.next() {
        let is_last = lines.peek().is_none();
        let body = line.trim_end_matches('\n');
        if !body.trim().is_empty() {
            match serde_json::from_str::<Record>(body) {
                Ok(record) if line.ends_with('\n') => {
                    out.last_seq = out.last_seq.max(record.seq);
                    out.ops.push(record.op);
                }
                Err(e) if !is_last => return Err(e.into()),
                // unterminated or unparseable final line: a crash mid-append
                _ => {
                    out.torn = true;
                    break;
                }
            }
        }
        offset += line.len();
        out.intact = offset as u64;
    }
    Ok(out)
}

fn read_existing(path: &Path) -> Result<String, WalError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Durable operation log.
///
/// Each `append_all` is written and fsynced as one batch. A batch cut short
/// by a crash leaves at most one damaged trailing line, which `open` trims.
pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
    entries: usize,
}

impl Wal {
    /// Open or create the log, trimming a torn tail
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let scan = scan(&read_existing(path)?)?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        if scan.torn {
            tracing::warn!(path = %path.display(), "trimming torn log tail");
            file.set_len(scan.intact)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence: scan.last_seq,
            entries: scan.ops.len(),
        })
    }

    /// Every intact operation in the log, oldest first
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        Ok(scan(&read_existing(path)?)?.ops)
    }

    /// Append a batch of operations. Returns the last sequence number written.
    pub fn append_all(&mut self, ops: &[Operation]) -> Result<u64, WalError> {
        let (buf, last) = encode(self.sequence, ops)?;
        self.file.write_all(buf.as_bytes())?;
        self.file.sync_all()?;
        self.sequence = last;
        self.entries += ops.len();
        Ok(last)
    }

    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        self.append_all(std::slice::from_ref(op))
    }

    /// Highest sequence number in the log
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of operations in the log
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Replace the whole log with `snapshot`.
    ///
    /// Written to a sibling file and renamed into place; sequence numbers keep
    /// increasing across the rewrite.
    pub fn compact(&mut self, snapshot: &[Operation]) -> Result<(), WalError> {
        let tmp = self.path.with_extension("wal.tmp");
        let (buf, last) = encode(self.sequence, snapshot)?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(buf.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;
        let before = self.entries;
        self.sequence = last;
        self.entries = snapshot.len();
        tracing::info!(path = %self.path.display(), before, after = self.entries, "log compacted");
        Ok(())
    }
}

fn encode(mut seq: u64, ops: &[Operation]) -> Result<(String, u64), WalError> {
    let mut buf = String::new();
    for op in ops {
        seq += 1;
        let record = Record {
            seq,
            op: op.clone(),
        };
        buf.push_str(&serde_json::to_string(&record)?);
        buf.push('\n');
    }
    Ok((buf, seq))
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
