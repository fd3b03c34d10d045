// In crates/audit/src/ledger.rs

use crate::types::{AuditEntry, AuditFilter};
use crate::{Error, Result};
use capital::CapitalPoolSnapshot;
use chrono::{DateTime, Utc};
use core_types::{TradeDecision, TradeRequest};
use risk::RiskGovernorState;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Lines drained into one write before flushing.
const JOURNAL_BATCH: usize = 64;

/// Append-only record of every evaluation.
///
/// Entries live in memory and can be mirrored line by line to a JSON-lines
/// journal. Safe to share between threads; ids are assigned in append order.
/// Journal lines are written by a dedicated thread, so `append` never touches
/// the file. Dropping the ledger waits for pending lines to be written.
#[derive(Debug, Default)]
pub struct AuditLedger {
    entries: RwLock<Vec<AuditEntry>>,
    journal: Option<Journal>,
}

#[derive(Debug)]
struct Journal {
    path: PathBuf,
    lines: Option<mpsc::UnboundedSender<String>>,
    writer: Option<JoinHandle<()>>,
}

impl AuditLedger {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens (or creates) a journal at `path`. Entries already in the journal
    /// are loaded so ids keep increasing across restarts.
    pub fn with_journal(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let existing = if path.exists() {
            read_journal(path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), restored = existing.len(), "Audit journal opened");

        Ok(Self {
            entries: RwLock::new(existing),
            journal: Some(Journal::spawn(path.to_path_buf(), file)?),
        })
    }

    /// Records one evaluation and returns the stored entry.
    ///
    /// The in-memory ledger is authoritative; a failed journal write is
    /// logged and does not lose the entry. Lines reach the writer in id order
    /// because they are queued under the entries lock.
    pub fn append(
        &self,
        timestamp: DateTime<Utc>,
        request: TradeRequest,
        decision: TradeDecision,
        pool: CapitalPoolSnapshot,
        governor: RiskGovernorState,
    ) -> AuditEntry {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let id = entries.last().map_or(1, |last| last.id + 1);
        let entry = AuditEntry {
            id,
            timestamp,
            request,
            decision,
            pool,
            governor,
        };

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.enqueue(&entry) {
                error!(id, path = %journal.path.display(), error = %e, "Failed to queue audit journal line");
            }
        }

        entries.push(entry.clone());
        entry
    }

    /// Matching entries in id order, at most `filter.limit` of them.
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Journal {
    fn spawn(path: PathBuf, file: File) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let writer_path = path.clone();
        let writer = std::thread::Builder::new()
            .name("audit-journal".into())
            .spawn(move || {
                let mut out = BufWriter::new(file);
                let mut batch = Vec::with_capacity(JOURNAL_BATCH);
                while let Some(line) = rx.blocking_recv() {
                    batch.push(line);
                    while batch.len() < JOURNAL_BATCH {
                        match rx.try_recv() {
                            Ok(line) => batch.push(line),
                            Err(_) => break,
                        }
                    }
                    if let Err(e) = write_batch(&mut out, &batch) {
                        error!(path = %writer_path.display(), lines = batch.len(), error = %e, "Failed to write audit journal");
                    }
                    batch.clear();
                }
            })?;
        Ok(Self {
            path,
            lines: Some(tx),
            writer: Some(writer),
        })
    }

    fn enqueue(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        match &self.lines {
            Some(tx) => tx.send(line).map_err(|_| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "audit journal writer has stopped",
                ))
            }),
            None => Ok(()),
        }
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain and exit.
        self.lines.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                error!(path = %self.path.display(), "Audit journal writer panicked");
            }
        }
    }
}

fn write_batch(out: &mut impl Write, batch: &[String]) -> std::io::Result<()> {
    for line in batch {
        out.write_all(line.as_bytes())?;
    }
    out.flush()
}

/// Reads every entry from a JSON-lines journal. Blank lines are skipped.
pub fn read_journal(path: impl AsRef<Path>) -> Result<Vec<AuditEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: AuditEntry =
            serde_json::from_str(&line).map_err(|e| Error::CorruptJournal {
                line: index + 1,
                reason: e.to_string(),
            })?;
        entries.push(entry);
    }
    Ok(entries)
}
