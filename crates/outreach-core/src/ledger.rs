use crate::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final disposition of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The action was performed and a confirmation signal was observed.
    Succeeded,
    /// The desired end state already held (e.g. request pending).
    AlreadyDone,
    /// Never attempted: quota exhausted or operator abort.
    Skipped,
    /// Attempted but could not be confirmed, or errored along the way.
    Failed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Succeeded => "succeeded",
            OutcomeKind::AlreadyDone => "already_done",
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::Failed => "failed",
        }
    }
}

/// One row of the result ledger. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub profile_url: String,
    pub outcome: OutcomeKind,
    /// Diagnostic text; empty when there is nothing to add.
    pub detail: String,
    pub timestamp: DateTime<Local>,
}

impl ActionRecord {
    pub fn new(
        profile_url: impl Into<String>,
        outcome: OutcomeKind,
        detail: Option<String>,
    ) -> Self {
        Self {
            profile_url: profile_url.into(),
            outcome,
            detail: detail.unwrap_or_default(),
            timestamp: Local::now(),
        }
    }
}

/// Durable, ordered record of per-target outcomes.
///
/// The whole file is rewritten after every append so the ledger on disk
/// is well-formed CSV at every instant; a crash between targets loses
/// nothing already recorded.
pub struct ResultLedger {
    path: Option<PathBuf>,
    records: Vec<ActionRecord>,
}

impl ResultLedger {
    /// A ledger backed by a CSV file, created on first append.
    pub fn with_output(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            records: Vec::new(),
        }
    }

    /// An in-memory ledger with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Vec::new(),
        }
    }

    /// Append a record and flush the ledger to disk.
    pub fn append(&mut self, record: ActionRecord) -> Result<()> {
        tracing::info!(
            "Recorded {} for {}{}",
            record.outcome.as_str(),
            record.profile_url,
            if record.detail.is_empty() {
                String::new()
            } else {
                format!(" ({})", record.detail)
            }
        );

        self.records.push(record);
        self.flush()
    }

    /// Write all records out. Appends already flush; this exists for the
    /// terminal state where the caller wants an explicit final write.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.records.iter().filter(|r| r.outcome == kind).count()
    }
}
