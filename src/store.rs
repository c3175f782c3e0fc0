//! Append-only interaction log.
//!
//! Every mode persists one record per interaction to a JSONL file under the
//! working root's state directory. Records are never mutated; cleanup
//! rewrites the file atomically with only the retained lines. An advisory
//! file lock guards writers so a cron-driven cleanup and an interactive
//! session cannot interleave.

use crate::config::Config;
use crate::error::{MindError, Result};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// File name of the interaction log inside the state directory.
pub const LOG_FILE: &str = "log.jsonl";

/// One logged interaction.
///
/// The numeric wellbeing metrics are only set by journal mode; every other
/// mode leaves them empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    /// Unique record id.
    pub id: String,
    /// When the interaction happened.
    pub timestamp: DateTime<Utc>,
    /// Mode that produced the record (plan, journal, debug-interactive, ...).
    pub mode: String,
    /// What the user asked.
    pub prompt: String,
    /// What came back (or the closing summary, for sessions).
    pub response: String,
    /// Self-reported focus, 1-10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<u8>,
    /// Self-reported clarity, 1-10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity: Option<u8>,
    /// Self-reported stress, 1-10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<u8>,
}

impl LogRecord {
    /// Create a record with the current timestamp and a fresh id.
    #[must_use]
    pub fn new(mode: impl Into<String>, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            mode: mode.into(),
            prompt: prompt.into(),
            response: response.into(),
            focus: None,
            clarity: None,
            stress: None,
        }
    }

    /// Attach journal metrics.
    #[must_use]
    pub fn with_metrics(mut self, focus: Option<u8>, clarity: Option<u8>, stress: Option<u8>) -> Self {
        self.focus = focus;
        self.clarity = clarity;
        self.stress = stress;
        self
    }
}

/// Handle on the JSONL interaction log.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    /// Open (creating if needed) the log store under a working root.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = Config::state_dir(root);
        fs::create_dir_all(&dir)
            .map_err(|e| MindError::store(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self {
            path: dir.join(LOG_FILE),
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MindError::store(format!("cannot open {}: {e}", self.path.display())))?;

        file.lock_exclusive()
            .map_err(|e| MindError::store(format!("cannot lock log: {e}")))?;
        let result = writeln!(file, "{}", serde_json::to_string(record)?);
        let _ = fs2::FileExt::unlock(&file);
        result.map_err(|e| MindError::store(format!("append failed: {e}")))?;

        debug!("Logged {} record {}", record.mode, record.id);
        Ok(())
    }

    /// Load all records in file order. Corrupt lines are skipped with a
    /// warning rather than poisoning the whole log.
    pub fn load(&self) -> Result<Vec<LogRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| MindError::store(format!("cannot read {}: {e}", self.path.display())))?;

        let mut records = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping corrupt log line {}: {}", lineno + 1, e),
            }
        }
        Ok(records)
    }

    /// The most recent `n` records, newest first.
    pub fn recent(&self, n: usize) -> Result<Vec<LogRecord>> {
        let mut records = self.load()?;
        records.reverse();
        records.truncate(n);
        Ok(records)
    }

    /// Records newer than the given cutoff, in file order.
    pub fn since(&self, cutoff: DateTime<Utc>) -> Result<Vec<LogRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.timestamp > cutoff)
            .collect())
    }

    /// Case-insensitive substring search over stored prompts.
    pub fn search(&self, keyword: &str) -> Result<Vec<LogRecord>> {
        let needle = keyword.to_lowercase();
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.prompt.to_lowercase().contains(&needle))
            .collect())
    }

    /// Delete records older than `days` days. Returns how many were removed.
    ///
    /// The file is rewritten through a temp file and renamed into place so a
    /// crash mid-cleanup cannot truncate the log.
    pub fn purge_older_than(&self, days: u32) -> Result<usize> {
        let records = self.load()?;
        if records.is_empty() {
            return Ok(0);
        }

        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let (kept, dropped): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.timestamp >= cutoff);

        if dropped.is_empty() {
            return Ok(0);
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut file = fs::File::create(&tmp)
                .map_err(|e| MindError::store(format!("cannot create temp log: {e}")))?;
            for record in &kept {
                writeln!(file, "{}", serde_json::to_string(record)?)
                    .map_err(|e| MindError::store(format!("rewrite failed: {e}")))?;
            }
        }
        fs::rename(&tmp, &self.path)
            .map_err(|e| MindError::store(format!("cannot replace log: {e}")))?;

        debug!("Purged {} records older than {} days", dropped.len(), days);
        Ok(dropped.len())
    }
}
