//! Progress trackers for the batch runner and the tabular exporter.
//!
//! On-disk JSON keys keep the names the companion tooling already expects
//! (`last_processed_row`, `processed_founders`, `conversion_status`, ...), so
//! tracker files from earlier runs remain readable.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use founderwiki_shared::{FounderWikiError, Result};
use serde::{Deserialize, Serialize};

use crate::atomic::atomic_write;

// ---------------------------------------------------------------------------
// Batch tracker
// ---------------------------------------------------------------------------

/// Durable state of the batch runner.
///
/// Invariant: `cursor` is monotonically non-decreasing across a run, and every
/// founder in `completed` has been fully handled (stored, rejected, or failed
/// and skipped). `completed` is the authoritative de-dup signal; `cursor` only
/// avoids re-scanning the prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    /// Offset into the ordered input set: everything before it is handled.
    #[serde(rename = "last_processed_row")]
    pub cursor: usize,

    /// Founder names already handled, in sorted order.
    #[serde(rename = "processed_founders")]
    pub completed: BTreeSet<String>,

    /// When the state was last saved. Absent in files written by older runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Loads and saves [`TrackerState`] at a fixed path.
pub struct BatchTracker {
    path: PathBuf,
}

impl BatchTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last saved state, or the initial state if no file exists.
    /// Absence of prior state is never an error.
    pub fn load(&self) -> Result<TrackerState> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no tracker file, starting fresh");
            return Ok(TrackerState::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| FounderWikiError::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            FounderWikiError::Storage(format!(
                "invalid tracker file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Persist the full state atomically. Called synchronously after each
    /// processed founder, before moving to the next.
    pub fn save(&self, state: &TrackerState) -> Result<()> {
        let mut stamped = state.clone();
        stamped.updated_at = Some(Utc::now());

        let json = serde_json::to_vec_pretty(&stamped)
            .map_err(|e| FounderWikiError::Storage(format!("serialize tracker: {e}")))?;
        atomic_write(&self.path, &json)
    }
}

// ---------------------------------------------------------------------------
// Export tracker
// ---------------------------------------------------------------------------

/// Whether an export run finished or was interrupted. The status flag is the
/// only mechanism distinguishing the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    #[default]
    Incomplete,
    Complete,
}

/// Durable state of the tabular exporter.
///
/// The resumption point is the key immediately after `last_processed_key` in
/// the result store's sorted iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportState {
    /// Last founder written to the output CSV, if any.
    #[serde(rename = "last_processed_founder")]
    pub last_processed_key: Option<String>,

    /// Rows written so far across the run and any resumptions.
    #[serde(rename = "total_founders_processed")]
    pub total_processed: usize,

    #[serde(rename = "conversion_status")]
    pub status: ExportStatus,

    /// Schema width discovered on the run's first pass. A resumed run reuses
    /// this so rows written before and after an interruption have identical
    /// column counts even if wider records landed in the store meanwhile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_experiences: Option<usize>,
}

/// Loads and saves [`ExportState`] at a fixed path.
pub struct ExportTracker {
    path: PathBuf,
}

impl ExportTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last saved state, or the initial state if no file exists.
    pub fn load(&self) -> Result<ExportState> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no export tracker, starting fresh");
            return Ok(ExportState::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| FounderWikiError::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            FounderWikiError::Storage(format!(
                "invalid export tracker {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Persist the full state atomically, called after every written row.
    pub fn save(&self, state: &ExportState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| FounderWikiError::Storage(format!("serialize export tracker: {e}")))?;
        atomic_write(&self.path, &json)
    }
}
