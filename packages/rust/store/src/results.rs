//! The result store: a durable founder → [`CareerRecord`] mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use founderwiki_shared::{CareerRecord, FounderWikiError, Result};

use crate::atomic::atomic_write;

/// Accumulating key→record store, persisted as a single JSON object keyed by
/// founder name.
///
/// Records are written incrementally: [`insert`](Self::insert) persists the
/// whole map before returning, so a crash after it leaves the record durable.
/// Iteration is in sorted key order, which is the stable order the exporter's
/// resumption point is defined against.
pub struct ResultStore {
    path: PathBuf,
    records: BTreeMap<String, CareerRecord>,
}

impl ResultStore {
    /// Load the store from `path`, or start empty if no file exists.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let records = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| FounderWikiError::io(&path, e))?;
            serde_json::from_str(&content).map_err(|e| {
                FounderWikiError::Storage(format!(
                    "invalid result store {}: {e}",
                    path.display()
                ))
            })?
        } else {
            tracing::debug!(path = %path.display(), "no result store file, starting empty");
            BTreeMap::new()
        };

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CareerRecord> {
        self.records.get(name)
    }

    /// Insert a record and persist the store immediately (all-or-nothing per
    /// key: the record is either fully durable or absent).
    pub fn insert(&mut self, name: impl Into<String>, record: CareerRecord) -> Result<()> {
        self.records.insert(name.into(), record);
        self.persist()
    }

    /// Iterate records in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CareerRecord)> {
        self.records.iter()
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.records)
            .map_err(|e| FounderWikiError::Storage(format!("serialize result store: {e}")))?;
        atomic_write(&self.path, &json)
    }
}
