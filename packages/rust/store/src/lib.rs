//! Durable state for FounderWiki's resumable pipelines.
//!
//! Three artifacts, each owned exclusively by one pipeline run at a time:
//! - [`BatchTracker`] — cursor + completed founders for the batch runner
//! - [`ResultStore`] — founder → `CareerRecord` JSON map
//! - [`ExportTracker`] — resumption point for the tabular exporter
//!
//! All writes go through an atomic temp-file-then-rename so readers never
//! observe a half-written state. The write-then-advance-tracker ordering in
//! the pipelines is the sole durability discipline; no locking is used
//! because at most one process runs against a given set of artifacts.

mod atomic;
mod results;
mod tracker;

pub use atomic::atomic_write;
pub use results::ResultStore;
pub use tracker::{BatchTracker, ExportStatus, ExportState, ExportTracker, TrackerState};
