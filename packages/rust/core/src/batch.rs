//! Resumable batch runner over the input founder set.
//!
//! Progress is durable per item: after each founder the tracker is saved
//! before the runner moves on, and a matched record lands in the result store
//! before the tracker marks the founder complete. Re-running after an
//! interruption therefore never repeats completed work and never loses a
//! stored record.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use founderwiki_shared::{FounderWikiError, InputRecord, Result};
use founderwiki_store::{BatchTracker, ResultStore};

use crate::lookup::{LookupOutcome, LookupPipeline};

/// File locations the batch runner operates on.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Input founder CSV (`Founder Name`, `Title`, `Company Founded`,
    /// `Description` headers).
    pub input_csv: PathBuf,
    /// JSON result store, founder name → career record.
    pub result_store: PathBuf,
    /// Batch progress tracker JSON.
    pub tracker: PathBuf,
}

/// Counters for one batch invocation. `skipped` counts founders already in
/// the tracker's completed set; the remaining counters partition `processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub matched: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Receives batch progress events. The CLI hooks a spinner in here; library
/// callers use [`SilentProgress`].
pub trait ProgressReporter {
    fn begin(&self, total: usize) {
        let _ = total;
    }
    fn item(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }
    fn finish(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// No-op reporter.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}

/// Run the batch: every founder in the input set that is not yet in the
/// tracker's completed set goes through the lookup pipeline exactly once.
///
/// A failure to read the input set is fatal; a per-founder lookup failure is
/// recorded and the run continues.
pub async fn run(
    pipeline: &LookupPipeline,
    config: &BatchConfig,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary> {
    let tracker = BatchTracker::new(&config.tracker);
    let mut state = tracker.load()?;
    let mut store = ResultStore::load(&config.result_store)?;

    let records = read_input(config)?;
    info!(
        total = records.len(),
        completed = state.completed.len(),
        "starting batch run"
    );
    progress.begin(records.len());

    let mut summary = BatchSummary::default();

    // Everything before the cursor was handled by an earlier run; resume
    // there without touching those rows. The completed set still guards the
    // rest against duplicates.
    let start = state.cursor.min(records.len());
    if start > 0 {
        debug!(cursor = start, "resuming after cursor");
        summary.skipped += start;
    }

    for (index, record) in records.iter().enumerate().skip(start) {
        if state.completed.contains(&record.name) {
            debug!(founder = %record.name, "already processed, skipping");
            summary.skipped += 1;
            continue;
        }

        progress.item(index, records.len(), &record.name);

        match pipeline
            .lookup(&record.name, &record.lookup_description())
            .await
        {
            LookupOutcome::Matched(career) => {
                // Record first, then tracker: a crash between the two re-runs
                // the founder, which overwrites the same key harmlessly.
                store.insert(record.name.clone(), *career)?;
                info!(founder = %record.name, "career record stored");
                summary.matched += 1;
            }
            LookupOutcome::Rejected { reason } => {
                info!(founder = %record.name, %reason, "lookup rejected");
                summary.rejected += 1;
            }
            LookupOutcome::Failed { kind, detail } => {
                warn!(
                    founder = %record.name,
                    stage = kind.as_str(),
                    %detail,
                    "lookup failed"
                );
                summary.failed += 1;
            }
        }

        state.cursor = index + 1;
        state.completed.insert(record.name.clone());
        tracker.save(&state)?;
        summary.processed += 1;
    }

    progress.finish(&summary);
    info!(?summary, "batch run finished");
    Ok(summary)
}

fn read_input(config: &BatchConfig) -> Result<Vec<InputRecord>> {
    let mut reader = csv::Reader::from_path(&config.input_csv).map_err(|e| {
        FounderWikiError::parse(format!(
            "cannot read input set {}: {e}",
            config.input_csv.display()
        ))
    })?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: InputRecord = row.map_err(|e| {
            FounderWikiError::parse(format!(
                "malformed row in {}: {e}",
                config.input_csv.display()
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::lookup::doubles::{FixturePage, FixtureWiki, ScriptedChat, extraction_json};
    use crate::lookup::VERDICT_MATCH;

    fn write_input(path: &Path, founders: &[(&str, &str, &str)]) {
        let mut out = String::from("Founder Name,Title,Company Founded,Description\n");
        for (name, title, company) in founders {
            out.push_str(&format!("{name},{title},{company},\n"));
        }
        std::fs::write(path, out).expect("write input csv");
    }

    fn fixture_wiki(names: &[&str]) -> FixtureWiki {
        FixtureWiki {
            pages: names
                .iter()
                .map(|name| FixturePage {
                    title: (*name).to_string(),
                    extract: format!("{name} is an entrepreneur."),
                    content: format!("{name} founded a company."),
                    disambiguation: false,
                })
                .collect(),
        }
    }

    fn pipeline_for(wiki: FixtureWiki, responses: Vec<&'static str>) -> LookupPipeline {
        LookupPipeline::new(
            Arc::new(wiki),
            Arc::new(ScriptedChat::new(responses)),
            HashMap::new(),
        )
    }

    fn leak(s: String) -> &'static str {
        Box::leak(s.into_boxed_str())
    }

    #[tokio::test]
    async fn full_run_then_resume_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BatchConfig {
            input_csv: dir.path().join("founders.csv"),
            result_store: dir.path().join("data.json"),
            tracker: dir.path().join("tracker.json"),
        };
        write_input(
            &config.input_csv,
            &[("Alice Ahn", "CEO", "Acme"), ("Bob Birch", "CTO", "Birchware")],
        );

        let wiki = fixture_wiki(&["Alice Ahn", "Bob Birch"]);
        let pipeline = pipeline_for(
            wiki,
            vec![
                VERDICT_MATCH,
                leak(extraction_json(2)),
                VERDICT_MATCH,
                leak(extraction_json(1)),
            ],
        );

        let summary = run(&pipeline, &config, &SilentProgress).await.expect("run");
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.skipped, 0);

        let store = ResultStore::load(&config.result_store).expect("store");
        assert_eq!(store.len(), 2);
        assert!(store.contains("Alice Ahn"));
        assert!(store.contains("Bob Birch"));

        // Second run with an exhausted chat script: nothing may be retried.
        let wiki = fixture_wiki(&["Alice Ahn", "Bob Birch"]);
        let pipeline = pipeline_for(wiki, vec![]);
        let summary = run(&pipeline, &config, &SilentProgress).await.expect("rerun");
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn per_item_failure_does_not_abort_the_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BatchConfig {
            input_csv: dir.path().join("founders.csv"),
            result_store: dir.path().join("data.json"),
            tracker: dir.path().join("tracker.json"),
        };
        write_input(
            &config.input_csv,
            &[
                ("Nobody Nonexistent", "CEO", "Ghost"),
                ("Alice Ahn", "CEO", "Acme"),
            ],
        );

        // Only Alice has a page; the first founder fails at search.
        let wiki = fixture_wiki(&["Alice Ahn"]);
        let pipeline = pipeline_for(wiki, vec![VERDICT_MATCH, leak(extraction_json(1))]);

        let summary = run(&pipeline, &config, &SilentProgress).await.expect("run");
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.matched, 1);

        let store = ResultStore::load(&config.result_store).expect("store");
        assert!(store.contains("Alice Ahn"));
        assert!(!store.contains("Nobody Nonexistent"));

        // The failed founder is marked handled and not retried on resume.
        let wiki = fixture_wiki(&["Alice Ahn"]);
        let pipeline = pipeline_for(wiki, vec![]);
        let summary = run(&pipeline, &config, &SilentProgress).await.expect("rerun");
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.processed, 0);
    }

    #[tokio::test]
    async fn cursor_skips_prefix_without_lookup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BatchConfig {
            input_csv: dir.path().join("founders.csv"),
            result_store: dir.path().join("data.json"),
            tracker: dir.path().join("tracker.json"),
        };
        write_input(
            &config.input_csv,
            &[("Alice Ahn", "CEO", "Acme"), ("Bob Birch", "CTO", "Birchware")],
        );

        // A tracker whose cursor already covers the first row.
        let tracker = BatchTracker::new(&config.tracker);
        let state = founderwiki_store::TrackerState {
            cursor: 1,
            ..Default::default()
        };
        tracker.save(&state).expect("seed tracker");

        // Chat script covers Bob only; touching Alice would exhaust it.
        let wiki = fixture_wiki(&["Alice Ahn", "Bob Birch"]);
        let pipeline = pipeline_for(wiki, vec![VERDICT_MATCH, leak(extraction_json(1))]);

        let summary = run(&pipeline, &config, &SilentProgress).await.expect("run");
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 1);

        let store = ResultStore::load(&config.result_store).expect("store");
        assert!(store.contains("Bob Birch"));
        assert!(!store.contains("Alice Ahn"));
    }

    #[tokio::test]
    async fn rejected_founder_is_counted_and_not_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BatchConfig {
            input_csv: dir.path().join("founders.csv"),
            result_store: dir.path().join("data.json"),
            tracker: dir.path().join("tracker.json"),
        };
        write_input(&config.input_csv, &[("Alice Ahn", "CEO", "Acme")]);

        let wiki = fixture_wiki(&["Alice Ahn"]);
        let pipeline = pipeline_for(wiki, vec!["No it does not match"]);

        let summary = run(&pipeline, &config, &SilentProgress).await.expect("run");
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.matched, 0);

        let store = ResultStore::load(&config.result_store).expect("store");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unreadable_input_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BatchConfig {
            input_csv: dir.path().join("missing.csv"),
            result_store: dir.path().join("data.json"),
            tracker: dir.path().join("tracker.json"),
        };

        let wiki = FixtureWiki::default();
        let pipeline = pipeline_for(wiki, vec![]);
        let err = run(&pipeline, &config, &SilentProgress).await.unwrap_err();
        assert!(err.to_string().contains("cannot read input set"));
    }
}
