//! Resumable flat-CSV exporter over the result store.
//!
//! The output schema is fixed-width: eleven base columns, six columns per
//! experience slot up to the widest record in the store, and a trailing
//! `source_url`. Narrower records pad their unused slots with empty strings so
//! every row has the same column count.
//!
//! A resumed run appends after the last written founder (in the store's sorted
//! key order) and reuses the schema width the interrupted run pinned in its
//! tracker, so the appended rows line up with the rows already on disk.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use tracing::{debug, info};

use founderwiki_shared::{CareerRecord, FounderWikiError, Result};
use founderwiki_store::{ExportState, ExportStatus, ExportTracker, ResultStore};

/// Columns before the experience slots.
const BASE_HEADERS: [&str; 11] = [
    "founder_name",
    "short_description",
    "education_degree",
    "education_institution",
    "education_field",
    "current_role_title",
    "current_role_company",
    "current_role_description",
    "current_role_duration",
    "current_role_achievements",
    "total_years_experience",
];

/// Columns per experience slot.
const EXPERIENCE_FIELDS: [&str; 6] = [
    "company",
    "title",
    "duration",
    "description",
    "responsibilities",
    "achievements",
];

/// File locations the exporter operates on.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// JSON result store produced by the batch runner.
    pub result_store: PathBuf,
    /// Export progress tracker JSON.
    pub tracker: PathBuf,
    /// Output CSV path.
    pub output_csv: PathBuf,
}

/// Counters for one export invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Rows written by this invocation.
    pub written: usize,
    /// Rows written across the run including prior resumptions.
    pub total_processed: usize,
    /// Experience slots in the schema.
    pub max_experiences: usize,
    /// Whether this invocation appended to an interrupted run's output.
    pub resumed: bool,
}

/// Join a list field into a single pipe-separated cell.
pub fn format_list(items: &[String]) -> String {
    items.join("|")
}

fn headers(max_experiences: usize) -> Vec<String> {
    let mut headers: Vec<String> = BASE_HEADERS.iter().map(|h| h.to_string()).collect();
    for i in 1..=max_experiences {
        for field in EXPERIENCE_FIELDS {
            headers.push(format!("experience_{i}_{field}"));
        }
    }
    headers.push("source_url".to_string());
    headers
}

/// Flatten one record into a row of `11 + 6 * max_experiences + 1` cells.
///
/// Each experience slot takes its role fields from the first (most recent)
/// role. A slot whose record has no roles, or beyond the record's experience
/// count, is six empty cells.
fn flatten(name: &str, record: &CareerRecord, max_experiences: usize) -> Vec<String> {
    let mut row = vec![
        name.to_string(),
        record.short_description.clone(),
        record.education.degree.clone(),
        record.education.institution.clone(),
        record.education.field.clone(),
        record.career.current_role.title.clone(),
        record.career.current_role.company.clone(),
        record.career.current_role.description.clone(),
        record.career.current_role.duration.clone(),
        format_list(&record.career.current_role.achievements),
        record.career.total_years_experience.clone(),
    ];

    for idx in 0..max_experiences {
        let role = record
            .career
            .experience
            .get(idx)
            .and_then(|exp| exp.roles.first().map(|role| (exp, role)));
        match role {
            Some((exp, role)) => {
                row.push(exp.company.clone());
                row.push(role.title.clone());
                row.push(role.duration.clone());
                row.push(role.description.clone());
                row.push(format_list(&role.responsibilities));
                row.push(format_list(&role.achievements));
            }
            None => row.extend(std::iter::repeat_n(String::new(), EXPERIENCE_FIELDS.len())),
        }
    }

    row.push(record.source_url.clone());
    row
}

/// Export the result store to a flat CSV, resuming an interrupted run if the
/// tracker records one.
///
/// Only an `Incomplete` tracker resumes. A completed tracker means the
/// previous run finished, so the next invocation is a fresh run: it recomputes
/// the schema width and rewrites the whole file, picking up records that
/// arrived since — including ones sorting before the old resumption point.
pub fn export(config: &ExportConfig) -> Result<ExportSummary> {
    let store = ResultStore::load(&config.result_store)?;
    let tracker = ExportTracker::new(&config.tracker);
    let mut state = tracker.load()?;

    let resumed = state.status == ExportStatus::Incomplete && state.last_processed_key.is_some();
    if !resumed {
        state = ExportState::default();
    }

    // A fresh run discovers the schema width from the store; a resumed run
    // reuses the width pinned by the interrupted run.
    let max_experiences = match state.max_experiences {
        Some(width) if resumed => width,
        _ => store
            .iter()
            .map(|(_, record)| record.career.experience.len())
            .max()
            .unwrap_or(0),
    };
    state.max_experiences = Some(max_experiences);

    let file = if resumed {
        OpenOptions::new()
            .append(true)
            .open(&config.output_csv)
            .map_err(|e| FounderWikiError::io(&config.output_csv, e))?
    } else {
        File::create(&config.output_csv)
            .map_err(|e| FounderWikiError::io(&config.output_csv, e))?
    };
    let mut writer = csv::Writer::from_writer(file);

    if !resumed {
        writer
            .write_record(headers(max_experiences))
            .map_err(|e| FounderWikiError::Storage(format!("write csv header: {e}")))?;
    }

    info!(
        records = store.len(),
        max_experiences,
        resumed,
        "exporting result store to {}",
        config.output_csv.display()
    );

    let mut written = 0usize;
    for (name, record) in store.iter() {
        if let Some(last) = &state.last_processed_key {
            if name <= last {
                continue;
            }
        }

        writer
            .write_record(flatten(name, record, max_experiences))
            .map_err(|e| FounderWikiError::Storage(format!("write csv row: {e}")))?;
        writer
            .flush()
            .map_err(|e| FounderWikiError::io(&config.output_csv, e))?;

        // Row is on disk; record the resumption point before the next one.
        state.last_processed_key = Some(name.clone());
        state.total_processed += 1;
        state.status = ExportStatus::Incomplete;
        tracker.save(&state)?;

        debug!(founder = %name, "row exported");
        written += 1;
    }

    state.status = ExportStatus::Complete;
    tracker.save(&state)?;

    Ok(ExportSummary {
        written,
        total_processed: state.total_processed,
        max_experiences,
        resumed,
    })
}
