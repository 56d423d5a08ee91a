//! Core pipelines for FounderWiki.
//!
//! - [`lookup`] — the per-founder search → verify → extract state machine
//! - [`batch`] — the resumable batch runner over the input founder set
//! - [`export`] — the resumable flat-CSV exporter over the result store
//! - [`llm`] — chat-completions client used by verification and extraction

pub mod batch;
pub mod export;
pub mod llm;
pub mod lookup;
