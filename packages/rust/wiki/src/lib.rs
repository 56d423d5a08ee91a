//! Wikipedia API client for FounderWiki.
//!
//! Three capabilities, matching what the lookup pipeline consumes:
//! - [`WikipediaClient::search`] — find a candidate page for a founder name
//! - [`WikipediaClient::summary`] — page summary used during verification
//! - [`WikipediaClient::fetch_content`] — full plain-text content + section
//!   titles for extraction, with disambiguation pages surfaced as a
//!   distinguishable error rather than silently resolved

mod client;

pub use client::{
    PageContent, PageKind, PageSummary, SearchHit, WikipediaClient, title_from_url,
};
