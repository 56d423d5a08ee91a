//! Shared types, error model, and configuration for FounderWiki.
//!
//! This crate is the foundation depended on by all other FounderWiki crates.
//! It provides:
//! - [`FounderWikiError`] — the unified error type
//! - Domain types ([`InputRecord`], [`CareerRecord`] and its nested career shapes)
//! - Configuration ([`AppConfig`], path resolution, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DisambiguationOverride, OpenRouterConfig, PathsConfig, WikipediaConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{FounderWikiError, Result};
pub use types::{
    Career, CareerRecord, CurrentRole, Education, Experience, ExperienceRole, InputRecord,
};
