//! Application configuration for FounderWiki.
//!
//! User config lives at `~/.founderwiki/founderwiki.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FounderWikiError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "founderwiki.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".founderwiki";

// ---------------------------------------------------------------------------
// Config structs (matching founderwiki.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Durable file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// OpenRouter settings for verification/extraction calls.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Wikipedia API settings.
    #[serde(default)]
    pub wikipedia: WikipediaConfig,

    /// Per-founder disambiguation overrides.
    #[serde(default)]
    pub overrides: Vec<DisambiguationOverride>,
}

/// `[paths]` section — every durable artifact has a fixed, configured location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Input founder CSV.
    #[serde(default = "default_input_csv")]
    pub input_csv: String,

    /// Result store: JSON object keyed by founder name.
    #[serde(default = "default_result_store")]
    pub result_store: String,

    /// Batch tracker JSON (cursor + completed founders).
    #[serde(default = "default_tracker")]
    pub tracker: String,

    /// Export tracker JSON.
    #[serde(default = "default_export_tracker")]
    pub export_tracker: String,

    /// Flattened output CSV.
    #[serde(default = "default_output_csv")]
    pub output_csv: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_csv: default_input_csv(),
            result_store: default_result_store(),
            tracker: default_tracker(),
            export_tracker: default_export_tracker(),
            output_csv: default_output_csv(),
        }
    }
}

fn default_input_csv() -> String {
    "founders.csv".into()
}
fn default_result_store() -> String {
    "founders_wiki_data.json".into()
}
fn default_tracker() -> String {
    "processed_rows.json".into()
}
fn default_export_tracker() -> String {
    "conversion_tracking.json".into()
}
fn default_output_csv() -> String {
    "founders_wiki_data.csv".into()
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model to use for verification and extraction.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (overridable for tests).
    #[serde(default = "default_openrouter_base")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_openrouter_base(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_openrouter_base() -> String {
    "https://openrouter.ai/api".into()
}

/// `[wikipedia]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// MediaWiki action API base (search, extracts, sections).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// REST API base (page summaries).
    #[serde(default = "default_rest_base")]
    pub rest_base: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            rest_base: default_rest_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_rest_base() -> String {
    "https://en.wikipedia.org/api/rest_v1".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[[overrides]]` entry — resolves a known ambiguous founder name to an
/// explicit Wikipedia page title, consulted before content fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisambiguationOverride {
    /// Founder name as it appears in the input CSV.
    pub founder: String,
    /// Exact Wikipedia page title to fetch, e.g. "Brian Armstrong (businessman)".
    pub page_title: String,
}

impl AppConfig {
    /// Overrides as a lookup map keyed by founder name.
    pub fn override_map(&self) -> HashMap<String, String> {
        self.overrides
            .iter()
            .map(|o| (o.founder.clone(), o.page_title.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.founderwiki/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FounderWikiError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.founderwiki/founderwiki.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FounderWikiError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        FounderWikiError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FounderWikiError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FounderWikiError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FounderWikiError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the OpenRouter API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(FounderWikiError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("input_csv"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("en.wikipedia.org"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.tracker, "processed_rows.json");
        assert_eq!(parsed.openrouter.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(parsed.wikipedia.timeout_secs, 30);
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[paths]
input_csv = "/tmp/yc_founders.csv"

[[overrides]]
founder = "Brian Armstrong"
page_title = "Brian Armstrong (businessman)"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.overrides.len(), 1);

        let map = config.override_map();
        assert_eq!(
            map.get("Brian Armstrong").map(String::as_str),
            Some("Brian Armstrong (businessman)")
        );
        assert_eq!(config.paths.input_csv, "/tmp/yc_founders.csv");
        // Unspecified paths keep their defaults
        assert_eq!(config.paths.output_csv, "founders_wiki_data.csv");
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openrouter.api_key_env = "FW_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
