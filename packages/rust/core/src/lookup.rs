//! Per-founder lookup pipeline: search → verify → extract.
//!
//! The state machine is `SEARCHING → VERIFYING → {EXTRACTING | REJECTED |
//! FAILED}`. Verification is fail-closed: any verdict that is not one of the
//! two exact recognized sentences is a rejection, never a match.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use founderwiki_shared::{CareerRecord, FounderWikiError, Result};
use founderwiki_wiki::{PageContent, PageSummary, SearchHit, WikipediaClient, title_from_url};

use crate::llm::{ChatClient, Message, strip_code_fence};

/// The affirmative verdict sentence the verification prompt demands.
pub const VERDICT_MATCH: &str = "Yes it definitely matches";
/// The negative verdict sentence.
pub const VERDICT_NO_MATCH: &str = "No it does not match";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a lookup failed. Per-item and non-fatal to the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No candidate page found, or search transport error.
    Search,
    /// The verification call itself errored (not a negative verdict).
    Verification,
    /// Content fetch for a confirmed match failed.
    ContentFetch,
    /// The title resolves to multiple subjects and no override is configured.
    Disambiguation,
    /// Extraction call failed or its output did not parse as a career record.
    ExtractionParse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Verification => "verification",
            Self::ContentFetch => "content_fetch",
            Self::Disambiguation => "disambiguation",
            Self::ExtractionParse => "extraction_parse",
        }
    }
}

/// Terminal outcome of one founder's lookup. Downstream code matches on this
/// exhaustively; there is no untyped result map.
#[derive(Debug)]
pub enum LookupOutcome {
    /// Verified match with extracted career data (source URL attached).
    Matched(Box<CareerRecord>),
    /// The page does not describe this founder, or verification was
    /// inconclusive (fail-closed).
    Rejected { reason: String },
    /// The pipeline could not finish; distinguished from a genuine non-match.
    Failed { kind: FailureKind, detail: String },
}

// ---------------------------------------------------------------------------
// Encyclopedia seam
// ---------------------------------------------------------------------------

/// The encyclopedia capabilities the pipeline consumes, as a trait so tests
/// run against recorded fixtures instead of a live service.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn search(&self, query: &str) -> Result<Option<SearchHit>>;
    async fn summary(&self, title: &str) -> Result<PageSummary>;
    async fn fetch_content(&self, title: &str) -> Result<PageContent>;
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn search(&self, query: &str) -> Result<Option<SearchHit>> {
        WikipediaClient::search(self, query).await
    }

    async fn summary(&self, title: &str) -> Result<PageSummary> {
        WikipediaClient::summary(self, title).await
    }

    async fn fetch_content(&self, title: &str) -> Result<PageContent> {
        WikipediaClient::fetch_content(self, title).await
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

const VERIFY_TEMPLATE: &str = "\
Given a person's name, description, and Wikipedia URL, verify if this is the correct person.

Person's Name: {name}
Description: {description}
Wikipedia URL: {url}

Wikipedia page summary:
{summary}

Steps:
1. Read the Wikipedia page summary
2. Compare it with the provided description
3. Verify if key details match (role, company, achievements)
4. You MUST answer with one of these two exact phrases and nothing else:
   - \"Yes it definitely matches\"
   - \"No it does not match\"

Your answer must be exactly one of these two options, with no additional explanation or caveats.
If you are not 100% certain, answer \"No it does not match\".";

const EXTRACT_TEMPLATE: &str = r#"Given the following Wikipedia content about {name}, extract and organize their career information.

Wikipedia Content:
{wiki_content}

Sections available:
{sections}

Format the response as a JSON object with the following structure:
{
    "short_description": "A brief one-line description focusing on current role and main achievement",
    "education": {
        "degree": "Degree name (if available)",
        "institution": "Institution name",
        "field": "Field of study"
    },
    "career": {
        "current_role": {
            "title": "Current position (most recent)",
            "company": "Current company",
            "description": "Detailed description of current responsibilities",
            "duration": "Specific time period (e.g., 2020 - Present)",
            "achievements": [
                "List current role achievements",
                "Include ongoing projects"
            ]
        },
        "experience": [
            {
                "company": "Company name",
                "roles": [
                    {
                        "title": "Specific role title",
                        "duration": "Exact time period",
                        "description": "Detailed role description",
                        "responsibilities": [
                            "Key responsibility 1",
                            "Key responsibility 2"
                        ],
                        "achievements": [
                            "Specific achievement 1",
                            "Project or initiative led",
                            "Major milestone reached"
                        ]
                    }
                ]
            }
        ],
        "total_years_experience": "Calculate total years based on earliest position"
    }
}

Respond with the JSON object only."#;

fn verify_prompt(name: &str, description: &str, url: &str, summary: &str) -> String {
    VERIFY_TEMPLATE
        .replace("{name}", name)
        .replace("{description}", description)
        .replace("{url}", url)
        .replace("{summary}", summary)
}

fn extract_prompt(name: &str, content: &str, sections: &[String]) -> String {
    let sections_json =
        serde_json::to_string_pretty(sections).unwrap_or_else(|_| "[]".to_string());
    EXTRACT_TEMPLATE
        .replace("{name}", name)
        .replace("{wiki_content}", content)
        .replace("{sections}", &sections_json)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives one founder through the lookup state machine.
pub struct LookupPipeline {
    wiki: Arc<dyn Encyclopedia>,
    chat: Arc<dyn ChatClient>,
    /// Founder name → explicit page title, for known-ambiguous names.
    overrides: HashMap<String, String>,
}

impl LookupPipeline {
    pub fn new(
        wiki: Arc<dyn Encyclopedia>,
        chat: Arc<dyn ChatClient>,
        overrides: HashMap<String, String>,
    ) -> Self {
        Self {
            wiki,
            chat,
            overrides,
        }
    }

    /// Run the full state machine for one founder. Always returns an outcome;
    /// per-item errors are folded into [`LookupOutcome::Failed`].
    #[instrument(skip_all, fields(founder = %name))]
    pub async fn lookup(&self, name: &str, description: &str) -> LookupOutcome {
        // --- SEARCHING ---
        let hit = match self.wiki.search(&format!("{name} wikipedia")).await {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::Search,
                    detail: "no Wikipedia page found in search results".into(),
                };
            }
            Err(e) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::Search,
                    detail: e.to_string(),
                };
            }
        };
        debug!(title = %hit.title, url = %hit.url, "candidate page found");

        // --- VERIFYING ---
        let summary = match self.wiki.summary(&hit.title).await {
            Ok(summary) => summary,
            Err(e) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::Verification,
                    detail: e.to_string(),
                };
            }
        };

        let prompt = verify_prompt(name, description, &hit.url, &summary.extract);
        let verdict = match self.chat.complete(vec![Message::user(prompt)], 0.0, 64).await {
            Ok(text) => text,
            Err(e) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::Verification,
                    detail: e.to_string(),
                };
            }
        };

        match verdict.trim() {
            VERDICT_MATCH => {}
            VERDICT_NO_MATCH => {
                return LookupOutcome::Rejected {
                    reason: "Wikipedia page does not definitively match the person".into(),
                };
            }
            other => {
                // Fail closed: an ambiguous verdict is never a match.
                warn!(verdict = other, "verification gave no definitive answer");
                return LookupOutcome::Rejected {
                    reason: "No final answer provided in verification".into(),
                };
            }
        }
        info!(url = %hit.url, "page verified as matching");

        // --- EXTRACTING ---
        // The fetch title comes from the verified page's URL, not the search
        // hit title, so a redirect resolved during verification sticks.
        let title = match self.overrides.get(name) {
            Some(title) => {
                info!(%title, "using configured disambiguation override");
                title.clone()
            }
            None => title_from_url(&hit.url).unwrap_or_else(|| hit.title.clone()),
        };

        let page = match self.wiki.fetch_content(&title).await {
            Ok(page) => page,
            Err(FounderWikiError::Disambiguation { title }) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::Disambiguation,
                    detail: format!("'{title}' is a disambiguation page; configure an override"),
                };
            }
            Err(e) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::ContentFetch,
                    detail: e.to_string(),
                };
            }
        };

        let prompt = extract_prompt(name, &page.content, &page.sections);
        let raw = match self.chat.complete(vec![Message::user(prompt)], 0.0, 4096).await {
            Ok(text) => text,
            Err(e) => {
                return LookupOutcome::Failed {
                    kind: FailureKind::ExtractionParse,
                    detail: format!("extraction call failed: {e}"),
                };
            }
        };

        match serde_json::from_str::<CareerRecord>(strip_code_fence(&raw)) {
            Ok(mut record) => {
                record.source_url = hit.url;
                LookupOutcome::Matched(Box::new(record))
            }
            Err(e) => LookupOutcome::Failed {
                kind: FailureKind::ExtractionParse,
                detail: format!("malformed extraction output: {e}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------
