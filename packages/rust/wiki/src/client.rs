//! HTTP client for the MediaWiki action API and the Wikimedia REST API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use founderwiki_shared::{FounderWikiError, Result, WikipediaConfig};

/// User-Agent string for Wikipedia requests.
const USER_AGENT: &str = concat!("FounderWiki/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A search hit: the candidate page for a founder name.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Canonical page title, e.g. "Brian Armstrong (businessman)".
    pub title: String,
    /// Canonical page URL in `…/wiki/<Title>` form.
    pub url: String,
}

/// What kind of page a title resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Standard,
    /// The title lists multiple distinct subjects.
    Disambiguation,
}

/// Page summary from the REST API, consumed during verification.
#[derive(Debug, Clone)]
pub struct PageSummary {
    pub title: String,
    pub extract: String,
    pub kind: PageKind,
}

/// Full plain-text page content plus section titles, consumed by extraction.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub content: String,
    pub sections: Vec<String>,
}

/// Extract the page title from a `…/wiki/<Title>` URL, de-underscored.
pub fn title_from_url(url: &str) -> Option<String> {
    url.rsplit_once("/wiki/")
        .map(|(_, title)| title.replace('_', " "))
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    search: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResultItem {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(rename = "type", default)]
    page_type: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: String,
    #[serde(default)]
    missing: bool,
}

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    parse: Option<ParseBlock>,
}

#[derive(Debug, Deserialize)]
struct ParseBlock {
    #[serde(default)]
    sections: Vec<SectionItem>,
}

#[derive(Debug, Deserialize)]
struct SectionItem {
    line: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the English Wikipedia APIs. Base URLs come from config so tests
/// can point at a mock server.
pub struct WikipediaClient {
    client: Client,
    api_base: String,
    rest_base: String,
}

impl WikipediaClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &WikipediaConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FounderWikiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            rest_base: config.rest_base.clone(),
        })
    }

    /// Search for the best-matching page for `query`. Returns `None` when the
    /// search yields no hits at all.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Option<SearchHit>> {
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "5"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| FounderWikiError::Network(format!("search '{query}': {e}")))?;

        if !response.status().is_success() {
            return Err(FounderWikiError::Network(format!(
                "search '{query}': HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| FounderWikiError::Network(format!("search '{query}': {e}")))?;

        let hit = parsed
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .next();

        match hit {
            Some(item) => {
                let url = self.page_url(&item.title)?;
                debug!(title = %item.title, %url, "search hit");
                Ok(Some(SearchHit {
                    title: item.title,
                    url,
                }))
            }
            None => {
                debug!(query, "no search hits");
                Ok(None)
            }
        }
    }

    /// Fetch the page summary for `title`. HTTP 404 maps to `PageNotFound`.
    #[instrument(skip(self))]
    pub async fn summary(&self, title: &str) -> Result<PageSummary> {
        let url = self.summary_url(title)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FounderWikiError::Network(format!("summary '{title}': {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FounderWikiError::PageNotFound {
                title: title.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(FounderWikiError::Network(format!(
                "summary '{title}': HTTP {}",
                response.status()
            )));
        }

        let parsed: SummaryResponse = response
            .json()
            .await
            .map_err(|e| FounderWikiError::Network(format!("summary '{title}': {e}")))?;

        let kind = if parsed.page_type == "disambiguation" {
            PageKind::Disambiguation
        } else {
            PageKind::Standard
        };

        Ok(PageSummary {
            title: parsed.title,
            extract: parsed.extract,
            kind,
        })
    }

    /// Fetch full plain-text content and section titles for `title`.
    ///
    /// A disambiguation page is a dedicated error: the caller must never get
    /// an arbitrary subject's content back for an ambiguous title.
    #[instrument(skip(self))]
    pub async fn fetch_content(&self, title: &str) -> Result<PageContent> {
        let summary = self.summary(title).await?;
        if summary.kind == PageKind::Disambiguation {
            warn!(title, "title resolves to a disambiguation page");
            return Err(FounderWikiError::Disambiguation {
                title: title.to_string(),
            });
        }

        let content = self.fetch_extract(title).await?;
        if content.is_empty() {
            return Err(FounderWikiError::validation(format!(
                "no content found for page '{title}'"
            )));
        }

        let sections = self.fetch_sections(title).await?;

        Ok(PageContent { content, sections })
    }

    async fn fetch_extract(&self, title: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await
            .map_err(|e| FounderWikiError::Network(format!("extract '{title}': {e}")))?;

        if !response.status().is_success() {
            return Err(FounderWikiError::Network(format!(
                "extract '{title}': HTTP {}",
                response.status()
            )));
        }

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| FounderWikiError::Network(format!("extract '{title}': {e}")))?;

        let page = parsed
            .query
            .map(|q| q.pages)
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| FounderWikiError::PageNotFound {
                title: title.to_string(),
            })?;

        if page.missing {
            return Err(FounderWikiError::PageNotFound {
                title: title.to_string(),
            });
        }

        Ok(page.extract)
    }

    async fn fetch_sections(&self, title: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "sections"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| FounderWikiError::Network(format!("sections '{title}': {e}")))?;

        if !response.status().is_success() {
            return Err(FounderWikiError::Network(format!(
                "sections '{title}': HTTP {}",
                response.status()
            )));
        }

        let parsed: SectionsResponse = response
            .json()
            .await
            .map_err(|e| FounderWikiError::Network(format!("sections '{title}': {e}")))?;

        Ok(parsed
            .parse
            .map(|p| p.sections.into_iter().map(|s| s.line).collect())
            .unwrap_or_default())
    }

    /// Canonical `…/wiki/<Title>` URL on the same host as the action API.
    fn page_url(&self, title: &str) -> Result<String> {
        let base = Url::parse(&self.api_base)
            .map_err(|e| FounderWikiError::validation(format!("bad api_base: {e}")))?;
        let mut url = base.clone();
        url.set_path("");
        url.set_query(None);
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FounderWikiError::validation("api_base cannot be a base URL"))?;
            segments.push("wiki");
            segments.push(&title.replace(' ', "_"));
        }
        Ok(url.to_string())
    }

    fn summary_url(&self, title: &str) -> Result<Url> {
        let mut url = Url::parse(&self.rest_base)
            .map_err(|e| FounderWikiError::validation(format!("bad rest_base: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FounderWikiError::validation("rest_base cannot be a base URL"))?;
            segments.pop_if_empty();
            segments.push("page");
            segments.push("summary");
            segments.push(&title.replace(' ', "_"));
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> WikipediaConfig {
        WikipediaConfig {
            api_base: format!("{}/w/api.php", server.uri()),
            rest_base: format!("{}/api/rest_v1", server.uri()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn title_from_url_extracts_and_de_underscores() {
        assert_eq!(
            title_from_url("https://en.wikipedia.org/wiki/Brian_Armstrong_(businessman)"),
            Some("Brian Armstrong (businessman)".to_string())
        );
        assert_eq!(title_from_url("https://example.com/no-wiki-path"), None);
        assert_eq!(title_from_url("https://en.wikipedia.org/wiki/"), None);
    }

    #[tokio::test]
    async fn search_returns_first_hit_with_canonical_url() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {
                    "search": [
                        { "title": "Brian Armstrong (businessman)" },
                        { "title": "Brian Armstrong (footballer)" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        let hit = client
            .search("Brian Armstrong wikipedia")
            .await
            .unwrap()
            .expect("hit");

        assert_eq!(hit.title, "Brian Armstrong (businessman)");
        assert!(hit.url.ends_with("/wiki/Brian_Armstrong_(businessman)"));
    }

    #[tokio::test]
    async fn search_with_no_hits_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "search": [] }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        assert!(client.search("Nobody Nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn summary_detects_disambiguation_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Brian_Armstrong"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Brian Armstrong",
                "type": "disambiguation",
                "extract": "Brian Armstrong may refer to:"
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        let summary = client.summary("Brian Armstrong").await.unwrap();
        assert_eq!(summary.kind, PageKind::Disambiguation);
    }

    #[tokio::test]
    async fn summary_404_is_page_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        let err = client.summary("Missing Page").await.unwrap_err();
        assert!(matches!(err, FounderWikiError::PageNotFound { .. }));
    }

    #[tokio::test]
    async fn fetch_content_returns_extract_and_sections() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Jane_Founder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Jane Founder",
                "type": "standard",
                "extract": "Jane Founder is an entrepreneur."
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {
                    "pages": [
                        { "extract": "Jane Founder is an entrepreneur. She founded Acme." }
                    ]
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "sections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "parse": {
                    "sections": [
                        { "line": "Early life" },
                        { "line": "Career" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        let content = client.fetch_content("Jane Founder").await.unwrap();
        assert!(content.content.contains("founded Acme"));
        assert_eq!(content.sections, vec!["Early life", "Career"]);
    }

    #[tokio::test]
    async fn fetch_content_refuses_disambiguation_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Brian_Armstrong"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Brian Armstrong",
                "type": "disambiguation",
                "extract": "Brian Armstrong may refer to:"
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        let err = client.fetch_content("Brian Armstrong").await.unwrap_err();
        assert!(matches!(err, FounderWikiError::Disambiguation { .. }));
    }

    #[tokio::test]
    async fn fetch_content_rejects_empty_extract() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Empty_Page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Empty Page",
                "type": "standard",
                "extract": ""
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [ { "extract": "" } ] }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(&test_config(&server)).unwrap();
        let err = client.fetch_content("Empty Page").await.unwrap_err();
        assert!(matches!(err, FounderWikiError::Validation { .. }));
    }
}
