//! Web-search responder.
//!
//! Queries a pluggable search backend and composes an answer that always
//! cites the source URL of each hit. The HTTP backend speaks the Tavily
//! wire shape; the static backend serves tests and keyless operation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use supersearch_core::config::WebConfig;
use supersearch_core::types::ConversationState;
use supersearch_router::{Responder, ResponderError, ResponderReply};

/// One search result from a backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: f64,
}

/// A search engine the web responder can query.
///
/// Opaque to the routing core: credentials, ranking, and transport all
/// live behind this seam.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ResponderError>;
}

// =============================================================================
// HttpSearchBackend
// =============================================================================

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

/// Backend that POSTs to a Tavily-style search API.
pub struct HttpSearchBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
    timeout_secs: u64,
}

impl HttpSearchBackend {
    /// Build from config. Fails when no API key is configured.
    pub fn new(config: &WebConfig) -> Result<Self, ResponderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ResponderError::Backend("no search API key configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResponderError::Backend(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            max_results: config.max_results,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ResponderError> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::Timeout(self.timeout_secs)
                } else {
                    ResponderError::Backend(format!("search request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResponderError::Backend(format!(
                "search API returned {}",
                status
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ResponderError::Backend(format!("malformed search response: {}", e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
                score: r.score,
            })
            .collect())
    }
}

// =============================================================================
// StaticBackend
// =============================================================================

/// Backend returning a fixed hit list. Used in tests and when the
/// application runs without an API key.
#[derive(Default)]
pub struct StaticBackend {
    hits: Vec<SearchHit>,
}

impl StaticBackend {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl SearchBackend for StaticBackend {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ResponderError> {
        Ok(self.hits.clone())
    }
}

// =============================================================================
// WebResponder
// =============================================================================

/// Responder that answers from open web search results.
///
/// This is the designated fallback responder: it never needs structured
/// access and it signals "nothing found" with a usable, polite turn rather
/// than an empty reply.
pub struct WebResponder {
    backend: Box<dyn SearchBackend>,
    max_results: usize,
}

impl WebResponder {
    pub fn new(backend: impl SearchBackend + 'static, max_results: usize) -> Self {
        Self {
            backend: Box::new(backend),
            max_results: max_results.max(1),
        }
    }

    fn format_hits(hits: &[SearchHit]) -> String {
        let mut out = String::from("Here's what I found on the web:\n");
        for (i, hit) in hits.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} - {} (source: {})\n",
                i + 1,
                hit.title,
                hit.snippet,
                hit.url
            ));
        }
        out
    }
}

#[async_trait]
impl Responder for WebResponder {
    fn name(&self) -> &str {
        "web"
    }

    fn capability(&self) -> &str {
        "Answers open questions from web search results, citing sources"
    }

    async fn invoke(&self, state: &ConversationState) -> Result<ResponderReply, ResponderError> {
        let question = match state.latest_user_turn() {
            Some(turn) => turn.content.clone(),
            None => return Ok(ResponderReply::empty()),
        };

        let mut hits = self.backend.search(&question).await?;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.max_results);

        if hits.is_empty() {
            return Ok(ResponderReply::answer(
                self.name(),
                "I couldn't find anything specific about that on the web. \
                 Could you try rephrasing the question?",
            ));
        }

        Ok(ResponderReply::answer(self.name(), Self::format_hits(&hits)))
    }
}

// =============================================================================
// Tests
// =============================================================================
