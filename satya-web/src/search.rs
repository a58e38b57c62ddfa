//! Google Custom Search (Programmable Search Engine) client used to surface
//! related coverage for a claim.

use satya_http::{ApiKey, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

pub const GOOGLE_SEARCH_BASE_URL: &str = "https://www.googleapis.com";

/// Number of results requested from, and kept out of, a search.
pub const RELATED_NEWS_LIMIT: usize = 3;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const QUERY_LOG_MAX: usize = 160;

/// One related article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

#[derive(Clone)]
pub struct GoogleSearchClient {
    http: HttpClient,
    api_key: String,
    engine_id: String,
}

impl GoogleSearchClient {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_endpoint(GOOGLE_SEARCH_BASE_URL, api_key, engine_id)
    }

    pub fn with_endpoint(
        endpoint: &str,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Result<Self, HttpError> {
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let http = HttpClient::new(&base)?.with_timeout(SEARCH_TIMEOUT);
        Ok(Self {
            http,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        })
    }

    /// Top results for `query`, at most [`RELATED_NEWS_LIMIT`] of them.
    pub async fn search(&self, query: &str) -> Result<Vec<NewsItem>, HttpError> {
        let opts = RequestOpts::with_key(ApiKey::new("key", &self.api_key))
            .param("cx", self.engine_id.as_str())
            .param("q", query)
            .param("num", RELATED_NEWS_LIMIT.to_string());
        let resp: SearchResponse = self.http.get_json("customsearch/v1", opts).await?;

        Ok(resp
            .items
            .into_iter()
            .filter(|item| !item.link.trim().is_empty())
            .take(RELATED_NEWS_LIMIT)
            .map(|item| NewsItem {
                title: item.title,
                link: item.link,
            })
            .collect())
    }

    /// Best-effort variant of [`GoogleSearchClient::search`]: failures are
    /// logged and reported as `None`.
    pub async fn related_news(&self, claim: &str) -> Option<Vec<NewsItem>> {
        let started = std::time::Instant::now();
        match self.search(claim).await {
            Ok(items) => {
                tracing::info!(
                    target: "web.search",
                    query = %snip(claim),
                    hits = items.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "search.related_news.ok"
                );
                Some(items)
            }
            Err(err) => {
                tracing::warn!(
                    target: "web.search",
                    query = %snip(claim),
                    error = %err,
                    "search.related_news.failed"
                );
                None
            }
        }
    }
}

fn snip(query: &str) -> Cow<'_, str> {
    match query.char_indices().nth(QUERY_LOG_MAX) {
        Some((idx, _)) => Cow::Owned(format!("{}…", &query[..idx])),
        None => Cow::Borrowed(query),
    }
}
