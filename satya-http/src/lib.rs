//! JSON-over-HTTP plumbing shared by the Gemini and Custom Search clients
//! and the article fetcher.
//!
//! Every call is a single attempt. Google-style APIs take their key as a
//! query parameter, so [`ApiKey`] is the only credential shape; its value
//! (and any other secret-looking parameter) is replaced with `<redacted>`
//! before it reaches a `tracing` event. Set `SATYA_HTTP_RAW=1` to log a
//! curl line plus the response body under the `http.raw` target.
//!
//! ```no_run
//! # async fn demo() -> Result<(), satya_http::HttpError> {
//! use satya_http::{ApiKey, HttpClient, RequestOpts};
//!
//! let client = HttpClient::new("https://www.googleapis.com/")?;
//! let hits: serde_json::Value = client
//!     .get_json(
//!         "customsearch/v1",
//!         RequestOpts::with_key(ApiKey::new("key", "AIza..."))
//!             .param("cx", "engine")
//!             .param("q", "claim"),
//!     )
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "SATYA_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const REDACTED: &str = "<redacted>";

// Lowercase parameter names whose values never get logged.
const SECRET_PARAMS: &[&str] = &["key", "api_key", "apikey", "access_token", "token", "secret"];

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// An API key passed as a query parameter (Google's `key=`).
#[derive(Clone)]
pub struct ApiKey<'a> {
    pub param: &'a str,
    pub value: &'a str,
}

impl<'a> ApiKey<'a> {
    pub fn new(param: &'a str, value: &'a str) -> Self {
        Self { param, value }
    }
}

impl std::fmt::Debug for ApiKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("param", &self.param)
            .field("value", &REDACTED)
            .finish()
    }
}

/// What to send besides the method, path and body.
///
/// ```
/// use satya_http::{ApiKey, RequestOpts};
///
/// let opts = RequestOpts::with_key(ApiKey::new("key", "demo")).param("num", 3.to_string());
/// assert_eq!(opts.query.len(), 1);
/// assert!(opts.api_key.is_some());
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub api_key: Option<ApiKey<'a>>,
    pub query: Vec<(&'a str, Cow<'a, str>)>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

impl<'a> RequestOpts<'a> {
    pub fn with_key(api_key: ApiKey<'a>) -> Self {
        Self {
            api_key: Some(api_key),
            ..Default::default()
        }
    }

    /// Fetch a full URL rather than a path under the client's base.
    pub fn absolute() -> Self {
        Self {
            allow_absolute: true,
            ..Default::default()
        }
    }

    pub fn param(mut self, name: &'a str, value: impl Into<Cow<'a, str>>) -> Self {
        self.query.push((name, value.into()));
        self
    }
}

struct RawResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: bytes::Bytes,
    req_id: String,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub timeout: Duration,
}

impl HttpClient {
    /// Client anchored to `base`; relative paths are joined onto it, so give
    /// it a trailing `/` when it carries a path.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Self::with_user_agent(base, concat!("satya/", env!("CARGO_PKG_VERSION")))
    }

    /// Like [`HttpClient::new`] but announcing a custom `User-Agent`.
    pub fn with_user_agent(base: &str, user_agent: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the whole-request timeout (15 s unless changed).
    ///
    /// ```
    /// use satya_http::HttpClient;
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(60));
    /// assert_eq!(client.timeout, Duration::from_secs(60));
    /// # Ok::<(), satya_http::HttpError>(())
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let raw = self.send::<()>(Method::GET, path, None, opts).await?;
        decode_json(raw)
    }

    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let raw = self.send(Method::POST, path, Some(body), opts).await?;
        decode_json(raw)
    }

    /// GET a body as text (lossy UTF-8), e.g. an HTML page.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let raw = self.send::<()>(Method::GET, path, None, opts).await?;
        Ok(String::from_utf8_lossy(&raw.body).into_owned())
    }

    /// GET a body as raw bytes, e.g. a PDF.
    pub async fn get_bytes(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<bytes::Bytes, HttpError> {
        Ok(self.send::<()>(Method::GET, path, None, opts).await?.body)
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path, opts.allow_absolute)?;

        let mut query = opts.query;
        if let Some(key) = &opts.api_key {
            query.push((key.param, Cow::Borrowed(key.value)));
        }
        let shown_query = redact_pairs(&query);

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(self.timeout);
        if !query.is_empty() {
            let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        let body_bytes = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        if let Some(bytes) = &body_bytes {
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }

        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());
        tracing::debug!(
            %req_id,
            %method,
            host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query = ?shown_query,
            timeout_ms = self.timeout.as_millis() as u64,
            keyed = opts.api_key.is_some(),
            has_body = body_bytes.is_some(),
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&method, &url, &shown_query, body_bytes.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let started = Instant::now();
        let resp = rb.send().await.map_err(|e| {
            tracing::warn!(%req_id, message = %e, "http.network_error.send");
            HttpError::Network(e.to_string())
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|e| {
            tracing::warn!(%req_id, message = %e, "http.network_error.body");
            HttpError::Network(e.to_string())
        })?;
        let duration_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(
            %req_id,
            %status,
            duration_ms,
            body_len = body.len(),
            "http.response"
        );
        if raw_enabled() {
            let shown = &body[..body.len().min(RAW_MAX_BODY)];
            tracing::info!(
                target: "http.raw",
                %req_id,
                %status,
                headers = ?header_pairs(&headers),
                body = %String::from_utf8_lossy(shown),
                truncated = body.len() > RAW_MAX_BODY
            );
        }

        if !status.is_success() {
            let message = extract_error_message(&body);
            tracing::warn!(
                %req_id,
                %status,
                %message,
                body_snippet = %snip_body(&body),
                "http.error"
            );
            return Err(HttpError::Api { status, message });
        }

        Ok(RawResponse {
            status,
            content_type: headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
            req_id,
        })
    }
}

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn decode_json<T: DeserializeOwned>(raw: RawResponse) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(&raw.body).map_err(|e| {
        let snippet = snip_body(&raw.body);
        tracing::warn!(
            req_id = %raw.req_id,
            status = %raw.status,
            content_type = ?raw.content_type,
            serde_err = %e,
            body_snippet = %snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn is_secret_param(name: &str) -> bool {
    SECRET_PARAMS.contains(&name.to_ascii_lowercase().as_str())
}

fn redact_pairs(pairs: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let shown = if is_secret_param(k) { REDACTED } else { v.as_ref() };
            ((*k).to_string(), shown.to_string())
        })
        .collect()
}

// Response headers for raw logging; Google never echoes the key back, but
// cookies can carry session state.
fn header_pairs(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let val = if *k == reqwest::header::SET_COOKIE {
                REDACTED
            } else {
                v.to_str().unwrap_or("")
            };
            (k.as_str().to_string(), val.to_string())
        })
        .collect()
}

/// A copy-pasteable curl line; query secrets are already redacted.
fn make_curl(
    method: &Method,
    url: &Url,
    redacted_query: &[(String, String)],
    body: Option<&[u8]>,
) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    if let Some(bytes) = body {
        let shown = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
        parts.push(format!("-d '{}'", shown.replace('\'', r"'\''")));
    }
    let mut shown = url.clone();
    if !redacted_query.is_empty() {
        shown
            .query_pairs_mut()
            .extend_pairs(redacted_query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    parts.push(format!("'{shown}'"));
    parts.join(" ")
}

/// Pull a human-readable message out of an error body.
///
/// Understands Google's `{"error":{"message":..}}` envelope and the flat
/// `{"message"|"error": ..}` shapes; anything else is snipped raw.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        return env.error.message;
    }
    if let Ok(flat) = serde_json::from_slice::<Flat>(body) {
        if let Some(m) = [flat.message, flat.error].into_iter().find(|m| !m.is_empty()) {
            return m;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_MAX) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_error_envelope_is_unwrapped() {
        let body = br#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            extract_error_message(body),
            "API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn flat_error_shapes_fall_through_in_order() {
        assert_eq!(extract_error_message(br#"{"message":"nope"}"#), "nope");
        assert_eq!(extract_error_message(br#"{"error":"quota"}"#), "quota");
        assert_eq!(extract_error_message(b"plain failure"), "plain failure");
    }

    #[test]
    fn secret_query_params_are_redacted() {
        let pairs = vec![
            ("key", Cow::Borrowed("AIza-secret")),
            ("q", Cow::Borrowed("claim text")),
        ];
        let redacted = redact_pairs(&pairs);
        assert_eq!(redacted[0], ("key".into(), REDACTED.into()));
        assert_eq!(redacted[1], ("q".into(), "claim text".into()));
    }

    #[test]
    fn curl_line_never_contains_the_key() {
        let url = Url::parse("https://example.com/customsearch/v1").unwrap();
        let pairs = vec![
            ("key", Cow::Borrowed("AIza-secret")),
            ("num", Cow::Borrowed("3")),
        ];
        let curl = make_curl(&Method::GET, &url, &redact_pairs(&pairs), None);
        assert!(!curl.contains("AIza-secret"));
        assert!(curl.contains("num=3"));
    }

    #[test]
    fn api_key_debug_hides_the_value() {
        let shown = format!("{:?}", ApiKey::new("key", "AIza-secret"));
        assert!(!shown.contains("AIza-secret"));
    }

    #[test]
    fn long_bodies_are_snipped_on_char_boundary() {
        let body = "é".repeat(600);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert_eq!(snip.chars().count(), SNIPPET_MAX + 3);
    }
}
