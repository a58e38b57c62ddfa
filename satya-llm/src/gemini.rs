use crate::traits::{GenerateOpts, LlmClient, LlmResponse};
use async_trait::async_trait;
use satya_common::{Result, SatyaError};
use satya_http::{ApiKey, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const GEMINI_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

/// Google Gemini `generateContent` client.
///
/// The API key travels as the `key` query parameter and is never logged.
#[derive(Clone)]
pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Client against the public Gemini endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(GEMINI_BASE_URL, api_key, model)
    }

    /// Client against an arbitrary Gemini-compatible base URL
    /// (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn with_endpoint(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let http = HttpClient::new(&with_trailing_slash(endpoint))
            .map_err(|e| SatyaError::Config(format!("invalid Gemini endpoint: {e}")))?
            .with_timeout(GEMINI_TIMEOUT);
        Self::from_http(http, api_key, model)
    }

    /// Reuse an existing HTTP client (its base must end with `/`).
    pub fn from_http(
        http: HttpClient,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SatyaError::Credential(
                "Gemini API key is empty".to_string(),
            ));
        }
        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model: model.into(),
        })
    }

    fn create_safety_settings() -> Vec<GeminiSafetySetting> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| GeminiSafetySetting {
            category,
            // The text under review is often deliberately provocative.
            threshold: "BLOCK_ONLY_HIGH",
        })
        .collect()
    }
}

fn with_trailing_slash(endpoint: &str) -> String {
    if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{endpoint}/")
    }
}

fn map_http_error(err: HttpError) -> SatyaError {
    match err {
        HttpError::Api { status, message } => SatyaError::Service {
            status: Some(status.as_u16()),
            message,
        },
        HttpError::Network(message) => SatyaError::Service {
            status: None,
            message,
        },
        HttpError::Decode(e, snippet) => SatyaError::MalformedResponse(format!(
            "response envelope is not valid JSON ({e}): {snippet}"
        )),
        HttpError::Url(e) | HttpError::Build(e) => {
            SatyaError::Config(format!("cannot build Gemini request: {e}"))
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str, opts: GenerateOpts) -> Result<LlmResponse> {
        let path = format!("models/{}:generateContent", self.model);

        let generation_config = (opts.temperature.is_some() || opts.json_output).then(|| {
            GeminiGenerationConfig {
                temperature: opts.temperature,
                response_mime_type: opts.json_output.then_some("application/json"),
            }
        });

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
            safety_settings: Self::create_safety_settings(),
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "gemini.generate.start");

        let resp: GeminiResponse = self
            .http
            .post_json(
                &path,
                &request,
                RequestOpts::with_key(ApiKey::new("key", &self.api_key)),
            )
            .await
            .map_err(map_http_error)?;

        let Some(candidate) = resp.candidates.into_iter().next() else {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked ({r})"))
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(SatyaError::MalformedResponse(reason));
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(SatyaError::MalformedResponse(
                "content blocked by Gemini safety filters".to_string(),
            ));
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(SatyaError::MalformedResponse(
                "candidate carried no text".to_string(),
            ));
        }

        let tokens_used = resp.usage_metadata.and_then(|u| u.total_token_count);
        tracing::debug!(
            model = %self.model,
            ?tokens_used,
            finish_reason = ?candidate.finish_reason,
            "gemini.generate.done"
        );

        Ok(LlmResponse { text, tokens_used })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
