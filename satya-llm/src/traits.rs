use async_trait::async_trait;
use satya_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub tokens_used: Option<u32>,
}

/// Generation knobs forwarded to the provider. `None` means provider default.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOpts {
    pub temperature: Option<f32>,
    /// Ask the provider to emit a bare JSON document (if it supports it).
    pub json_output: bool,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a single completion for `prompt`. Exactly one request is made.
    async fn generate(&self, prompt: &str, opts: GenerateOpts) -> Result<LlmResponse>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
