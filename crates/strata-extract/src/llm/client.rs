//! The LLM client contract (`spec.md` §6): `call(model, messages,
//! temperature, max_tokens, provider, json_mode?) -> { success,
//! content, tokens_in, tokens_out, provider, error? }`, honoring a
//! timeout and accepting multipart content for vision actions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub model: String,
    pub provider: String,
    pub prompt_file: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionProfile {
    pub primary: ModelConfig,
    pub fallbacks: Vec<ModelConfig>,
}

impl ActionProfile {
    pub fn chain(&self) -> Vec<&ModelConfig> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum MessageContent {
    Text(String),
    Multipart(Vec<ContentPart>),
}

#[derive(Debug, Clone)]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { url: String },
}

#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub provider: String,
    pub messages: Vec<LlmMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub json_mode: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub success: bool,
    pub content: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub provider: String,
    pub error: Option<String>,
    /// Set when the provider signaled HTTP 429 (rate-limited); drives the
    /// runner's exponential-backoff retry (`spec.md` §4.C).
    pub rate_limited: bool,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn call(&self, request: LlmRequest) -> LlmResponse;
}
