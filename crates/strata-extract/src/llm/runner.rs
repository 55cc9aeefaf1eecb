//! LLM Action Runner (`spec.md` §4.C): composes the prompt, calls
//! each model in the fallback chain in turn, retries 429s with
//! exponential backoff, parses the response, and (for `extract*`
//! actions) repairs its schema.

use super::client::{ActionProfile, ContentPart, LlmClient, LlmMessage, LlmRequest, MessageContent};
use super::parse::{self, RepairedExtraction};
use crate::error::{ExtractError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strata_ids::SolutionId;
use strata_prompt::PromptComposer;
use tracing::{info, warn};

const MAX_PAYLOAD_CHARS: usize = 100_000;
const TRUNCATION_SUFFIX: &str = "… (truncated)";
const RETRY_BACKOFFS: [u64; 3] = [5, 10, 20];
const DEFAULT_RATE_PER_1K: f64 = 0.002;

pub enum Payload {
    Text(String),
    Vision { mime: String, base64: String, prompt: String },
}

fn truncate_payload(text: &str) -> String {
    if text.chars().count() <= MAX_PAYLOAD_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_PAYLOAD_CHARS).collect();
    format!("{truncated}{TRUNCATION_SUFFIX}")
}

fn wants_json_mode(action: &str, prompt_file: &Option<String>) -> bool {
    let name = prompt_file.as_deref().unwrap_or(action);
    name.contains("extract") || name.contains("strict")
}

pub struct RunOutcome {
    pub raw_value: Value,
    pub model_used: String,
    pub provider: String,
    pub fallback_used: bool,
    pub models_attempted: Vec<String>,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub cost_estimate_usd: f64,
    pub retry_count: u32,
}

pub struct ActionRunner<C: LlmClient> {
    client: Arc<C>,
    composer: Arc<PromptComposer>,
}

impl<C: LlmClient> ActionRunner<C> {
    pub fn new(client: Arc<C>, composer: Arc<PromptComposer>) -> Self {
        Self { client, composer }
    }

    pub async fn run(
        &self,
        action: &str,
        profile: &ActionProfile,
        project_id: Option<&SolutionId>,
        payload: Payload,
        vars: &HashMap<String, String>,
        schema: Schema,
    ) -> Result<RunOutcome> {
        let chain = profile.chain();
        let mut models_attempted = Vec::new();
        let mut last_error: Option<ExtractError> = None;

        for (idx, model_config) in chain.iter().enumerate() {
            models_attempted.push(model_config.model.clone());
            let composed = self.composer.compose(action, project_id, vars).await?;
            let user_content = match &payload {
                Payload::Text(text) => MessageContent::Text(truncate_payload(text)),
                Payload::Vision { mime, base64, prompt } => MessageContent::Multipart(vec![
                    ContentPart::Text { text: prompt.clone() },
                    ContentPart::ImageUrl { url: format!("data:{mime};base64,{base64}") },
                ]),
            };

            let json_mode = wants_json_mode(action, &model_config.prompt_file);
            let messages = vec![
                LlmMessage { role: "system", content: MessageContent::Text(composed) },
                LlmMessage { role: "user", content: user_content },
            ];

            let mut retry_count = 0u32;
            let response = loop {
                let request = LlmRequest {
                    model: model_config.model.clone(),
                    provider: model_config.provider.clone(),
                    messages: messages.clone(),
                    temperature: model_config.temperature,
                    max_tokens: model_config.max_tokens,
                    json_mode,
                    timeout_ms: model_config.timeout_ms,
                };
                let response = self.client.call(request).await;

                if response.rate_limited && (retry_count as usize) < RETRY_BACKOFFS.len() {
                    let backoff = RETRY_BACKOFFS[retry_count as usize];
                    warn!(model = %model_config.model, backoff, "rate limited, retrying");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    retry_count += 1;
                    continue;
                }
                break response;
            };

            if !response.success {
                last_error = Some(ExtractError::Llm(
                    response.error.unwrap_or_else(|| "unknown LLM error".to_string()),
                ));
                continue;
            }

            let raw_value = match parse::parse_response(&response.content) {
                Ok(v) => v,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };

            let validated = match schema {
                Schema::Extraction => match parse::repair_extraction_schema(raw_value.clone()) {
                    Ok(repaired) => {
                        if repaired.dropped_edges > 0 {
                            warn!(dropped = repaired.dropped_edges, action, "dropped edges missing an endpoint");
                        }
                        Some(repaired)
                    }
                    Err(e) => {
                        last_error = Some(e);
                        None
                    }
                },
                Schema::PassThrough => None,
            };
            if schema == Schema::Extraction && validated.is_none() {
                continue;
            }

            let cost_estimate_usd = (response.tokens_in + response.tokens_out) as f64 / 1000.0 * DEFAULT_RATE_PER_1K;
            info!(model = %model_config.model, action, fallback_used = idx > 0, "action completed");

            return Ok(RunOutcome {
                raw_value,
                model_used: model_config.model.clone(),
                provider: response.provider,
                fallback_used: idx > 0,
                models_attempted,
                tokens_in: response.tokens_in,
                tokens_out: response.tokens_out,
                cost_estimate_usd,
                retry_count,
            });
        }

        warn!(action, attempted = ?models_attempted, "fallback chain exhausted");
        Err(last_error.unwrap_or_else(|| ExtractError::FallbackExhausted(action.to_string())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Extraction,
    PassThrough,
}

/// Parse a successfully-validated `extract*` response into its typed
/// nodes/edges/evidences/assumptions.
pub fn into_extraction(value: Value) -> Result<RepairedExtraction> {
    parse::repair_extraction_schema(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strata_db::LineageStore;

    struct ScriptedClient {
        calls: AtomicUsize,
        responses: Vec<super::super::client::LlmResponse>,
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn call(&self, _request: LlmRequest) -> super::super::client::LlmResponse {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses[idx.min(self.responses.len() - 1)].clone()
        }
    }

    fn model_config(name: &str) -> super::super::client::ModelConfig {
        super::super::client::ModelConfig {
            model: name.to_string(),
            provider: "openai".to_string(),
            prompt_file: Some("extract_schema".to_string()),
            temperature: 0.0,
            max_tokens: 4000,
            timeout_ms: 60_000,
        }
    }

    #[tokio::test]
    async fn falls_back_to_second_model_when_first_returns_invalid_json() {
        let store = Arc::new(LineageStore::open(None).await.unwrap());
        let composer = Arc::new(PromptComposer::new(store, "prompts"));
        let client = Arc::new(ScriptedClient {
            calls: AtomicUsize::new(0),
            responses: vec![
                super::super::client::LlmResponse {
                    success: true,
                    content: "not json at all {{{".to_string(),
                    tokens_in: 10,
                    tokens_out: 5,
                    provider: "openai".to_string(),
                    error: None,
                    rate_limited: false,
                },
                super::super::client::LlmResponse {
                    success: true,
                    content: r#"{"nodes": [], "edges": []}"#.to_string(),
                    tokens_in: 10,
                    tokens_out: 5,
                    provider: "openai".to_string(),
                    error: None,
                    rate_limited: false,
                },
            ],
        });
        let runner = ActionRunner::new(client, composer);
        let profile = ActionProfile {
            primary: model_config("model-a"),
            fallbacks: vec![model_config("model-b")],
        };

        let outcome = runner
            .run(
                "extract.strict",
                &profile,
                None,
                Payload::Text("select 1".to_string()),
                &HashMap::new(),
                Schema::Extraction,
            )
            .await
            .unwrap();

        assert_eq!(outcome.model_used, "model-b");
        assert!(outcome.fallback_used);
        assert_eq!(outcome.models_attempted, vec!["model-a", "model-b"]);
    }

    #[tokio::test]
    async fn truncates_payload_over_limit() {
        let long = "x".repeat(MAX_PAYLOAD_CHARS + 50);
        let truncated = truncate_payload(&long);
        assert!(truncated.ends_with(TRUNCATION_SUFFIX));
        assert_eq!(truncated.chars().count(), MAX_PAYLOAD_CHARS + TRUNCATION_SUFFIX.chars().count());
    }
}
