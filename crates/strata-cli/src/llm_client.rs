//! `HttpLlmClient`: the production `strata_extract::llm::LlmClient` the
//! `worker` command wires into the Orchestrator. Speaks the OpenAI
//! chat-completions wire format, which is also what Groq, Together, and
//! most other providers `spec.md` §6 names serve behind their own base
//! URL — provider selection is therefore just a base URL and API key
//! swap, not a different request shape.

use crate::cli::error::HelpfulError;
use crate::config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strata_extract::llm::{ContentPart, LlmClient, LlmRequest, LlmResponse, MessageContent};
use tracing::warn;

pub struct HttpLlmClient {
    http: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

impl Default for HttpLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: ChatContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    error: Option<ChatError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChatError {
    message: String,
}

fn to_chat_message(message: &strata_extract::llm::LlmMessage) -> ChatMessage {
    let content = match &message.content {
        MessageContent::Text(text) => ChatContent::Text(text.clone()),
        MessageContent::Multipart(parts) => ChatContent::Parts(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => ChatContentPart::Text { text: text.clone() },
                    ContentPart::ImageUrl { url } => {
                        ChatContentPart::ImageUrl { image_url: ImageUrl { url: url.clone() } }
                    }
                })
                .collect(),
        ),
    };
    ChatMessage { role: message.role, content }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn call(&self, request: LlmRequest) -> LlmResponse {
        let Some(api_key) = config::provider_api_key(&request.provider) else {
            return LlmResponse {
                success: false,
                error: Some(HelpfulError::missing_api_key(&request.provider).to_string()),
                provider: request.provider,
                ..Default::default()
            };
        };

        let body = ChatRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(to_chat_message).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = config::provider_base_url(&request.provider);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&api_key)
            .timeout(Duration::from_millis(request.timeout_ms))
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(provider = %request.provider, error = %e, "llm call failed");
                return LlmResponse {
                    success: false,
                    error: Some(e.to_string()),
                    rate_limited: false,
                    provider: request.provider,
                    ..Default::default()
                };
            }
        };

        let rate_limited = response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS;
        let status_ok = response.status().is_success();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                return LlmResponse {
                    success: false,
                    error: Some(e.to_string()),
                    rate_limited,
                    provider: request.provider,
                    ..Default::default()
                }
            }
        };

        let parsed: Result<ChatResponse, _> = serde_json::from_str(&text);
        match parsed {
            Ok(parsed) if status_ok && !parsed.choices.is_empty() => LlmResponse {
                success: true,
                content: parsed.choices[0].message.content.clone(),
                tokens_in: parsed.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
                tokens_out: parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
                provider: request.provider,
                error: None,
                rate_limited: false,
            },
            Ok(parsed) => LlmResponse {
                success: false,
                error: Some(parsed.error.map(|e| e.message).unwrap_or_else(|| text.clone())),
                rate_limited,
                provider: request.provider,
                ..Default::default()
            },
            Err(e) => LlmResponse {
                success: false,
                error: Some(format!("unparseable response ({e}): {text}")),
                rate_limited,
                provider: request.provider,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_extract::llm::LlmMessage;

    #[test]
    fn text_message_serializes_as_a_bare_string() {
        let message = LlmMessage { role: "user", content: MessageContent::Text("hello".to_string()) };
        let chat = to_chat_message(&message);
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn multipart_message_serializes_as_tagged_parts() {
        let message = LlmMessage {
            role: "user",
            content: MessageContent::Multipart(vec![
                ContentPart::Text { text: "describe this".to_string() },
                ContentPart::ImageUrl { url: "data:image/png;base64,xyz".to_string() },
            ]),
        };
        let chat = to_chat_message(&message);
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "describe this");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(json["content"][1]["image_url"]["url"], "data:image/png;base64,xyz");
    }

    #[test]
    fn chat_request_omits_response_format_when_not_json_mode() {
        let body = ChatRequest {
            model: "gpt-4".to_string(),
            messages: vec![],
            temperature: 0.0,
            max_tokens: 100,
            response_format: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn chat_request_sets_json_object_type_when_json_mode() {
        let body = ChatRequest {
            model: "gpt-4".to_string(),
            messages: vec![],
            temperature: 0.0,
            max_tokens: 100,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }
}
