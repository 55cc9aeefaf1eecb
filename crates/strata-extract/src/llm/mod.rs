pub mod client;
pub mod parse;
pub mod routing;
pub mod runner;

pub use client::{ActionProfile, ContentPart, LlmClient, LlmMessage, LlmRequest, LlmResponse, MessageContent, ModelConfig};
pub use routing::RoutingLoader;
pub use runner::{ActionRunner, Payload, RunOutcome, Schema};
