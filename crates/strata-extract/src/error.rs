use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Mirrors the `error_type` taxonomy in `spec.md` §7.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("llm_error: {0}")]
    Llm(String),

    #[error("json_parse_error: {0}")]
    JsonParse(String),

    #[error("validation_error: {0}")]
    Validation(String),

    #[error("model_execution_error: {0}")]
    ModelExecution(String),

    #[error("all fallback models exhausted for action {0}")]
    FallbackExhausted(String),

    #[error("unsupported file class: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Prompt(#[from] strata_prompt::PromptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl ExtractError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ExtractError::Llm(_) => "llm_error",
            ExtractError::JsonParse(_) => "json_parse_error",
            ExtractError::Validation(_) => "validation_error",
            ExtractError::ModelExecution(_) => "model_execution_error",
            ExtractError::FallbackExhausted(_) => "fallback_exhausted",
            ExtractError::Unsupported(_) => "action_execution_error",
            ExtractError::Prompt(_) => "action_execution_error",
            ExtractError::Io(_) => "ingest_error",
            ExtractError::Xml(_) => "json_parse_error",
        }
    }
}
