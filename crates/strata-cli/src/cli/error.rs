//! Helpful error types for CLI commands.
//!
//! Every error carries a message, optional context, and a list of
//! actionable suggestions so a user hitting it from a terminal has
//! somewhere to go next.

use std::fmt;

/// An error with helpful context and suggestions.
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new() }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    /// A caller-supplied ID string did not parse as a UUID.
    pub fn invalid_id(label: &str, value: &str) -> Self {
        Self::new(format!("Invalid {label}: '{value}'"))
            .with_context(format!("{label} must be a UUID, as printed by a prior command"))
    }

    /// `STRATA_LLM_API_KEY` (or a provider-specific override) was not set.
    pub fn missing_api_key(provider: &str) -> Self {
        Self::new(format!("No API key configured for provider '{provider}'"))
            .with_context("The worker needs a key to call this provider's API")
            .with_suggestion(format!(
                "TRY: export STRATA_LLM_API_KEY_{}=sk-...  (or the provider's own *_API_KEY)",
                provider.to_ascii_uppercase()
            ))
    }

    /// The on-disk routing config directory is missing `active.yml`.
    pub fn missing_routing_config(config_dir: &std::path::Path) -> Self {
        Self::new(format!("No routing config found at {}", config_dir.display()))
            .with_context("Expected an active.yml plus a routings/ directory")
            .with_suggestion("TRY: set STRATA_LLM_CONFIG_DIR to point at a config directory")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;
        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {ctx}")?;
        }
        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {suggestion}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context_and_suggestions() {
        let err = HelpfulError::new("boom").with_context("while doing a thing").with_suggestion("TRY: retry");
        let rendered = format!("{err}");
        assert!(rendered.contains("ERROR: boom"));
        assert!(rendered.contains("CONTEXT: while doing a thing"));
        assert!(rendered.contains("TRY: retry"));
    }

    #[test]
    fn invalid_id_names_the_label() {
        let err = HelpfulError::invalid_id("job id", "not-a-uuid");
        assert!(format!("{err}").contains("Invalid job id"));
    }

    #[test]
    fn missing_api_key_suggests_the_scoped_env_var() {
        let err = HelpfulError::missing_api_key("groq");
        assert!(format!("{err}").contains("STRATA_LLM_API_KEY_GROQ"));
    }

    #[test]
    fn missing_routing_config_names_the_directory() {
        let err = HelpfulError::missing_routing_config(std::path::Path::new("/tmp/routing"));
        assert!(format!("{err}").contains("/tmp/routing"));
    }
}
