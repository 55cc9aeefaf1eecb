//! Environment-driven configuration (`spec.md` §6 "Config of model
//! routing (on disk)"). Every path defaults to a sibling of the current
//! working directory so a fresh checkout works with no environment set.

use std::path::PathBuf;

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

/// Where the SQLite-backed `LineageStore` lives. `None` (the in-memory
/// store) is never selected by the CLI; tests are the only caller that
/// wants that.
pub fn db_path() -> PathBuf {
    env_path("STRATA_DB_PATH", "strata.db")
}

/// Scratch space the Artifact Fetcher copies/clones into.
pub fn artifacts_tmp_root() -> PathBuf {
    env_path("STRATA_ARTIFACTS_TMP", "data/artifacts_tmp")
}

/// Filesystem fallback directory for prompts with no DB-configured layer.
pub fn prompts_dir() -> PathBuf {
    env_path("STRATA_PROMPTS_DIR", "config/prompts")
}

/// Directory holding `active.yml` and `routings/*.yml`.
pub fn llm_config_dir() -> PathBuf {
    strata_extract::llm::routing::config_dir_from_env()
}

/// Base URL for an OpenAI-compatible chat completions endpoint, per
/// provider name (`spec.md` §6 LLM client contract's `provider` field).
/// Providers not listed here need `STRATA_LLM_BASE_URL_<PROVIDER>` set.
pub fn provider_base_url(provider: &str) -> String {
    let var = format!("STRATA_LLM_BASE_URL_{}", provider.to_ascii_uppercase());
    if let Ok(url) = std::env::var(&var) {
        return url;
    }
    match provider {
        "openai" => "https://api.openai.com/v1/chat/completions".to_string(),
        "groq" => "https://api.groq.com/openai/v1/chat/completions".to_string(),
        "together" => "https://api.together.xyz/v1/chat/completions".to_string(),
        "anthropic" => "https://api.anthropic.com/v1/messages".to_string(),
        other => format!("https://api.{other}.com/v1/chat/completions"),
    }
}

/// API key for `provider`, read from `STRATA_LLM_API_KEY_<PROVIDER>` or
/// the provider's own conventional env var, in that order.
pub fn provider_api_key(provider: &str) -> Option<String> {
    let scoped = format!("STRATA_LLM_API_KEY_{}", provider.to_ascii_uppercase());
    if let Ok(key) = std::env::var(&scoped) {
        return Some(key);
    }
    let conventional = match provider {
        "openai" => "OPENAI_API_KEY",
        "groq" => "GROQ_API_KEY",
        "together" => "TOGETHER_API_KEY",
        "anthropic" => "ANTHROPIC_API_KEY",
        _ => return std::env::var("STRATA_LLM_API_KEY").ok(),
    };
    std::env::var(conventional).or_else(|_| std::env::var("STRATA_LLM_API_KEY")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_base_url_has_a_default_for_known_providers() {
        assert!(provider_base_url("openai").contains("openai.com"));
        assert!(provider_base_url("groq").contains("groq.com"));
    }

    #[test]
    fn provider_base_url_falls_back_for_unknown_providers() {
        assert_eq!(provider_base_url("mystery"), "https://api.mystery.com/v1/chat/completions");
    }
}
