//! Model routing config loader (`spec.md` §6): `active.yml` names which
//! `routings/*.yml` file is live; each routing file maps an action name
//! to a `ModelConfig` plus its fallback chain. `LLM_ECONOMY_MODE=true`
//! switches to the economy routing regardless of `active.yml`.

use super::client::{ActionProfile, ModelConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoutingError>;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("IO error reading {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("YAML parse error in {path}: {source}")]
    Yaml { path: String, source: serde_yaml::Error },

    #[error("no routing entry for action {0}")]
    UnknownAction(String),
}

const ECONOMY_MODE_ENV: &str = "LLM_ECONOMY_MODE";

#[derive(Debug, Clone, Deserialize)]
struct ActiveConfig {
    default_routing: String,
    economy_routing: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawModelEntry {
    model: String,
    #[serde(default = "default_provider")]
    provider: String,
    prompt_file: Option<String>,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default)]
    fallbacks: Vec<RawModelEntry>,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_temperature() -> f64 {
    0.0
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_timeout_ms() -> u64 {
    60_000
}

impl From<&RawModelEntry> for ModelConfig {
    fn from(raw: &RawModelEntry) -> Self {
        ModelConfig {
            model: raw.model.clone(),
            provider: raw.provider.clone(),
            prompt_file: raw.prompt_file.clone(),
            temperature: raw.temperature,
            max_tokens: raw.max_tokens,
            timeout_ms: raw.timeout_ms,
        }
    }
}

type RoutingFile = HashMap<String, RawModelEntry>;

pub struct RoutingLoader {
    config_dir: PathBuf,
}

impl RoutingLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self { config_dir: config_dir.into() }
    }

    fn read_yaml<T: for<'de> Deserialize<'de>>(&self, relative: &str) -> Result<T> {
        let path = self.config_dir.join(relative);
        let text = std::fs::read_to_string(&path)
            .map_err(|source| RoutingError::Io { path: path.display().to_string(), source })?;
        serde_yaml::from_str(&text)
            .map_err(|source| RoutingError::Yaml { path: path.display().to_string(), source })
    }

    fn active_routing_name(&self) -> Result<String> {
        let active: ActiveConfig = self.read_yaml("active.yml")?;
        let economy = std::env::var(ECONOMY_MODE_ENV).map(|v| v == "true").unwrap_or(false);
        Ok(if economy { active.economy_routing } else { active.default_routing })
    }

    /// Resolve `action` (dot notation, e.g. `extract.lineage.package`)
    /// against the currently active routing file.
    pub fn resolve_action(&self, action: &str) -> Result<ActionProfile> {
        let routing_name = self.active_routing_name()?;
        let routing_file: RoutingFile =
            self.read_yaml(&format!("routings/{routing_name}.yml"))?;
        let entry = routing_file
            .get(action)
            .ok_or_else(|| RoutingError::UnknownAction(action.to_string()))?;

        Ok(ActionProfile {
            primary: ModelConfig::from(entry),
            fallbacks: entry.fallbacks.iter().map(ModelConfig::from).collect(),
        })
    }
}

pub fn config_dir_from_env() -> PathBuf {
    std::env::var("STRATA_LLM_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new("config/llm").to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &Path) {
        fs::write(
            dir.join("active.yml"),
            "default_routing: production\neconomy_routing: economy\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("routings")).unwrap();
        fs::write(
            dir.join("routings/production.yml"),
            r#"
extract.schema:
  model: gpt-4o
  provider: openai
  prompt_file: extract_schema
  temperature: 0.0
  max_tokens: 4000
  fallbacks:
    - model: gpt-4o-mini
      provider: openai
      temperature: 0.0
      max_tokens: 4000
"#,
        )
        .unwrap();
        fs::write(
            dir.join("routings/economy.yml"),
            r#"
extract.schema:
  model: llama-3.1-70b
  provider: groq
  temperature: 0.0
  max_tokens: 4000
"#,
        )
        .unwrap();
    }

    #[test]
    fn resolves_action_with_fallback_chain() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        std::env::remove_var(ECONOMY_MODE_ENV);

        let loader = RoutingLoader::new(tmp.path());
        let profile = loader.resolve_action("extract.schema").unwrap();
        assert_eq!(profile.primary.model, "gpt-4o");
        assert_eq!(profile.fallbacks.len(), 1);
        assert_eq!(profile.fallbacks[0].model, "gpt-4o-mini");
    }

    #[test]
    fn economy_mode_env_overrides_active_yml() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        std::env::set_var(ECONOMY_MODE_ENV, "true");

        let loader = RoutingLoader::new(tmp.path());
        let profile = loader.resolve_action("extract.schema").unwrap();
        assert_eq!(profile.primary.provider, "groq");

        std::env::remove_var(ECONOMY_MODE_ENV);
    }

    #[test]
    fn unknown_action_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        std::env::remove_var(ECONOMY_MODE_ENV);

        let loader = RoutingLoader::new(tmp.path());
        assert!(matches!(
            loader.resolve_action("ghost.action"),
            Err(RoutingError::UnknownAction(_))
        ));
    }
}
