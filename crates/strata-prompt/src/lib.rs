//! Prompt Composer (`spec.md` §4.J): resolves per-action prompt layers
//! from `action_prompt_config`/`project_action_config`, falls back to a
//! filesystem prompt file when none resolve, and interpolates only the
//! placeholders the template literally names.

pub mod error;
pub mod interpolate;

pub use error::{PromptError, Result};
pub use interpolate::interpolate;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use strata_db::LineageStore;
use strata_ids::SolutionId;
use tracing::debug;

const BASE_HEADER: &str = "BASE";
const DOMAIN_HEADER: &str = "### DOMAIN SPECIALIZED INSTRUCTIONS";
const ORG_HEADER: &str = "### ORGANIZATIONAL GUIDELINES";
const SOLUTION_HEADER: &str = "### PROJECT-SPECIFIC RULES (SOLUTION LAYER)";
const REASONER_HEADER: &str = "### REASONING AGENT INSTRUCTIONS";

pub struct PromptComposer {
    store: Arc<LineageStore>,
    prompts_dir: PathBuf,
}

impl PromptComposer {
    pub fn new(store: Arc<LineageStore>, prompts_dir: impl Into<PathBuf>) -> Self {
        Self { store, prompts_dir: prompts_dir.into() }
    }

    /// Compose the full prompt for `action` (dot notation, e.g.
    /// `extract.lineage.package`), optionally scoped to `project_id` for
    /// the solution-layer override, then interpolate `vars`.
    pub async fn compose(
        &self,
        action: &str,
        project_id: Option<&SolutionId>,
        vars: &HashMap<String, String>,
    ) -> Result<String> {
        let raw = self.compose_raw(action, project_id).await?;
        Ok(interpolate(&raw, vars))
    }

    async fn compose_raw(&self, action: &str, project_id: Option<&SolutionId>) -> Result<String> {
        let config = self.store.get_action_prompt_config(action).await?;

        let mut sections: Vec<(&'static str, String)> = Vec::new();

        if let Some(config) = &config {
            if let Some(content) = self.resolve_layer(&config.base_layer).await? {
                sections.push((BASE_HEADER, content));
            }
            if let Some(content) = self.resolve_layer(&config.domain_layer).await? {
                sections.push((DOMAIN_HEADER, content));
            }
            if let Some(content) = self.resolve_layer(&config.org_layer).await? {
                sections.push((ORG_HEADER, content));
            }
        }

        if let Some(project_id) = project_id {
            if let Some(project_config) =
                self.store.get_project_action_config(project_id, action).await?
            {
                sections.push((SOLUTION_HEADER, project_config.solution_layer));
            }
        }

        if let Some(config) = &config {
            if let Some(content) = self.resolve_layer(&config.reasoner_layer).await? {
                sections.push((REASONER_HEADER, content));
            }
        }

        if sections.is_empty() {
            return self.fallback_file(action);
        }

        Ok(sections
            .into_iter()
            .map(|(header, content)| format!("{header}\n{content}"))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn resolve_layer(&self, layer_name: &Option<String>) -> Result<Option<String>> {
        match layer_name {
            Some(name) => Ok(self.store.get_prompt_layer(name).await?.map(|l| l.content)),
            None => Ok(None),
        }
    }

    fn fallback_file(&self, action: &str) -> Result<String> {
        let stem = action.replace('.', "_");
        for ext in ["md", "txt"] {
            let path = self.prompts_dir.join(format!("{stem}.{ext}"));
            if path.exists() {
                debug!(%action, path = %path.display(), "falling back to filesystem prompt file");
                return Ok(std::fs::read_to_string(path)?);
            }
        }
        Err(PromptError::NotFound(action.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::enums::PromptLayerType;
    use strata_protocol::{ActionPromptConfig, PromptLayer, ProjectActionConfig};

    async fn store() -> Arc<LineageStore> {
        Arc::new(LineageStore::open(None).await.unwrap())
    }

    #[tokio::test]
    async fn composes_base_domain_org_layers_in_order() {
        let store = store().await;
        store
            .upsert_prompt_layer(&PromptLayer {
                name: "base/extract".into(),
                layer_type: PromptLayerType::Base,
                content: "You extract lineage.".into(),
            })
            .await
            .unwrap();
        store
            .upsert_prompt_layer(&PromptLayer {
                name: "domain/sql".into(),
                layer_type: PromptLayerType::Domain,
                content: "Focus on T-SQL dialect quirks.".into(),
            })
            .await
            .unwrap();
        store
            .upsert_action_prompt_config(&ActionPromptConfig {
                action: "extract.schema".into(),
                base_layer: Some("base/extract".into()),
                domain_layer: Some("domain/sql".into()),
                org_layer: None,
                reasoner_layer: None,
            })
            .await
            .unwrap();

        let composer = PromptComposer::new(store, "prompts");
        let vars = HashMap::new();
        let composed = composer.compose("extract.schema", None, &vars).await.unwrap();

        assert!(composed.starts_with("BASE\nYou extract lineage."));
        assert!(composed.contains("### DOMAIN SPECIALIZED INSTRUCTIONS\nFocus on T-SQL"));
        assert!(!composed.contains("### ORGANIZATIONAL GUIDELINES"));
    }

    #[tokio::test]
    async fn project_override_adds_solution_layer() {
        let store = store().await;
        let project_id = SolutionId::new();
        store
            .upsert_action_prompt_config(&ActionPromptConfig {
                action: "extract.schema".into(),
                base_layer: None,
                domain_layer: None,
                org_layer: None,
                reasoner_layer: None,
            })
            .await
            .unwrap();
        store
            .upsert_project_action_config(&ProjectActionConfig {
                project_id: project_id.clone(),
                action: "extract.schema".into(),
                solution_layer: "Never touch the archive schema.".into(),
            })
            .await
            .unwrap();

        let composer = PromptComposer::new(store, "prompts");
        let composed = composer
            .compose("extract.schema", Some(&project_id), &HashMap::new())
            .await
            .unwrap();

        assert_eq!(
            composed,
            "### PROJECT-SPECIFIC RULES (SOLUTION LAYER)\nNever touch the archive schema."
        );
    }

    #[tokio::test]
    async fn falls_back_to_filesystem_file_when_no_layers_resolve() {
        let store = store().await;
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("triage_fast.md"), "Classify quickly.").unwrap();

        let composer = PromptComposer::new(store, tmp.path());
        let composed = composer.compose("triage_fast", None, &HashMap::new()).await.unwrap();
        assert_eq!(composed, "Classify quickly.");
    }

    #[tokio::test]
    async fn missing_layers_and_missing_file_is_not_found() {
        let store = store().await;
        let composer = PromptComposer::new(store, "/nonexistent/prompts/dir");
        let err = composer.compose("ghost.action", None, &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, PromptError::NotFound(_)));
    }
}
