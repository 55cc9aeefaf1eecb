//! Prompt Layer / Action Prompt Config / Project Action Config persistence
//! (`spec.md` §4.J Prompt Composer).

use crate::error::Result;
use crate::LineageStore;
use strata_ids::SolutionId;
use strata_protocol::{ActionPromptConfig, PromptLayer, PromptLayerType, ProjectActionConfig};

impl LineageStore {
    pub async fn upsert_prompt_layer(&self, layer: &PromptLayer) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO prompt_layer (name, layer_type, content) VALUES (?, ?, ?)
               ON CONFLICT(name) DO UPDATE SET layer_type = excluded.layer_type, content = excluded.content"#,
        )
        .bind(&layer.name)
        .bind(layer.layer_type)
        .bind(&layer.content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_prompt_layer(&self, name: &str) -> Result<Option<PromptLayer>> {
        let row = sqlx::query_as::<_, PromptLayerRow>(
            "SELECT name, layer_type, content FROM prompt_layer WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn upsert_action_prompt_config(&self, config: &ActionPromptConfig) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO action_prompt_config
               (action, base_layer, domain_layer, org_layer, reasoner_layer)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(action) DO UPDATE SET
                   base_layer = excluded.base_layer,
                   domain_layer = excluded.domain_layer,
                   org_layer = excluded.org_layer,
                   reasoner_layer = excluded.reasoner_layer"#,
        )
        .bind(&config.action)
        .bind(&config.base_layer)
        .bind(&config.domain_layer)
        .bind(&config.org_layer)
        .bind(&config.reasoner_layer)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_action_prompt_config(&self, action: &str) -> Result<Option<ActionPromptConfig>> {
        let row = sqlx::query_as::<_, ActionPromptConfigRow>(
            r#"SELECT action, base_layer, domain_layer, org_layer, reasoner_layer
               FROM action_prompt_config WHERE action = ?"#,
        )
        .bind(action)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn upsert_project_action_config(&self, config: &ProjectActionConfig) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO project_action_config (project_id, action, solution_layer)
               VALUES (?, ?, ?)
               ON CONFLICT(project_id, action) DO UPDATE SET solution_layer = excluded.solution_layer"#,
        )
        .bind(&config.project_id)
        .bind(&config.action)
        .bind(&config.solution_layer)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_project_action_config(
        &self,
        project_id: &SolutionId,
        action: &str,
    ) -> Result<Option<ProjectActionConfig>> {
        let row = sqlx::query_as::<_, ProjectActionConfigRow>(
            "SELECT project_id, action, solution_layer FROM project_action_config WHERE project_id = ? AND action = ?",
        )
        .bind(project_id)
        .bind(action)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct PromptLayerRow {
    name: String,
    layer_type: PromptLayerType,
    content: String,
}

impl From<PromptLayerRow> for PromptLayer {
    fn from(row: PromptLayerRow) -> Self {
        PromptLayer {
            name: row.name,
            layer_type: row.layer_type,
            content: row.content,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ActionPromptConfigRow {
    action: String,
    base_layer: Option<String>,
    domain_layer: Option<String>,
    org_layer: Option<String>,
    reasoner_layer: Option<String>,
}

impl From<ActionPromptConfigRow> for ActionPromptConfig {
    fn from(row: ActionPromptConfigRow) -> Self {
        ActionPromptConfig {
            action: row.action,
            base_layer: row.base_layer,
            domain_layer: row.domain_layer,
            org_layer: row.org_layer,
            reasoner_layer: row.reasoner_layer,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProjectActionConfigRow {
    project_id: SolutionId,
    action: String,
    solution_layer: String,
}

impl From<ProjectActionConfigRow> for ProjectActionConfig {
    fn from(row: ProjectActionConfigRow) -> Self {
        ProjectActionConfig {
            project_id: row.project_id,
            action: row.action,
            solution_layer: row.solution_layer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_prompt_layer_overwrites_content() {
        let store = LineageStore::open(None).await.unwrap();
        let layer = PromptLayer {
            name: "base/discovery".into(),
            layer_type: PromptLayerType::Base,
            content: "v1".into(),
        };
        store.upsert_prompt_layer(&layer).await.unwrap();

        let updated = PromptLayer { content: "v2".into(), ..layer.clone() };
        store.upsert_prompt_layer(&updated).await.unwrap();

        let fetched = store.get_prompt_layer("base/discovery").await.unwrap().unwrap();
        assert_eq!(fetched.content, "v2");
    }
}
