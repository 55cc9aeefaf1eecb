//! Prompt Layer / Action Prompt Config / Project Action Config
//! (`spec.md` §3, §4.J).

use crate::enums::PromptLayerType;
use serde::{Deserialize, Serialize};
use strata_ids::SolutionId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptLayer {
    pub name: String,
    pub layer_type: PromptLayerType,
    pub content: String,
}

/// Maps an action name to zero or one layer of each non-solution scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPromptConfig {
    pub action: String,
    pub base_layer: Option<String>,
    pub domain_layer: Option<String>,
    pub org_layer: Option<String>,
    pub reasoner_layer: Option<String>,
}

/// Overrides the SOLUTION layer per `project_id` (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectActionConfig {
    pub project_id: SolutionId,
    pub action: String,
    pub solution_layer: String,
}
