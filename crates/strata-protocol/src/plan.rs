//! Plan / Area / Plan Item: the human-approvable execution intent
//! (`spec.md` §3 Plan).

use crate::enums::{Area, PlanItemStatus, PlanMode, PlanStatus, RecommendedAction, Strategy};
use serde::{Deserialize, Serialize};
use strata_ids::{JobId, PlanId, PlanItemId};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_files: u32,
    pub total_cost_est: f64,
    pub total_time_est: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub job_id: JobId,
    pub status: PlanStatus,
    pub mode: PlanMode,
    pub summary: PlanSummary,
}

impl Plan {
    pub fn draft(job_id: JobId, mode: PlanMode) -> Self {
        Self {
            id: PlanId::new(),
            job_id,
            status: PlanStatus::Draft,
            mode,
            summary: PlanSummary::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Estimate {
    pub tokens: u64,
    pub cost_usd: f64,
    pub time_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: PlanItemId,
    pub plan_id: PlanId,
    pub area: Area,
    /// Position of this item within its area; ties broken by alphabetical
    /// path to keep plans deterministic across runs (`spec.md` §9 Open
    /// Question resolution — see `DESIGN.md`).
    pub order_index: i64,
    pub path: String,
    pub file_hash: String,
    pub size_bytes: u64,
    pub file_type: String,
    pub classifier: String,
    pub strategy: Strategy,
    pub recommended_action: RecommendedAction,
    pub enabled: bool,
    pub estimate: Estimate,
    pub status: PlanItemStatus,
}

impl PlanItem {
    /// An item is skipped, and never executed, per `spec.md` §3 invariant:
    /// "items with `enabled=false` or `strategy=SKIP` are not executed."
    pub fn is_executable(&self) -> bool {
        self.enabled && !matches!(self.strategy, Strategy::Skip)
    }
}

/// An Area grouping within a plan, carrying its fixed `order_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAreaGroup {
    pub area: Area,
    pub order_index: i64,
    pub items: Vec<PlanItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(area: Area, order_index: i64, enabled: bool, strategy: Strategy) -> PlanItem {
        PlanItem {
            id: PlanItemId::new(),
            plan_id: PlanId::new(),
            area,
            order_index,
            path: "x.sql".to_string(),
            file_hash: "h".to_string(),
            size_bytes: 10,
            file_type: "sql".to_string(),
            classifier: "sql".to_string(),
            strategy,
            recommended_action: RecommendedAction::Process,
            enabled,
            estimate: Estimate::default(),
            status: PlanItemStatus::Pending,
        }
    }

    #[test]
    fn disabled_item_is_not_executable() {
        let it = item(Area::Foundation, 0, false, Strategy::ParserOnly);
        assert!(!it.is_executable());
    }

    #[test]
    fn skip_strategy_is_not_executable() {
        let it = item(Area::Aux, 0, true, Strategy::Skip);
        assert!(!it.is_executable());
    }

    #[test]
    fn enabled_non_skip_is_executable() {
        let it = item(Area::Foundation, 0, true, Strategy::ParserOnly);
        assert!(it.is_executable());
    }
}
