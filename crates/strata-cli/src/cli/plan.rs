//! `get_plan` / `get_active_plan` (`spec.md` §6): inspect a plan by id,
//! or the plan belonging to a solution's most recent job.

use crate::cli::error::HelpfulError;
use crate::cli::output::print_table_with_status;
use crate::cli::open_store;
use clap::Subcommand;
use strata_db::LineageStore;
use strata_ids::{PlanId, SolutionId};
use strata_protocol::{Job, Plan, PlanItem};

#[derive(Subcommand, Debug, Clone)]
pub enum PlanAction {
    /// Show a plan and its items by plan id.
    Show { plan_id: String },
    /// Show the plan belonging to a solution's most recent job.
    Active { solution_id: String },
}

pub fn run(action: PlanAction) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async {
        match action {
            PlanAction::Show { plan_id } => run_show(&plan_id).await,
            PlanAction::Active { solution_id } => run_active(&solution_id).await,
        }
    })
}

async fn run_show(plan_id: &str) -> anyhow::Result<()> {
    let store = open_store().await?;
    let plan_id: PlanId = crate::cli::parse_id("plan id", plan_id)?;
    let plan = store.get_plan(&plan_id).await?;
    let job = store.get_job(&plan.job_id).await?;
    print_plan(&store, &job, &plan).await
}

async fn run_active(solution_id: &str) -> anyhow::Result<()> {
    let store = open_store().await?;
    let solution_id: SolutionId = crate::cli::parse_id("solution id", solution_id)?;

    let jobs = store.list_jobs_for_solution(&solution_id).await?;
    let job = jobs.into_iter().last().ok_or_else(|| {
        HelpfulError::new(format!("no jobs found for solution {solution_id}"))
    })?;
    let plan = store.get_plan_for_job(&job.id).await?;
    print_plan(&store, &job, &plan).await
}

async fn print_plan(store: &LineageStore, job: &Job, plan: &Plan) -> anyhow::Result<()> {
    println!("plan_id: {}", plan.id);
    println!("job_id: {}", job.id);
    println!("status: {}", plan.status.as_str());
    println!(
        "summary: {} files, ${:.2} est, {:.0}s est",
        plan.summary.total_files, plan.summary.total_cost_est, plan.summary.total_time_est
    );
    println!();

    let items: Vec<PlanItem> = store.list_plan_items(&plan.id).await?;
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                item.area.as_str().to_string(),
                item.path.clone(),
                item.strategy.as_str().to_string(),
                item.status.as_str().to_string(),
                item.enabled.to_string(),
            ]
        })
        .collect();
    print_table_with_status(&["area", "path", "strategy", "status", "enabled"], rows, 3);
    Ok(())
}
