//! `approve` (`spec.md` §6): transition a plan to `approved`, the job to
//! `queued`, and re-enqueue it.

use crate::cli::open_store;
use std::sync::Arc;
use strata_ids::PlanId;
use strata_planner::Planner;
use strata_queue::JobQueue;

pub fn run(plan_id: String) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async { run_async(plan_id).await })
}

async fn run_async(plan_id: String) -> anyhow::Result<()> {
    let store = open_store().await?;
    let plan_id: PlanId = crate::cli::parse_id("plan id", &plan_id)?;
    let plan = store.get_plan(&plan_id).await?;

    let queue = JobQueue::new(Arc::new(store.clone()));
    let planner = Planner::new(store.clone(), queue);
    planner.approve(&plan.id, &plan.job_id).await?;

    println!("job_id: {}", plan.job_id);
    Ok(())
}
