//! `cancel` (`spec.md` §6): set the most recent non-terminal job for a
//! solution to `cancelled`. The Orchestrator observes this between plan
//! items (`spec.md` §5 Cancellation) rather than interrupting in-flight
//! work.

use crate::cli::error::HelpfulError;
use crate::cli::open_store;
use strata_ids::SolutionId;
use strata_protocol::JobStatus;

pub fn run(solution_id: String) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async { run_async(solution_id).await })
}

async fn run_async(solution_id: String) -> anyhow::Result<()> {
    let store = open_store().await?;
    let solution_id: SolutionId = crate::cli::parse_id("solution id", &solution_id)?;

    let jobs = store.list_jobs_for_solution(&solution_id).await?;
    let latest = jobs
        .into_iter()
        .rev()
        .find(|job| !job.status.is_terminal())
        .ok_or_else(|| {
            HelpfulError::new(format!("no cancellable job for solution {solution_id}"))
                .with_context("every job for this solution has already reached a terminal status")
        })?;

    store.set_job_status(&latest.id, JobStatus::Cancelled).await?;
    println!("cancelled job_id: {}", latest.id);
    Ok(())
}
