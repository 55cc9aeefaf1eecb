//! `submit` (`spec.md` §6): create a Solution if missing, insert a
//! queued Job, and enqueue it for a worker to pick up.

use crate::cli::open_store;
use std::sync::Arc;
use strata_ids::SolutionId;
use strata_protocol::{Job, Solution};
use strata_queue::JobQueue;

pub struct SubmitArgs {
    pub solution_id: Option<String>,
    pub name: String,
    pub storage_path: String,
    pub auto_approve: bool,
}

pub fn run(args: SubmitArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async { run_async(args).await })
}

async fn run_async(args: SubmitArgs) -> anyhow::Result<()> {
    let store = open_store().await?;
    let queue = JobQueue::new(Arc::new(store.clone()));

    let solution_id = match &args.solution_id {
        Some(raw) => {
            let id: SolutionId = crate::cli::parse_id("solution id", raw)?;
            if store.get_solution(&id).await.is_err() {
                let mut solution = Solution::new(args.name.clone(), args.storage_path.clone());
                solution.id = id.clone();
                store.insert_solution(&solution).await?;
            }
            id
        }
        None => {
            let solution = Solution::new(args.name.clone(), args.storage_path.clone());
            store.insert_solution(&solution).await?;
            solution.id
        }
    };

    let job = Job::new_submission(solution_id.clone(), !args.auto_approve);
    store.insert_job(&job).await?;
    queue.enqueue(&job.id).await?;

    println!("solution_id: {solution_id}");
    println!("job_id: {}", job.id);
    Ok(())
}
