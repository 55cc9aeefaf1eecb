//! `get_job_logs` (`spec.md` §6): the per-file processing log for a job.

use crate::cli::open_store;
use crate::cli::output::{format_time_ago, print_table_with_status};
use strata_ids::JobId;

pub fn run(job_id: String) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async { run_async(job_id).await })
}

async fn run_async(job_id: String) -> anyhow::Result<()> {
    let store = open_store().await?;
    let job_id: JobId = crate::cli::parse_id("job id", &job_id)?;
    let job = store.get_job(&job_id).await?;

    println!("job_id: {job_id}");
    println!("created: {}", format_time_ago(job.created_at));
    println!("status: {} ({}% - {})", job.status, job.progress_pct, job.current_stage);
    if let Some(message) = &job.error_message {
        println!("error: {message}");
    }
    println!();

    let logs = store.list_file_logs_for_job(&job_id).await?;
    let rows: Vec<Vec<String>> = logs
        .iter()
        .map(|log| {
            vec![
                log.file_path.clone(),
                log.action_name.clone(),
                log.status.as_str().to_string(),
                log.model_used.clone().unwrap_or_default(),
                log.nodes_extracted.to_string(),
                log.error_message.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table_with_status(
        &["file", "action", "status", "model", "nodes", "error"],
        rows,
        2,
    );
    Ok(())
}
