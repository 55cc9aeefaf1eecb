//! `get_audit_history` (`spec.md` §6): every audit snapshot recorded for
//! a solution, newest first.

use crate::cli::open_store;
use crate::cli::output::print_table;
use strata_ids::SolutionId;

pub fn run(solution_id: String) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async { run_async(solution_id).await })
}

async fn run_async(solution_id: String) -> anyhow::Result<()> {
    let store = open_store().await?;
    let solution_id: SolutionId = crate::cli::parse_id("solution id", &solution_id)?;

    let history = store.list_audit_snapshots(&solution_id).await?;
    let rows: Vec<Vec<String>> = history
        .iter()
        .map(|snapshot| {
            vec![
                snapshot.created_at.to_rfc3339(),
                snapshot.metrics.total_assets.to_string(),
                snapshot.metrics.total_relationships.to_string(),
                format!("{:.2}", snapshot.metrics.coverage_score),
                format!("{:.2}", snapshot.metrics.avg_confidence),
                snapshot.gaps.len().to_string(),
            ]
        })
        .collect();
    print_table(
        &["recorded_at", "assets", "relationships", "coverage", "avg_confidence", "gaps"],
        rows,
    );

    if let Some(latest) = history.first() {
        if !latest.gaps.is_empty() {
            println!();
            println!("gaps as of latest snapshot:");
            for gap in &latest.gaps {
                println!("  - {gap}");
            }
        }
    }
    Ok(())
}
