//! `strata`: CLI front end for the lineage discovery core (`spec.md` §6).

mod cli;
mod config;
mod llm_client;

use clap::{Parser, Subcommand};
use cli::plan::PlanAction;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Lineage discovery: submit, approve, and inspect ingestion jobs")]
struct Cli {
    /// Emit debug-level tracing spans.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a solution (creating it if new) and queue a job for it.
    Submit {
        /// Display name for a newly created solution. Ignored if
        /// `--solution-id` already refers to an existing one.
        #[arg(long, default_value = "solution")]
        name: String,
        /// Archive path, git URL, `local://` path, or bucket key.
        storage_path: String,
        /// Reuse an existing solution instead of creating a new one.
        #[arg(long)]
        solution_id: Option<String>,
        /// Skip the approval gate and start execution immediately.
        #[arg(long)]
        auto_approve: bool,
    },
    /// Approve a pending plan and re-enqueue its job.
    Approve { plan_id: String },
    /// Cancel the most recent non-terminal job for a solution.
    Cancel { solution_id: String },
    /// Inspect a plan.
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Show a job's per-file processing log.
    Logs { job_id: String },
    /// Show the audit snapshot history for a solution.
    Audit { solution_id: String },
    /// Run the worker loop: claim queued jobs and drive them to completion.
    Worker,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    strata_logging::init_logging(strata_logging::LogConfig { verbose: cli.verbose })?;

    match cli.command {
        Commands::Submit { name, storage_path, solution_id, auto_approve } => {
            cli::submit::run(cli::submit::SubmitArgs { solution_id, name, storage_path, auto_approve })
        }
        Commands::Approve { plan_id } => cli::approve::run(plan_id),
        Commands::Cancel { solution_id } => cli::cancel::run(solution_id),
        Commands::Plan { action } => cli::plan::run(action),
        Commands::Logs { job_id } => cli::logs::run(job_id),
        Commands::Audit { solution_id } => cli::audit::run(solution_id),
        Commands::Worker => cli::worker::run(),
    }
}
