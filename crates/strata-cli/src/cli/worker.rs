//! `worker` (`spec.md` §5 Scheduling model): block on the queue and
//! drive every claimed job through the Orchestrator until interrupted.

use crate::cli::error::HelpfulError;
use crate::config;
use crate::llm_client::HttpLlmClient;
use std::sync::Arc;
use strata_audit::AuditLogger;
use strata_catalog::CatalogSync;
use strata_extract::llm::{ActionRunner, RoutingLoader};
use strata_fetch::{ArtifactFetcher, LocalBlobStore};
use strata_orchestrator::Orchestrator;
use strata_planner::Planner;
use strata_prompt::PromptComposer;
use strata_queue::JobQueue;
use tracing::{info, warn};

pub fn run() -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(run_async())
}

/// Resolves on Ctrl-C. If the signal handler itself fails to install,
/// never resolves rather than treating that as an immediate cancel.
async fn cancel_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler, worker will not respond to Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn run_async() -> anyhow::Result<()> {
    let store = crate::cli::open_store().await?;
    let queue = JobQueue::new(Arc::new(store.clone()));
    let planner = Planner::new(store.clone(), queue.clone());
    let catalog = CatalogSync::new(store.clone());
    let audit = AuditLogger::new(store.clone());

    std::fs::create_dir_all(config::artifacts_tmp_root())?;
    let fetcher = ArtifactFetcher::new(config::artifacts_tmp_root(), Arc::new(LocalBlobStore::new()));

    let composer = Arc::new(PromptComposer::new(Arc::new(store.clone()), config::prompts_dir()));
    let action_runner = ActionRunner::new(Arc::new(HttpLlmClient::new()), composer);

    let config_dir = config::llm_config_dir();
    if !config_dir.join("active.yml").is_file() {
        return Err(HelpfulError::missing_routing_config(&config_dir).into());
    }
    let routing = RoutingLoader::new(config_dir);

    let orchestrator =
        Orchestrator::new(store, queue, fetcher, planner, catalog, audit, action_runner, routing);

    info!("worker started, polling the queue");
    orchestrator.worker_loop(Box::pin(cancel_signal())).await?;
    info!("worker stopped");
    Ok(())
}
