//! Shared logging initialization for the lineage discovery binaries.

use anyhow::{Context, Result};
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "strata=info,strata_orchestrator=info,strata_extract=info";

static INIT: Once = Once::new();

/// Logging configuration shared by the `strata` binaries.
pub struct LogConfig {
    /// Emit `debug`-level spans for every crate instead of just `info`.
    pub verbose: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { verbose: false }
    }
}

/// Initialize a stderr `tracing` subscriber, honoring `RUST_LOG` if set.
///
/// Safe to call more than once per process (e.g. from both a binary and its
/// integration tests); only the first call takes effect.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let mut init_result: Result<()> = Ok(());
    INIT.call_once(|| {
        init_result = try_init(config);
    });
    init_result
}

fn try_init(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
