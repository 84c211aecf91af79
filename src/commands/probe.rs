use anyhow::{Context, Result, bail};
use tracing::info;

use crate::catalog::{HttpSearchBackend, LookupOrchestrator};
use crate::cli::ProbeArgs;
use crate::config::load_config;

pub fn run(args: ProbeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.host.as_deref())?;
    let orchestrator =
        LookupOrchestrator::new(HttpSearchBackend::new(&config.service)?, &config.service);

    info!(host = %config.service.host, timeout_ms = config.service.probe_timeout_ms, "probing lookup service");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    if !runtime.block_on(orchestrator.is_reachable()) {
        bail!("lookup service at {} is unreachable", config.service.host);
    }

    info!(host = %config.service.host, "lookup service ok");
    Ok(())
}
