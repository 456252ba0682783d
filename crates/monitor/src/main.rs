//! Classroom Engagement Monitor - Main Entry Point

use anyhow::Context;
use monitor::{init_logging, run, MonitorConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var("CLASSROOM_MONITOR_CONFIG").ok();
    let config = MonitorConfig::load(path.as_deref()).context("failed to load configuration")?;

    init_logging(&config.log_level, config.log_format)?;

    info!("=== Classroom Engagement Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    run(config).await?;

    Ok(())
}
