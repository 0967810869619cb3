use tracing_subscriber::EnvFilter;

use tagparty_core::effects::TracingDispatcher;
use tagparty_host::{HostConfig, LogFormat, ModeRegistry, sim};

#[tokio::main]
async fn main() {
    let (config, source) = HostConfig::load();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    source.log();

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }

    let registry = ModeRegistry::new();
    tracing::info!(
        mode = %config.mode,
        bots = config.bots,
        available = ?registry.available_modes(),
        "tagparty host starting"
    );

    match sim::run_simulation(&registry, &config, Box::new(TracingDispatcher)).await {
        Ok(report) => tracing::info!(?report, "Done"),
        Err(e) => {
            tracing::error!(error = %e, "Simulation failed");
            std::process::exit(1);
        },
    }
}
