//! Headless host binary for stdin/stdout JSON communication.
//!
//! This binary reads `CommandMessage` lines as newline-delimited JSON from
//! stdin, dispatches them through the channel gate and command router, and
//! writes `EventEnvelope` messages to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use kubedeck::host::channel::NoopPluginHost;
use kubedeck::host::stdio::run_stdio_bridge;
use kubedeck::DeckConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DeckConfig::load();
    let _log_guard = kubedeck::logging::init(config.file_logs);

    tracing::info!("kubedeck-host starting");

    run_stdio_bridge(NoopPluginHost, config.event_capacity)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "kubedeck-host exited with error");
            anyhow::anyhow!("kubedeck-host failed: {e}")
        })?;

    tracing::info!("kubedeck-host shut down cleanly");
    Ok(())
}
