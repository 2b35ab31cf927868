//! Stdin/stdout JSON bridge for the host command router.
//!
//! Reads newline-delimited JSON `CommandMessage` lines from stdin,
//! dispatches them through the channel gate and router, and writes
//! `EventEnvelope` messages as newline-delimited JSON to stdout.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr. Commands are
//! fire-and-forget, so a malformed line has no response channel to be
//! reported on: it is logged and skipped.

use crate::error::{DeckError, Result};
use crate::host::channel::{bridge_channel, PluginHost, UiBridge};
use crate::host::contract::CommandMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// Run the stdin/stdout JSON bridge until stdin closes.
///
/// Three concurrent pieces cooperate:
///
/// 1. **Reader** -- parses command lines from stdin and pushes them
///    through the gate onto the router's queue.
/// 2. **Event forwarder** -- receives broadcast `EventEnvelope` messages
///    and writes them as JSON lines to stdout.
/// 3. **Router** -- runs the `PluginHostServer` loop.
///
/// The bridge exits on stdin EOF. Dropping the reader's bridge handle
/// closes the command queue, which ends the router task naturally.
pub async fn run_stdio_bridge<H: PluginHost>(host: H, event_capacity: usize) -> Result<()> {
    let (bridge, server) = bridge_channel(event_capacity, host);
    let mut event_rx = server.event_sender().subscribe();

    let server_handle = tokio::spawn(server.run());

    let event_handle = tokio::spawn(async move {
        let stdout = tokio::io::stdout();
        let mut writer = BufWriter::new(stdout);
        loop {
            match event_rx.recv().await {
                Ok(envelope) => match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        if let Err(e) = write_line(&mut writer, &json).await {
                            tracing::warn!(
                                error = %e,
                                "failed to write event envelope to stdout; stopping event forwarder"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "failed to serialize event envelope; skipping"
                        );
                    }
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        lagged = n,
                        "event forwarder lagged; some events were dropped"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    tracing::info!("event broadcast channel closed; stopping event forwarder");
                    break;
                }
            }
        }
    });

    // Run the reader on the current task (not spawned) so that when it
    // finishes we can cleanly shut down. It consumes the bridge handle,
    // closing the command queue on return.
    let reader_result = run_reader(bridge).await;

    event_handle.abort();
    let _ = event_handle.await;
    let _ = server_handle.await;

    reader_result
}

/// Read stdin line-by-line and dispatch each command through the gate.
async fn run_reader(bridge: UiBridge) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| DeckError::Channel(format!("failed to read from stdin: {e}")))?;

        // EOF
        if bytes_read == 0 {
            tracing::info!("stdin closed (EOF); shutting down stdio bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<CommandMessage>(trimmed) {
            Ok(command) => bridge.send(&command.channel, command.args),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    raw_line = %trimmed,
                    "failed to parse command message from stdin; skipping"
                );
            }
        }
    }

    Ok(())
}

/// Write a single JSON line to the buffered writer and flush.
async fn write_line(writer: &mut BufWriter<tokio::io::Stdout>, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| DeckError::Channel(format!("failed to write to stdout: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| DeckError::Channel(format!("failed to write newline to stdout: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| DeckError::Channel(format!("failed to flush stdout: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::host::contract::{CommandMessage, EventEnvelope, CMD_INSTALL_PLUGIN};

    #[test]
    fn command_line_parses_wire_format() {
        let line = r#"{"channel":"install-plugin","args":["traces","https://plugins.example.com/traces.tar.gz"]}"#;
        let command: CommandMessage = serde_json::from_str(line).expect("parse in test");
        assert_eq!(command.channel, CMD_INSTALL_PLUGIN);
        assert_eq!(command.arg_str(0), Some("traces"));
    }

    #[test]
    fn malformed_line_is_a_parse_error_not_a_panic() {
        let result = serde_json::from_str::<CommandMessage>("{not json");
        assert!(result.is_err());
    }

    #[test]
    fn event_line_is_single_json_object() {
        let envelope = EventEnvelope::new(
            "install-plugin-progress",
            serde_json::json!({"type": "info", "message": "Downloading Plugin"}),
        );
        let json = serde_json::to_string(&envelope).expect("serialize in test");
        assert!(!json.contains('\n'));
        let parsed: EventEnvelope = serde_json::from_str(&json).expect("parse in test");
        assert_eq!(parsed, envelope);
    }
}
