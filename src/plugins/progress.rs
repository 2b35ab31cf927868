//! Progress event types and percentage inference for plugin operations.
//!
//! The host reports free-text progress while it works. When the caller
//! supplies no callback, the operation client maps the well-known stage
//! messages onto coarse percentages for the status cache; anything it does
//! not recognise falls back to a low default, including error events.

use serde::{Deserialize, Serialize};

/// Severity of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Info,
    Error,
    /// Catch-all for event types this client does not know.
    Unknown,
}

impl ProgressKind {
    /// Render to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from wire format; anything unrecognised is `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "info" => Self::Info,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// A `{type, message}` payload emitted by the host during an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub message: String,
}

impl ProgressEvent {
    /// Build an info event.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Info,
            message: message.into(),
        }
    }

    /// Build an error event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Error,
            message: message.into(),
        }
    }

    /// Read a raw event payload the way the bridge contract defines it:
    /// missing or malformed fields degrade instead of failing, so a
    /// misbehaving host can never break event delivery.
    #[must_use]
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        let kind = payload
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(ProgressKind::parse)
            .unwrap_or(ProgressKind::Unknown);
        let message = payload
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Self { kind, message }
    }
}

/// Callback type for receiving raw progress events.
///
/// Callers that supply one take over all status bookkeeping: the cache is
/// not touched for events delivered to a callback.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Fallback percentage for install/update events that match no stage.
const DEFAULT_INSTALL_PERCENT: u8 = 10;

/// Fallback percentage for uninstall events that match no stage.
const DEFAULT_UNINSTALL_PERCENT: u8 = 1;

/// Coarse percentage for an install or update progress event.
///
/// Stage names are matched by exact string against info events; error
/// events always map to the fallback, which understates failure severity.
/// The stage contract lives in the host's message strings, not here.
#[must_use]
pub fn install_stage_percent(event: &ProgressEvent) -> u8 {
    if event.kind != ProgressKind::Info {
        return DEFAULT_INSTALL_PERCENT;
    }
    match event.message.as_str() {
        "Fetching Plugin Metadata" => 20,
        "Plugin Metadata Fetched" => 30,
        "Downloading Plugin" => 50,
        "Plugin Downloaded" => 100,
        _ => DEFAULT_INSTALL_PERCENT,
    }
}

/// Coarse percentage for an uninstall progress event.
#[must_use]
pub fn uninstall_stage_percent(event: &ProgressEvent) -> u8 {
    if event.kind != ProgressKind::Info {
        return DEFAULT_UNINSTALL_PERCENT;
    }
    match event.message.as_str() {
        "Uninstalling Plugin" => 50,
        "Plugin Uninstalled" => 100,
        _ => DEFAULT_UNINSTALL_PERCENT,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn event_serializes_with_type_field() {
        let event = ProgressEvent::info("Downloading Plugin");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"info","message":"Downloading Plugin"}"#);
    }

    #[test]
    fn from_payload_reads_well_formed_events() {
        let payload = serde_json::json!({"type": "error", "message": "checksum mismatch"});
        let event = ProgressEvent::from_payload(&payload);
        assert_eq!(event.kind, ProgressKind::Error);
        assert_eq!(event.message, "checksum mismatch");
    }

    #[test]
    fn from_payload_degrades_on_missing_fields() {
        let event = ProgressEvent::from_payload(&serde_json::json!({}));
        assert_eq!(event.kind, ProgressKind::Unknown);
        assert_eq!(event.message, "");
    }

    #[test]
    fn from_payload_degrades_on_non_object() {
        let event = ProgressEvent::from_payload(&serde_json::json!(42));
        assert_eq!(event.kind, ProgressKind::Unknown);
        assert_eq!(event.message, "");
    }

    #[test]
    fn from_payload_unknown_type_string() {
        let payload = serde_json::json!({"type": "warning", "message": "slow mirror"});
        let event = ProgressEvent::from_payload(&payload);
        assert_eq!(event.kind, ProgressKind::Unknown);
        assert_eq!(event.message, "slow mirror");
    }

    #[test]
    fn install_stages_map_to_documented_percentages() {
        let stages = [
            ("Fetching Plugin Metadata", 20),
            ("Plugin Metadata Fetched", 30),
            ("Downloading Plugin", 50),
            ("Plugin Downloaded", 100),
        ];
        for (message, expected) in stages {
            assert_eq!(install_stage_percent(&ProgressEvent::info(message)), expected);
        }
    }

    #[test]
    fn install_unmatched_messages_use_fallback() {
        assert_eq!(install_stage_percent(&ProgressEvent::info("Extracting Plugin")), 10);
        assert_eq!(install_stage_percent(&ProgressEvent::info("")), 10);
    }

    #[test]
    fn install_stage_requires_info_kind() {
        // An error event carrying a stage message must not be promoted.
        assert_eq!(install_stage_percent(&ProgressEvent::error("Plugin Downloaded")), 10);
    }

    #[test]
    fn uninstall_stages_map_to_documented_percentages() {
        assert_eq!(uninstall_stage_percent(&ProgressEvent::info("Uninstalling Plugin")), 50);
        assert_eq!(uninstall_stage_percent(&ProgressEvent::info("Plugin Uninstalled")), 100);
    }

    #[test]
    fn uninstall_unmatched_messages_use_fallback() {
        assert_eq!(uninstall_stage_percent(&ProgressEvent::info("Removing Files")), 1);
        assert_eq!(uninstall_stage_percent(&ProgressEvent::error("permission denied")), 1);
    }

    #[test]
    fn kind_parse_roundtrip() {
        assert_eq!(ProgressKind::parse("info"), ProgressKind::Info);
        assert_eq!(ProgressKind::parse("error"), ProgressKind::Error);
        assert_eq!(ProgressKind::parse("debug"), ProgressKind::Unknown);
        assert_eq!(ProgressKind::Info.as_str(), "info");
        assert_eq!(ProgressKind::Error.as_str(), "error");
    }

    #[test]
    fn callback_receives_events() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let callback: ProgressCallback = Box::new(move |event| {
            let Ok(mut guard) = seen_clone.lock() else {
                return;
            };
            guard.push(event.message);
        });

        callback(ProgressEvent::info("Downloading Plugin"));
        callback(ProgressEvent::error("network unreachable"));

        let guard = seen.lock().unwrap();
        assert_eq!(guard.as_slice(), &["Downloading Plugin", "network unreachable"]);
    }
}
