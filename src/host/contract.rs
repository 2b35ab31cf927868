//! Wire contract for the UI <-> host message bridge.
//!
//! Commands travel UI -> host as `{channel, args}` and are fire-and-forget:
//! there is no acknowledgement and no response envelope. Events travel
//! host -> UI as `{event_id, channel, payload}`; the `event_id` is
//! transport metadata and is stripped before subscriber handlers run, so
//! handlers only ever see the logical payload.
//!
//! Keep the channel names in sync with `frontend/src/desktopApi.ts`.

use serde::{Deserialize, Serialize};

// Command channels (UI -> host).
pub const CMD_SET_MENU: &str = "set-menu";
pub const CMD_LOCALE: &str = "locale";
pub const CMD_APP_CONFIG: &str = "app-config";
pub const CMD_PLUGINS_LOADED: &str = "plugins-loaded";
pub const CMD_RUN_COMMAND: &str = "run-command";
pub const CMD_INSTALL_PLUGIN: &str = "install-plugin";
pub const CMD_UPDATE_PLUGIN: &str = "update-plugin";
pub const CMD_UNINSTALL_PLUGIN: &str = "uninstall-plugin";
pub const CMD_LIST_PLUGINS: &str = "list-plugins";
pub const CMD_CANCEL_PLUGIN_PROCESS: &str = "cancel-plugin-process";

// Event channels (host -> UI).
pub const EVT_CURRENT_MENU: &str = "current-menu";
pub const EVT_SET_MENU: &str = "set-menu";
pub const EVT_LOCALE: &str = "locale";
pub const EVT_APP_CONFIG: &str = "app-config";
pub const EVT_COMMAND_STDOUT: &str = "command-stdout";
pub const EVT_COMMAND_STDERR: &str = "command-stderr";
pub const EVT_COMMAND_EXIT: &str = "command-exit";
pub const EVT_INSTALL_PLUGIN_PROGRESS: &str = "install-plugin-progress";
pub const EVT_UPDATE_PLUGIN_PROGRESS: &str = "update-plugin-progress";
pub const EVT_UNINSTALL_PLUGIN_PROGRESS: &str = "uninstall-plugin-progress";
pub const EVT_LIST_PLUGINS: &str = "list-plugins";

/// A fire-and-forget command message from the UI process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub channel: String,
    /// Positional arguments; each is an opaque JSON value.
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl CommandMessage {
    /// Build a command message for a channel with positional arguments.
    #[must_use]
    pub fn new(channel: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            channel: channel.into(),
            args,
        }
    }

    /// Positional argument at `index`, if present and a JSON string.
    #[must_use]
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(serde_json::Value::as_str)
    }
}

/// An event envelope from the host process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Transport-level identifier, never exposed to subscriber handlers.
    pub event_id: String,
    pub channel: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build an event envelope with a fresh transport id.
    #[must_use]
    pub fn new(channel: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            channel: channel.into(),
            payload,
        }
    }
}

/// Descriptor for one installed plugin, the element type of the
/// `list-plugins` event payload. Field names are camelCase on the wire to
/// match the UI bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
