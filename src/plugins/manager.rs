//! Operation client for plugin lifecycle commands.
//!
//! One method per lifecycle action. Each issues a fire-and-forget command
//! over the bridge, subscribes to the matching per-kind progress channel,
//! and either keeps the status cache current (the default) or hands raw
//! events to a caller-supplied callback. Callbacks take over all status
//! bookkeeping; the cache is untouched for events they receive.
//!
//! Because subscriptions are additive for the life of the process, every
//! call to install/update/uninstall adds another listener to that kind's
//! channel. Known limitation of the bridge contract, not corrected here.

use crate::host::channel::UiBridge;
use crate::host::contract as channels;
use crate::plugins::progress::{
    install_stage_percent, uninstall_stage_percent, ProgressCallback, ProgressEvent,
};
use crate::plugins::status::{PluginAction, PluginStatus, StatusStore};

/// Message recorded with the synthetic install seed entry.
pub const INSTALL_SEED_MESSAGE: &str = "Plugin Installation Started";

/// Message recorded with the synthetic update seed entry.
pub const UPDATE_SEED_MESSAGE: &str = "Plugin Updation Started";

/// Progress written with a synthetic seed entry.
const SEED_PERCENT: u8 = 3;

/// Client for plugin lifecycle operations, one instance per UI process.
///
/// The status store is injected rather than reached through ambient
/// storage, so ownership and shared access stay visible to the embedder.
pub struct PluginManager {
    bridge: UiBridge,
    store: StatusStore,
}

impl PluginManager {
    #[must_use]
    pub fn new(bridge: UiBridge, store: StatusStore) -> Self {
        Self { bridge, store }
    }

    /// Install a plugin from `source_url`, tracked under `identifier`.
    ///
    /// Seeds the status cache with a synthetic "started" entry, then maps
    /// host progress onto coarse percentages unless `on_progress` takes
    /// over.
    pub fn install(&self, identifier: &str, source_url: &str, on_progress: Option<ProgressCallback>) {
        self.bridge.send(
            channels::CMD_INSTALL_PLUGIN,
            vec![serde_json::json!(identifier), serde_json::json!(source_url)],
        );
        self.seed(identifier, PluginAction::Install, INSTALL_SEED_MESSAGE);
        self.track(
            channels::EVT_INSTALL_PLUGIN_PROGRESS,
            identifier,
            PluginAction::Install,
            install_stage_percent,
            on_progress,
        );
    }

    /// Update the plugin `name`, tracked under `identifier`.
    pub fn update(&self, identifier: &str, name: &str, on_progress: Option<ProgressCallback>) {
        self.bridge.send(
            channels::CMD_UPDATE_PLUGIN,
            vec![serde_json::json!(identifier), serde_json::json!(name)],
        );
        self.seed(identifier, PluginAction::Update, UPDATE_SEED_MESSAGE);
        self.track(
            channels::EVT_UPDATE_PLUGIN_PROGRESS,
            identifier,
            PluginAction::Update,
            install_stage_percent,
            on_progress,
        );
    }

    /// Uninstall the plugin `name`, tracked under `identifier`.
    ///
    /// The host-facing command is addressed by name, not identifier, and
    /// carries an unused second argument; the cache stays keyed by
    /// identifier. No seed entry is written: uninstall starts untracked
    /// until its first progress event.
    pub fn uninstall(&self, identifier: &str, name: &str, on_progress: Option<ProgressCallback>) {
        self.bridge.send(
            channels::CMD_UNINSTALL_PLUGIN,
            vec![serde_json::json!(name), serde_json::Value::Null],
        );
        self.track(
            channels::EVT_UNINSTALL_PLUGIN_PROGRESS,
            identifier,
            PluginAction::Uninstall,
            uninstall_stage_percent,
            on_progress,
        );
    }

    /// Request the installed-plugin list. The callback is mandatory and
    /// receives the raw event payload; list results are never cached.
    pub fn list(&self, on_result: impl Fn(serde_json::Value) + Send + Sync + 'static) {
        self.bridge.send(channels::CMD_LIST_PLUGINS, Vec::new());
        self.bridge.subscribe(channels::EVT_LIST_PLUGINS, on_result);
    }

    /// Ask the host to abandon an in-flight operation and evict its local
    /// status. The eviction is optimistic: it happens whether or not the
    /// host actually stops the work. Only install and update operations
    /// can be cancelled host-side; anything else is a no-op beyond the
    /// eviction.
    pub fn cancel(&self, identifier: &str) {
        self.bridge.send(
            channels::CMD_CANCEL_PLUGIN_PROCESS,
            vec![serde_json::json!(identifier)],
        );
        if let Err(e) = self.store.remove(identifier) {
            tracing::warn!(identifier, error = %e, "failed to evict status on cancel");
        }
    }

    /// Latest cached status for an operation, if still fresh.
    #[must_use]
    pub fn status(&self, identifier: &str) -> Option<PluginStatus> {
        self.store.status(identifier)
    }

    fn seed(&self, identifier: &str, action: PluginAction, message: &str) {
        let seed = ProgressEvent::info(message);
        match serde_json::to_string(&seed) {
            Ok(status_json) => {
                if let Err(e) = self.store.set(identifier, action, SEED_PERCENT, &status_json) {
                    tracing::warn!(identifier, error = %e, "failed to seed status entry");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize seed event");
            }
        }
    }

    fn track(
        &self,
        channel: &'static str,
        identifier: &str,
        action: PluginAction,
        stage_percent: fn(&ProgressEvent) -> u8,
        on_progress: Option<ProgressCallback>,
    ) {
        let store = self.store.clone();
        let identifier = identifier.to_owned();
        self.bridge.subscribe(channel, move |payload| {
            let event = ProgressEvent::from_payload(&payload);
            match &on_progress {
                Some(callback) => callback(event),
                None => {
                    let percent = stage_percent(&event);
                    if let Err(e) = store.set(&identifier, action, percent, &payload.to_string()) {
                        tracing::warn!(identifier = %identifier, error = %e, "failed to record progress");
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_event_matches_wire_shape() {
        let json = serde_json::to_string(&ProgressEvent::info(INSTALL_SEED_MESSAGE))
            .expect("serialize in test");
        assert_eq!(json, r#"{"type":"info","message":"Plugin Installation Started"}"#);
    }

    #[test]
    fn update_seed_keeps_legacy_wording() {
        // "Updation" is the message the UI bundle matches on; keep it.
        assert_eq!(UPDATE_SEED_MESSAGE, "Plugin Updation Started");
    }
}
