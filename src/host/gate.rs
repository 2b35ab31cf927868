//! Channel allow-list enforced at the UI/host boundary.
//!
//! The gate is the entire security contract of the bridge: a command or
//! subscription on a channel outside the fixed lists is dropped silently,
//! with no error and no signal to the caller. Unknown channels never reach
//! the privileged process and never register a handler; the only observable
//! symptom of a typo'd channel name is the absence of any response. Drops
//! are counted and logged so the fail-closed default stays diagnosable.

use crate::host::contract;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Channels the UI process may send commands on.
const COMMAND_CHANNELS: &[&str] = &[
    contract::CMD_SET_MENU,
    contract::CMD_LOCALE,
    contract::CMD_APP_CONFIG,
    contract::CMD_PLUGINS_LOADED,
    contract::CMD_RUN_COMMAND,
    contract::CMD_INSTALL_PLUGIN,
    contract::CMD_UPDATE_PLUGIN,
    contract::CMD_UNINSTALL_PLUGIN,
    contract::CMD_LIST_PLUGINS,
    contract::CMD_CANCEL_PLUGIN_PROCESS,
];

/// Channels the UI process may subscribe to.
const EVENT_CHANNELS: &[&str] = &[
    contract::EVT_CURRENT_MENU,
    contract::EVT_SET_MENU,
    contract::EVT_LOCALE,
    contract::EVT_APP_CONFIG,
    contract::EVT_COMMAND_STDOUT,
    contract::EVT_COMMAND_STDERR,
    contract::EVT_COMMAND_EXIT,
    contract::EVT_INSTALL_PLUGIN_PROGRESS,
    contract::EVT_UPDATE_PLUGIN_PROGRESS,
    contract::EVT_UNINSTALL_PLUGIN_PROGRESS,
    contract::EVT_LIST_PLUGINS,
];

/// Returns `true` if the UI may send commands on `channel`.
#[must_use]
pub fn can_send(channel: &str) -> bool {
    COMMAND_CHANNELS.contains(&channel)
}

/// Returns `true` if the UI may subscribe to events on `channel`.
#[must_use]
pub fn can_receive(channel: &str) -> bool {
    EVENT_CHANNELS.contains(&channel)
}

/// Lock-free counters for traffic the gate silently dropped.
///
/// Internal diagnostics only; nothing here is ever surfaced to the UI, so
/// the fail-closed contract is unchanged.
#[derive(Debug, Default)]
pub struct GateAudit {
    dropped_sends: AtomicUsize,
    dropped_subscribes: AtomicUsize,
}

impl GateAudit {
    pub(crate) fn record_dropped_send(&self, channel: &str) {
        self.dropped_sends.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(channel, "dropped command on disallowed channel");
    }

    pub(crate) fn record_dropped_subscribe(&self, channel: &str) {
        self.dropped_subscribes.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(channel, "dropped subscription on disallowed channel");
    }

    /// Number of commands refused at the boundary so far.
    #[must_use]
    pub fn dropped_sends(&self) -> usize {
        self.dropped_sends.load(Ordering::Relaxed)
    }

    /// Number of subscriptions refused at the boundary so far.
    #[must_use]
    pub fn dropped_subscribes(&self) -> usize {
        self.dropped_subscribes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_commands_are_sendable() {
        assert!(can_send(contract::CMD_INSTALL_PLUGIN));
        assert!(can_send(contract::CMD_UPDATE_PLUGIN));
        assert!(can_send(contract::CMD_UNINSTALL_PLUGIN));
        assert!(can_send(contract::CMD_LIST_PLUGINS));
        assert!(can_send(contract::CMD_CANCEL_PLUGIN_PROCESS));
    }

    #[test]
    fn plugin_progress_events_are_receivable() {
        assert!(can_receive(contract::EVT_INSTALL_PLUGIN_PROGRESS));
        assert!(can_receive(contract::EVT_UPDATE_PLUGIN_PROGRESS));
        assert!(can_receive(contract::EVT_UNINSTALL_PLUGIN_PROGRESS));
    }

    #[test]
    fn list_plugins_is_both_command_and_event() {
        assert!(can_send(contract::CMD_LIST_PLUGINS));
        assert!(can_receive(contract::EVT_LIST_PLUGINS));
    }

    #[test]
    fn unknown_channels_are_rejected() {
        assert!(!can_send("install-plugins"));
        assert!(!can_send("drop-table"));
        assert!(!can_send(""));
        assert!(!can_receive("install-plugin"));
        assert!(!can_receive("plugin-progress"));
        assert!(!can_receive(""));
    }

    #[test]
    fn namespaces_are_disjoint_except_list() {
        for &channel in COMMAND_CHANNELS {
            if channel == contract::CMD_LIST_PLUGINS
                || channel == contract::CMD_SET_MENU
                || channel == contract::CMD_LOCALE
                || channel == contract::CMD_APP_CONFIG
            {
                continue;
            }
            assert!(!can_receive(channel), "{channel} leaked into events");
        }
    }

    #[test]
    fn audit_counts_dropped_traffic() {
        let audit = GateAudit::default();
        assert_eq!(audit.dropped_sends(), 0);
        assert_eq!(audit.dropped_subscribes(), 0);

        audit.record_dropped_send("bogus-channel");
        audit.record_dropped_send("bogus-channel");
        audit.record_dropped_subscribe("bogus-events");

        assert_eq!(audit.dropped_sends(), 2);
        assert_eq!(audit.dropped_subscribes(), 1);
    }
}
