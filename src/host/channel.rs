//! In-process command/event channel pairing the UI bridge with the host
//! command router.
//!
//! Commands flow one way over an unbounded queue; events flow back over a
//! broadcast channel. There is no request/response pairing anywhere:
//! completion is something callers infer from the event stream.

use crate::error::Result;
use crate::host::contract::{self, CommandMessage, EventEnvelope, PluginDescriptor};
use crate::host::gate::{self, GateAudit};
use crate::plugins::progress::ProgressEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

/// Handler invoked once per inbound event on a subscribed channel. Only
/// the logical payload is passed; envelope metadata never reaches handlers.
pub type EventHandler = Box<dyn Fn(serde_json::Value) + Send + Sync>;

type HandlerRegistry = Arc<Mutex<HashMap<String, Vec<EventHandler>>>>;

/// Privileged-side operations behind the bridge.
///
/// Implementations must return promptly: long-running work (fetching,
/// unpacking, removal) belongs on the implementation's own tasks, reporting
/// through the supplied [`ProgressSink`]. The default methods accept every
/// request and do nothing, which is what a headless host wants.
pub trait PluginHost: Send + Sync + 'static {
    fn install_plugin(
        &self,
        _identifier: &str,
        _source_url: &str,
        _progress: &ProgressSink,
    ) -> Result<()> {
        Ok(())
    }

    fn update_plugin(&self, _identifier: &str, _name: &str, _progress: &ProgressSink) -> Result<()> {
        Ok(())
    }

    fn uninstall_plugin(&self, _name: &str, _progress: &ProgressSink) -> Result<()> {
        Ok(())
    }

    fn list_plugins(&self) -> Result<Vec<PluginDescriptor>> {
        Ok(Vec::new())
    }

    /// Abandon an in-flight install or update. Best effort: the host may
    /// already be past the point of no return.
    fn cancel_operation(&self, _identifier: &str) -> Result<()> {
        Ok(())
    }
}

/// Host that accepts every request and does nothing.
#[derive(Debug, Default)]
pub struct NoopPluginHost;

impl PluginHost for NoopPluginHost {}

/// Publishes `{type, message}` progress payloads on one event channel.
///
/// Each lifecycle operation kind shares a single channel across all of its
/// concurrent invocations; the sink does not add any per-invocation
/// correlation.
#[derive(Clone)]
pub struct ProgressSink {
    event_tx: broadcast::Sender<EventEnvelope>,
    channel: &'static str,
}

impl ProgressSink {
    #[must_use]
    pub fn new(event_tx: broadcast::Sender<EventEnvelope>, channel: &'static str) -> Self {
        Self { event_tx, channel }
    }

    /// Publish an info event.
    pub fn info(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::info(message));
    }

    /// Publish an error event.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::error(message));
    }

    /// Publish an arbitrary progress event. Send failures mean no UI is
    /// listening, which is fine for a fire-and-forget stream.
    pub fn emit(&self, event: ProgressEvent) {
        match serde_json::to_value(&event) {
            Ok(payload) => {
                let _ = self.event_tx.send(EventEnvelope::new(self.channel, payload));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize progress event; dropping");
            }
        }
    }
}

/// UI-side end of the message bridge. Cloning yields another handle onto
/// the same transport, handler registry, and audit counters.
#[derive(Clone)]
pub struct UiBridge {
    command_tx: mpsc::UnboundedSender<CommandMessage>,
    handlers: HandlerRegistry,
    audit: Arc<GateAudit>,
}

impl UiBridge {
    /// Send a command. Fire and forget: a disallowed channel is silently
    /// dropped (and counted), and transport failures surface nowhere.
    pub fn send(&self, channel: &str, args: Vec<serde_json::Value>) {
        if !gate::can_send(channel) {
            self.audit.record_dropped_send(channel);
            return;
        }
        if self.command_tx.send(CommandMessage::new(channel, args)).is_err() {
            tracing::debug!(channel, "host command channel closed; command dropped");
        }
    }

    /// Register a handler for an event channel. A disallowed channel never
    /// registers anything. Handlers accumulate: there is no unsubscribe,
    /// and repeated registrations on one channel all fire for every event.
    pub fn subscribe(
        &self,
        channel: &str,
        handler: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) {
        if !gate::can_receive(channel) {
            self.audit.record_dropped_subscribe(channel);
            return;
        }
        let Ok(mut handlers) = self.handlers.lock() else {
            tracing::error!(channel, "handler registry lock poisoned; subscription dropped");
            return;
        };
        handlers
            .entry(channel.to_owned())
            .or_default()
            .push(Box::new(handler));
    }

    /// Counters for traffic the gate dropped at this bridge.
    #[must_use]
    pub fn audit(&self) -> &GateAudit {
        &self.audit
    }
}

/// Host-side command router.
///
/// Receives command messages from the UI, re-validates them against the
/// gate, and dispatches plugin lifecycle commands to the [`PluginHost`].
/// Allowed channels outside the plugin core (window chrome, locale, and
/// the command runner) belong to other host subsystems and are ignored
/// here.
pub struct PluginHostServer<H: PluginHost> {
    command_rx: mpsc::UnboundedReceiver<CommandMessage>,
    event_tx: broadcast::Sender<EventEnvelope>,
    host: H,
}

/// Create a connected bridge/router pair with a fresh event stream.
///
/// Must be called from within a Tokio runtime: the bridge spawns the task
/// that fans events out to subscribed handlers.
#[must_use]
pub fn bridge_channel<H: PluginHost>(
    event_capacity: usize,
    host: H,
) -> (UiBridge, PluginHostServer<H>) {
    let (event_tx, _event_rx) = broadcast::channel(event_capacity.max(1));
    bridge_channel_with_events(event_tx, host)
}

/// Create a connected bridge/router pair over an existing event sender.
///
/// Other host subsystems (the command runner, menu and locale plumbing)
/// publish on the same stream, so they can share the sender with the
/// router instead of owning a second channel.
#[must_use]
pub fn bridge_channel_with_events<H: PluginHost>(
    event_tx: broadcast::Sender<EventEnvelope>,
    host: H,
) -> (UiBridge, PluginHostServer<H>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let handlers: HandlerRegistry = Arc::new(Mutex::new(HashMap::new()));
    spawn_dispatcher(event_tx.subscribe(), Arc::clone(&handlers));

    (
        UiBridge {
            command_tx,
            handlers,
            audit: Arc::new(GateAudit::default()),
        },
        PluginHostServer {
            command_rx,
            event_tx,
            host,
        },
    )
}

/// Fan inbound events out to every handler registered for their channel.
/// The envelope is dropped here: handlers only ever see the payload.
fn spawn_dispatcher(mut event_rx: broadcast::Receiver<EventEnvelope>, handlers: HandlerRegistry) {
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(envelope) => {
                    let Ok(guard) = handlers.lock() else {
                        tracing::error!("handler registry lock poisoned; stopping dispatcher");
                        return;
                    };
                    if let Some(subscribed) = guard.get(&envelope.channel) {
                        for handler in subscribed {
                            handler(envelope.payload.clone());
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event dispatcher lagged; events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

impl<H: PluginHost> PluginHostServer<H> {
    /// Handle to the host -> UI event stream. Used by the transport layers
    /// and by host subsystems that publish their own events.
    #[must_use]
    pub fn event_sender(&self) -> broadcast::Sender<EventEnvelope> {
        self.event_tx.clone()
    }

    /// Run the router loop until every command sender is dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            self.route(&command);
        }
    }

    /// Route one command message to the plugin host.
    pub fn route(&self, command: &CommandMessage) {
        if !gate::can_send(&command.channel) {
            // The UI-side gate already refuses these; a message arriving
            // here means some other transport fed the router directly.
            tracing::warn!(channel = %command.channel, "refused command on disallowed channel");
            return;
        }
        match command.channel.as_str() {
            contract::CMD_INSTALL_PLUGIN => self.handle_install(command),
            contract::CMD_UPDATE_PLUGIN => self.handle_update(command),
            contract::CMD_UNINSTALL_PLUGIN => self.handle_uninstall(command),
            contract::CMD_LIST_PLUGINS => self.handle_list(),
            contract::CMD_CANCEL_PLUGIN_PROCESS => self.handle_cancel(command),
            other => {
                tracing::debug!(channel = other, "ignoring non-plugin command");
            }
        }
    }

    fn handle_install(&self, command: &CommandMessage) {
        let (Some(identifier), Some(source_url)) = (command.arg_str(0), command.arg_str(1)) else {
            tracing::warn!("install-plugin requires (identifier, source_url) args");
            return;
        };
        let sink = ProgressSink::new(self.event_tx.clone(), contract::EVT_INSTALL_PLUGIN_PROGRESS);
        if let Err(e) = self.host.install_plugin(identifier, source_url, &sink) {
            sink.error(e.to_string());
        }
    }

    fn handle_update(&self, command: &CommandMessage) {
        let (Some(identifier), Some(name)) = (command.arg_str(0), command.arg_str(1)) else {
            tracing::warn!("update-plugin requires (identifier, name) args");
            return;
        };
        let sink = ProgressSink::new(self.event_tx.clone(), contract::EVT_UPDATE_PLUGIN_PROGRESS);
        if let Err(e) = self.host.update_plugin(identifier, name, &sink) {
            sink.error(e.to_string());
        }
    }

    fn handle_uninstall(&self, command: &CommandMessage) {
        // Uninstall is addressed by plugin name; the second positional arg
        // is unused on the wire and deliberately ignored.
        let Some(name) = command.arg_str(0) else {
            tracing::warn!("uninstall-plugin requires a name arg");
            return;
        };
        let sink =
            ProgressSink::new(self.event_tx.clone(), contract::EVT_UNINSTALL_PLUGIN_PROGRESS);
        if let Err(e) = self.host.uninstall_plugin(name, &sink) {
            sink.error(e.to_string());
        }
    }

    fn handle_list(&self) {
        let descriptors = match self.host.list_plugins() {
            Ok(descriptors) => descriptors,
            Err(e) => {
                tracing::warn!(error = %e, "list-plugins failed");
                return;
            }
        };
        match serde_json::to_value(&descriptors) {
            Ok(payload) => {
                let _ = self
                    .event_tx
                    .send(EventEnvelope::new(contract::EVT_LIST_PLUGINS, payload));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize plugin descriptors");
            }
        }
    }

    fn handle_cancel(&self, command: &CommandMessage) {
        let Some(identifier) = command.arg_str(0) else {
            tracing::warn!("cancel-plugin-process requires an identifier arg");
            return;
        };
        if let Err(e) = self.host.cancel_operation(identifier) {
            tracing::warn!(identifier, error = %e, "cancel request failed");
        }
    }
}
