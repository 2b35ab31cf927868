//! Kubedeck: desktop host core for a Kubernetes cluster-management
//! dashboard.
//!
//! A privileged host process and a sandboxed UI exchange messages over a
//! restricted asynchronous bridge:
//!
//! - **Channel gate** -- fixed allow-lists for command and event channels;
//!   anything else is dropped silently at the boundary (fail closed).
//! - **Message bridge** -- fire-and-forget command sends and additive
//!   event subscriptions, over in-process channels or newline-delimited
//!   JSON on stdin/stdout.
//! - **Operation client** -- plugin install/update/uninstall/list/cancel
//!   with heuristic progress inference and optional caller callbacks.
//! - **Status cache** -- a time-bounded, file-backed table of each
//!   operation's last known progress.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod plugins;

pub use config::DeckConfig;
pub use error::{DeckError, Result};
pub use host::channel::{NoopPluginHost, PluginHost, ProgressSink, UiBridge};
pub use plugins::manager::PluginManager;
pub use plugins::progress::{ProgressCallback, ProgressEvent, ProgressKind};
pub use plugins::status::{PluginStatus, StatusStore};
