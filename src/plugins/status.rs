//! Persistent status table for in-flight plugin operations.
//!
//! One JSON document keyed by operation identifier, stored at
//! `{config_dir}/kubedeck/plugin-status.json`. Every mutation is a full
//! read-parse-mutate-serialize-write cycle; an in-process mutex serializes
//! those cycles, but the file stays last-writer-wins if a second process
//! shares it. Entries expire sixty seconds after their last update and are
//! evicted as a side effect of the read that finds them stale; successful
//! operations are never removed eagerly, they simply age out.

use crate::error::{DeckError, Result};
use crate::plugins::progress::{ProgressEvent, ProgressKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Entries older than this are treated as absent and evicted on read.
pub const STATUS_TTL_MS: i64 = 60_000;

/// Lifecycle action a status entry tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginAction {
    Install,
    Update,
    Uninstall,
}

impl PluginAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Update => "Update",
            Self::Uninstall => "Uninstall",
        }
    }
}

/// One row of the status table as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub action: PluginAction,
    /// Coarse completion percentage, 0-100.
    pub progress: u8,
    /// JSON-encoded progress event, re-parsed on read.
    pub status: String,
    /// Epoch milliseconds of the last update.
    pub timestamp: i64,
}

/// The view returned to callers: the last action, its inferred percentage,
/// and the decoded fields of the most recent progress event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginStatus {
    pub action: PluginAction,
    pub progress: u8,
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub message: String,
}

type StatusTable = HashMap<String, StatusEntry>;

/// File-backed status table shared by every operation client in the
/// process. Cloning yields another handle onto the same table.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl StatusStore {
    /// Store backed by an explicit file path (used by tests and embedders).
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store at the default platform location
    /// (`{config_dir}/kubedeck/plugin-status.json`).
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| DeckError::Status("cannot determine config directory".to_owned()))?;
        Ok(Self::at_path(base.join("kubedeck").join("plugin-status.json")))
    }

    /// Overwrite the entry for `identifier` with a fresh timestamp.
    pub fn set(
        &self,
        identifier: &str,
        action: PluginAction,
        progress: u8,
        status_json: &str,
    ) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| DeckError::Status("status table lock poisoned".to_owned()))?;

        let mut table = self.read_table();
        table.insert(
            identifier.to_owned(),
            StatusEntry {
                action,
                progress,
                status: status_json.to_owned(),
                timestamp: now_millis(),
            },
        );
        self.write_table(&table)
    }

    /// Remove the entry for `identifier`, if any.
    pub fn remove(&self, identifier: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| DeckError::Status("status table lock poisoned".to_owned()))?;

        let mut table = self.read_table();
        if table.remove(identifier).is_none() {
            return Ok(());
        }
        self.write_table(&table)
    }

    /// Latest status for `identifier`, or `None` when the table is absent,
    /// no entry exists, or the entry has gone stale. Stale entries are
    /// evicted as a side effect of the read.
    #[must_use]
    pub fn status(&self, identifier: &str) -> Option<PluginStatus> {
        let _guard = self.lock.lock().ok()?;

        let mut table = self.read_table();
        let entry = table.get(identifier)?;

        if now_millis() - entry.timestamp >= STATUS_TTL_MS {
            table.remove(identifier);
            if let Err(e) = self.write_table(&table) {
                tracing::warn!(identifier, error = %e, "failed to evict stale status entry");
            }
            return None;
        }

        let payload: serde_json::Value = serde_json::from_str(&entry.status).unwrap_or_default();
        let event = ProgressEvent::from_payload(&payload);
        Some(PluginStatus {
            action: entry.action,
            progress: entry.progress,
            kind: event.kind,
            message: event.message,
        })
    }

    /// Parse the table from disk. A missing or unreadable file is an empty
    /// table, matching the semantics of a never-written store.
    fn read_table(&self) -> StatusTable {
        let bytes = match std::fs::read(self.path.as_ref()) {
            Ok(b) => b,
            Err(_) => return StatusTable::new(),
        };
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    fn write_table(&self, table: &StatusTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DeckError::Status(format!(
                    "cannot create status directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string(table)
            .map_err(|e| DeckError::Status(format!("cannot serialize status table: {e}")))?;

        std::fs::write(self.path.as_ref(), json).map_err(|e| {
            DeckError::Status(format!(
                "cannot write status table to {}: {e}",
                self.path.display()
            ))
        })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
