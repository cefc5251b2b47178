//! Injected logging capability.
//!
//! Nothing in the core logs through a global. The broker, the repository and
//! the operation dispatcher each receive an [`EventSink`] and report what they
//! did through it. The CLI wires a JSONL audit log together with `tracing`;
//! tests use [`MemorySink`] to assert on what was reported.

use crate::core::envelope::{new_event_id, now_epoch_z};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuditEvent {
    pub ts: String,
    pub event_id: String,
    pub level: Level,
    pub actor: String,
    pub op: String,
    pub target: Option<String>,
    pub status: String,
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(level: Level, actor: &str, op: &str, status: &str) -> Self {
        Self {
            ts: now_epoch_z(),
            event_id: new_event_id(),
            level,
            actor: actor.to_string(),
            op: op.to_string(),
            target: None,
            status: status.to_string(),
            detail: None,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub trait EventSink {
    fn emit(&self, event: AuditEvent);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AuditEvent) {}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Appends one JSON line per event to an audit log file.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn append(&self, event: &AuditEvent) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(event)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{}", line)
    }
}

impl EventSink for JsonlSink {
    fn emit(&self, event: AuditEvent) {
        // An unwritable audit log must not undo a committed invocation.
        if let Err(e) = self.append(&event) {
            tracing::warn!(path = %self.path.display(), error = %e, "audit log append failed");
        }
    }
}

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AuditEvent) {
        let target = event.target.as_deref().unwrap_or("-");
        let detail = event.detail.as_deref().unwrap_or("");
        match event.level {
            Level::Debug => tracing::debug!(
                actor = %event.actor,
                op = %event.op,
                member = target,
                status = %event.status,
                "{}",
                detail
            ),
            Level::Info => tracing::info!(
                actor = %event.actor,
                op = %event.op,
                member = target,
                status = %event.status,
                "{}",
                detail
            ),
            Level::Warn => tracing::warn!(
                actor = %event.actor,
                op = %event.op,
                member = target,
                status = %event.status,
                "{}",
                detail
            ),
        }
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&self, event: AuditEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}

/// Reads an audit log back, skipping lines that do not parse.
pub fn read_audit_log(path: &Path) -> Result<Vec<AuditEvent>, std::io::Error> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
