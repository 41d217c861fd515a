use crate::model::PersonId;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Generate,
    Swap,
    Complete,
    RequestDutySwap,
    ApproveDutySwap,
    RejectDutySwap,
}

/// Évènement d'audit : qui, quoi, sur quelle entité.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: PersonId,
    pub action: AuditAction,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(actor: &PersonId, action: AuditAction, entity_type: &str) -> Self {
        Self {
            actor: actor.clone(),
            action,
            entity_type: entity_type.to_string(),
            entity_id: None,
            details: None,
            at: Utc::now(),
        }
    }

    pub fn entity(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Journal d'audit en écriture seule. Un échec n'annule jamais l'opération appelante.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Transmet l'évènement à `tracing` (cible `audit`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<()> {
        tracing::info!(
            target: "audit",
            actor = %event.actor,
            action = ?event.action,
            entity_type = %event.entity_type,
            entity_id = event.entity_id.as_deref().unwrap_or("-"),
            "audit event"
        );
        Ok(())
    }
}

/// Ajoute une ligne JSON par évènement dans un fichier.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), lock: Mutex::new(()) }
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, event: AuditEvent) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("audit lock poisoned"))?;
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Conserve les évènements en mémoire.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow!("audit lock poisoned"))?
            .push(event);
        Ok(())
    }
}

/// Enregistre sans propager : l'échec est seulement journalisé.
pub(crate) fn emit(sink: &dyn AuditSink, event: AuditEvent) {
    let action = event.action;
    if let Err(err) = sink.record(event) {
        tracing::warn!(?action, error = %format!("{err:#}"), "audit sink failed");
    }
}
