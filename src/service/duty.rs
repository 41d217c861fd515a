use crate::audit::{self, AuditAction, AuditEvent, AuditSink};
use crate::error::{DutyError, Result};
use crate::model::{DutyId, DutyKind, DutyShift, PersonId};
use crate::scheduler::{self, parse_date, GenerationPlan};
use crate::storage::Storage;
use crate::store::{DutyStore, Repository};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const ENTITY: &str = "duty";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDutyRequest {
    pub kind: DutyKind,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub floor: Option<i32>,
    pub assignee_id: PersonId,
}

/// Mise à jour partielle : un champ absent (ou vide) ne change rien.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDutyRequest {
    #[serde(default)]
    pub kind: Option<DutyKind>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub assignee_id: Option<PersonId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDutyRequest {
    pub kind: DutyKind,
    pub start_date: String,
    pub end_date: String,
    pub assignee_ids: Vec<PersonId>,
    #[serde(default)]
    pub floor: Option<i32>,
}

/// Filtres de liste ; bornes de dates incluses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DutyQuery {
    #[serde(default)]
    pub kind: Option<DutyKind>,
    #[serde(default)]
    pub assignee_id: Option<PersonId>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub struct DutyService<S: Storage> {
    repo: Arc<Repository<S>>,
    audit: Arc<dyn AuditSink>,
}

impl<S: Storage> DutyService<S> {
    pub fn new(repo: Arc<Repository<S>>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repo, audit }
    }

    pub fn create(&self, actor: &PersonId, req: &CreateDutyRequest) -> Result<DutyShift> {
        let date = parse_date(&req.date)?;
        scheduler::check_single(req.kind, date, req.floor)?;
        let duty = DutyShift::new(req.kind, date, req.floor, req.assignee_id.clone());
        let created = self.repo.transaction(|tx| -> Result<_> { Ok(tx.create_duty(duty)?) })?;
        tracing::info!(id = %created.id, kind = %created.kind, date = %created.date, "duty created");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(actor, AuditAction::Create, ENTITY).entity(&created.id),
        );
        Ok(created)
    }

    pub fn get(&self, id: &DutyId) -> Result<DutyShift> {
        self.repo.read(|tx| tx.get_duty(id).map_err(Into::into))
    }

    pub fn list(&self, query: &DutyQuery) -> Result<Vec<DutyShift>> {
        let start = non_empty(&query.start_date).map(parse_date).transpose()?;
        let end = non_empty(&query.end_date).map(parse_date).transpose()?;
        self.repo.read(|tx| {
            Ok(tx.find_duties(|d| {
                query.kind.map_or(true, |k| d.kind == k)
                    && query.assignee_id.as_ref().map_or(true, |a| &d.assignee_id == a)
                    && start.map_or(true, |s| d.date >= s)
                    && end.map_or(true, |e| d.date <= e)
            }))
        })
    }

    pub fn update(&self, actor: &PersonId, id: &DutyId, req: &UpdateDutyRequest) -> Result<DutyShift> {
        let date = non_empty(&req.date).map(parse_date).transpose()?;
        let assignee = req.assignee_id.as_ref().filter(|a| !a.as_str().trim().is_empty());
        let updated = self.repo.transaction(|tx| -> Result<_> {
            let mut duty = tx.get_duty(id)?;
            if let Some(kind) = req.kind {
                duty.kind = kind;
            }
            if let Some(date) = date {
                duty.date = date;
            }
            if let Some(floor) = req.floor {
                duty.floor = Some(floor);
            }
            if let Some(assignee) = assignee {
                duty.assignee_id = assignee.clone();
            }
            if !duty.kind.requires_floor() {
                duty.floor = None;
            } else if duty.floor.is_none() {
                return Err(DutyError::MissingFloor);
            }
            duty.touch();
            tx.update_duty(&duty)?;
            Ok(duty)
        })?;
        tracing::info!(id = %updated.id, "duty updated");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(actor, AuditAction::Update, ENTITY).entity(&updated.id),
        );
        Ok(updated)
    }

    pub fn delete(&self, actor: &PersonId, id: &DutyId) -> Result<()> {
        self.repo.transaction(|tx| -> Result<_> { Ok(tx.delete_duty(id)?) })?;
        tracing::info!(%id, "duty deleted");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(actor, AuditAction::Delete, ENTITY).entity(id),
        );
        Ok(())
    }

    /// Marque la garde comme effectuée (idempotent : rien n'est écrit ni audité la
    /// seconde fois).
    pub fn complete(&self, actor: &PersonId, id: &DutyId) -> Result<DutyShift> {
        let (duty, changed) = self.repo.transaction(|tx| -> Result<_> {
            let mut duty = tx.get_duty(id)?;
            if duty.completed {
                return Ok((duty, false));
            }
            duty.completed = true;
            duty.touch();
            tx.update_duty(&duty)?;
            Ok((duty, true))
        })?;
        if changed {
            tracing::info!(%id, "duty completed");
            audit::emit(
                self.audit.as_ref(),
                AuditEvent::new(actor, AuditAction::Complete, ENTITY).entity(id),
            );
        }
        Ok(duty)
    }

    /// Génère puis insère le lot en une seule transaction.
    pub fn generate(&self, actor: &PersonId, req: &GenerateDutyRequest) -> Result<Vec<DutyShift>> {
        let plan = GenerationPlan {
            kind: req.kind,
            start: parse_date(&req.start_date)?,
            end: parse_date(&req.end_date)?,
            assignee_ids: req.assignee_ids.clone(),
            floor: req.floor,
        };
        let batch = scheduler::generate(&plan)?;
        let created = self
            .repo
            .transaction(|tx| -> Result<_> { Ok(tx.create_duties(batch)?) })?;
        tracing::info!(kind = %plan.kind, count = created.len(), "duty batch persisted");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(actor, AuditAction::Generate, ENTITY)
                .details(json!({ "count": created.len() })),
        );
        Ok(created)
    }

    /// Échange immédiat des titulaires, sans contrôle de type ni d'autorisation.
    pub fn exchange_assignees(
        &self,
        actor: &PersonId,
        a: &DutyId,
        b: &DutyId,
    ) -> Result<(DutyShift, DutyShift)> {
        let pair = self
            .repo
            .transaction(|tx| -> Result<_> { Ok(tx.exchange_assignees(a, b)?) })?;
        tracing::info!(%a, %b, "duty assignees exchanged");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(actor, AuditAction::Swap, ENTITY)
                .details(json!({ "dutyA": a.as_str(), "dutyB": b.as_str() })),
        );
        Ok(pair)
    }
}
