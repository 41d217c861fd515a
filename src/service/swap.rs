//! Négociation des échanges de gardes.
//!
//! Machine à états : `Pending` → `Approved` | `Rejected`, une seule transition.
//! L'approbation relit la demande, vérifie l'autorisation, échange les titulaires et
//! clôt la demande dans une même transaction : deux approbations concurrentes de la
//! même demande ne peuvent pas s'exécuter toutes les deux, la seconde voit `NotPending`.

use crate::audit::{self, AuditAction, AuditEvent, AuditSink};
use crate::error::{DutyError, Result};
use crate::model::{
    DutyId, PersonId, Roster, SwapRequest, SwapRequestId, SwapRequestView, SwapStatus,
};
use crate::storage::Storage;
use crate::store::{DutyStore, Repository, SwapRequestStore};
use serde_json::json;
use std::sync::Arc;

const ENTITY: &str = "duty_swap_request";

pub struct SwapService<S: Storage> {
    repo: Arc<Repository<S>>,
    audit: Arc<dyn AuditSink>,
}

fn resolve(tx: &Roster, request: SwapRequest) -> Result<SwapRequestView> {
    let source = tx.get_duty(&request.source_duty_id)?;
    let target = tx.get_duty(&request.target_duty_id)?;
    Ok(SwapRequestView {
        request,
        source,
        target,
    })
}

/// Variante tolérante pour les listes : une demande dont une garde a disparu est omise.
fn resolve_all(tx: &Roster, requests: Vec<SwapRequest>) -> Vec<SwapRequestView> {
    requests
        .into_iter()
        .filter_map(|request| {
            let id = request.id.clone();
            match resolve(tx, request) {
                Ok(view) => Some(view),
                Err(err) => {
                    tracing::warn!(%id, error = %err, "skipping swap request with missing duty");
                    None
                }
            }
        })
        .collect()
}

impl<S: Storage> SwapService<S> {
    pub fn new(repo: Arc<Repository<S>>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repo, audit }
    }

    /// Propose d'échanger `source` (détenue par `requester`) contre `target`.
    ///
    /// Toutes les vérifications précèdent l'écriture : un refus ne sauvegarde rien.
    pub fn propose(
        &self,
        requester: &PersonId,
        source_id: &DutyId,
        target_id: &DutyId,
    ) -> Result<SwapRequestView> {
        let view = self.repo.transaction(|tx| -> Result<_> {
            let source = tx.get_duty(source_id)?;
            if &source.assignee_id != requester {
                return Err(DutyError::NotOwner);
            }
            let target = tx.get_duty(target_id)?;
            if source.kind != target.kind {
                return Err(DutyError::KindMismatch);
            }
            if source.assignee_id == target.assignee_id {
                return Err(DutyError::SelfSwap);
            }
            let request = SwapRequest::pending(requester.clone(), source.id, target.id);
            let created = tx.create_swap_request(request)?;
            resolve(tx, created)
        })?;
        tracing::info!(id = %view.request.id, source = %source_id, target = %target_id, "swap requested");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(requester, AuditAction::RequestDutySwap, ENTITY)
                .entity(&view.request.id)
                .details(json!({
                    "sourceDutyId": source_id.as_str(),
                    "targetDutyId": target_id.as_str(),
                })),
        );
        Ok(view)
    }

    /// Seul le titulaire actuel de la garde cible peut approuver.
    pub fn approve(&self, id: &SwapRequestId, acting: &PersonId) -> Result<SwapRequestView> {
        let view = self.settle(id, acting, SwapStatus::Approved)?;
        tracing::info!(%id, by = %acting, "swap approved");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(acting, AuditAction::ApproveDutySwap, ENTITY).entity(id),
        );
        Ok(view)
    }

    /// Mêmes contrôles que [`approve`](Self::approve), sans toucher aux gardes.
    pub fn reject(&self, id: &SwapRequestId, acting: &PersonId) -> Result<SwapRequestView> {
        let view = self.settle(id, acting, SwapStatus::Rejected)?;
        tracing::info!(%id, by = %acting, "swap rejected");
        audit::emit(
            self.audit.as_ref(),
            AuditEvent::new(acting, AuditAction::RejectDutySwap, ENTITY).entity(id),
        );
        Ok(view)
    }

    fn settle(
        &self,
        id: &SwapRequestId,
        acting: &PersonId,
        outcome: SwapStatus,
    ) -> Result<SwapRequestView> {
        self.repo.transaction(|tx| -> Result<_> {
            let mut request = tx.get_swap_request(id)?;
            if !request.is_pending() {
                return Err(DutyError::NotPending(request.status.as_str()));
            }
            let source = tx.get_duty(&request.source_duty_id)?;
            let target = tx.get_duty(&request.target_duty_id)?;
            if &target.assignee_id != acting {
                return Err(DutyError::NotAuthorized);
            }
            if outcome == SwapStatus::Approved {
                tx.exchange_assignees(&source.id, &target.id)?;
            }
            if !request.settle(outcome) {
                return Err(DutyError::NotPending(request.status.as_str()));
            }
            tx.update_swap_request(&request)?;
            resolve(tx, request)
        })
    }

    pub fn get(&self, id: &SwapRequestId) -> Result<SwapRequestView> {
        self.repo.read(|tx| -> Result<_> {
            let request = tx.get_swap_request(id)?;
            resolve(tx, request)
        })
    }

    /// Demandes `Pending` dont la garde cible est détenue par `user`, plus récentes d'abord.
    pub fn list_pending_for_assignee(&self, user: &PersonId) -> Result<Vec<SwapRequestView>> {
        self.repo.read(|tx| -> Result<_> {
            let requests = tx.find_swap_requests(|r| {
                r.is_pending()
                    && tx
                        .get_duty(&r.target_duty_id)
                        .map(|target| &target.assignee_id == user)
                        .unwrap_or(false)
            });
            Ok(resolve_all(tx, requests))
        })
    }

    /// Toutes les demandes émises par `user`, quel que soit leur statut.
    pub fn list_mine(&self, user: &PersonId) -> Result<Vec<SwapRequestView>> {
        self.repo.read(|tx| -> Result<_> {
            let requests = tx.find_swap_requests(|r| &r.requester_id == user);
            Ok(resolve_all(tx, requests))
        })
    }
}
