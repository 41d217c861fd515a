use super::StoreError;
use crate::error::Entity;
use crate::model::{Roster, SwapRequest, SwapRequestId};

/// Table des demandes d'échange.
pub trait SwapRequestStore {
    fn get_swap_request(&self, id: &SwapRequestId) -> Result<SwapRequest, StoreError>;
    /// Refuse une seconde demande `Pending` pour la même paire (source, cible).
    fn create_swap_request(&mut self, request: SwapRequest) -> Result<SwapRequest, StoreError>;
    fn update_swap_request(&mut self, request: &SwapRequest) -> Result<(), StoreError>;
    /// Demandes satisfaisant `predicate`, les plus récentes d'abord.
    fn find_swap_requests<P>(&self, predicate: P) -> Vec<SwapRequest>
    where
        P: Fn(&SwapRequest) -> bool;
}

impl SwapRequestStore for Roster {
    fn get_swap_request(&self, id: &SwapRequestId) -> Result<SwapRequest, StoreError> {
        self.swap_requests
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::SwapRequest, id))
    }

    fn create_swap_request(&mut self, request: SwapRequest) -> Result<SwapRequest, StoreError> {
        if self.swap_requests.iter().any(|r| r.id == request.id) {
            return Err(StoreError::DuplicateKey(request.id.to_string()));
        }
        if request.is_pending() && pending_exists(self, &request) {
            return Err(StoreError::DuplicatePending {
                source_duty: request.source_duty_id.clone(),
                target_duty: request.target_duty_id.clone(),
            });
        }
        self.swap_requests.push(request.clone());
        Ok(request)
    }

    fn update_swap_request(&mut self, request: &SwapRequest) -> Result<(), StoreError> {
        let slot = self
            .swap_requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or_else(|| StoreError::not_found(Entity::SwapRequest, &request.id))?;
        *slot = request.clone();
        Ok(())
    }

    fn find_swap_requests<P>(&self, predicate: P) -> Vec<SwapRequest>
    where
        P: Fn(&SwapRequest) -> bool,
    {
        // insertion inverse puis tri stable : à horodatage égal, la plus récente d'abord
        let mut out: Vec<SwapRequest> = self
            .swap_requests
            .iter()
            .rev()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

fn pending_exists(roster: &Roster, request: &SwapRequest) -> bool {
    roster.swap_requests.iter().any(|r| {
        r.is_pending()
            && r.source_duty_id == request.source_duty_id
            && r.target_duty_id == request.target_duty_id
    })
}
