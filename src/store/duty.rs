use super::StoreError;
use crate::error::Entity;
use crate::model::{DutyId, DutyShift, Roster};
use std::collections::HashSet;

/// Table des gardes. Aucune règle métier ici.
pub trait DutyStore {
    fn get_duty(&self, id: &DutyId) -> Result<DutyShift, StoreError>;
    fn create_duty(&mut self, duty: DutyShift) -> Result<DutyShift, StoreError>;
    /// Tout ou rien : en cas d'erreur aucune ligne n'est ajoutée.
    fn create_duties(&mut self, duties: Vec<DutyShift>) -> Result<Vec<DutyShift>, StoreError>;
    fn update_duty(&mut self, duty: &DutyShift) -> Result<(), StoreError>;
    fn delete_duty(&mut self, id: &DutyId) -> Result<(), StoreError>;
    /// Gardes satisfaisant `predicate`, triées par date.
    fn find_duties<P>(&self, predicate: P) -> Vec<DutyShift>
    where
        P: Fn(&DutyShift) -> bool;
    /// Échange les titulaires de deux gardes ; retourne les deux gardes mises à jour.
    fn exchange_assignees(
        &mut self,
        a: &DutyId,
        b: &DutyId,
    ) -> Result<(DutyShift, DutyShift), StoreError>;
}

fn duty_index(roster: &Roster, id: &DutyId) -> Result<usize, StoreError> {
    roster
        .duties
        .iter()
        .position(|d| &d.id == id)
        .ok_or_else(|| StoreError::not_found(Entity::Duty, id))
}

impl DutyStore for Roster {
    fn get_duty(&self, id: &DutyId) -> Result<DutyShift, StoreError> {
        let idx = duty_index(self, id)?;
        Ok(self.duties[idx].clone())
    }

    fn create_duty(&mut self, duty: DutyShift) -> Result<DutyShift, StoreError> {
        if self.duties.iter().any(|d| d.id == duty.id) {
            return Err(StoreError::DuplicateKey(duty.id.to_string()));
        }
        self.duties.push(duty.clone());
        Ok(duty)
    }

    fn create_duties(&mut self, duties: Vec<DutyShift>) -> Result<Vec<DutyShift>, StoreError> {
        let mut seen: HashSet<&DutyId> = self.duties.iter().map(|d| &d.id).collect();
        for duty in &duties {
            if !seen.insert(&duty.id) {
                return Err(StoreError::DuplicateKey(duty.id.to_string()));
            }
        }
        self.duties.extend(duties.iter().cloned());
        Ok(duties)
    }

    fn update_duty(&mut self, duty: &DutyShift) -> Result<(), StoreError> {
        let idx = duty_index(self, &duty.id)?;
        self.duties[idx] = duty.clone();
        Ok(())
    }

    fn delete_duty(&mut self, id: &DutyId) -> Result<(), StoreError> {
        let idx = duty_index(self, id)?;
        self.duties.remove(idx);
        Ok(())
    }

    fn find_duties<P>(&self, predicate: P) -> Vec<DutyShift>
    where
        P: Fn(&DutyShift) -> bool,
    {
        let mut out: Vec<DutyShift> = self.duties.iter().filter(|d| predicate(d)).cloned().collect();
        out.sort_by_key(|d| d.date);
        out
    }

    fn exchange_assignees(
        &mut self,
        a: &DutyId,
        b: &DutyId,
    ) -> Result<(DutyShift, DutyShift), StoreError> {
        let ia = duty_index(self, a)?;
        let ib = duty_index(self, b)?;
        if ia != ib {
            let assignee_a = self.duties[ia].assignee_id.clone();
            let assignee_b = std::mem::replace(&mut self.duties[ib].assignee_id, assignee_a);
            self.duties[ia].assignee_id = assignee_b;
            self.duties[ia].touch();
            self.duties[ib].touch();
        }
        Ok((self.duties[ia].clone(), self.duties[ib].clone()))
    }
}
