//! Générateur de gardes : calcul pur, aucune écriture.

mod assignment;
mod types;
mod util;

pub use types::GenerationPlan;
pub use util::{parse_date, DATE_FORMAT};

use crate::error::DutyError;
use crate::model::{DutyKind, DutyShift};
use chrono::{Datelike, NaiveDate};

/// Produit une garde par date éligible de `[start, end]`, titulaires en rotation.
///
/// Ordre des validations : étage manquant, plage inversée, rotation vide, puis
/// absence de date éligible.
pub fn generate(plan: &GenerationPlan) -> Result<Vec<DutyShift>, DutyError> {
    if plan.kind.requires_floor() && plan.floor.is_none() {
        return Err(DutyError::MissingFloor);
    }
    if plan.start > plan.end {
        return Err(DutyError::InvalidRange {
            start: plan.start.to_string(),
            end: plan.end.to_string(),
        });
    }
    if plan.assignee_ids.is_empty() {
        return Err(DutyError::EmptyAssigneePool);
    }
    let duties = assignment::expand(plan)?;
    tracing::debug!(kind = %plan.kind, count = duties.len(), "generated duty batch");
    Ok(duties)
}

/// Même contrôle que pour un jour généré, appliqué à une garde isolée.
pub fn check_single(kind: DutyKind, date: NaiveDate, floor: Option<i32>) -> Result<(), DutyError> {
    if !kind.is_eligible(date) {
        return Err(DutyError::IneligibleWeekday {
            kind: kind.as_str(),
            date: date.to_string(),
            weekday: date.weekday().to_string(),
        });
    }
    if kind.requires_floor() && floor.is_none() {
        return Err(DutyError::MissingFloor);
    }
    Ok(())
}
