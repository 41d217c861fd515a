use super::{util, GenerationPlan};
use crate::error::DutyError;
use crate::model::DutyShift;

/// Expansion round-robin : le curseur n'avance que sur les dates éligibles.
pub(super) fn expand(plan: &GenerationPlan) -> Result<Vec<DutyShift>, DutyError> {
    let total = plan.assignee_ids.len();
    let mut cursor = 0usize;
    let mut out = Vec::new();

    for date in util::days_inclusive(plan.start, plan.end) {
        if !plan.kind.is_eligible(date) {
            continue;
        }
        let assignee = plan.assignee_ids[cursor % total].clone();
        out.push(DutyShift::new(plan.kind, date, plan.floor, assignee));
        cursor += 1;
    }

    if out.is_empty() {
        return Err(DutyError::NoEligibleDates {
            kind: plan.kind.as_str(),
            start: plan.start.to_string(),
            end: plan.end.to_string(),
        });
    }

    Ok(out)
}
