use crate::model::{DutyKind, PersonId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Demande de génération, dates déjà analysées.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub kind: DutyKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Rotation ordonnée des titulaires (non vide).
    pub assignee_ids: Vec<PersonId>,
    #[serde(default)]
    pub floor: Option<i32>,
}
