use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant opaque d'une personne (résolu par la couche session, hors périmètre)
    PersonId
);
string_id!(
    /// Identifiant fort pour DutyShift
    DutyId
);
string_id!(
    /// Identifiant fort pour SwapRequest
    SwapRequestId
);

/// Type de garde. `Regular` correspond à la garde d'internat, `NightStudy` à l'étude du soir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyKind {
    Regular,
    NightStudy,
}

impl DutyKind {
    /// Prédicat d'éligibilité par jour de semaine.
    ///
    /// - `Regular` : dimanche → jeudi (ni vendredi ni samedi).
    /// - `NightStudy` : lundi → jeudi.
    pub fn is_eligible(self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        let weekday = date.weekday();
        match self {
            DutyKind::Regular => !matches!(weekday, Weekday::Fri | Weekday::Sat),
            DutyKind::NightStudy => matches!(
                weekday,
                Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu
            ),
        }
    }

    pub fn requires_floor(self) -> bool {
        matches!(self, DutyKind::NightStudy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DutyKind::Regular => "REGULAR",
            DutyKind::NightStudy => "NIGHT_STUDY",
        }
    }
}

impl fmt::Display for DutyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "REGULAR" | "DORM" => Ok(DutyKind::Regular),
            "NIGHT_STUDY" => Ok(DutyKind::NightStudy),
            other => Err(format!("unknown duty kind: {other}")),
        }
    }
}

/// Garde planifiée : une personne, un type, une date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyShift {
    pub id: DutyId,
    pub kind: DutyKind,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    pub assignee_id: PersonId,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DutyShift {
    /// Construit une garde non persistée. L'étage n'est conservé que pour `NightStudy`.
    pub fn new(kind: DutyKind, date: NaiveDate, floor: Option<i32>, assignee_id: PersonId) -> Self {
        let now = Utc::now();
        Self {
            id: DutyId::random(),
            kind,
            date,
            floor: if kind.requires_floor() { floor } else { None },
            assignee_id,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Cycle de vie d'une demande d'échange. `Approved` et `Rejected` sont terminaux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    Pending,
    Approved,
    Rejected,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwapStatus::Pending => "PENDING",
            SwapStatus::Approved => "APPROVED",
            SwapStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposition d'échange des titulaires de deux gardes de même type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: SwapRequestId,
    pub requester_id: PersonId,
    pub source_duty_id: DutyId,
    pub target_duty_id: DutyId,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    pub fn pending(requester_id: PersonId, source_duty_id: DutyId, target_duty_id: DutyId) -> Self {
        let now = Utc::now();
        Self {
            id: SwapRequestId::random(),
            requester_id,
            source_duty_id,
            target_duty_id,
            status: SwapStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SwapStatus::Pending
    }

    /// Applique une transition ; seul `Pending` accepte de sortir.
    pub(crate) fn settle(&mut self, status: SwapStatus) -> bool {
        if self.status.is_terminal() || status == SwapStatus::Pending {
            return false;
        }
        self.status = status;
        self.updated_at = Utc::now();
        true
    }
}

/// Demande d'échange avec ses deux gardes résolues (lecture après écriture).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequestView {
    pub request: SwapRequest,
    pub source: DutyShift,
    pub target: DutyShift,
}

/// Document complet persisté : gardes + demandes d'échange.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Roster {
    #[serde(default)]
    pub duties: Vec<DutyShift>,
    #[serde(default)]
    pub swap_requests: Vec<SwapRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn regular_skips_friday_and_saturday() {
        // 2025-10-06 est un lundi
        let eligible: Vec<bool> = (6..=12)
            .map(|d| DutyKind::Regular.is_eligible(date(2025, 10, d)))
            .collect();
        assert_eq!(eligible, vec![true, true, true, true, false, false, true]);
    }

    #[test]
    fn night_study_is_monday_to_thursday() {
        let eligible: Vec<bool> = (6..=12)
            .map(|d| DutyKind::NightStudy.is_eligible(date(2025, 10, d)))
            .collect();
        assert_eq!(eligible, vec![true, true, true, true, false, false, false]);
    }

    #[test]
    fn kind_parses_legacy_name() {
        assert_eq!("dorm".parse::<DutyKind>().unwrap(), DutyKind::Regular);
        assert_eq!("night-study".parse::<DutyKind>().unwrap(), DutyKind::NightStudy);
        assert!("weekend".parse::<DutyKind>().is_err());
    }

    #[test]
    fn settle_only_leaves_pending_once() {
        let mut req = SwapRequest::pending(PersonId::new("a"), DutyId::new("s"), DutyId::new("t"));
        assert!(req.settle(SwapStatus::Approved));
        assert!(!req.settle(SwapStatus::Rejected));
        assert_eq!(req.status, SwapStatus::Approved);
    }
}
