use crate::store::StoreError;
use thiserror::Error;

/// Entité visée par un `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Duty,
    SwapRequest,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Entity::Duty => "duty",
            Entity::SwapRequest => "swap request",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code d'erreur stable exposé à la couche API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRange,
    NoEligibleDates,
    MissingFloor,
    EmptyAssigneePool,
    DateFormatInvalid,
    IneligibleWeekday,
    NotFound,
    NotOwner,
    KindMismatch,
    SelfSwap,
    DuplicateRequest,
    NotPending,
    NotAuthorized,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidRange => "INVALID_RANGE",
            ErrorKind::NoEligibleDates => "NO_ELIGIBLE_DATES",
            ErrorKind::MissingFloor => "MISSING_FLOOR",
            ErrorKind::EmptyAssigneePool => "EMPTY_ASSIGNEE_POOL",
            ErrorKind::DateFormatInvalid => "DATE_FORMAT_INVALID",
            ErrorKind::IneligibleWeekday => "INELIGIBLE_WEEKDAY",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NotOwner => "NOT_OWNER",
            ErrorKind::KindMismatch => "KIND_MISMATCH",
            ErrorKind::SelfSwap => "SELF_SWAP",
            ErrorKind::DuplicateRequest => "DUPLICATE_REQUEST",
            ErrorKind::NotPending => "NOT_PENDING",
            ErrorKind::NotAuthorized => "NOT_AUTHORIZED",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },
    #[error("no eligible {kind} dates between {start} and {end}")]
    NoEligibleDates {
        kind: &'static str,
        start: String,
        end: String,
    },
    #[error("floor is required for NIGHT_STUDY duty")]
    MissingFloor,
    #[error("at least one assignee is required")]
    EmptyAssigneePool,
    #[error("invalid date format (expected YYYY-MM-DD): {0}")]
    DateFormatInvalid(String),
    #[error("{kind} duty cannot be scheduled on {weekday} ({date})")]
    IneligibleWeekday {
        kind: &'static str,
        date: String,
        weekday: String,
    },
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },
    #[error("you can only request a swap for your own duty")]
    NotOwner,
    #[error("can only swap duties of the same kind")]
    KindMismatch,
    #[error("cannot swap with a duty you already hold")]
    SelfSwap,
    #[error("a pending swap request already exists for these duties")]
    DuplicateRequest,
    #[error("swap request is not pending (status {0})")]
    NotPending(&'static str),
    #[error("only the target duty assignee can approve or reject")]
    NotAuthorized,
    #[error("storage failure: {0:#}")]
    StorageFailure(#[source] anyhow::Error),
}

impl DutyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DutyError::InvalidRange { .. } => ErrorKind::InvalidRange,
            DutyError::NoEligibleDates { .. } => ErrorKind::NoEligibleDates,
            DutyError::MissingFloor => ErrorKind::MissingFloor,
            DutyError::EmptyAssigneePool => ErrorKind::EmptyAssigneePool,
            DutyError::DateFormatInvalid(_) => ErrorKind::DateFormatInvalid,
            DutyError::IneligibleWeekday { .. } => ErrorKind::IneligibleWeekday,
            DutyError::NotFound { .. } => ErrorKind::NotFound,
            DutyError::NotOwner => ErrorKind::NotOwner,
            DutyError::KindMismatch => ErrorKind::KindMismatch,
            DutyError::SelfSwap => ErrorKind::SelfSwap,
            DutyError::DuplicateRequest => ErrorKind::DuplicateRequest,
            DutyError::NotPending(_) => ErrorKind::NotPending,
            DutyError::NotAuthorized => ErrorKind::NotAuthorized,
            DutyError::StorageFailure(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<StoreError> for DutyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DutyError::NotFound { entity, id },
            StoreError::DuplicatePending { .. } => DutyError::DuplicateRequest,
            StoreError::Backend(err) => DutyError::StorageFailure(err),
            other @ StoreError::DuplicateKey(_) => DutyError::StorageFailure(other.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DutyError>;
