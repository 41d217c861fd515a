#![forbid(unsafe_code)]
//! Duty roster — tours de garde et négociation des échanges, stockage local (sans BD).
//!
//! - Génération round-robin sur les jours éligibles (internat : dim → jeu, étude : lun → jeu).
//! - Demandes d'échange `PENDING → APPROVED | REJECTED`, échange atomique des titulaires.
//! - Stockage fichier JSON, écriture atomique ; toutes les dates en `YYYY-MM-DD`.

pub mod audit;
pub mod error;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod store;

pub use audit::{AuditAction, AuditEvent, AuditSink, JsonLinesAuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::{DutyError, Entity, ErrorKind};
pub use model::{
    DutyId, DutyKind, DutyShift, PersonId, Roster, SwapRequest, SwapRequestId, SwapRequestView,
    SwapStatus,
};
pub use scheduler::{generate, GenerationPlan};
pub use service::{
    CreateDutyRequest, DutyQuery, DutyService, GenerateDutyRequest, SwapService, UpdateDutyRequest,
};
pub use storage::{JsonStorage, MemoryStorage, Storage, StorageLock};
pub use store::{DutyStore, Repository, StoreError, SwapRequestStore};
