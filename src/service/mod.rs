//! Services métier au-dessus du [`Repository`](crate::store::Repository).

pub mod duty;
pub mod swap;

pub use duty::{CreateDutyRequest, DutyQuery, DutyService, GenerateDutyRequest, UpdateDutyRequest};
pub use swap::SwapService;
