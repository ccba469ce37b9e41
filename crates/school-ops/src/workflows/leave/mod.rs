//! Student leave permits and their approval workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    LeavePermit, LeavePermitFilter, LeavePermitRequest, LeavePermitStatus, LeaveType,
};
pub use repository::LeavePermitRepository;
pub use router::leave_router;
pub use service::LeavePermitService;
