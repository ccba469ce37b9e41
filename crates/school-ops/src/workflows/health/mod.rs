//! Medical exemptions ("health statuses") that mark students sick.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    HealthStatus, HealthStatusChanges, HealthStatusFilter, HealthStatusRequest, HealthStatusState,
};
pub use repository::HealthStatusRepository;
pub use router::health_router;
pub use service::HealthStatusService;
