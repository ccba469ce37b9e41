//! Scheduling, attendance, leave, and medical-exemption records for a school day.
//!
//! The workflows share one storage abstraction per record type (see the
//! `repository` module in each workflow) so the services can run against the
//! in-memory backend in [`store::memory`] or any other implementation.

pub mod audit;
pub mod config;
pub mod error;
pub mod locks;
pub mod store;
pub mod telemetry;
pub mod workflows;
