pub mod attendance;
pub mod calendar;
pub mod health;
pub mod ids;
pub mod interval;
pub mod leave;
pub mod scheduling;
