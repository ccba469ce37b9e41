use crate::config::ConfigError;
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    InvalidTransition,
    Internal,
}

/// Error raised by the workflow services.
///
/// Validation failures are always returned before any write is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("class schedule not found")]
    ClassScheduleNotFound,
    #[error("schedule slot not found")]
    SlotNotFound,
    #[error("leave permit not found")]
    LeavePermitNotFound,
    #[error("health status not found")]
    HealthStatusNotFound,
    #[error("attendance session not found")]
    AttendanceSessionNotFound,
    #[error("schedule slot overlaps another slot in the same dormitory")]
    SlotConflict,
    #[error("slot number is already used in this dormitory")]
    SlotNumberConflict,
    #[error("leave permit overlaps an existing permit for this student")]
    LeavePermitConflict,
    #[error("attendance session is locked")]
    AttendanceAlreadyLocked,
    #[error("student already has an active health status for this date")]
    HealthStatusActive,
    #[error("schedule slot is inactive")]
    SlotInactive,
    #[error("leave permit cannot move from {from} to {to}")]
    LeavePermitStatus {
        from: &'static str,
        to: &'static str,
    },
    #[error("health status is no longer active")]
    HealthStatusForbidden,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal<E: fmt::Display>(error: E) -> Self {
        Self::Internal(error.to_string())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) | Self::SlotInactive => ErrorKind::BadRequest,
            Self::ClassScheduleNotFound
            | Self::SlotNotFound
            | Self::LeavePermitNotFound
            | Self::HealthStatusNotFound
            | Self::AttendanceSessionNotFound => ErrorKind::NotFound,
            Self::SlotConflict
            | Self::SlotNumberConflict
            | Self::LeavePermitConflict
            | Self::AttendanceAlreadyLocked
            | Self::HealthStatusActive => ErrorKind::Conflict,
            Self::LeavePermitStatus { .. } | Self::HealthStatusForbidden => {
                ErrorKind::InvalidTransition
            }
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidTransition => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        Self::internal(value)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Process-level error surfaced by the binaries.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Service(err) => err.into_response(),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        assert_eq!(
            ServiceError::bad_request("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::SlotInactive.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::AttendanceSessionNotFound.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::AttendanceAlreadyLocked.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::HealthStatusForbidden.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::from(RepositoryError::Unavailable("offline".to_string())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn transition_error_names_both_states() {
        let err = ServiceError::LeavePermitStatus {
            from: "rejected",
            to: "approved",
        };
        assert_eq!(
            err.to_string(),
            "leave permit cannot move from rejected to approved"
        );
    }

    #[test]
    fn app_error_keeps_service_status() {
        let response = AppError::from(ServiceError::SlotConflict).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let response = AppError::from(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
