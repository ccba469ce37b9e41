//! UUID-backed identifiers for records owned here and references to records
//! owned by the surrounding system (students, teachers, dormitories, ...).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses a caller-supplied identifier; malformed input is a bad request.
            pub fn parse(raw: &str) -> Result<Self, ServiceError> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| ServiceError::bad_request(concat!("invalid ", $label)))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_id!(StudentId, "student id");
uuid_id!(TeacherId, "teacher id");
uuid_id!(DormitoryId, "dormitory id");
uuid_id!(ClassId, "class id");
uuid_id!(SubjectId, "subject id");
uuid_id!(
    /// Staff member performing an action (creator, approver, revoker).
    UserId,
    "user id"
);
uuid_id!(SlotId, "schedule slot id");
uuid_id!(ClassScheduleId, "class schedule id");
uuid_id!(SessionId, "attendance session id");
uuid_id!(StudentAttendanceId, "student attendance id");
uuid_id!(TeacherAttendanceId, "teacher attendance id");
uuid_id!(LeavePermitId, "leave permit id");
uuid_id!(HealthStatusId, "health status id");

/// Parses an optional identifier, treating blank input as absent.
pub fn parse_optional<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Result<T, ServiceError>,
) -> Result<Option<T>, ServiceError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => parse(value).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn malformed_identifier_is_bad_request() {
        let err = SessionId::parse("not-a-uuid").expect_err("rejected");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.to_string().contains("attendance session id"));
    }

    #[test]
    fn parse_accepts_surrounding_whitespace() {
        let id = StudentId::new();
        let parsed = StudentId::parse(&format!("  {id} ")).expect("parses");
        assert_eq!(parsed, id);
    }

    #[test]
    fn blank_optional_is_absent() {
        assert_eq!(parse_optional(Some("  "), TeacherId::parse).expect("ok"), None);
        assert_eq!(parse_optional(None, TeacherId::parse).expect("ok"), None);
    }
}
