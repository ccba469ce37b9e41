use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    HealthStatus, HealthStatusChanges, HealthStatusFilter, HealthStatusRequest, HealthStatusState,
};
use super::repository::HealthStatusRepository;
use crate::audit::{self, AuditEntry, AuditSink};
use crate::error::ServiceError;
use crate::store::{Page, PageRequest, PaginationConfig, RepositoryError};
use crate::workflows::calendar::parse_date;
use crate::workflows::ids::{HealthStatusId, StudentId, UserId};

const AUDIT_RESOURCE: &str = "health_status";

/// Medical exemption records.
pub struct HealthStatusService<H> {
    repository: Arc<H>,
    audit: Arc<dyn AuditSink>,
    pagination: PaginationConfig,
}

impl<H> HealthStatusService<H>
where
    H: HealthStatusRepository + 'static,
{
    pub fn new(repository: Arc<H>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            repository,
            audit,
            pagination: PaginationConfig::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn create(&self, request: HealthStatusRequest) -> Result<HealthStatus, ServiceError> {
        let student_id = StudentId::parse(&request.student_id)?;
        let created_by = UserId::parse(&request.created_by)?;
        let start_date = parse_date(&request.start_date)?;
        let end_date = optional_date(request.end_date.as_deref())?;
        let diagnosis = request.diagnosis.trim();

        if diagnosis.is_empty() {
            return Err(ServiceError::bad_request("diagnosis is required"));
        }
        if end_date.is_some_and(|end| end < start_date) {
            return Err(ServiceError::bad_request(
                "end_date must not be before start_date",
            ));
        }

        let existing = match self.repository.active_on(student_id, start_date) {
            Ok(record) => record,
            Err(RepositoryError::NotFound) => None,
            Err(err) => return Err(err.into()),
        };
        if existing.is_some() {
            return Err(ServiceError::HealthStatusActive);
        }

        let now = Utc::now();
        let record = HealthStatus {
            id: HealthStatusId::new(),
            student_id,
            diagnosis: diagnosis.to_string(),
            notes: request.notes.trim().to_string(),
            start_date,
            end_date,
            status: HealthStatusState::Active,
            created_by,
            revoked_by: None,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.insert(record)?;
        info!(
            health_id = %created.id,
            student_id = %created.student_id,
            "health status recorded"
        );
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "create", created.id)
                .with("student_id", created.student_id)
                .with("start_date", created.start_date),
        );

        Ok(created)
    }

    pub fn update(
        &self,
        id: HealthStatusId,
        changes: HealthStatusChanges,
    ) -> Result<HealthStatus, ServiceError> {
        let mut record = self.active(id)?;

        if let Some(diagnosis) = changes.diagnosis {
            let diagnosis = diagnosis.trim();
            if diagnosis.is_empty() {
                return Err(ServiceError::bad_request("diagnosis is required"));
            }
            record.diagnosis = diagnosis.to_string();
        }
        if let Some(notes) = changes.notes {
            record.notes = notes.trim().to_string();
        }
        if let Some(raw) = changes.end_date {
            let end_date = optional_date(Some(&raw))?;
            if end_date.is_some_and(|end| end < record.start_date) {
                return Err(ServiceError::bad_request(
                    "end_date must not be before start_date",
                ));
            }
            record.end_date = end_date;
        }
        record.updated_at = Utc::now();

        let updated = self.store(record)?;
        info!(health_id = %id, "health status updated");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "update", id),
        );
        Ok(updated)
    }

    pub fn revoke(
        &self,
        id: HealthStatusId,
        revoker: UserId,
    ) -> Result<HealthStatus, ServiceError> {
        let mut record = self.active(id)?;
        let now = Utc::now();
        record.status = HealthStatusState::Revoked;
        record.revoked_by = Some(revoker);
        record.revoked_at = Some(now);
        record.updated_at = now;

        let updated = self.store(record)?;
        info!(health_id = %id, "health status revoked");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "revoke", id).with("revoked_by", revoker),
        );
        Ok(updated)
    }

    pub fn get(&self, id: HealthStatusId) -> Result<HealthStatus, ServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(ServiceError::HealthStatusNotFound)
    }

    pub fn list(
        &self,
        filter: &HealthStatusFilter,
        page: PageRequest,
    ) -> Result<Page<HealthStatus>, ServiceError> {
        let pagination = page.normalize(&self.pagination);
        Ok(self.repository.list(filter, pagination)?)
    }

    fn active(&self, id: HealthStatusId) -> Result<HealthStatus, ServiceError> {
        let record = self.get(id)?;
        if !record.is_active() {
            return Err(ServiceError::HealthStatusForbidden);
        }
        Ok(record)
    }

    fn store(&self, record: HealthStatus) -> Result<HealthStatus, ServiceError> {
        self.repository.update(record).map_err(|err| match err {
            RepositoryError::NotFound => ServiceError::HealthStatusNotFound,
            other => other.into(),
        })
    }
}

/// Blank input clears the end date.
fn optional_date(raw: Option<&str>) -> Result<Option<chrono::NaiveDate>, ServiceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}
