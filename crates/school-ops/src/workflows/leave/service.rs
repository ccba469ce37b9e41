use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::domain::{
    LeavePermit, LeavePermitFilter, LeavePermitRequest, LeavePermitStatus, LeaveType,
};
use super::repository::LeavePermitRepository;
use crate::audit::{self, AuditEntry, AuditSink};
use crate::error::ServiceError;
use crate::store::{Page, PageRequest, PaginationConfig, RepositoryError};
use crate::workflows::calendar::parse_date;
use crate::workflows::ids::{LeavePermitId, StudentId, UserId};

const AUDIT_RESOURCE: &str = "leave_permit";

/// Leave permit intake and approval workflow.
pub struct LeavePermitService<L> {
    repository: Arc<L>,
    audit: Arc<dyn AuditSink>,
    pagination: PaginationConfig,
}

impl<L> LeavePermitService<L>
where
    L: LeavePermitRepository + 'static,
{
    pub fn new(repository: Arc<L>, audit: Arc<dyn AuditSink>) -> Self {
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

    /// Overlap validator: permits of any status block the range.
    pub fn has_overlap(
        &self,
        student_id: StudentId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<LeavePermitId>,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .repository
            .has_overlap(student_id, start, end, exclude)?)
    }

    pub fn create(&self, request: LeavePermitRequest) -> Result<LeavePermit, ServiceError> {
        let student_id = StudentId::parse(&request.student_id)?;
        let leave_type: LeaveType = request.leave_type.parse()?;
        let created_by = UserId::parse(&request.created_by)?;
        let start_date = parse_date(&request.start_date)?;
        let end_date = parse_date(&request.end_date)?;

        if end_date < start_date {
            return Err(ServiceError::bad_request(
                "end_date must not be before start_date",
            ));
        }

        if self.has_overlap(student_id, start_date, end_date, None)? {
            return Err(ServiceError::LeavePermitConflict);
        }

        let now = Utc::now();
        let permit = LeavePermit {
            id: LeavePermitId::new(),
            student_id,
            leave_type,
            reason: request.reason.trim().to_string(),
            start_date,
            end_date,
            status: LeavePermitStatus::Pending,
            created_by,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.insert(permit)?;
        info!(
            permit_id = %created.id,
            student_id = %created.student_id,
            "leave permit requested"
        );
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "create", created.id)
                .with("student_id", created.student_id)
                .with("start_date", created.start_date)
                .with("end_date", created.end_date),
        );

        Ok(created)
    }

    pub fn approve(
        &self,
        id: LeavePermitId,
        approver: UserId,
    ) -> Result<LeavePermit, ServiceError> {
        self.transition(id, LeavePermitStatus::Approved, Some(approver))
    }

    pub fn reject(
        &self,
        id: LeavePermitId,
        approver: UserId,
    ) -> Result<LeavePermit, ServiceError> {
        self.transition(id, LeavePermitStatus::Rejected, Some(approver))
    }

    pub fn complete(&self, id: LeavePermitId) -> Result<LeavePermit, ServiceError> {
        self.transition(id, LeavePermitStatus::Completed, None)
    }

    fn transition(
        &self,
        id: LeavePermitId,
        next: LeavePermitStatus,
        approver: Option<UserId>,
    ) -> Result<LeavePermit, ServiceError> {
        let mut permit = self.get(id)?;
        let from = permit.status;

        if !from.can_transition_to(next) {
            return Err(ServiceError::LeavePermitStatus {
                from: from.label(),
                to: next.label(),
            });
        }

        if next == LeavePermitStatus::Approved
            && self.has_overlap(permit.student_id, permit.start_date, permit.end_date, Some(id))?
        {
            return Err(ServiceError::LeavePermitConflict);
        }

        let now = Utc::now();
        if let Some(approver) = approver {
            permit.approved_by = Some(approver);
            permit.approved_at = Some(now);
        }
        permit.status = next;
        permit.updated_at = now;

        let updated = self.repository.update(permit).map_err(|err| match err {
            RepositoryError::NotFound => ServiceError::LeavePermitNotFound,
            other => other.into(),
        })?;

        info!(
            permit_id = %id,
            from = from.label(),
            to = next.label(),
            "leave permit transitioned"
        );
        let mut entry = AuditEntry::new(AUDIT_RESOURCE, next.label(), id).with("from", from);
        if let Some(approver) = approver {
            entry = entry.with("approved_by", approver);
        }
        audit::record(self.audit.as_ref(), entry);

        Ok(updated)
    }

    pub fn get(&self, id: LeavePermitId) -> Result<LeavePermit, ServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(ServiceError::LeavePermitNotFound)
    }

    pub fn list(
        &self,
        filter: &LeavePermitFilter,
        page: PageRequest,
    ) -> Result<Page<LeavePermit>, ServiceError> {
        let pagination = page.normalize(&self.pagination);
        Ok(self.repository.list(filter, pagination)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::store::MemoryStore;

    fn service() -> (LeavePermitService<MemoryStore>, Arc<MemoryAuditSink>) {
        let audit = Arc::new(MemoryAuditSink::default());
        let service = LeavePermitService::new(Arc::new(MemoryStore::new()), audit.clone());
        (service, audit)
    }

    fn request(student: StudentId, start: &str, end: &str) -> LeavePermitRequest {
        LeavePermitRequest {
            student_id: student.to_string(),
            leave_type: "official_duty".to_string(),
            reason: " Regional olympiad ".to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            created_by: UserId::new().to_string(),
        }
    }

    #[test]
    fn create_starts_pending() {
        let (service, audit) = service();
        let permit = service
            .create(request(StudentId::new(), "2025-11-01", "2025-11-02"))
            .expect("created");

        assert_eq!(permit.status, LeavePermitStatus::Pending);
        assert_eq!(permit.leave_type, LeaveType::OfficialDuty);
        assert_eq!(permit.reason, "Regional olympiad");
        assert_eq!(audit.actions(), vec![("leave_permit", "create")]);
    }

    #[test]
    fn overlapping_requests_conflict_whatever_the_status() {
        let (service, _) = service();
        let student = StudentId::new();
        let rejected = service
            .create(request(student, "2025-11-01", "2025-11-02"))
            .expect("first");
        service
            .reject(rejected.id, UserId::new())
            .expect("rejected");

        let err = service
            .create(request(student, "2025-11-02", "2025-11-05"))
            .expect_err("shares 2025-11-02");
        assert!(matches!(err, ServiceError::LeavePermitConflict));

        service
            .create(request(student, "2025-11-03", "2025-11-05"))
            .expect("adjacent range");
        service
            .create(request(StudentId::new(), "2025-11-01", "2025-11-02"))
            .expect("other student");
    }

    #[test]
    fn single_day_and_inverted_ranges() {
        let (service, _) = service();
        service
            .create(request(StudentId::new(), "2025-11-01", "2025-11-01"))
            .expect("single day");

        let err = service
            .create(request(StudentId::new(), "2025-11-02", "2025-11-01"))
            .expect_err("inverted");
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let mut bad_type = request(StudentId::new(), "2025-11-01", "2025-11-01");
        bad_type.leave_type = "vacation".to_string();
        assert!(matches!(
            service.create(bad_type),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn workflow_edges_are_enforced() {
        let (service, audit) = service();
        let approver = UserId::new();
        let permit = service
            .create(request(StudentId::new(), "2025-11-01", "2025-11-02"))
            .expect("created");

        let err = service.complete(permit.id).expect_err("pending cannot complete");
        assert!(matches!(
            err,
            ServiceError::LeavePermitStatus {
                from: "pending",
                to: "completed"
            }
        ));

        let approved = service.approve(permit.id, approver).expect("approved");
        assert_eq!(approved.approved_by, Some(approver));
        assert!(approved.approved_at.is_some());

        let err = service
            .reject(permit.id, approver)
            .expect_err("approved cannot be rejected");
        assert!(matches!(err, ServiceError::LeavePermitStatus { .. }));

        let completed = service.complete(permit.id).expect("completed");
        assert_eq!(completed.status, LeavePermitStatus::Completed);

        assert_eq!(
            audit.actions(),
            vec![
                ("leave_permit", "create"),
                ("leave_permit", "approved"),
                ("leave_permit", "completed"),
            ]
        );
    }

    #[test]
    fn unknown_permit_is_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.approve(LeavePermitId::new(), UserId::new()),
            Err(ServiceError::LeavePermitNotFound)
        ));
    }
}
