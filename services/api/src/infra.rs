use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use school_ops::audit::AuditSink;
use school_ops::store::{MemoryStore, PaginationConfig};
use school_ops::workflows::attendance::{AttendanceService, StatusAuthorityResolver};
use school_ops::workflows::health::HealthStatusService;
use school_ops::workflows::leave::LeavePermitService;
use school_ops::workflows::scheduling::{ClassScheduleService, ScheduleSlotService};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SlotService = ScheduleSlotService<MemoryStore>;
pub(crate) type ScheduleService = ClassScheduleService<MemoryStore, MemoryStore>;
pub(crate) type LeaveService = LeavePermitService<MemoryStore>;
pub(crate) type HealthService = HealthStatusService<MemoryStore>;
pub(crate) type SessionService = AttendanceService<MemoryStore, MemoryStore, MemoryStore>;

/// Every workflow service, wired to one shared store.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) slots: Arc<SlotService>,
    pub(crate) schedules: Arc<ScheduleService>,
    pub(crate) leave: Arc<LeaveService>,
    pub(crate) health: Arc<HealthService>,
    pub(crate) attendance: Arc<SessionService>,
}

impl Services {
    pub(crate) fn in_memory(audit: Arc<dyn AuditSink>, pagination: PaginationConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let resolver = StatusAuthorityResolver::standard(store.clone(), store.clone());

        Self {
            slots: Arc::new(
                ScheduleSlotService::new(store.clone(), audit.clone()).with_pagination(pagination),
            ),
            schedules: Arc::new(
                ClassScheduleService::new(store.clone(), store.clone(), audit.clone())
                    .with_pagination(pagination),
            ),
            leave: Arc::new(
                LeavePermitService::new(store.clone(), audit.clone()).with_pagination(pagination),
            ),
            health: Arc::new(
                HealthStatusService::new(store.clone(), audit.clone())
                    .with_pagination(pagination),
            ),
            attendance: Arc::new(
                AttendanceService::new(store.clone(), store.clone(), store, resolver, audit)
                    .with_pagination(pagination),
            ),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
