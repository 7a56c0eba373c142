//! Schedule repository interface

use async_trait::async_trait;

use super::model::{RateSchedule, ScheduleSummary};
use crate::domain::DomainResult;

/// Read-side access to rate schedules.
///
/// The engine treats whatever this returns as an immutable snapshot for the
/// lifetime of one calculation. Fetch failures are fatal to the calculation
/// that needed them; there is no partial bill.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Load a schedule with its full component set
    async fn load_schedule(&self, schedule_id: &str) -> DomainResult<Option<RateSchedule>>;

    /// List all known schedules for browsing
    async fn list_schedules(&self) -> DomainResult<Vec<ScheduleSummary>>;
}
