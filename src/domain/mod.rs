pub mod billing;
pub mod error;
pub mod schedule;

// Re-export commonly used types
pub use billing::{BillBreakdown, EstimateWarning, LineItem, RateEngine, UsageContext};
pub use error::{DomainError, DomainResult};
pub use schedule::{ChargeCategory, RateComponent, RateKind, RateSchedule, ScheduleRepository};
