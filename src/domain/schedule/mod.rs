pub mod model;
pub mod repository;

pub use model::{
    ChargeCategory, ChargeUnit, ComponentRow, PercentageBasis, RateComponent, RateKind,
    RateSchedule, ScheduleSummary, Season,
};
pub use repository::ScheduleRepository;
