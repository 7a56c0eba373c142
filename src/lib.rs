//! # EVready Rates
//!
//! Rate schedule evaluation engine for estimating electricity bills.
//!
//! Given a utility rate schedule (a set of conditionally-applicable pricing
//! rules) and a usage scenario (energy, demand, billing period, voltage,
//! power factor), the engine produces an itemized bill breakdown with
//! per-category totals. The calculation is a pure function: no clock access,
//! no shared state, identical inputs give identical output.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, the evaluation engine and
//!   repository traits
//! - **application**: Bill estimation and rate comparison services
//! - **infrastructure**: Storage implementations (in-memory store,
//!   provider-row ingestion)

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::EngineConfig;

// Re-export the engine surface for easy access
pub use domain::billing::{
    BillBreakdown, CategoryTotals, EstimateWarning, LineItem, RateEngine, UsageContext,
};
pub use domain::schedule::{
    ChargeCategory, ChargeUnit, PercentageBasis, RateComponent, RateKind, RateSchedule,
    ScheduleRepository, ScheduleSummary, Season,
};
pub use domain::{DomainError, DomainResult};

// Re-export services
pub use application::services::{
    BillEstimate, ComparisonEntry, EstimateRequest, EstimationService, RateComparison,
};

// Re-export storage
pub use infrastructure::InMemoryScheduleStore;
