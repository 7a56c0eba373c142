//! Bill estimation service
//!
//! Orchestrates one calculation: fetch the schedule snapshot from the
//! repository, resolve input defaults, run the engine, log the outcome.
//! Repository failures are fatal here; everything component-level is
//! already handled inside the engine as warnings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::comparison::{ComparisonEntry, RateComparison};
use crate::config::EngineConfig;
use crate::domain::billing::{format_amount, BillBreakdown, RateEngine, UsageContext};
use crate::domain::schedule::ScheduleRepository;
use crate::domain::{DomainError, DomainResult};

/// One estimation request as received from the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub schedule_id: String,
    pub usage_kwh: f64,
    pub demand_kw: f64,
    /// Defaults to the configured billing period length when absent
    #[serde(default)]
    pub billing_days: Option<u32>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub power_factor: Option<f64>,
    pub billing_month: u32,
    /// Explicit kWh per time-of-use period, keyed by component description
    #[serde(default)]
    pub usage_by_period: Option<HashMap<String, f64>>,
}

impl EstimateRequest {
    pub fn new(schedule_id: impl Into<String>, usage_kwh: f64, demand_kw: f64, billing_month: u32) -> Self {
        Self {
            schedule_id: schedule_id.into(),
            usage_kwh,
            demand_kw,
            billing_days: None,
            voltage: None,
            power_factor: None,
            billing_month,
            usage_by_period: None,
        }
    }

    fn usage_context(&self, config: &EngineConfig) -> UsageContext {
        UsageContext {
            usage_kwh: self.usage_kwh,
            demand_kw: self.demand_kw,
            billing_days: self.billing_days.unwrap_or(config.default_billing_days),
            voltage: self.voltage,
            power_factor: self.power_factor,
            billing_month: self.billing_month,
            usage_by_period: self.usage_by_period.clone(),
        }
    }
}

/// An estimated bill for one schedule
#[derive(Debug, Clone, Serialize)]
pub struct BillEstimate {
    pub schedule_id: String,
    pub schedule_name: String,
    pub breakdown: BillBreakdown,
}

/// Service for bill estimation and rate comparison
pub struct EstimationService {
    repository: Arc<dyn ScheduleRepository>,
    engine: RateEngine,
}

impl EstimationService {
    pub fn new(repository: Arc<dyn ScheduleRepository>) -> Self {
        Self::with_config(repository, EngineConfig::default())
    }

    pub fn with_config(repository: Arc<dyn ScheduleRepository>, config: EngineConfig) -> Self {
        Self {
            repository,
            engine: RateEngine::new(config),
        }
    }

    /// Estimate a bill, evaluating applicability as of today
    pub async fn estimate_bill(&self, request: &EstimateRequest) -> DomainResult<BillEstimate> {
        self.estimate_bill_at(request, Utc::now().date_naive()).await
    }

    /// Estimate a bill for an explicit evaluation date
    pub async fn estimate_bill_at(
        &self,
        request: &EstimateRequest,
        evaluation_date: NaiveDate,
    ) -> DomainResult<BillEstimate> {
        let schedule = self
            .repository
            .load_schedule(&request.schedule_id)
            .await?
            .ok_or_else(|| DomainError::ScheduleNotFound(request.schedule_id.clone()))?;

        let usage = request.usage_context(self.engine.config());
        let breakdown = self.engine.estimate(&schedule, &usage, evaluation_date);

        info!(
            "Schedule {} estimated: {} ({} line items, {} warnings)",
            schedule.schedule_id,
            format_amount(breakdown.total),
            breakdown.line_items.len(),
            breakdown.warnings.len()
        );

        Ok(BillEstimate {
            schedule_id: schedule.schedule_id,
            schedule_name: schedule.name,
            breakdown,
        })
    }

    /// Price the same usage scenario against several schedules,
    /// evaluating applicability as of today
    pub async fn compare_schedules(
        &self,
        schedule_ids: &[String],
        usage: &UsageContext,
    ) -> DomainResult<RateComparison> {
        self.compare_schedules_at(schedule_ids, usage, Utc::now().date_naive())
            .await
    }

    /// Comparison variant with an explicit evaluation date
    pub async fn compare_schedules_at(
        &self,
        schedule_ids: &[String],
        usage: &UsageContext,
        evaluation_date: NaiveDate,
    ) -> DomainResult<RateComparison> {
        if schedule_ids.len() < 2 {
            return Err(DomainError::Validation(
                "at least two schedules are required for a comparison".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(schedule_ids.len());
        for schedule_id in schedule_ids {
            let schedule = self
                .repository
                .load_schedule(schedule_id)
                .await?
                .ok_or_else(|| DomainError::ScheduleNotFound(schedule_id.clone()))?;
            let breakdown = self.engine.estimate(&schedule, usage, evaluation_date);
            entries.push(ComparisonEntry::new(
                schedule.schedule_id,
                schedule.name,
                breakdown,
                usage,
                self.engine.config().projection_rate,
            ));
        }

        let comparison = RateComparison::from_entries(entries);
        info!(
            "Compared {} schedules: lowest is {} at {}",
            schedule_ids.len(),
            comparison.entries[comparison.lowest_cost_index].schedule_name,
            format_amount(comparison.entries[comparison.lowest_cost_index].total)
        );
        Ok(comparison)
    }
}

// ── Tests ──────────────────────────────────────────────────────
