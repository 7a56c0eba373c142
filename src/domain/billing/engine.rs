//! Bill assembly
//!
//! Single-pass, stateless pipeline: category aggregation, then percentage
//! charges, then taxes, then the assembled breakdown. Amounts stay
//! unrounded all the way through; rounding is the caller's presentation
//! step.

use chrono::NaiveDate;

use super::model::{BillBreakdown, CategoryTotals, EstimateWarning, LineItem, UsageContext};
use super::{basis, categories};
use crate::config::EngineConfig;
use crate::domain::schedule::RateSchedule;

/// The rate schedule evaluation engine.
///
/// A pure function of `(schedule, usage, evaluation date)`: it reads no
/// clock, holds no state between calls, and identical inputs produce
/// identical output. Distinct invocations are safe to run in parallel.
#[derive(Debug, Clone, Default)]
pub struct RateEngine {
    config: EngineConfig,
}

impl RateEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate one schedule against one usage scenario.
    ///
    /// Component-level data problems never abort the bill; they surface in
    /// `warnings` and the affected component contributes zero.
    pub fn estimate(
        &self,
        schedule: &RateSchedule,
        usage: &UsageContext,
        evaluation_date: NaiveDate,
    ) -> BillBreakdown {
        let mut warnings = Vec::new();

        if usage.usage_kwh <= 0.0 {
            warnings.push(EstimateWarning::NonPositiveUsage {
                usage_kwh: usage.usage_kwh,
            });
        }
        if usage.voltage.is_some()
            && !schedule.components.iter().any(|c| c.has_voltage_bounds())
        {
            warnings.push(EstimateWarning::VoltageUnused);
        }

        let power_factor = usage
            .power_factor
            .unwrap_or(self.config.default_power_factor);

        let service = categories::service_charges(schedule, usage, evaluation_date, &mut warnings);
        let energy = categories::energy_charges(schedule, usage, evaluation_date, &mut warnings);
        let demand = categories::demand_charges(
            schedule,
            usage,
            evaluation_date,
            power_factor,
            &mut warnings,
        );
        let other = categories::other_charges(schedule, usage, evaluation_date, &mut warnings);

        let mut totals = CategoryTotals {
            service: service.total,
            energy: energy.total,
            demand: demand.total,
            other: other.total,
            percentage: 0.0,
            tax: 0.0,
        };
        let subtotal = totals.subtotal();

        let percentage =
            basis::percentage_charges(schedule, usage, evaluation_date, &totals, &mut warnings);
        totals.percentage = percentage.total;

        let (tax, used_default_tax) = basis::tax_charges(
            schedule,
            usage,
            evaluation_date,
            &totals,
            percentage.total,
            self.config.default_tax_rate,
            &mut warnings,
        );
        totals.tax = tax.total;

        let total = subtotal + percentage.total + tax.total;

        let mut line_items = Vec::new();
        line_items.extend(service.items);
        line_items.extend(energy.items);
        line_items.extend(demand.items);
        line_items.extend(other.items);
        line_items.push(LineItem::new("Subtotal", subtotal));
        line_items.extend(percentage.items);
        line_items.extend(tax.items);
        line_items.push(LineItem::new("Total", total));

        BillBreakdown {
            line_items,
            totals,
            subtotal,
            total,
            warnings,
            used_default_tax,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
