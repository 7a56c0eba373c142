//! Rate comparison results
//!
//! Pricing the same usage scenario against several schedules, with the
//! simple ranking and savings figures the estimation product reports
//! alongside the per-schedule breakdowns.

use serde::Serialize;

use crate::domain::billing::{BillBreakdown, UsageContext};

/// One schedule's result within a comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub schedule_id: String,
    pub schedule_name: String,
    pub total: f64,
    /// Total grown by the configured projection rate
    pub projected_total: f64,
    /// Effective $/kWh, when usage is non-zero
    pub cost_per_kwh: Option<f64>,
    /// Effective $/kW of demand, when demand is non-zero
    pub cost_per_kw: Option<f64>,
    pub breakdown: BillBreakdown,
}

impl ComparisonEntry {
    pub(crate) fn new(
        schedule_id: String,
        schedule_name: String,
        breakdown: BillBreakdown,
        usage: &UsageContext,
        projection_rate: f64,
    ) -> Self {
        let total = breakdown.total;
        Self {
            schedule_id,
            schedule_name,
            total,
            projected_total: total * (1.0 + projection_rate),
            cost_per_kwh: (usage.usage_kwh > 0.0).then(|| total / usage.usage_kwh),
            cost_per_kw: (usage.demand_kw > 0.0).then(|| total / usage.demand_kw),
            breakdown,
        }
    }
}

/// Ranked comparison across two or more schedules
#[derive(Debug, Clone, Serialize)]
pub struct RateComparison {
    pub entries: Vec<ComparisonEntry>,
    pub lowest_cost_index: usize,
    pub highest_cost_index: usize,
    pub average_cost: f64,
    /// Monthly saving of the lowest-cost option over the highest
    pub potential_monthly_savings: f64,
    pub potential_annual_savings: f64,
}

impl RateComparison {
    /// Rank entries by total. Callers guarantee at least one entry.
    pub(crate) fn from_entries(entries: Vec<ComparisonEntry>) -> Self {
        debug_assert!(!entries.is_empty());
        let lowest_cost_index = entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total.total_cmp(&b.total))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let highest_cost_index = entries
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total.total_cmp(&b.total))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let average_cost =
            entries.iter().map(|e| e.total).sum::<f64>() / entries.len() as f64;
        let potential_monthly_savings =
            entries[highest_cost_index].total - entries[lowest_cost_index].total;

        Self {
            entries,
            lowest_cost_index,
            highest_cost_index,
            average_cost,
            potential_monthly_savings,
            potential_annual_savings: potential_monthly_savings * 12.0,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
