//! Time-of-use distribution
//!
//! When a bill has time-of-use rates but the caller only knows aggregate
//! usage, the aggregate is spread across the periods in proportion to the
//! hours each period covers. An explicit per-period breakdown, when
//! supplied, is used verbatim.

use std::collections::HashMap;

use super::model::EstimateWarning;
use crate::domain::schedule::RateComponent;

/// Usage assigned to one time-of-use period
pub(crate) struct PeriodAllocation<'a> {
    pub component: &'a RateComponent,
    /// Window label for line items, e.g. `21:00-05:00` or `all hours`
    pub label: String,
    pub usage: f64,
}

fn parse_hour(time: &str) -> Option<i64> {
    time.split(':').next()?.trim().parse().ok()
}

/// Hours covered by a period's window. Absent times mean the full day;
/// windows crossing midnight wrap.
fn window_hours(component: &RateComponent, warnings: &mut Vec<EstimateWarning>) -> f64 {
    let (Some(start), Some(end)) = (&component.start_time, &component.end_time) else {
        return 24.0;
    };
    let (Some(start_hour), Some(end_hour)) = (parse_hour(start), parse_hour(end)) else {
        warnings.push(EstimateWarning::UnparsableTimeWindow {
            description: component.description.clone(),
        });
        return 24.0;
    };
    let mut hours = end_hour - start_hour;
    if hours <= 0 {
        hours += 24;
    }
    hours as f64
}

fn window_label(component: &RateComponent) -> String {
    match (&component.start_time, &component.end_time) {
        (Some(start), Some(end)) => format!("{}-{}", start, end),
        _ => "all hours".to_string(),
    }
}

/// Allocate `total_usage` across the given periods.
///
/// With an explicit breakdown the allocations are taken verbatim (keyed by
/// component description) and a sum mismatch versus the declared total is
/// reported as a warning, not corrected. Otherwise usage is distributed by
/// window hours; automatic allocations always sum to `total_usage`.
pub(crate) fn allocate<'a>(
    total_usage: f64,
    periods: &[&'a RateComponent],
    explicit: Option<&HashMap<String, f64>>,
    warnings: &mut Vec<EstimateWarning>,
) -> Vec<PeriodAllocation<'a>> {
    if periods.is_empty() {
        return Vec::new();
    }

    if let Some(breakdown) = explicit {
        let allocations: Vec<PeriodAllocation<'a>> = periods
            .iter()
            .copied()
            .map(|p| PeriodAllocation {
                component: p,
                label: window_label(p),
                usage: breakdown.get(&p.description).copied().unwrap_or(0.0),
            })
            .collect();
        let allocated: f64 = allocations.iter().map(|a| a.usage).sum();
        if (allocated - total_usage).abs() > 1e-6 {
            warnings.push(EstimateWarning::TouAllocationMismatch {
                declared: total_usage,
                allocated,
            });
        }
        return allocations;
    }

    let hours: Vec<f64> = periods
        .iter()
        .map(|p| window_hours(p, warnings))
        .collect();
    let total_hours: f64 = hours.iter().sum();
    if total_hours <= 0.0 {
        return vec![PeriodAllocation {
            component: periods[0],
            label: "All Hours".to_string(),
            usage: total_usage,
        }];
    }

    periods
        .iter()
        .copied()
        .zip(hours)
        .map(|(p, h)| PeriodAllocation {
            component: p,
            label: window_label(p),
            usage: total_usage * h / total_hours,
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────
