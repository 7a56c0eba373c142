//! Applicability filtering
//!
//! A component is in effect only when every constraint it defines passes;
//! an unset attribute is no constraint on that axis.

use chrono::NaiveDate;

use super::model::UsageContext;
use crate::domain::schedule::{RateComponent, Season};

/// Whether one component is in effect for this usage context and date
pub fn is_applicable(
    component: &RateComponent,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
) -> bool {
    // Filed-but-not-yet-active components never bill
    if component.pending {
        return false;
    }

    if let (Some(min_kv), Some(max_kv), Some(voltage)) = (
        component.min_voltage,
        component.max_voltage,
        usage.voltage,
    ) {
        if voltage < min_kv || voltage > max_kv {
            return false;
        }
    }

    if let Some(season) = &component.season {
        if !Season::from_month(usage.billing_month).matches_label(season) {
            return false;
        }
    }

    // Date range is inclusive; one-sided ranges always pass
    if let (Some(start), Some(end)) = (component.start_date, component.end_date) {
        if evaluation_date < start || evaluation_date > end {
            return false;
        }
    }

    true
}

/// Filter to the applicable subset, preserving order
pub(crate) fn applicable<'a, I>(
    components: I,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
) -> Vec<&'a RateComponent>
where
    I: Iterator<Item = &'a RateComponent>,
{
    components
        .filter(|c| is_applicable(c, usage, evaluation_date))
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────
