//! Percentage and tax resolution
//!
//! A deliberately ordered two-phase pipeline: percentage charges are
//! computed against the already-final category totals, then taxes are
//! computed with the percentage total available as part of their `all`
//! basis. Percentages never see tax amounts; taxes do see percentage
//! amounts. That asymmetry is a billing rule, not an accident of ordering.

use chrono::NaiveDate;

use super::applicability::applicable;
use super::categories::{rate_or_warn, CategoryCharges};
use super::model::{CategoryTotals, EstimateWarning, LineItem, UsageContext};
use crate::domain::schedule::{ChargeCategory, PercentageBasis, RateSchedule};

fn base_amount(
    basis: PercentageBasis,
    totals: &CategoryTotals,
    percentage_total: f64,
    all_includes_percentages: bool,
) -> f64 {
    match basis {
        PercentageBasis::EnergyOnly => totals.energy,
        PercentageBasis::DemandOnly => totals.demand,
        PercentageBasis::ServiceOnly => totals.service,
        PercentageBasis::Subtotal => totals.subtotal(),
        PercentageBasis::All => {
            if all_includes_percentages {
                totals.subtotal() + percentage_total
            } else {
                totals.subtotal()
            }
        }
    }
}

/// Percentage-based charges against the charge-category totals
pub(crate) fn percentage_charges(
    schedule: &RateSchedule,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    totals: &CategoryTotals,
    warnings: &mut Vec<EstimateWarning>,
) -> CategoryCharges {
    let mut charges = CategoryCharges::default();
    for component in applicable(
        schedule.in_category(ChargeCategory::Percentage),
        usage,
        evaluation_date,
    ) {
        let Some(rate) = rate_or_warn(component, warnings) else {
            continue;
        };
        let basis = component.basis.unwrap_or(PercentageBasis::All);
        let base = base_amount(basis, totals, 0.0, false);
        charges.push(LineItem::new(
            format!("{} ({}%)", component.description, rate),
            (rate / 100.0) * base,
        ));
    }
    charges
}

/// Taxes, resolved after percentages.
///
/// A schedule that defines no tax components at all gets the configured
/// default rate against the subtotal, flagged through the returned bool.
/// Tax components that exist but fail applicability yield an explicit zero
/// with no fallback.
pub(crate) fn tax_charges(
    schedule: &RateSchedule,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    totals: &CategoryTotals,
    percentage_total: f64,
    default_tax_rate: f64,
    warnings: &mut Vec<EstimateWarning>,
) -> (CategoryCharges, bool) {
    let mut charges = CategoryCharges::default();

    if !schedule.has_any(ChargeCategory::Tax) {
        charges.push(LineItem::new(
            format!("Default Tax Rate ({}%)", default_tax_rate),
            (default_tax_rate / 100.0) * totals.subtotal(),
        ));
        return (charges, true);
    }

    for component in applicable(
        schedule.in_category(ChargeCategory::Tax),
        usage,
        evaluation_date,
    ) {
        let Some(rate) = rate_or_warn(component, warnings) else {
            continue;
        };
        let basis = component.basis.unwrap_or(PercentageBasis::All);
        let base = base_amount(basis, totals, percentage_total, true);
        charges.push(LineItem::new(
            format!("{} ({}%)", component.description, rate),
            (rate / 100.0) * base,
        ));
    }
    (charges, false)
}

// ── Tests ──────────────────────────────────────────────────────
