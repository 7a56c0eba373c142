//! Category aggregators
//!
//! One aggregator per bill category. Energy and Demand share a single
//! metered aggregator discriminated by component kind: tiered structures
//! take precedence over time-of-use, which takes precedence over flat
//! rates when it produces a non-zero charge.

use chrono::NaiveDate;

use super::applicability::applicable;
use super::model::{EstimateWarning, LineItem, UsageContext};
use super::{tiers, tou};
use crate::domain::schedule::{ChargeCategory, ChargeUnit, RateComponent, RateKind, RateSchedule};

/// One category's contribution to the bill
#[derive(Debug, Default)]
pub(crate) struct CategoryCharges {
    pub total: f64,
    pub items: Vec<LineItem>,
}

impl CategoryCharges {
    pub(crate) fn push(&mut self, item: LineItem) {
        self.total += item.amount;
        self.items.push(item);
    }
}

/// Unit labels for metered (energy/demand) line items
struct MeterUnits {
    quantity: &'static str,
    rate: &'static str,
    precision: usize,
}

const ENERGY_UNITS: MeterUnits = MeterUnits {
    quantity: "kWh",
    rate: "$/kWh",
    precision: 4,
};

const DEMAND_UNITS: MeterUnits = MeterUnits {
    quantity: "kW",
    rate: "$/kW",
    precision: 2,
};

pub(crate) fn rate_or_warn(
    component: &RateComponent,
    warnings: &mut Vec<EstimateWarning>,
) -> Option<f64> {
    if component.rate.is_none() {
        warnings.push(EstimateWarning::MalformedComponent {
            category: component.category,
            description: component.description.clone(),
        });
    }
    component.rate
}

fn unit_label(component: &RateComponent) -> String {
    match component.charge_unit {
        Some(unit) => format!("{} ({})", component.description, unit),
        None => component.description.clone(),
    }
}

/// Fixed service charges: `per_day` scales by billing days, `per_bill` and
/// `per_month` apply once.
pub(crate) fn service_charges(
    schedule: &RateSchedule,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    warnings: &mut Vec<EstimateWarning>,
) -> CategoryCharges {
    let mut charges = CategoryCharges::default();
    for component in applicable(
        schedule.in_category(ChargeCategory::Service),
        usage,
        evaluation_date,
    ) {
        let Some(rate) = rate_or_warn(component, warnings) else {
            continue;
        };
        let amount = match component.charge_unit {
            Some(ChargeUnit::PerDay) => rate * f64::from(usage.billing_days),
            _ => rate,
        };
        charges.push(LineItem::new(unit_label(component), amount));
    }
    charges
}

pub(crate) fn energy_charges(
    schedule: &RateSchedule,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    warnings: &mut Vec<EstimateWarning>,
) -> CategoryCharges {
    metered_charges(
        schedule,
        ChargeCategory::Energy,
        usage.usage_kwh,
        &ENERGY_UNITS,
        usage.usage_by_period.as_ref(),
        usage,
        evaluation_date,
        warnings,
    )
}

/// Demand charges plus reactive demand.
///
/// Reactive components charge per kVAR derived from real demand and power
/// factor, and are added on top of the metered demand total rather than
/// replacing it.
pub(crate) fn demand_charges(
    schedule: &RateSchedule,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    power_factor: f64,
    warnings: &mut Vec<EstimateWarning>,
) -> CategoryCharges {
    let mut charges = metered_charges(
        schedule,
        ChargeCategory::Demand,
        usage.demand_kw,
        &DEMAND_UNITS,
        None,
        usage,
        evaluation_date,
        warnings,
    );

    let reactive = applicable(
        schedule.of_kind(ChargeCategory::Demand, RateKind::Reactive),
        usage,
        evaluation_date,
    );
    if !reactive.is_empty() && usage.demand_kw > 0.0 {
        let pf = power_factor.clamp(0.0, 1.0);
        let kvar = usage.demand_kw * pf.acos().tan();
        for component in reactive {
            let Some(rate) = rate_or_warn(component, warnings) else {
                continue;
            };
            charges.push(LineItem::new(
                format!(
                    "{} ({:.2} $/kVAR, PF={:.2})",
                    component.description, rate, pf
                ),
                rate * kvar,
            ));
        }
    }

    charges
}

/// Other charges are unit-dependent: `per_kwh` and `per_kw` scale by the
/// metered quantities, `per_day` by billing days, anything else is flat.
pub(crate) fn other_charges(
    schedule: &RateSchedule,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    warnings: &mut Vec<EstimateWarning>,
) -> CategoryCharges {
    let mut charges = CategoryCharges::default();
    for component in applicable(
        schedule.in_category(ChargeCategory::Other),
        usage,
        evaluation_date,
    ) {
        let Some(rate) = rate_or_warn(component, warnings) else {
            continue;
        };
        let amount = match component.charge_unit {
            Some(ChargeUnit::PerKwh) => rate * usage.usage_kwh,
            Some(ChargeUnit::PerKw) => rate * usage.demand_kw,
            Some(ChargeUnit::PerDay) => rate * f64::from(usage.billing_days),
            _ => rate,
        };
        charges.push(LineItem::new(unit_label(component), amount));
    }
    charges
}

/// Shared energy/demand aggregation over a metered quantity.
#[allow(clippy::too_many_arguments)]
fn metered_charges(
    schedule: &RateSchedule,
    category: ChargeCategory,
    quantity: f64,
    units: &MeterUnits,
    explicit_periods: Option<&std::collections::HashMap<String, f64>>,
    usage: &UsageContext,
    evaluation_date: NaiveDate,
    warnings: &mut Vec<EstimateWarning>,
) -> CategoryCharges {
    // Tiered structures replace flat rates outright
    let tiered = applicable(
        schedule.of_kind(category, RateKind::Tiered),
        usage,
        evaluation_date,
    );
    if !tiered.is_empty() {
        let (total, items) = tiers::accumulate(
            quantity,
            tiered,
            units.quantity,
            units.rate,
            units.precision,
            warnings,
        );
        return CategoryCharges { total, items };
    }

    // Time-of-use replaces flat only when it actually bills something
    let periods = applicable(
        schedule.of_kind(category, RateKind::TimeOfUse),
        usage,
        evaluation_date,
    );
    if !periods.is_empty() {
        let mut charges = CategoryCharges::default();
        for allocation in tou::allocate(quantity, &periods, explicit_periods, warnings) {
            let Some(rate) = rate_or_warn(allocation.component, warnings) else {
                continue;
            };
            charges.push(LineItem::new(
                format!(
                    "{} ({}, {:.prec$} {})",
                    allocation.component.description,
                    allocation.label,
                    rate,
                    units.rate,
                    prec = units.precision
                ),
                rate * allocation.usage,
            ));
        }
        if charges.total > 0.0 {
            return charges;
        }
    }

    let mut charges = CategoryCharges::default();
    for component in applicable(
        schedule.of_kind(category, RateKind::Flat),
        usage,
        evaluation_date,
    ) {
        let Some(rate) = rate_or_warn(component, warnings) else {
            continue;
        };
        charges.push(LineItem::new(
            format!(
                "{} ({:.prec$} {})",
                component.description,
                rate,
                units.rate,
                prec = units.precision
            ),
            rate * quantity,
        ));
    }
    charges
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::RateComponent;

    fn july_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    fn usage() -> UsageContext {
        UsageContext::new(1000.0, 100.0, 7)
    }

    fn schedule_with(components: Vec<RateComponent>) -> RateSchedule {
        let mut schedule = RateSchedule::new("S1", "Test Schedule");
        for c in components {
            schedule.push(c);
        }
        schedule
    }

    #[test]
    fn service_charge_units() {
        let mut per_day =
            RateComponent::new(ChargeCategory::Service, RateKind::Flat, "Meter Fee", 0.50);
        per_day.charge_unit = Some(ChargeUnit::PerDay);
        let mut per_bill =
            RateComponent::new(ChargeCategory::Service, RateKind::Flat, "Statement Fee", 2.0);
        per_bill.charge_unit = Some(ChargeUnit::PerBill);
        let monthly =
            RateComponent::new(ChargeCategory::Service, RateKind::Flat, "Customer Charge", 10.0);

        let schedule = schedule_with(vec![per_day, per_bill, monthly]);
        let mut warnings = Vec::new();
        let charges = service_charges(&schedule, &usage(), july_1(), &mut warnings);

        // 0.50 * 30 days + 2.00 + 10.00
        assert!((charges.total - 27.0).abs() < 1e-9);
        assert_eq!(charges.items[0].description, "Meter Fee (per_day)");
        assert_eq!(charges.items[2].description, "Customer Charge");
    }

    #[test]
    fn flat_energy_charge() {
        let schedule = schedule_with(vec![RateComponent::new(
            ChargeCategory::Energy,
            RateKind::Flat,
            "Energy",
            0.12,
        )]);
        let mut warnings = Vec::new();
        let charges = energy_charges(&schedule, &usage(), july_1(), &mut warnings);
        assert!((charges.total - 120.0).abs() < 1e-9);
        assert_eq!(charges.items[0].description, "Energy (0.1200 $/kWh)");
    }

    #[test]
    fn tiered_energy_overrides_flat() {
        let flat = RateComponent::new(ChargeCategory::Energy, RateKind::Flat, "Energy", 0.12);
        let mut tier1 = RateComponent::new(ChargeCategory::Energy, RateKind::Tiered, "Tier 1", 0.10);
        tier1.tier_start = Some(0.0);
        tier1.tier_end = Some(500.0);
        let mut tier2 = RateComponent::new(ChargeCategory::Energy, RateKind::Tiered, "Tier 2", 0.15);
        tier2.tier_start = Some(500.0);

        let schedule = schedule_with(vec![flat, tier1, tier2]);
        let mut warnings = Vec::new();
        let mut u = usage();
        u.usage_kwh = 800.0;
        let charges = energy_charges(&schedule, &u, july_1(), &mut warnings);

        assert!((charges.total - 95.0).abs() < 1e-9);
        assert_eq!(charges.items.len(), 2);
    }

    #[test]
    fn inapplicable_tiers_fall_through_to_flat() {
        let flat = RateComponent::new(ChargeCategory::Energy, RateKind::Flat, "Energy", 0.12);
        let mut winter_tier =
            RateComponent::new(ChargeCategory::Energy, RateKind::Tiered, "Winter Tier", 0.05);
        winter_tier.season = Some("Winter".into());

        let schedule = schedule_with(vec![flat, winter_tier]);
        let mut warnings = Vec::new();
        let charges = energy_charges(&schedule, &usage(), july_1(), &mut warnings);
        assert!((charges.total - 120.0).abs() < 1e-9);
    }

    #[test]
    fn tou_energy_overrides_flat_when_nonzero() {
        let flat = RateComponent::new(ChargeCategory::Energy, RateKind::Flat, "Energy", 0.12);
        let mut off =
            RateComponent::new(ChargeCategory::Energy, RateKind::TimeOfUse, "Off-Peak", 0.08);
        off.start_time = Some("21:00".into());
        off.end_time = Some("13:00".into());
        let mut on = RateComponent::new(ChargeCategory::Energy, RateKind::TimeOfUse, "On-Peak", 0.20);
        on.start_time = Some("13:00".into());
        on.end_time = Some("21:00".into());

        let schedule = schedule_with(vec![flat, off, on]);
        let mut warnings = Vec::new();
        let mut u = usage();
        u.usage_kwh = 900.0;
        let charges = energy_charges(&schedule, &u, july_1(), &mut warnings);

        // 600 kWh @ 0.08 + 300 kWh @ 0.20
        assert!((charges.total - 108.0).abs() < 1e-9);
        assert_eq!(
            charges.items[0].description,
            "Off-Peak (21:00-13:00, 0.0800 $/kWh)"
        );
    }

    #[test]
    fn zero_rate_tou_falls_back_to_flat() {
        let flat = RateComponent::new(ChargeCategory::Energy, RateKind::Flat, "Energy", 0.12);
        let free = RateComponent::new(ChargeCategory::Energy, RateKind::TimeOfUse, "Promo", 0.0);

        let schedule = schedule_with(vec![flat, free]);
        let mut warnings = Vec::new();
        let charges = energy_charges(&schedule, &usage(), july_1(), &mut warnings);
        assert!((charges.total - 120.0).abs() < 1e-9);
    }

    #[test]
    fn reactive_demand_adds_to_flat_demand() {
        let flat = RateComponent::new(ChargeCategory::Demand, RateKind::Flat, "Demand", 12.0);
        let reactive =
            RateComponent::new(ChargeCategory::Demand, RateKind::Reactive, "Reactive Demand", 2.50);

        let schedule = schedule_with(vec![flat, reactive]);
        let mut warnings = Vec::new();
        let charges = demand_charges(&schedule, &usage(), july_1(), 0.9, &mut warnings);

        // 100 kW * 12 + ~48.43 kVAR * 2.50
        let kvar = 100.0 * (0.9_f64.acos()).tan();
        assert!((kvar - 48.4322).abs() < 1e-4);
        assert!((charges.total - (1200.0 + kvar * 2.5)).abs() < 1e-9);
        assert_eq!(
            charges.items[1].description,
            "Reactive Demand (2.50 $/kVAR, PF=0.90)"
        );
    }

    #[test]
    fn reactive_skipped_when_no_demand() {
        let reactive =
            RateComponent::new(ChargeCategory::Demand, RateKind::Reactive, "Reactive Demand", 2.50);
        let schedule = schedule_with(vec![reactive]);
        let mut warnings = Vec::new();
        let mut u = usage();
        u.demand_kw = 0.0;
        let charges = demand_charges(&schedule, &u, july_1(), 0.9, &mut warnings);
        assert_eq!(charges.total, 0.0);
        assert!(charges.items.is_empty());
    }

    #[test]
    fn other_charge_units() {
        let mut per_kwh =
            RateComponent::new(ChargeCategory::Other, RateKind::Flat, "Fuel Adjustment", 0.01);
        per_kwh.charge_unit = Some(ChargeUnit::PerKwh);
        let mut per_kw =
            RateComponent::new(ChargeCategory::Other, RateKind::Flat, "Capacity Rider", 0.25);
        per_kw.charge_unit = Some(ChargeUnit::PerKw);
        let flat = RateComponent::new(ChargeCategory::Other, RateKind::Flat, "Franchise Fee", 3.0);

        let schedule = schedule_with(vec![per_kwh, per_kw, flat]);
        let mut warnings = Vec::new();
        let charges = other_charges(&schedule, &usage(), july_1(), &mut warnings);

        // 0.01 * 1000 + 0.25 * 100 + 3.00
        assert!((charges.total - 38.0).abs() < 1e-9);
    }

    #[test]
    fn missing_rate_component_warns_and_contributes_zero() {
        let mut broken = RateComponent::new(ChargeCategory::Service, RateKind::Flat, "Rider X", 0.0);
        broken.rate = None;
        let schedule = schedule_with(vec![broken]);
        let mut warnings = Vec::new();
        let charges = service_charges(&schedule, &usage(), july_1(), &mut warnings);
        assert_eq!(charges.total, 0.0);
        assert!(charges.items.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
