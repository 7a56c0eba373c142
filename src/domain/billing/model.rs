//! Usage scenario input and bill breakdown output

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::schedule::ChargeCategory;

/// One billing scenario to price a schedule against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageContext {
    /// Metered energy for the billing period, kWh
    pub usage_kwh: f64,
    /// Peak demand for the billing period, kW
    pub demand_kw: f64,
    pub billing_days: u32,
    /// Service voltage in kV, when known
    pub voltage: Option<f64>,
    /// Metered power factor; the engine default applies when absent
    pub power_factor: Option<f64>,
    /// Month the bill covers, 1-12; drives season applicability
    pub billing_month: u32,
    /// Explicit kWh per time-of-use period, keyed by component description.
    /// When present it is used verbatim instead of automatic distribution.
    pub usage_by_period: Option<HashMap<String, f64>>,
}

impl UsageContext {
    pub fn new(usage_kwh: f64, demand_kw: f64, billing_month: u32) -> Self {
        Self {
            usage_kwh,
            demand_kw,
            billing_days: 30,
            voltage: None,
            power_factor: None,
            billing_month,
            usage_by_period: None,
        }
    }
}

/// One line of the itemized bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// Per-category totals of one bill
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub service: f64,
    pub energy: f64,
    pub demand: f64,
    pub other: f64,
    pub percentage: f64,
    pub tax: f64,
}

impl CategoryTotals {
    /// Sum of the four charge categories, before percentages and taxes
    pub fn subtotal(&self) -> f64 {
        self.service + self.energy + self.demand + self.other
    }
}

/// Non-fatal data or input problems encountered during one calculation.
///
/// Warnings never abort a bill; the affected component simply contributes
/// zero, or the questionable input is carried through as given.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimateWarning {
    /// A component row lacked a usable rate and was skipped
    MalformedComponent {
        category: ChargeCategory,
        description: String,
    },
    /// The explicit time-of-use breakdown does not sum to the declared usage
    TouAllocationMismatch { declared: f64, allocated: f64 },
    /// A service voltage was supplied but no component constrains voltage
    VoltageUnused,
    /// Usage was zero or negative
    NonPositiveUsage { usage_kwh: f64 },
    /// A time-of-use window could not be parsed; a full day was assumed
    UnparsableTimeWindow { description: String },
}

impl std::fmt::Display for EstimateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedComponent {
                category,
                description,
            } => write!(
                f,
                "{} component \"{}\" has no usable rate and was skipped",
                category, description
            ),
            Self::TouAllocationMismatch {
                declared,
                allocated,
            } => write!(
                f,
                "time-of-use breakdown sums to {:.3} kWh but {:.3} kWh was declared",
                allocated, declared
            ),
            Self::VoltageUnused => {
                write!(f, "a service voltage was supplied but no component uses it")
            }
            Self::NonPositiveUsage { usage_kwh } => {
                write!(f, "usage of {} kWh is zero or negative", usage_kwh)
            }
            Self::UnparsableTimeWindow { description } => write!(
                f,
                "time window of \"{}\" could not be parsed; assuming all hours",
                description
            ),
        }
    }
}

/// The estimated bill: ordered line items, category totals and grand total.
///
/// Amounts are unrounded accumulation results; rounding to currency
/// precision is a presentation concern, see [`BillBreakdown::rounded`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillBreakdown {
    pub line_items: Vec<LineItem>,
    pub totals: CategoryTotals,
    pub subtotal: f64,
    pub total: f64,
    pub warnings: Vec<EstimateWarning>,
    /// The schedule carried no tax components and the configured default
    /// rate was applied instead
    pub used_default_tax: bool,
}

impl BillBreakdown {
    /// Copy with every monetary amount rounded to cents, for display
    pub fn rounded(&self) -> BillBreakdown {
        BillBreakdown {
            line_items: self
                .line_items
                .iter()
                .map(|item| LineItem::new(item.description.clone(), round_currency(item.amount)))
                .collect(),
            totals: CategoryTotals {
                service: round_currency(self.totals.service),
                energy: round_currency(self.totals.energy),
                demand: round_currency(self.totals.demand),
                other: round_currency(self.totals.other),
                percentage: round_currency(self.totals.percentage),
                tax: round_currency(self.totals.tax),
            },
            subtotal: round_currency(self.subtotal),
            total: round_currency(self.total),
            warnings: self.warnings.clone(),
            used_default_tax: self.used_default_tax,
        }
    }
}

/// Round to cents, half away from zero
pub fn round_currency(amount: f64) -> f64 {
    Decimal::from_f64_retain(amount)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(amount)
}

/// Format an amount as a dollar string, e.g. `$127.20`
pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", round_currency(amount))
}

// ── Tests ──────────────────────────────────────────────────────
