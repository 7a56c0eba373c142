//! Rate schedule domain entities
//!
//! A schedule is a utility's named set of pricing rules for a customer
//! class; each rule is one [`RateComponent`]. Upstream rate providers ship
//! these as per-table rows with inconsistent column names (two boundary
//! conventions for tiers, mixed `kV` casings, numbers as strings); the
//! [`ComponentRow`] decoder absorbs that so the rest of the crate only ever
//! sees the normalized component type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which bill category a component charges into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeCategory {
    Service,
    Energy,
    Demand,
    Other,
    Percentage,
    Tax,
}

impl ChargeCategory {
    /// Fallback line-item description for rows shipped without one
    pub fn default_description(self) -> &'static str {
        match self {
            Self::Service => "Service Charge",
            Self::Energy => "Energy Charge",
            Self::Demand => "Demand Charge",
            Self::Other => "Other Charge",
            Self::Percentage => "Percentage Charge",
            Self::Tax => "Tax",
        }
    }
}

impl std::fmt::Display for ChargeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Energy => write!(f, "energy"),
            Self::Demand => write!(f, "demand"),
            Self::Other => write!(f, "other"),
            Self::Percentage => write!(f, "percentage"),
            Self::Tax => write!(f, "tax"),
        }
    }
}

/// How a component's rate is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// Single rate applied to the whole billing quantity
    Flat,
    /// Marginal rate for one usage band of a tiered structure
    Tiered,
    /// Rate for one time period of a time-of-use structure
    TimeOfUse,
    /// Rate per kVAR of reactive demand
    Reactive,
}

/// Billing unit for service and other charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeUnit {
    PerMonth,
    PerDay,
    PerBill,
    PerKwh,
    PerKw,
}

impl ChargeUnit {
    /// Parse a provider label; unknown labels are treated as absent
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "per_month" => Some(Self::PerMonth),
            "per_day" => Some(Self::PerDay),
            "per_bill" => Some(Self::PerBill),
            "per_kwh" => Some(Self::PerKwh),
            "per_kw" => Some(Self::PerKw),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChargeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerMonth => write!(f, "per_month"),
            Self::PerDay => write!(f, "per_day"),
            Self::PerBill => write!(f, "per_bill"),
            Self::PerKwh => write!(f, "per_kwh"),
            Self::PerKw => write!(f, "per_kw"),
        }
    }
}

/// Monetary base a percentage or tax rate is applied against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageBasis {
    EnergyOnly,
    DemandOnly,
    ServiceOnly,
    Subtotal,
    All,
}

impl PercentageBasis {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "energy_only" => Some(Self::EnergyOnly),
            "demand_only" => Some(Self::DemandOnly),
            "service_only" => Some(Self::ServiceOnly),
            "subtotal" => Some(Self::Subtotal),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Billing season derived from the billing month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Mar-May Spring, Jun-Aug Summer, Sep-Nov Fall, Dec-Feb Winter
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            _ => Self::Winter,
        }
    }

    /// Case-insensitive match against a provider season label
    pub fn matches_label(self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(self.name())
    }

    fn name(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
            Self::Winter => "Winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One configured pricing rule of a rate schedule
///
/// `rate` is optional because provider rows sometimes arrive without one;
/// the engine skips such components with a warning rather than failing the
/// whole bill. All other optional attributes mean "no constraint".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateComponent {
    pub description: String,
    pub category: ChargeCategory,
    pub kind: RateKind,
    /// $/kWh, $/kW, $/kVAR, flat $ or percent depending on category and kind
    pub rate: Option<f64>,
    /// Lower usage bound of a tier (kWh or kW)
    pub tier_start: Option<f64>,
    /// Upper usage bound of a tier; `None` means open-ended
    pub tier_end: Option<f64>,
    /// Time-of-use window start, `"HH:MM"`
    pub start_time: Option<String>,
    /// Time-of-use window end, `"HH:MM"`
    pub end_time: Option<String>,
    /// Service voltage lower bound in kV
    pub min_voltage: Option<f64>,
    /// Service voltage upper bound in kV
    pub max_voltage: Option<f64>,
    /// Season label the component is limited to
    pub season: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Filed but not yet in effect; never applicable
    pub pending: bool,
    pub charge_unit: Option<ChargeUnit>,
    /// Basis for percentage and tax components
    pub basis: Option<PercentageBasis>,
}

impl RateComponent {
    pub fn new(
        category: ChargeCategory,
        kind: RateKind,
        description: impl Into<String>,
        rate: f64,
    ) -> Self {
        Self {
            description: description.into(),
            category,
            kind,
            rate: Some(rate),
            tier_start: None,
            tier_end: None,
            start_time: None,
            end_time: None,
            min_voltage: None,
            max_voltage: None,
            season: None,
            start_date: None,
            end_date: None,
            pending: false,
            charge_unit: None,
            basis: None,
        }
    }

    /// Whether the component carries voltage applicability bounds
    pub fn has_voltage_bounds(&self) -> bool {
        self.min_voltage.is_some() && self.max_voltage.is_some()
    }
}

/// A named rate schedule: identifier plus its full component set
///
/// Components are held flat and discriminated by `(category, kind)` rather
/// than per-table collections; the accessors below are the only grouping the
/// engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub schedule_id: String,
    pub name: String,
    pub description: Option<String>,
    pub components: Vec<RateComponent>,
}

impl RateSchedule {
    pub fn new(schedule_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schedule_id: schedule_id.into(),
            name: name.into(),
            description: None,
            components: Vec::new(),
        }
    }

    pub fn push(&mut self, component: RateComponent) {
        self.components.push(component);
    }

    pub fn in_category(&self, category: ChargeCategory) -> impl Iterator<Item = &RateComponent> {
        self.components.iter().filter(move |c| c.category == category)
    }

    pub fn of_kind(
        &self,
        category: ChargeCategory,
        kind: RateKind,
    ) -> impl Iterator<Item = &RateComponent> {
        self.in_category(category).filter(move |c| c.kind == kind)
    }

    pub fn has_any(&self, category: ChargeCategory) -> bool {
        self.in_category(category).next().is_some()
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            schedule_id: self.schedule_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Listing entry for schedule browsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub schedule_id: String,
    pub name: String,
    pub description: Option<String>,
}

// ── Provider row decoding ──────────────────────────────────────

/// Accepts numbers, numeric strings, or null. Strings that do not parse
/// decode to `None` so one bad cell cannot reject the whole row.
fn flexible_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// One raw rate row as shipped by the upstream provider.
///
/// The aliases cover every column-name convention observed in the feed:
/// per-table rate columns (`Rate`, `RatekWh`, `RatekW`, `RatekVAR`,
/// `PercentageRate`, `TaxRate`, `Per_cent`), both tier-bound conventions
/// (`StartkWh`/`EndkWh` and `StepMin`/`StepMax`), and both `kV` casings.
/// Which category and kind a row belongs to is carried by the table it came
/// from, so conversion takes them as arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComponentRow {
    #[serde(alias = "Description", alias = "Type")]
    pub description: Option<String>,
    #[serde(
        alias = "Rate",
        alias = "RatekWh",
        alias = "RatekW",
        alias = "RatekVAR",
        alias = "PercentageRate",
        alias = "TaxRate",
        alias = "Per_cent",
        deserialize_with = "flexible_number"
    )]
    pub rate: Option<f64>,
    #[serde(
        alias = "StartkWh",
        alias = "StartKWh",
        alias = "StepMin",
        deserialize_with = "flexible_number"
    )]
    pub tier_start: Option<f64>,
    #[serde(
        alias = "EndkWh",
        alias = "EndKWh",
        alias = "StepMax",
        deserialize_with = "flexible_number"
    )]
    pub tier_end: Option<f64>,
    #[serde(alias = "StartTime")]
    pub start_time: Option<String>,
    #[serde(alias = "EndTime")]
    pub end_time: Option<String>,
    #[serde(alias = "MinKV", alias = "MinkV", deserialize_with = "flexible_number")]
    pub min_voltage: Option<f64>,
    #[serde(alias = "MaxKV", alias = "MaxkV", deserialize_with = "flexible_number")]
    pub max_voltage: Option<f64>,
    #[serde(alias = "Season")]
    pub season: Option<String>,
    #[serde(alias = "StartDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "EndDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(alias = "Pending")]
    pub pending: bool,
    #[serde(alias = "ChargeUnit")]
    pub charge_unit: Option<String>,
    #[serde(alias = "Basis")]
    pub basis: Option<String>,
    #[serde(alias = "City")]
    pub city: Option<String>,
}

impl ComponentRow {
    /// Normalize into a [`RateComponent`] for the given table position
    pub fn into_component(self, category: ChargeCategory, kind: RateKind) -> RateComponent {
        let mut description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| category.default_description().to_string());
        if let Some(city) = self.city.filter(|c| !c.trim().is_empty()) {
            description = format!("{} ({})", description, city);
        }

        RateComponent {
            description,
            category,
            kind,
            rate: self.rate,
            tier_start: self.tier_start,
            tier_end: self.tier_end,
            start_time: self.start_time.filter(|t| !t.trim().is_empty()),
            end_time: self.end_time.filter(|t| !t.trim().is_empty()),
            min_voltage: self.min_voltage,
            max_voltage: self.max_voltage,
            season: self.season.filter(|s| !s.trim().is_empty()),
            start_date: self.start_date,
            end_date: self.end_date,
            pending: self.pending,
            charge_unit: self.charge_unit.as_deref().and_then(ChargeUnit::from_label),
            basis: self.basis.as_deref().and_then(PercentageBasis::from_label),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_from_month() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Fall);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
    }

    #[test]
    fn season_label_match_is_case_insensitive() {
        assert!(Season::Summer.matches_label("SUMMER"));
        assert!(Season::Summer.matches_label(" summer "));
        assert!(!Season::Summer.matches_label("winter"));
    }

    #[test]
    fn charge_unit_labels() {
        assert_eq!(ChargeUnit::from_label("per_day"), Some(ChargeUnit::PerDay));
        assert_eq!(ChargeUnit::from_label("PER_KWH"), Some(ChargeUnit::PerKwh));
        assert_eq!(ChargeUnit::from_label("fortnightly"), None);
        assert_eq!(ChargeUnit::PerBill.to_string(), "per_bill");
    }

    #[test]
    fn basis_labels() {
        assert_eq!(
            PercentageBasis::from_label("energy_only"),
            Some(PercentageBasis::EnergyOnly)
        );
        assert_eq!(PercentageBasis::from_label("All"), Some(PercentageBasis::All));
        assert_eq!(PercentageBasis::from_label(""), None);
    }

    #[test]
    fn decode_energy_row_with_kwh_convention() {
        let row: ComponentRow = serde_json::from_str(
            r#"{
                "Description": "Tier 1 Energy",
                "RatekWh": 0.0843,
                "StartkWh": 0,
                "EndkWh": 500,
                "Season": "Summer"
            }"#,
        )
        .unwrap();
        let c = row.into_component(ChargeCategory::Energy, RateKind::Tiered);
        assert_eq!(c.description, "Tier 1 Energy");
        assert_eq!(c.rate, Some(0.0843));
        assert_eq!(c.tier_start, Some(0.0));
        assert_eq!(c.tier_end, Some(500.0));
        assert_eq!(c.season.as_deref(), Some("Summer"));
    }

    #[test]
    fn decode_demand_row_with_step_convention_and_string_rate() {
        let row: ComponentRow = serde_json::from_str(
            r#"{"RatekW": "14.50", "StepMin": "0", "StepMax": "100"}"#,
        )
        .unwrap();
        let c = row.into_component(ChargeCategory::Demand, RateKind::Tiered);
        assert_eq!(c.description, "Demand Charge");
        assert_eq!(c.rate, Some(14.5));
        assert_eq!(c.tier_start, Some(0.0));
        assert_eq!(c.tier_end, Some(100.0));
    }

    #[test]
    fn unparsable_rate_decodes_to_none() {
        let row: ComponentRow = serde_json::from_str(r#"{"Rate": "n/a"}"#).unwrap();
        assert_eq!(row.rate, None);
    }

    #[test]
    fn decode_tax_row_with_city_and_per_cent() {
        let row: ComponentRow = serde_json::from_str(
            r#"{"Type": "Utility Users Tax", "City": "Oakland", "Per_cent": 7.5, "Basis": "all"}"#,
        )
        .unwrap();
        let c = row.into_component(ChargeCategory::Tax, RateKind::Flat);
        assert_eq!(c.description, "Utility Users Tax (Oakland)");
        assert_eq!(c.rate, Some(7.5));
        assert_eq!(c.basis, Some(PercentageBasis::All));
    }

    #[test]
    fn decode_applicability_attributes() {
        let row: ComponentRow = serde_json::from_str(
            r#"{
                "Rate": 3.25,
                "MinKV": 0,
                "MaxkV": 50,
                "Pending": true,
                "StartDate": "2025-06-01",
                "EndDate": "2025-09-30",
                "ChargeUnit": "per_day"
            }"#,
        )
        .unwrap();
        let c = row.into_component(ChargeCategory::Service, RateKind::Flat);
        assert!(c.has_voltage_bounds());
        assert!(c.pending);
        assert_eq!(c.charge_unit, Some(ChargeUnit::PerDay));
        assert_eq!(
            c.start_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        );
    }

    #[test]
    fn schedule_category_accessors() {
        let mut schedule = RateSchedule::new("S1", "Residential TOU");
        schedule.push(RateComponent::new(
            ChargeCategory::Energy,
            RateKind::Flat,
            "Energy",
            0.12,
        ));
        schedule.push(RateComponent::new(
            ChargeCategory::Energy,
            RateKind::Tiered,
            "Tier 1",
            0.10,
        ));
        schedule.push(RateComponent::new(
            ChargeCategory::Service,
            RateKind::Flat,
            "Customer Charge",
            10.0,
        ));

        assert_eq!(schedule.in_category(ChargeCategory::Energy).count(), 2);
        assert_eq!(
            schedule
                .of_kind(ChargeCategory::Energy, RateKind::Tiered)
                .count(),
            1
        );
        assert!(schedule.has_any(ChargeCategory::Service));
        assert!(!schedule.has_any(ChargeCategory::Tax));
    }
}
