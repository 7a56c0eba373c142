//! Configuration module

/// Engine configuration
///
/// Defaults mirror the assumptions baked into typical utility rate filings:
/// a 0.9 power factor when none is metered, a 30-day billing period, and a
/// 6% tax rate applied (and flagged) when a schedule carries no tax rows.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tax rate in percent applied when a schedule defines no tax components
    pub default_tax_rate: f64,
    /// Power factor assumed when the usage context does not supply one
    pub default_power_factor: f64,
    /// Billing days assumed when a request does not supply them
    pub default_billing_days: u32,
    /// Growth factor for projected totals in rate comparisons
    pub projection_rate: f64,
}

impl EngineConfig {
    pub fn new(default_tax_rate: f64) -> Self {
        Self {
            default_tax_rate,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_tax_rate: 6.0,
            default_power_factor: 0.9,
            default_billing_days: 30,
            projection_rate: 0.02,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
