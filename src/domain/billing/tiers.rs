//! Tiered/incremental rate accumulation
//!
//! Progressive marginal billing: each usage band is billed at its own rate,
//! walking the bands in ascending order until the usage is exhausted.

use super::model::{EstimateWarning, LineItem};
use crate::domain::schedule::RateComponent;

/// Accumulate charges for `usage` across the given tier components.
///
/// Tiers are sorted ascending by start bound before the walk. A tier with an
/// upper bound consumes at most `end - start`; a tier without one takes all
/// remaining usage. Zero-width tiers are skipped without ending the walk.
/// A tier missing its rate consumes its width at rate zero (with a warning)
/// so later band boundaries stay where the schedule put them.
pub(crate) fn accumulate(
    usage: f64,
    mut tiers: Vec<&RateComponent>,
    quantity_unit: &str,
    rate_unit: &str,
    precision: usize,
    warnings: &mut Vec<EstimateWarning>,
) -> (f64, Vec<LineItem>) {
    tiers.sort_by(|a, b| {
        a.tier_start
            .unwrap_or(0.0)
            .total_cmp(&b.tier_start.unwrap_or(0.0))
    });

    let mut total = 0.0;
    let mut items = Vec::new();
    let mut remaining = usage;

    for tier in tiers {
        if remaining <= 0.0 {
            break;
        }

        let start = tier.tier_start.unwrap_or(0.0);
        let width = match tier.tier_end {
            Some(end) => (end - start).min(remaining),
            None => remaining,
        };
        if width <= 0.0 {
            continue;
        }

        let rate = match tier.rate {
            Some(rate) => rate,
            None => {
                warnings.push(EstimateWarning::MalformedComponent {
                    category: tier.category,
                    description: tier.description.clone(),
                });
                0.0
            }
        };

        let amount = width * rate;
        let label = match tier.tier_end {
            Some(end) => format!(
                "{} ({}-{} {} @ {:.prec$} {})",
                tier.description,
                start,
                end,
                quantity_unit,
                rate,
                rate_unit,
                prec = precision
            ),
            None => format!(
                "{} ({}+ {} @ {:.prec$} {})",
                tier.description,
                start,
                quantity_unit,
                rate,
                rate_unit,
                prec = precision
            ),
        };
        items.push(LineItem::new(label, amount));
        total += amount;
        remaining -= width;
    }

    (total, items)
}

// ── Tests ──────────────────────────────────────────────────────
