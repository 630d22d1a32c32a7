//! Weighted contribution ranking with cumulative-share pruning
//!
//! ```text
//! E_i = W_i / d_i²            (raw wattage, not lamp lumens)
//! C_i = E_i · MSI_i
//! T_i = Σ_{j≤i} C_j           (C sorted descending)
//! S_i = C_i / T_i,  S_0 := 1
//! keep i ⇔ S_i > threshold
//! ```
//!
//! A light is pruned once its own contribution is a negligible fraction of
//! everything ranked above it. The strongest contributor is always kept.

use crate::config::{DistancePolicy, QueryConfig};
use crate::spatial::Neighbor;
use crate::{EnrichedLightRecord, ExposureError, RankedContribution, Result};
use tracing::{debug, warn};

/// Running total and share at one rank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareStep {
    pub running_total: f64,
    pub share: f64,
}

/// Fold contributions (already sorted descending) into running totals and
/// per-rank shares. The first share is forced to 1. A zero running total
/// yields a share of 0.
pub fn cumulative_shares(sorted: &[f64]) -> Vec<ShareStep> {
    if sorted.is_empty() {
        return Vec::new();
    }

    let mut steps: Vec<ShareStep> = sorted
        .iter()
        .scan(0.0_f64, |running_total, &c| {
            *running_total += c;
            let share = if *running_total > 0.0 {
                c / *running_total
            } else {
                0.0
            };
            Some(ShareStep {
                running_total: *running_total,
                share,
            })
        })
        .collect();

    steps[0].share = 1.0;
    steps
}

/// Distance used in the inverse-square law, or `None` if the light is rejected
fn effective_distance(distance_m: f64, policy: DistancePolicy) -> Option<f64> {
    match policy {
        DistancePolicy::Floor { min_distance_m } => Some(distance_m.max(min_distance_m)),
        DistancePolicy::Reject if distance_m > 0.0 => Some(distance_m),
        DistancePolicy::Reject => None,
    }
}

struct Scored<'a> {
    light: &'a EnrichedLightRecord,
    measured_distance_m: f64,
    distance_m: f64,
    illuminance: f64,
    weighted: f64,
}

/// Rank neighbours by weighted contribution and prune by cumulative share.
///
/// Lights without a suppression weight (unknown lamp type) or without a
/// finite, non-negative wattage are skipped.
/// Neighbours from a quick-mode search carry no distance and are an error.
/// Equal contributions keep their neighbour order.
pub fn rank(neighbors: &[Neighbor<'_>], config: &QueryConfig) -> Result<Vec<RankedContribution>> {
    let mut scored: Vec<Scored<'_>> = Vec::with_capacity(neighbors.len());

    for nb in neighbors {
        let Some(weight) = nb.light.suppression_weight() else {
            continue;
        };
        let wattage = nb.light.record.wattage;
        if !(wattage.is_finite() && wattage >= 0.0) {
            warn!("Light {} has invalid wattage {}, skipped", nb.light.id(), wattage);
            continue;
        }
        let measured_distance_m = nb.distance_m.ok_or_else(|| ExposureError::MissingDistance {
            id: nb.light.id().to_string(),
        })?;
        let Some(distance_m) = effective_distance(measured_distance_m, config.distance_policy)
        else {
            warn!("Light {} coincides with the location, rejected", nb.light.id());
            continue;
        };

        let illuminance = wattage / (distance_m * distance_m);
        scored.push(Scored {
            light: nb.light,
            measured_distance_m,
            distance_m,
            illuminance,
            weighted: illuminance * weight,
        });
    }

    // Stable: ties keep neighbour (catalog) order
    scored.sort_by(|a, b| b.weighted.total_cmp(&a.weighted));

    let weighted: Vec<f64> = scored.iter().map(|s| s.weighted).collect();
    let steps = cumulative_shares(&weighted);

    let ranked: Vec<RankedContribution> = scored
        .into_iter()
        .zip(steps)
        .filter(|(_, step)| step.share > config.threshold)
        .map(|(s, step)| RankedContribution {
            light: s.light.clone(),
            measured_distance_m: s.measured_distance_m,
            distance_m: s.distance_m,
            illuminance: s.illuminance,
            weighted_contribution: s.weighted,
            running_total: step.running_total,
            cumulative_share: step.share,
        })
        .collect();

    debug!(
        "Ranked {} of {} neighbours (threshold {})",
        ranked.len(),
        neighbors.len(),
        config.threshold
    );

    Ok(ranked)
}
