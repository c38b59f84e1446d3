use std::cmp::Ordering;

use itertools::Itertools;

use crate::data::{round_to, LevelCandidate, LevelType};

/// Merge candidates whose prices chain together within `tolerance` and keep one
/// representative per cluster.
///
/// Supports keep the member farthest from the midpoint of all candidate prices
/// (the deepest wick); resistances keep the highest price. Ties go to the most
/// recent timestamp. Clusters come back in ascending price order.
pub fn cluster_candidates(
    candidates: &[LevelCandidate],
    tolerance: f64,
    level_type: LevelType,
) -> Vec<LevelCandidate> {
    if candidates.is_empty() || !(tolerance.is_finite() && tolerance > 0.0) {
        return Vec::new();
    }

    let (min_price, max_price) = candidates
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c.price), hi.max(c.price)));
    let midpoint = (min_price + max_price) / 2.0;

    let sorted: Vec<&LevelCandidate> = candidates
        .iter()
        .sorted_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
        .collect();

    let mut representatives = Vec::new();
    let mut buffer: Vec<&LevelCandidate> = Vec::new();
    for candidate in sorted {
        if let Some(last) = buffer.last() {
            if candidate.price - last.price > tolerance {
                emit_representative(&mut representatives, &buffer, level_type, midpoint);
                buffer.clear();
            }
        }
        buffer.push(candidate);
    }
    emit_representative(&mut representatives, &buffer, level_type, midpoint);

    representatives
}

fn emit_representative(
    representatives: &mut Vec<LevelCandidate>,
    buffer: &[&LevelCandidate],
    level_type: LevelType,
    midpoint: f64,
) {
    let best = buffer.iter().copied().max_by(|a, b| {
        let primary = match level_type {
            LevelType::Support => (a.price - midpoint)
                .abs()
                .partial_cmp(&(b.price - midpoint).abs()),
            LevelType::Resistance => a.price.partial_cmp(&b.price),
        };
        primary
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
    if let Some(best) = best {
        representatives.push(best.clone());
    }
}

/// Collapse candidates sharing a rounded price, preferring the more extreme raw
/// value and then the more recent timestamp. Used when no tolerance is available.
pub fn dedup_by_rounded_price(
    candidates: &[LevelCandidate],
    decimals: u32,
    level_type: LevelType,
) -> Vec<LevelCandidate> {
    let mut kept: Vec<LevelCandidate> = Vec::new();
    for candidate in candidates {
        let key = round_to(candidate.price, decimals);
        match kept
            .iter_mut()
            .find(|existing| round_to(existing.price, decimals) == key)
        {
            Some(existing) => {
                if more_extreme(candidate, existing, level_type) {
                    *existing = candidate.clone();
                }
            }
            None => kept.push(candidate.clone()),
        }
    }
    kept
}

fn more_extreme(candidate: &LevelCandidate, existing: &LevelCandidate, level_type: LevelType) -> bool {
    let by_price = match level_type {
        LevelType::Support => existing.price.partial_cmp(&candidate.price),
        LevelType::Resistance => candidate.price.partial_cmp(&existing.price),
    };
    by_price
        .unwrap_or(Ordering::Equal)
        .then_with(|| candidate.timestamp.cmp(&existing.timestamp))
        == Ordering::Greater
}

/// Drop levels closer than `tolerance` to an already kept one, then backfill from
/// `all_values` (most extreme first) with prices that keep the spacing.
///
/// `levels` arrive most extreme first: ascending for supports, descending for
/// resistances. The result keeps that order.
pub fn merge_nearby_levels(
    levels: &[f64],
    all_values: &[f64],
    tolerance: f64,
    level_type: LevelType,
    decimals: u32,
) -> Vec<f64> {
    if levels.len() < 2 {
        return levels.to_vec();
    }

    let mut result: Vec<f64> = vec![levels[0]];
    for &candidate in &levels[1..] {
        if result.iter().all(|existing| (candidate - existing).abs() >= tolerance) {
            result.push(candidate);
        }
    }

    if result.len() < levels.len() {
        let alternatives = all_values
            .iter()
            .map(|v| round_to(*v, decimals))
            .sorted_by(|a, b| extreme_first(*a, *b, level_type))
            .dedup();
        for alternative in alternatives {
            if result.len() >= levels.len() {
                break;
            }
            if result
                .iter()
                .all(|existing| (alternative - existing).abs() >= tolerance)
            {
                result.push(alternative);
            }
        }
    }

    result.sort_by(|a, b| extreme_first(*a, *b, level_type));
    result
}

/// Ascending for supports, descending for resistances.
pub fn extreme_first(a: f64, b: f64, level_type: LevelType) -> Ordering {
    let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    match level_type {
        LevelType::Support => ordering,
        LevelType::Resistance => ordering.reverse(),
    }
}
