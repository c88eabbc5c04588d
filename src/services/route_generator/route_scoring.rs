use super::geometry::{circular_mean, cumulative_distances_m, index_at_fraction};
use super::route_metrics::EvaluatedCandidate;
use crate::constants::*;
use crate::models::geo::angular_difference;
use crate::models::Coordinates;
use std::cmp::Ordering;

/// An evaluated candidate with its popularity and final scores attached.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: EvaluatedCandidate,
    pub popularity_score: f64,
    pub shape_score: f64,
    pub scenic_score: f64,
    pub total_score: f64,
    /// `None` when the route has no usable heading (e.g. every sample on the origin)
    pub dominant_bearing: Option<f64>,
}

impl ScoredCandidate {
    pub fn new(candidate: EvaluatedCandidate, popularity_score: f64) -> Self {
        let metrics = &candidate.metrics;

        let shape_score = (0.4 * metrics.compactness + 0.4 * metrics.angular_spread
            - 0.8 * metrics.proximity_overlap)
            .max(0.0);
        let scenic_bonus = if candidate.raw.is_scenic() { 0.3 } else { 0.0 };
        let scenic_score = (metrics.terrain_score + scenic_bonus).min(1.0);

        let total_score = 0.20 * scenic_score
            + 0.20 * shape_score
            + 0.20 * metrics.validation.quality_score
            + 0.15 * (1.0 - metrics.backtrack_ratio)
            + 0.15 * metrics.loop_quality
            + 0.10 * popularity_score;

        let dominant_bearing = dominant_bearing(&candidate.coordinates);

        ScoredCandidate {
            candidate,
            popularity_score,
            shape_score,
            scenic_score,
            total_score,
            dominant_bearing,
        }
    }
}

/// Circular mean of the bearings from the start to points spread over the
/// 20%-60% stretch of the route.
pub fn dominant_bearing(path: &[Coordinates]) -> Option<f64> {
    let start = path.first()?;
    let cumulative = cumulative_distances_m(path);

    let span = DOMINANT_BEARING_END_FRACTION - DOMINANT_BEARING_START_FRACTION;
    let steps = DOMINANT_BEARING_SAMPLES.saturating_sub(1).max(1) as f64;
    let bearings: Vec<f64> = (0..DOMINANT_BEARING_SAMPLES)
        .map(|i| DOMINANT_BEARING_START_FRACTION + span * i as f64 / steps)
        .map(|fraction| &path[index_at_fraction(&cumulative, fraction)])
        .filter(|p| *p != start)
        .map(|p| start.bearing_to(p))
        .collect();

    circular_mean(&bearings)
}

/// Normalised bearing difference: 0 = same heading, 1 = opposite.
pub fn diversity(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => angular_difference(a, b) / 180.0,
        _ => 0.0,
    }
}

/// Stable sort by descending total score; ties keep arrival order.
pub fn sort_by_score(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Greedy diverse top-K over candidates already in score order.
///
/// A candidate is accepted on the first pass only if its dominant bearing
/// differs by at least `threshold` from every accepted one. Remaining slots
/// are then filled in score order regardless of diversity. The result keeps
/// descending score order.
pub fn select_diverse(
    sorted: Vec<ScoredCandidate>,
    max_routes: usize,
    threshold: f64,
) -> Vec<ScoredCandidate> {
    let mut accepted: Vec<usize> = Vec::with_capacity(max_routes);

    for (idx, candidate) in sorted.iter().enumerate() {
        if accepted.len() >= max_routes {
            break;
        }
        let is_diverse = accepted.iter().all(|&other| {
            diversity(candidate.dominant_bearing, sorted[other].dominant_bearing) >= threshold
        });
        if is_diverse {
            accepted.push(idx);
        } else {
            tracing::debug!(
                candidate = %candidate.candidate.raw.variant,
                score = candidate.total_score,
                "Skipping candidate too similar to an accepted route"
            );
        }
    }

    if accepted.len() < max_routes {
        for idx in 0..sorted.len() {
            if accepted.len() >= max_routes {
                break;
            }
            if !accepted.contains(&idx) {
                accepted.push(idx);
            }
        }
    }

    accepted.sort_unstable();
    sorted
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| accepted.contains(idx))
        .map(|(_, candidate)| candidate)
        .collect()
}
