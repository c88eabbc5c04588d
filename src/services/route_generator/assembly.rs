use super::route_scoring::ScoredCandidate;
use crate::models::{Difficulty, GeneratedRoute};
use crate::services::polyline;
use uuid::Uuid;

/// Turn a selected candidate into the immutable output route.
pub fn build_generated_route(scored: ScoredCandidate) -> GeneratedRoute {
    let ScoredCandidate {
        candidate,
        popularity_score,
        total_score,
        ..
    } = scored;

    let raw = candidate.raw;
    let metrics = candidate.metrics;
    let distance_km = raw.distance_meters / 1000.0;

    GeneratedRoute {
        id: Uuid::new_v4(),
        polyline: polyline::encode(&candidate.coordinates),
        coordinates: candidate.coordinates,
        distance_meters: raw.distance_meters,
        elevation_gain_m: raw.ascend_meters,
        elevation_loss_m: raw.descend_meters,
        duration_seconds: raw.duration_ms / 1000,
        difficulty: Difficulty::classify(raw.ascend_meters, distance_km),
        popularity_score,
        quality_score: metrics.validation.quality_score,
        loop_quality: metrics.loop_quality,
        backtrack_ratio: metrics.backtrack_ratio,
        total_score,
        variant: raw.variant,
        turn_instructions: raw.instructions,
    }
}
