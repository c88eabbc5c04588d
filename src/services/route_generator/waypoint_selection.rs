use crate::constants::*;
use crate::models::{Coordinates, ScenicFeature};
use std::cmp::Ordering;

/// Pick scenic waypoints for a loop of `target_distance_km` and order them by
/// bearing so the loop travels around the origin without crossing itself.
pub fn select_scenic_waypoints(
    features: &[ScenicFeature],
    origin: &Coordinates,
    target_distance_km: f64,
) -> Vec<Coordinates> {
    if features.is_empty() {
        return Vec::new();
    }

    let ideal_radius_km = target_distance_km / (2.0 * std::f64::consts::PI);
    let min_km = WAYPOINT_RING_MIN_FACTOR * ideal_radius_km;
    let max_km = WAYPOINT_RING_MAX_FACTOR * ideal_radius_km;

    let in_ring: Vec<&ScenicFeature> = features
        .iter()
        .filter(|f| (min_km..=max_km).contains(&f.distance_km_from_origin))
        .collect();
    let pool: Vec<&ScenicFeature> = if in_ring.len() < WAYPOINT_MIN_RING_FEATURES {
        features.iter().collect()
    } else {
        in_ring
    };

    let mut selected = best_per_quadrant(&pool);
    if selected.len() < WAYPOINT_MIN_QUADRANTS {
        selected = top_by_priority(&pool, WAYPOINT_FALLBACK_COUNT);
    }

    selected.sort_by(|a, b| {
        a.bearing_from_origin
            .partial_cmp(&b.bearing_from_origin)
            .unwrap_or(Ordering::Equal)
    });

    tracing::debug!(
        origin_lat = origin.lat,
        origin_lng = origin.lng,
        pool = pool.len(),
        selected = selected.len(),
        "Selected {} scenic waypoints: {}",
        selected.len(),
        selected
            .iter()
            .map(|f| format!("{} ({})", f.name, f.feature_type))
            .collect::<Vec<_>>()
            .join(", ")
    );

    selected.into_iter().map(|f| f.position).collect()
}

/// Highest-priority feature in each 90° quadrant; the first one seen wins ties.
fn best_per_quadrant<'a>(pool: &[&'a ScenicFeature]) -> Vec<&'a ScenicFeature> {
    let mut quadrants: [Option<&ScenicFeature>; 4] = [None; 4];
    for feature in pool {
        let quadrant = ((feature.bearing_from_origin / 90.0) as usize).min(3);
        let replace = match quadrants[quadrant] {
            Some(current) => feature.feature_type.priority() > current.feature_type.priority(),
            None => true,
        };
        if replace {
            quadrants[quadrant] = Some(feature);
        }
    }
    quadrants.into_iter().flatten().collect()
}

fn top_by_priority<'a>(pool: &[&'a ScenicFeature], count: usize) -> Vec<&'a ScenicFeature> {
    let mut ranked = pool.to_vec();
    // Stable: equal priorities keep discovery order
    ranked.sort_by(|a, b| b.feature_type.priority().cmp(&a.feature_type.priority()));
    ranked.truncate(count);
    ranked
}
