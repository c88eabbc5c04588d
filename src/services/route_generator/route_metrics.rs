use super::geometry::{cumulative_distances_m, evenly_spaced_indices, isoperimetric_ratio};
use super::terrain::RoadMix;
use super::validation::{validate_route, ValidationResult};
use crate::config::RouteGeneratorConfig;
use crate::constants::ANGULAR_SECTORS;
use crate::models::geo::LocalProjection;
use crate::models::{Coordinates, RawCandidateRoute, RouteRequest};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Geometric and terrain metrics of one candidate, computed once.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMetrics {
    /// 1.0 when the route ends exactly at its origin
    pub loop_quality: f64,
    /// Fraction of grid transitions that are later or earlier retraced in reverse
    pub backtrack_ratio: f64,
    /// Isoperimetric ratio normalised to [0, 1]
    pub compactness: f64,
    /// Fraction of the 8 compass sectors the route visits
    pub angular_spread: f64,
    /// Share of sampled points running beside a distant stretch of the same route
    pub proximity_overlap: f64,
    pub terrain_score: f64,
    pub road_mix: RoadMix,
    pub validation: ValidationResult,
}

/// Why a candidate left the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooFewPoints,
    NotClosed { loop_quality: f64 },
    Backtracking { ratio: f64 },
    ParallelOverlap { overlap: f64 },
    NotCompact { compactness: f64 },
    NarrowSpread { angular_spread: f64 },
    WrongTerrain { terrain_score: f64 },
    Invalid { issues: usize, quality_score: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewPoints => write!(f, "too few points"),
            Rejection::NotClosed { loop_quality } => {
                write!(f, "loop not closed (quality {:.2})", loop_quality)
            }
            Rejection::Backtracking { ratio } => write!(f, "backtracking {:.2}", ratio),
            Rejection::ParallelOverlap { overlap } => {
                write!(f, "runs beside itself (overlap {:.2})", overlap)
            }
            Rejection::NotCompact { compactness } => {
                write!(f, "elongated (compactness {:.2})", compactness)
            }
            Rejection::NarrowSpread { angular_spread } => {
                write!(f, "narrow angular spread {:.2}", angular_spread)
            }
            Rejection::WrongTerrain { terrain_score } => {
                write!(f, "too little trail (terrain {:.2})", terrain_score)
            }
            Rejection::Invalid {
                issues,
                quality_score,
            } => write!(
                f,
                "failed validation ({} issues, quality {:.2})",
                issues, quality_score
            ),
        }
    }
}

/// A candidate that passed every gate; coordinates are closed at the origin.
#[derive(Debug, Clone)]
pub struct EvaluatedCandidate {
    pub raw: RawCandidateRoute,
    pub coordinates: Vec<Coordinates>,
    pub metrics: CandidateMetrics,
}

/// Run the metrics pipeline over one raw candidate.
pub fn evaluate_candidate(
    raw: RawCandidateRoute,
    request: &RouteRequest,
    config: &RouteGeneratorConfig,
) -> Result<EvaluatedCandidate, Rejection> {
    let origin = request.origin;
    let mut coordinates = raw.to_coordinates();
    if coordinates.len() < 3 {
        return Err(Rejection::TooFewPoints);
    }
    let is_scenic = raw.is_scenic();

    let loop_quality = loop_quality(&coordinates, &origin, config.closure_normalizer_km);
    let min_loop_quality = if is_scenic {
        config.min_loop_quality_scenic
    } else {
        config.min_loop_quality_round_trip
    };
    if loop_quality < min_loop_quality {
        return Err(Rejection::NotClosed { loop_quality });
    }

    let backtrack_ratio = backtrack_ratio(&coordinates, &origin, config.backtrack_cell_m);
    if backtrack_ratio > config.max_backtrack_ratio {
        return Err(Rejection::Backtracking {
            ratio: backtrack_ratio,
        });
    }

    let compactness = compactness(&coordinates, &origin, config.compactness_normalizer);
    let angular_spread = angular_spread(
        &coordinates,
        &origin,
        config.angular_samples,
        config.angular_min_radius_m,
    );
    let proximity_overlap = proximity_overlap(&coordinates, &origin, config);
    check_shape(
        is_scenic,
        compactness,
        angular_spread,
        proximity_overlap,
        config,
    )?;

    close_at_origin(&mut coordinates, &origin);

    let road_mix = RoadMix::from_segments(&coordinates, &raw.road_classes);
    let terrain_score = road_mix.terrain_score();
    if !is_scenic && request.prefer_trails && terrain_score < config.min_terrain_score {
        return Err(Rejection::WrongTerrain { terrain_score });
    }

    let validation = validate_route(
        &coordinates,
        raw.distance_meters,
        request.target_distance_meters(),
        &road_mix,
        config,
    );
    if !validation.is_valid {
        return Err(Rejection::Invalid {
            issues: validation.issues.len(),
            quality_score: validation.quality_score,
        });
    }

    Ok(EvaluatedCandidate {
        raw,
        coordinates,
        metrics: CandidateMetrics {
            loop_quality,
            backtrack_ratio,
            compactness,
            angular_spread,
            proximity_overlap,
            terrain_score,
            road_mix,
            validation,
        },
    })
}

/// Overlap gate applies to every candidate; compactness and spread only to
/// round trips, since waypoint loops detour towards features on purpose.
pub fn check_shape(
    is_scenic: bool,
    compactness: f64,
    angular_spread: f64,
    proximity_overlap: f64,
    config: &RouteGeneratorConfig,
) -> Result<(), Rejection> {
    if proximity_overlap > config.max_proximity_overlap {
        return Err(Rejection::ParallelOverlap {
            overlap: proximity_overlap,
        });
    }
    if is_scenic {
        return Ok(());
    }
    if compactness < config.min_compactness {
        return Err(Rejection::NotCompact { compactness });
    }
    if angular_spread < config.min_angular_spread {
        return Err(Rejection::NarrowSpread { angular_spread });
    }
    Ok(())
}

pub fn loop_quality(path: &[Coordinates], origin: &Coordinates, normalizer_km: f64) -> f64 {
    let Some(end) = path.last() else {
        return 0.0;
    };
    (1.0 - end.distance_to(origin) / normalizer_km).max(0.0)
}

/// Quantise the path onto square cells of `cell_m` and count directed cell
/// transitions whose reverse transition also occurs somewhere on the path.
///
/// Both legs of a retraced stretch count, so a pure out-and-back scores ~1.0
/// and a clean loop ~0.0; `max_backtrack_ratio` is read on that scale.
pub fn backtrack_ratio(path: &[Coordinates], origin: &Coordinates, cell_m: f64) -> f64 {
    let projection = LocalProjection::new(*origin);
    let (lng_deg, lat_deg) = projection.cell_size_deg(cell_m);
    let cell_of = |p: &Coordinates| {
        (
            ((p.lng - origin.lng) / lng_deg).floor() as i64,
            ((p.lat - origin.lat) / lat_deg).floor() as i64,
        )
    };

    let cells: Vec<(i64, i64)> = path.iter().map(cell_of).collect();
    let transitions: Vec<((i64, i64), (i64, i64))> = cells
        .windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| (w[0], w[1]))
        .collect();
    if transitions.is_empty() {
        return 0.0;
    }

    let seen: HashSet<_> = transitions.iter().copied().collect();
    let retraced = transitions
        .iter()
        .filter(|(from, to)| seen.contains(&(*to, *from)))
        .count();

    retraced as f64 / transitions.len() as f64
}

pub fn compactness(path: &[Coordinates], origin: &Coordinates, normalizer: f64) -> f64 {
    (isoperimetric_ratio(path, origin) / normalizer).clamp(0.0, 1.0)
}

pub fn angular_spread(
    path: &[Coordinates],
    origin: &Coordinates,
    samples: usize,
    min_radius_m: f64,
) -> f64 {
    let sector_width = 360.0 / ANGULAR_SECTORS as f64;
    let sectors: HashSet<usize> = evenly_spaced_indices(path.len(), samples)
        .into_iter()
        .map(|i| &path[i])
        .filter(|p| origin.distance_m(p) > min_radius_m)
        .map(|p| ((origin.bearing_to(p) / sector_width) as usize).min(ANGULAR_SECTORS - 1))
        .collect();

    sectors.len() as f64 / ANGULAR_SECTORS as f64
}

/// Detects the path running beside itself. Over all pairs of sampled points
/// that are both away from the origin and far apart along the route, the
/// fraction that lie within `proximity_close_m` of each other.
pub fn proximity_overlap(
    path: &[Coordinates],
    origin: &Coordinates,
    config: &RouteGeneratorConfig,
) -> f64 {
    let cumulative = cumulative_distances_m(path);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total <= 0.0 {
        return 0.0;
    }

    let samples: Vec<(f64, &Coordinates)> =
        evenly_spaced_indices(path.len(), config.proximity_samples)
            .into_iter()
            .filter(|&i| origin.distance_m(&path[i]) > config.proximity_min_radius_m)
            .map(|i| (cumulative[i] / total, &path[i]))
            .collect();

    let mut pairs = 0usize;
    let mut close = 0usize;
    for (i, (pos_a, a)) in samples.iter().enumerate() {
        for (pos_b, b) in &samples[i + 1..] {
            if (pos_b - pos_a).abs() <= config.proximity_min_separation {
                continue;
            }
            pairs += 1;
            if a.distance_m(b) < config.proximity_close_m {
                close += 1;
            }
        }
    }

    if pairs == 0 {
        return 0.0;
    }
    close as f64 / pairs as f64
}

/// Force exact geometric closure.
fn close_at_origin(path: &mut [Coordinates], origin: &Coordinates) {
    if let Some(first) = path.first_mut() {
        *first = *origin;
    }
    if let Some(last) = path.last_mut() {
        *last = *origin;
    }
}
