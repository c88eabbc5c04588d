mod assembly;
pub mod fan_out;
pub mod geometry;
pub mod route_metrics;
pub mod route_scoring;
pub mod terrain;
pub mod validation;
pub mod waypoint_selection;

use crate::config::RouteGeneratorConfig;
use crate::error::{AppError, Result};
use crate::models::{
    CandidateVariant, Coordinates, GeneratedRoute, RawCandidateRoute, RouteBias, RouteRequest,
};
use crate::services::providers::{
    PopularityScorer, RoundTripRouteProvider, ScenicFeatureDiscovery, WaypointRouteProvider,
};
use std::sync::Arc;

use assembly::build_generated_route;
use fan_out::join_settled;
use route_metrics::{evaluate_candidate, EvaluatedCandidate};
use route_scoring::{select_diverse, sort_by_score, ScoredCandidate};
use waypoint_selection::select_scenic_waypoints;

/// Turns a start point and a target distance into up to `max_routes`
/// diverse running loops.
///
/// Each call owns all of its intermediate candidates; nothing is cached
/// between calls.
pub struct RouteGenerator {
    round_trips: Arc<dyn RoundTripRouteProvider>,
    waypoint_loops: Arc<dyn WaypointRouteProvider>,
    discovery: Arc<dyn ScenicFeatureDiscovery>,
    popularity: Arc<dyn PopularityScorer>,
    config: RouteGeneratorConfig,
}

impl RouteGenerator {
    pub fn new(
        round_trips: Arc<dyn RoundTripRouteProvider>,
        waypoint_loops: Arc<dyn WaypointRouteProvider>,
        discovery: Arc<dyn ScenicFeatureDiscovery>,
        popularity: Arc<dyn PopularityScorer>,
        config: RouteGeneratorConfig,
    ) -> Self {
        RouteGenerator {
            round_trips,
            waypoint_loops,
            discovery,
            popularity,
            config,
        }
    }

    pub fn config(&self) -> &RouteGeneratorConfig {
        &self.config
    }

    /// Generate routes with a freshly drawn base seed.
    pub async fn generate_route(&self, request: &RouteRequest) -> Result<Vec<GeneratedRoute>> {
        let base_seed = u64::from(rand::random::<u32>());
        self.generate_route_with_seed(request, base_seed).await
    }

    /// Generate routes from a fixed base seed. With fixed provider responses
    /// the result is fully deterministic apart from route ids.
    pub async fn generate_route_with_seed(
        &self,
        request: &RouteRequest,
        base_seed: u64,
    ) -> Result<Vec<GeneratedRoute>> {
        tracing::info!(
            lat = request.origin.lat,
            lng = request.origin.lng,
            target_km = request.target_distance_km,
            prefer_trails = request.prefer_trails,
            avoid_hills = request.avoid_hills,
            base_seed = base_seed,
            "Generating loop candidates: ({:.4}, {:.4}), {:.1}km",
            request.origin.lat,
            request.origin.lng,
            request.target_distance_km
        );

        let (round_trips, scenic_loops) = tokio::join!(
            self.fetch_round_trips(request, base_seed),
            self.fetch_scenic_loops(request),
        );
        let raw_candidates: Vec<RawCandidateRoute> =
            round_trips.into_iter().chain(scenic_loops).collect();
        let received = raw_candidates.len();

        let evaluated: Vec<EvaluatedCandidate> = raw_candidates
            .into_iter()
            .filter_map(|raw| self.evaluate(raw, request))
            .collect();

        if evaluated.is_empty() {
            tracing::warn!(
                received = received,
                "No candidate survived filtering ({} received)",
                received
            );
            return Err(AppError::no_valid_route(format!(
                "0 of {} candidates survived filtering",
                received
            )));
        }

        let mut scored = self.score(evaluated).await;
        sort_by_score(&mut scored);
        let selected = select_diverse(
            scored,
            self.config.max_routes,
            self.config.diversity_threshold,
        );

        let routes: Vec<GeneratedRoute> = selected.into_iter().map(build_generated_route).collect();

        tracing::info!(
            received = received,
            returned = routes.len(),
            best_score = routes.first().map(|r| r.total_score).unwrap_or(0.0),
            "Generated {} routes from {} candidates",
            routes.len(),
            received
        );

        Ok(routes)
    }

    /// Concurrent round-trip requests at well-spaced seeds.
    async fn fetch_round_trips(
        &self,
        request: &RouteRequest,
        base_seed: u64,
    ) -> Vec<RawCandidateRoute> {
        let bias = RouteBias {
            scenic: request.prefer_trails,
            avoid_hills: request.avoid_hills,
        };
        let distance_meters = request.target_distance_meters();
        let seeds: Vec<u64> = self
            .config
            .round_trip_seed_offsets
            .iter()
            .map(|offset| base_seed.wrapping_add(*offset))
            .collect();

        let results = join_settled(
            seeds.iter().map(|&seed| {
                self.round_trips
                    .generate_round_trip(&request.origin, distance_meters, seed, bias)
            }),
            self.config.routing_timeout(),
            "round trip request",
        )
        .await;

        collect_candidates(seeds.into_iter().map(CandidateVariant::RoundTrip), results)
    }

    /// Discovery, waypoint selection, then the waypoint-loop variants.
    /// Discovery problems only cost the scenic candidates.
    async fn fetch_scenic_loops(&self, request: &RouteRequest) -> Vec<RawCandidateRoute> {
        let radius_meters =
            request.target_distance_meters() * self.config.scenic_search_radius_factor;

        let discovered = tokio::time::timeout(
            self.config.discovery_timeout(),
            self.discovery.find_features(&request.origin, radius_meters),
        )
        .await;
        let features = match discovered {
            Ok(Ok(features)) => features,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Scenic discovery failed, using round trips only");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.config.discovery_timeout(),
                    "Scenic discovery timed out, using round trips only"
                );
                Vec::new()
            }
        };

        let waypoints =
            select_scenic_waypoints(&features, &request.origin, request.target_distance_km);
        if waypoints.len() < 2 {
            tracing::debug!(
                features = features.len(),
                waypoints = waypoints.len(),
                "Not enough scenic waypoints for waypoint loops"
            );
            return Vec::new();
        }

        let plans = waypoint_plans(&waypoints);
        let results = join_settled(
            plans.iter().map(|(_, stops)| {
                self.waypoint_loops
                    .generate_waypoint_loop(&request.origin, stops)
            }),
            self.config.routing_timeout(),
            "waypoint loop request",
        )
        .await;

        collect_candidates(plans.into_iter().map(|(variant, _)| variant), results)
    }

    fn evaluate(&self, raw: RawCandidateRoute, request: &RouteRequest) -> Option<EvaluatedCandidate> {
        let variant = raw.variant;
        match evaluate_candidate(raw, request, &self.config) {
            Ok(candidate) => {
                let m = &candidate.metrics;
                tracing::debug!(
                    candidate = %variant,
                    loop_quality = m.loop_quality,
                    backtrack_ratio = m.backtrack_ratio,
                    compactness = m.compactness,
                    angular_spread = m.angular_spread,
                    proximity_overlap = m.proximity_overlap,
                    terrain_score = m.terrain_score,
                    quality_score = m.validation.quality_score,
                    "Candidate accepted"
                );
                Some(candidate)
            }
            Err(reason) => {
                tracing::debug!(candidate = %variant, reason = %reason, "Candidate rejected");
                None
            }
        }
    }

    /// Attach popularity (0 on any failure) and compute final scores.
    async fn score(&self, evaluated: Vec<EvaluatedCandidate>) -> Vec<ScoredCandidate> {
        let popularity = join_settled(
            evaluated
                .iter()
                .map(|candidate| self.popularity.score(&candidate.coordinates)),
            self.config.popularity_timeout(),
            "popularity scoring",
        )
        .await;

        evaluated
            .into_iter()
            .zip(popularity)
            .map(|(candidate, popularity)| {
                let popularity_score = popularity.unwrap_or_else(|e| {
                    tracing::debug!(
                        candidate = %candidate.raw.variant,
                        error = %e,
                        "Popularity scoring failed, using 0"
                    );
                    0.0
                });
                let scored = ScoredCandidate::new(candidate, popularity_score);
                tracing::debug!(
                    candidate = %scored.candidate.raw.variant,
                    total_score = scored.total_score,
                    shape_score = scored.shape_score,
                    scenic_score = scored.scenic_score,
                    popularity_score = scored.popularity_score,
                    dominant_bearing = ?scored.dominant_bearing,
                    "Candidate scored"
                );
                scored
            })
            .collect()
    }
}

/// Waypoint orderings to request: full, reversed, and every other waypoint
/// when that still leaves at least two.
fn waypoint_plans(waypoints: &[Coordinates]) -> Vec<(CandidateVariant, Vec<Coordinates>)> {
    let mut plans = vec![
        (CandidateVariant::ScenicWaypointFull, waypoints.to_vec()),
        (
            CandidateVariant::ScenicWaypointReversed,
            waypoints.iter().rev().copied().collect(),
        ),
    ];

    if waypoints.len() >= 3 {
        let subset: Vec<Coordinates> = waypoints.iter().step_by(2).copied().collect();
        if subset.len() >= 2 {
            plans.push((CandidateVariant::ScenicWaypointSubset, subset));
        }
    }

    plans
}

/// Keep successful responses tagged with the variant that requested them;
/// log and drop failures.
fn collect_candidates(
    variants: impl IntoIterator<Item = CandidateVariant>,
    results: Vec<Result<RawCandidateRoute>>,
) -> Vec<RawCandidateRoute> {
    variants
        .into_iter()
        .zip(results)
        .filter_map(|(variant, result)| match result {
            Ok(raw) => Some(raw.with_variant(variant)),
            Err(e) => {
                tracing::warn!(candidate = %variant, error = %e, "Candidate request failed");
                None
            }
        })
        .collect()
}
