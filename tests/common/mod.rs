use async_trait::async_trait;
use looproute::config::RouteGeneratorConfig;
use looproute::error::{AppError, Result};
use looproute::models::{
    CandidateVariant, Coordinates, FeatureType, RawCandidateRoute, RoadClassSegment, RouteBias,
    ScenicFeature,
};
use looproute::services::providers::{
    PopularityScorer, RoundTripRouteProvider, ScenicFeatureDiscovery, WaypointRouteProvider,
};
use looproute::services::route_generator::RouteGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const ORIGIN_LAT: f64 = 54.597;
pub const ORIGIN_LNG: f64 = -5.930;
pub const BASE_SEED: u64 = 1000;

const METERS_PER_DEGREE_LAT: f64 = 111_195.0;

#[allow(dead_code)]
pub fn origin() -> Coordinates {
    Coordinates::new(ORIGIN_LAT, ORIGIN_LNG).unwrap()
}

/// Offset `origin` by metres east (`x`) and north (`y`).
fn offset(x: f64, y: f64) -> [f64; 2] {
    let lng_scale = ORIGIN_LAT.to_radians().cos();
    [
        ORIGIN_LNG + x / (METERS_PER_DEGREE_LAT * lng_scale),
        ORIGIN_LAT + y / METERS_PER_DEGREE_LAT,
    ]
}

/// Circular loop through the origin whose centre lies along `centre_bearing_deg`.
#[allow(dead_code)]
pub fn circle_points(centre_bearing_deg: f64, circumference_m: f64, clockwise: bool) -> Vec<[f64; 2]> {
    let radius = circumference_m / (2.0 * std::f64::consts::PI);
    let theta = centre_bearing_deg.to_radians();
    let (cx, cy) = (radius * theta.sin(), radius * theta.cos());
    let n = (circumference_m / 25.0).round() as usize;
    let direction = if clockwise { 1.0 } else { -1.0 };

    (0..=n)
        .map(|i| {
            let a = theta
                + std::f64::consts::PI
                + direction * 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            offset(cx + radius * a.sin(), cy + radius * a.cos())
        })
        .collect()
}

/// Clockwise loop with a dead-end spur at its far side: out `spur_m` along
/// `centre_bearing_deg`, U-turn, and back over the same points.
#[allow(dead_code)]
pub fn spur_loop_points(centre_bearing_deg: f64, circumference_m: f64, spur_m: f64) -> Vec<[f64; 2]> {
    let mut points = circle_points(centre_bearing_deg, circumference_m, true);
    let far = points.len() / 2;
    let radius = circumference_m / (2.0 * std::f64::consts::PI);
    let theta = centre_bearing_deg.to_radians();
    let steps = (spur_m / 25.0).round() as usize;

    let out: Vec<[f64; 2]> = (1..=steps)
        .map(|i| {
            let d = 2.0 * radius + i as f64 * 25.0;
            offset(d * theta.sin(), d * theta.cos())
        })
        .collect();
    let mut spur = out.clone();
    spur.extend(out.iter().rev().skip(1).copied());
    spur.push(points[far]);

    points.splice(far + 1..far + 1, spur);
    points
}

/// Split the point list into consecutive road-class runs of the given shares.
fn road_mix(point_count: usize, shares: &[(&str, f64)]) -> Vec<RoadClassSegment> {
    let last = point_count - 1;
    let mut segments = Vec::new();
    let mut start = 0;
    let mut acc = 0.0;
    for (i, (class, share)) in shares.iter().enumerate() {
        acc += share;
        let end = if i + 1 == shares.len() {
            last
        } else {
            ((acc * last as f64).round() as usize).min(last)
        };
        segments.push(RoadClassSegment::new(start, end, *class));
        start = end;
    }
    segments
}

#[allow(dead_code)]
pub fn candidate(
    points: Vec<[f64; 2]>,
    distance_meters: f64,
    ascend_meters: f64,
    shares: &[(&str, f64)],
    variant: CandidateVariant,
) -> RawCandidateRoute {
    let road_classes = road_mix(points.len(), shares);
    RawCandidateRoute {
        points,
        distance_meters,
        ascend_meters,
        descend_meters: ascend_meters,
        duration_ms: (distance_meters * 360.0) as u64,
        road_classes,
        instructions: vec![],
        variant,
    }
}

/// Six round trips keyed by seed, matching the default seed offsets from `BASE_SEED`:
/// four clean loops with different road mixes, one over-distance loop and one
/// over-distance loop with a U-turning spur.
#[allow(dead_code)]
pub fn stub_round_trips() -> HashMap<u64, RawCandidateRoute> {
    let offsets = RouteGeneratorConfig::default().round_trip_seed_offsets;
    let specs: Vec<RawCandidateRoute> = vec![
        candidate(
            circle_points(0.0, 5000.0, true),
            5000.0,
            35.0,
            &[("footway", 0.6), ("track", 0.4)],
            CandidateVariant::RoundTrip(0),
        ),
        candidate(
            circle_points(90.0, 4800.0, true),
            4800.0,
            60.0,
            &[("path", 0.6), ("residential", 0.4)],
            CandidateVariant::RoundTrip(0),
        ),
        candidate(
            circle_points(180.0, 5300.0, false),
            5300.0,
            150.0,
            &[("residential", 0.7), ("cycleway", 0.3)],
            CandidateVariant::RoundTrip(0),
        ),
        // Over-distance
        candidate(
            circle_points(270.0, 8000.0, true),
            8000.0,
            40.0,
            &[("track", 0.5), ("secondary", 0.5)],
            CandidateVariant::RoundTrip(0),
        ),
        // Over-distance with a retraced spur: little backtracking overall,
        // but the spur tip is a U-turn
        candidate(
            spur_loop_points(225.0, 6000.0, 400.0),
            6800.0,
            20.0,
            &[("footway", 1.0)],
            CandidateVariant::RoundTrip(0),
        ),
        candidate(
            circle_points(45.0, 5500.0, false),
            5500.0,
            80.0,
            &[("bridleway", 0.5), ("tertiary", 0.5)],
            CandidateVariant::RoundTrip(0),
        ),
    ];

    offsets
        .into_iter()
        .zip(specs)
        .map(|(offset, raw)| {
            let seed = BASE_SEED + offset;
            (seed, raw.with_variant(CandidateVariant::RoundTrip(seed)))
        })
        .collect()
}

/// Round trips served from a fixed table; unknown seeds fail like an upstream error.
pub struct StubRoundTrips {
    pub routes: HashMap<u64, RawCandidateRoute>,
    pub delay: Option<Duration>,
}

impl StubRoundTrips {
    #[allow(dead_code)]
    pub fn new(routes: HashMap<u64, RawCandidateRoute>) -> Self {
        StubRoundTrips {
            routes,
            delay: None,
        }
    }
}

#[async_trait]
impl RoundTripRouteProvider for StubRoundTrips {
    async fn generate_round_trip(
        &self,
        _origin: &Coordinates,
        _distance_meters: f64,
        seed: u64,
        _bias: RouteBias,
    ) -> Result<RawCandidateRoute> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.routes
            .get(&seed)
            .cloned()
            .ok_or_else(|| AppError::RoutingApi(format!("no stub route for seed {}", seed)))
    }
}

/// Waypoint loops: a 4.5 km loop to the south-east, clockwise when waypoints
/// arrive in ascending bearing order and anticlockwise otherwise.
pub struct StubWaypointLoops;

#[async_trait]
impl WaypointRouteProvider for StubWaypointLoops {
    async fn generate_waypoint_loop(
        &self,
        origin: &Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<RawCandidateRoute> {
        let (first, last) = match (waypoints.first(), waypoints.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(AppError::RoutingApi("no waypoints".to_string())),
        };
        let clockwise = origin.bearing_to(first) <= origin.bearing_to(last);
        Ok(candidate(
            circle_points(135.0, 4500.0, clockwise),
            4500.0,
            25.0,
            &[("path", 0.7), ("residential", 0.3)],
            CandidateVariant::ScenicWaypointFull,
        ))
    }
}

pub struct FailingProvider;

#[async_trait]
impl RoundTripRouteProvider for FailingProvider {
    async fn generate_round_trip(
        &self,
        _origin: &Coordinates,
        _distance_meters: f64,
        _seed: u64,
        _bias: RouteBias,
    ) -> Result<RawCandidateRoute> {
        Err(AppError::RoutingApi("HTTP 500".to_string()))
    }
}

#[async_trait]
impl WaypointRouteProvider for FailingProvider {
    async fn generate_waypoint_loop(
        &self,
        _origin: &Coordinates,
        _waypoints: &[Coordinates],
    ) -> Result<RawCandidateRoute> {
        Err(AppError::RoutingApi("HTTP 500".to_string()))
    }
}

#[async_trait]
impl ScenicFeatureDiscovery for FailingProvider {
    async fn find_features(
        &self,
        _origin: &Coordinates,
        _radius_meters: f64,
    ) -> Result<Vec<ScenicFeature>> {
        Err(AppError::OverpassApi("HTTP 429".to_string()))
    }
}

#[async_trait]
impl PopularityScorer for FailingProvider {
    async fn score(&self, _coordinates: &[Coordinates]) -> Result<f64> {
        Err(AppError::PopularityApi("HTTP 503".to_string()))
    }
}

/// Two features inside the ring for a 5 km loop, in different quadrants.
pub struct StubDiscovery;

#[async_trait]
impl ScenicFeatureDiscovery for StubDiscovery {
    async fn find_features(
        &self,
        origin: &Coordinates,
        _radius_meters: f64,
    ) -> Result<Vec<ScenicFeature>> {
        let park = Coordinates::from_lng_lat(offset(450.0, 300.0)).unwrap();
        let river = Coordinates::from_lng_lat(offset(350.0, -450.0)).unwrap();
        Ok(vec![
            ScenicFeature::new(FeatureType::Park, "Ormeau Park", park, origin),
            ScenicFeature::new(FeatureType::River, "River Lagan", river, origin),
        ])
    }
}

/// Popularity proportional to the number of points, capped at 1.
pub struct StubPopularity;

#[async_trait]
impl PopularityScorer for StubPopularity {
    async fn score(&self, coordinates: &[Coordinates]) -> Result<f64> {
        Ok((coordinates.len() as f64 / 400.0).min(1.0))
    }
}

#[allow(dead_code)]
pub fn stub_generator() -> RouteGenerator {
    RouteGenerator::new(
        Arc::new(StubRoundTrips::new(stub_round_trips())),
        Arc::new(StubWaypointLoops),
        Arc::new(StubDiscovery),
        Arc::new(StubPopularity),
        RouteGeneratorConfig::default(),
    )
}

#[allow(dead_code)]
pub fn failing_generator() -> RouteGenerator {
    RouteGenerator::new(
        Arc::new(FailingProvider),
        Arc::new(FailingProvider),
        Arc::new(FailingProvider),
        Arc::new(FailingProvider),
        RouteGeneratorConfig::default(),
    )
}

/// Check if we should skip real API tests
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("SKIP_REAL_API_TESTS").is_ok()
}
