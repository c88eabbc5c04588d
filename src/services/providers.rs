//! External collaborators of the route generator.
//!
//! The generator only talks to these traits; concrete HTTP clients live in
//! sibling modules and tests plug in deterministic stubs.

use crate::error::Result;
use crate::models::{Coordinates, RawCandidateRoute, RouteBias, ScenicFeature};
use async_trait::async_trait;

#[async_trait]
pub trait RoundTripRouteProvider: Send + Sync {
    /// Generate a loop of roughly `distance_meters` starting and ending at `origin`.
    /// `seed` selects the provider's loop variant.
    async fn generate_round_trip(
        &self,
        origin: &Coordinates,
        distance_meters: f64,
        seed: u64,
        bias: RouteBias,
    ) -> Result<RawCandidateRoute>;
}

#[async_trait]
pub trait WaypointRouteProvider: Send + Sync {
    /// Route origin -> waypoints (in order) -> origin.
    async fn generate_waypoint_loop(
        &self,
        origin: &Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<RawCandidateRoute>;
}

#[async_trait]
pub trait ScenicFeatureDiscovery: Send + Sync {
    /// Features within `radius_meters` of `origin`.
    async fn find_features(
        &self,
        origin: &Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<ScenicFeature>>;
}

#[async_trait]
pub trait PopularityScorer: Send + Sync {
    /// How often people run along this path, in [0, 1].
    async fn score(&self, coordinates: &[Coordinates]) -> Result<f64>;
}
