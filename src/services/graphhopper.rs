use crate::error::{AppError, Result};
use crate::models::{
    CandidateVariant, Coordinates, RawCandidateRoute, RoadClassSegment, RouteBias,
    TurnInstruction,
};
use crate::services::providers::{RoundTripRouteProvider, WaypointRouteProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ROUTING_TIMEOUT: Duration = Duration::from_secs(30);

/// GraphHopper allows at most this many points per request on public tiers
const MAX_POINTS: usize = 25;

#[derive(Clone)]
pub struct GraphHopperClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    profile: String,
    timeout: Duration,
}

impl GraphHopperClient {
    pub fn new(base_url: String, api_key: Option<String>, profile: String) -> Self {
        GraphHopperClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            profile,
            timeout: DEFAULT_ROUTING_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Try the weighted request first; on any failure retry once without weighting.
    async fn route_with_fallback(
        &self,
        query: RouteQuery,
        variant: CandidateVariant,
    ) -> Result<RawCandidateRoute> {
        if query.custom_model.is_none() {
            return self.route(&query, variant).await;
        }

        match self.route(&query, variant).await {
            Ok(route) => Ok(route),
            Err(e) => {
                tracing::warn!(
                    candidate = %variant,
                    error = %e,
                    "Weighted routing request failed, falling back to plain profile"
                );
                self.route(&query.plain(), variant).await
            }
        }
    }

    async fn route(&self, query: &RouteQuery, variant: CandidateVariant) -> Result<RawCandidateRoute> {
        let url = format!("{}/route", self.base_url);

        tracing::debug!(
            candidate = %variant,
            points = query.points.len(),
            weighted = query.custom_model.is_some(),
            "GraphHopper request: {} points, profile {}",
            query.points.len(),
            query.profile
        );

        let mut request = self.client.post(&url).json(query).timeout(self.timeout);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!("routing request after {:?}", self.timeout))
            } else {
                AppError::RoutingApi(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::RoutingApi(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GraphHopperResponse = response
            .json()
            .await
            .map_err(|e| AppError::RoutingApi(format!("Failed to parse response: {}", e)))?;

        let route = body.into_candidate(variant)?;
        tracing::debug!(
            candidate = %variant,
            distance_km = %format!("{:.2}", route.distance_meters / 1000.0),
            path_points = route.points.len(),
            "GraphHopper response: {:.2}km, {} path points",
            route.distance_meters / 1000.0,
            route.points.len()
        );
        Ok(route)
    }
}

#[async_trait]
impl RoundTripRouteProvider for GraphHopperClient {
    async fn generate_round_trip(
        &self,
        origin: &Coordinates,
        distance_meters: f64,
        seed: u64,
        bias: RouteBias,
    ) -> Result<RawCandidateRoute> {
        let mut query = RouteQuery::new(&self.profile, vec![origin.to_lng_lat()]);
        query.algorithm = Some("round_trip".to_string());
        query.round_trip_distance = Some(distance_meters.round());
        query.round_trip_seed = Some(seed);
        if bias.is_enhanced() {
            query = query.weighted(CustomModel::for_bias(bias));
        }

        self.route_with_fallback(query, CandidateVariant::RoundTrip(seed))
            .await
    }
}

#[async_trait]
impl WaypointRouteProvider for GraphHopperClient {
    async fn generate_waypoint_loop(
        &self,
        origin: &Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<RawCandidateRoute> {
        let points = build_loop_points(origin, waypoints);
        if points.len() > MAX_POINTS {
            return Err(AppError::InvalidRequest(format!(
                "Maximum {} points allowed, got {}",
                MAX_POINTS,
                points.len()
            )));
        }

        // Fallback keeps every point, the plain query only drops the weighting
        let query = RouteQuery::new(&self.profile, points).weighted(CustomModel::for_bias(
            RouteBias::scenic(),
        ));
        self.route_with_fallback(query, CandidateVariant::ScenicWaypointFull)
            .await
    }
}

/// Origin -> waypoints -> origin as `[lng, lat]` pairs
fn build_loop_points(origin: &Coordinates, waypoints: &[Coordinates]) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(waypoints.len() + 2);
    points.push(origin.to_lng_lat());
    points.extend(waypoints.iter().map(|w| w.to_lng_lat()));
    points.push(origin.to_lng_lat());
    points
}

// GraphHopper request types

#[derive(Debug, Clone, Serialize)]
struct RouteQuery {
    points: Vec<[f64; 2]>,
    profile: String,
    points_encoded: bool,
    instructions: bool,
    elevation: bool,
    details: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
    #[serde(rename = "round_trip.distance", skip_serializing_if = "Option::is_none")]
    round_trip_distance: Option<f64>,
    #[serde(rename = "round_trip.seed", skip_serializing_if = "Option::is_none")]
    round_trip_seed: Option<u64>,
    /// Custom models need the flexible (non-CH) mode
    #[serde(rename = "ch.disable", skip_serializing_if = "Option::is_none")]
    ch_disable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_model: Option<CustomModel>,
}

impl RouteQuery {
    fn new(profile: &str, points: Vec<[f64; 2]>) -> Self {
        RouteQuery {
            points,
            profile: profile.to_string(),
            points_encoded: false,
            instructions: true,
            elevation: true,
            details: vec!["road_class"],
            algorithm: None,
            round_trip_distance: None,
            round_trip_seed: None,
            ch_disable: None,
            custom_model: None,
        }
    }

    fn weighted(mut self, model: CustomModel) -> Self {
        self.ch_disable = Some(true);
        self.custom_model = Some(model);
        self
    }

    fn plain(&self) -> Self {
        let mut plain = self.clone();
        plain.ch_disable = None;
        plain.custom_model = None;
        plain
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct CustomModel {
    priority: Vec<PriorityRule>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct PriorityRule {
    #[serde(rename = "if")]
    condition: String,
    multiply_by: String,
}

impl PriorityRule {
    fn new(condition: &str, multiply_by: f64) -> Self {
        PriorityRule {
            condition: condition.to_string(),
            multiply_by: multiply_by.to_string(),
        }
    }
}

impl CustomModel {
    fn for_bias(bias: RouteBias) -> Self {
        let mut priority = Vec::new();

        if bias.scenic {
            priority.extend([
                PriorityRule::new(
                    "road_class == TRACK || road_class == PATH || road_class == BRIDLEWAY",
                    1.5,
                ),
                PriorityRule::new("road_class == FOOTWAY || road_class == CYCLEWAY", 1.3),
                PriorityRule::new("road_class == RESIDENTIAL", 0.8),
                PriorityRule::new("road_class == TERTIARY || road_class == SECONDARY", 0.6),
                PriorityRule::new("road_class == PRIMARY", 0.3),
                PriorityRule::new("road_class == TRUNK || road_class == MOTORWAY", 0.1),
                PriorityRule::new(
                    "surface == UNPAVED || surface == GRAVEL || surface == DIRT || surface == GROUND || surface == COMPACTED || surface == GRASS",
                    1.3,
                ),
            ]);
        }

        if bias.avoid_hills {
            priority.extend([
                PriorityRule::new("average_slope >= 8", 0.5),
                PriorityRule::new("average_slope >= 4", 0.8),
            ]);
        }

        CustomModel { priority }
    }
}

// GraphHopper response types

#[derive(Debug, Deserialize)]
struct GraphHopperResponse {
    #[serde(default)]
    paths: Vec<GraphHopperPath>,
}

#[derive(Debug, Deserialize)]
struct GraphHopperPath {
    distance: f64,
    /// milliseconds
    time: u64,
    #[serde(default)]
    ascend: f64,
    #[serde(default)]
    descend: f64,
    points: Option<GraphHopperGeometry>,
    #[serde(default)]
    instructions: Vec<GraphHopperInstruction>,
    #[serde(default)]
    details: GraphHopperDetails,
}

#[derive(Debug, Deserialize)]
struct GraphHopperGeometry {
    /// `[lng, lat]` or `[lng, lat, ele]`
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct GraphHopperInstruction {
    #[serde(default)]
    text: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    time: u64,
    #[serde(default)]
    sign: i32,
    #[serde(default)]
    interval: [usize; 2],
}

#[derive(Debug, Default, Deserialize)]
struct GraphHopperDetails {
    #[serde(default)]
    road_class: Vec<(usize, usize, String)>,
}

impl GraphHopperResponse {
    /// Validate the first path into a candidate. Missing geometry is an error.
    fn into_candidate(self, variant: CandidateVariant) -> Result<RawCandidateRoute> {
        let path = self
            .paths
            .into_iter()
            .next()
            .ok_or_else(|| AppError::RoutingApi("No paths in response".to_string()))?;

        let geometry = path
            .points
            .ok_or_else(|| AppError::RoutingApi("Path has no point data".to_string()))?;

        let points = geometry
            .coordinates
            .iter()
            .map(|c| match c.as_slice() {
                [lng, lat, ..] if Coordinates::new(*lat, *lng).is_ok() => Ok([*lng, *lat]),
                _ => Err(AppError::RoutingApi(format!("Malformed coordinate: {:?}", c))),
            })
            .collect::<Result<Vec<_>>>()?;

        if points.len() < 2 {
            return Err(AppError::RoutingApi(format!(
                "Path has {} points, need at least 2",
                points.len()
            )));
        }

        let last_index = points.len() - 1;
        let road_classes = path
            .details
            .road_class
            .into_iter()
            .filter(|(start, end, _)| start < end && *start <= last_index)
            .map(|(start, end, class)| RoadClassSegment::new(start, end.min(last_index), class))
            .collect();

        let instructions = path
            .instructions
            .into_iter()
            .map(|i| TurnInstruction {
                text: i.text,
                distance_m: i.distance,
                duration_ms: i.time,
                sign: i.sign,
                interval: i.interval,
            })
            .collect();

        Ok(RawCandidateRoute {
            points,
            distance_meters: path.distance,
            ascend_meters: path.ascend,
            descend_meters: path.descend,
            duration_ms: path.time,
            road_classes,
            instructions,
            variant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn origin() -> Coordinates {
        Coordinates::new(54.597, -5.930).unwrap()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = GraphHopperClient::new(
            "http://localhost:8989/".to_string(),
            None,
            "foot".to_string(),
        );
        assert_eq!(client.base_url, "http://localhost:8989");
        assert_eq!(client.timeout, DEFAULT_ROUTING_TIMEOUT);
    }

    #[test]
    fn test_loop_points_are_closed() {
        let wp = [
            Coordinates::new(54.60, -5.92).unwrap(),
            Coordinates::new(54.59, -5.91).unwrap(),
        ];
        let points = build_loop_points(&origin(), &wp);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], points[3]);
        assert_eq!(points[1], [-5.92, 54.60]);
    }

    #[test]
    fn test_weighted_query_serialization() {
        let mut query = RouteQuery::new("foot", vec![origin().to_lng_lat()]);
        query.algorithm = Some("round_trip".to_string());
        query.round_trip_distance = Some(5000.0);
        query.round_trip_seed = Some(97);
        let query = query.weighted(CustomModel::for_bias(RouteBias::scenic()));

        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["round_trip.distance"], json!(5000.0));
        assert_eq!(value["round_trip.seed"], json!(97));
        assert_eq!(value["ch.disable"], json!(true));
        let rules = value["custom_model"]["priority"].as_array().unwrap();
        assert!(rules.iter().any(|r| r["if"]
            .as_str()
            .unwrap()
            .contains("road_class == PATH")));
        assert!(rules.iter().any(|r| r["if"].as_str().unwrap().contains("UNPAVED")));
    }

    #[test]
    fn test_plain_query_drops_weighting_only() {
        let query = RouteQuery::new("foot", vec![origin().to_lng_lat(); 3])
            .weighted(CustomModel::for_bias(RouteBias::scenic()));
        let plain = query.plain();
        assert!(plain.custom_model.is_none());
        assert!(plain.ch_disable.is_none());
        assert_eq!(plain.points.len(), 3);

        let value = serde_json::to_value(&plain).unwrap();
        assert!(value.get("custom_model").is_none());
    }

    #[test]
    fn test_avoid_hills_adds_slope_rules() {
        let model = CustomModel::for_bias(RouteBias {
            scenic: false,
            avoid_hills: true,
        });
        assert_eq!(model.priority.len(), 2);
        assert!(model.priority[0].condition.contains("average_slope"));
    }

    #[test]
    fn test_parse_response() {
        let body: GraphHopperResponse = serde_json::from_value(json!({
            "paths": [{
                "distance": 5123.4,
                "time": 3_600_000,
                "ascend": 42.0,
                "descend": 41.5,
                "points": {
                    "type": "LineString",
                    "coordinates": [[-5.93, 54.597, 10.0], [-5.92, 54.60, 12.0], [-5.93, 54.597, 10.0]]
                },
                "instructions": [
                    {"text": "Continue", "distance": 100.0, "time": 60000, "sign": 0, "interval": [0, 1]}
                ],
                "details": {"road_class": [[0, 1, "path"], [1, 9, "residential"]]}
            }]
        }))
        .unwrap();

        let route = body.into_candidate(CandidateVariant::RoundTrip(3)).unwrap();
        assert_eq!(route.points.len(), 3);
        assert_eq!(route.points[1], [-5.92, 54.60]);
        assert_eq!(route.duration_ms, 3_600_000);
        assert_eq!(route.ascend_meters, 42.0);
        assert_eq!(route.road_classes.len(), 2);
        // End index clamped to the last point
        assert_eq!(route.road_classes[1].end, 2);
        assert_eq!(route.instructions[0].text, "Continue");
        assert_eq!(route.variant, CandidateVariant::RoundTrip(3));
    }

    #[test]
    fn test_missing_points_is_error() {
        let body: GraphHopperResponse = serde_json::from_value(json!({
            "paths": [{"distance": 10.0, "time": 5}]
        }))
        .unwrap();
        assert!(body.into_candidate(CandidateVariant::ScenicWaypointFull).is_err());

        let empty: GraphHopperResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.into_candidate(CandidateVariant::RoundTrip(0)).is_err());
    }

    #[test]
    fn test_malformed_coordinate_is_error() {
        let body: GraphHopperResponse = serde_json::from_value(json!({
            "paths": [{
                "distance": 10.0,
                "time": 5,
                "points": {"coordinates": [[-5.93], [-5.92, 54.6]]}
            }]
        }))
        .unwrap();
        assert!(body.into_candidate(CandidateVariant::RoundTrip(0)).is_err());
    }
}
