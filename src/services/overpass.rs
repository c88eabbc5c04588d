use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, FeatureType, ScenicFeature};
use crate::services::providers::ScenicFeatureDiscovery;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl OverpassClient {
    pub fn new(endpoint: String) -> Self {
        OverpassClient {
            client: Client::new(),
            endpoint,
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Query scenic features around `origin`. Unlike [`ScenicFeatureDiscovery::find_features`]
    /// this surfaces upstream errors.
    pub async fn query_features(
        &self,
        origin: &Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<ScenicFeature>> {
        let query = build_query(origin, radius_meters, self.timeout.as_secs());
        tracing::debug!("Overpass scenic query: {}", query);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!("data={}", urlencoding::encode(&query)))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("feature discovery after {:?}", self.timeout))
                } else {
                    AppError::OverpassApi(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::OverpassApi(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let api_response: OverpassResponse = response
            .json()
            .await
            .map_err(|e| AppError::OverpassApi(format!("Failed to parse response: {}", e)))?;

        Ok(convert_elements(api_response.elements, origin, radius_meters))
    }
}

#[async_trait]
impl ScenicFeatureDiscovery for OverpassClient {
    /// Never fails: discovery problems degrade to an empty feature list.
    async fn find_features(
        &self,
        origin: &Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<ScenicFeature>> {
        match self.query_features(origin, radius_meters).await {
            Ok(features) => {
                tracing::info!(
                    count = features.len(),
                    radius_m = radius_meters,
                    "Scenic discovery found {} features",
                    features.len()
                );
                Ok(features)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Scenic discovery failed, continuing without features"
                );
                Ok(Vec::new())
            }
        }
    }
}

fn build_query(origin: &Coordinates, radius_meters: f64, timeout_secs: u64) -> String {
    let around = format!("(around:{},{},{})", radius_meters, origin.lat, origin.lng);
    let selectors = [
        r#"nwr["leisure"~"^(park|garden|nature_reserve)$"]"#,
        r#"nwr["boundary"="protected_area"]"#,
        r#"way["waterway"~"^(river|stream|canal)$"]["name"]"#,
        r#"nwr["natural"="water"]["name"]"#,
        r#"way["natural"~"^(coastline|beach)$"]"#,
        r#"way["highway"~"^(footway|cycleway|path|bridleway|track)$"]["name"]"#,
        r#"relation["route"="hiking"]"#,
        r#"nwr["landuse"~"^(grass|meadow|forest|recreation_ground|village_green)$"]["name"]"#,
        r#"nwr["natural"="wood"]["name"]"#,
    ];

    let mut query_parts = vec![format!("[out:json][timeout:{}];(", timeout_secs.max(1))];
    for selector in selectors {
        query_parts.push(format!("{}{};", selector, around));
    }
    query_parts.push(format!(");out center {};", OVERPASS_RESULT_LIMIT));
    query_parts.join("\n")
}

/// Map elements to features: classify, drop out-of-ring positions, dedupe on a ~100 m grid.
fn convert_elements(
    elements: Vec<OverpassElement>,
    origin: &Coordinates,
    radius_meters: f64,
) -> Vec<ScenicFeature> {
    let mut seen_cells = HashSet::new();

    elements
        .into_iter()
        .filter_map(|elem| {
            let (lat, lon) = match (elem.lat, elem.lon, &elem.center) {
                (Some(lat), Some(lon), _) => (lat, lon),
                (_, _, Some(center)) => (center.lat, center.lon),
                _ => return None,
            };
            let position = Coordinates::new(lat, lon).ok()?;
            let feature_type = infer_feature_type(&elem.tags)?;

            let distance_m = origin.distance_m(&position);
            if distance_m < SCENIC_MIN_FEATURE_DISTANCE_M || distance_m > radius_meters {
                return None;
            }
            if !seen_cells.insert(position.grid_key(SCENIC_DEDUP_DECIMALS)) {
                return None;
            }

            let name = elem
                .tags
                .get("name")
                .cloned()
                .unwrap_or_else(|| feature_type.to_string());

            Some(ScenicFeature::new(feature_type, name, position, origin))
        })
        .collect()
}

fn infer_feature_type(tags: &HashMap<String, String>) -> Option<FeatureType> {
    // More specific tags first
    check_route_tags(tags)
        .or_else(|| check_leisure_tags(tags))
        .or_else(|| check_boundary_tags(tags))
        .or_else(|| check_waterway_tags(tags))
        .or_else(|| check_natural_tags(tags))
        .or_else(|| check_highway_tags(tags))
        .or_else(|| check_landuse_tags(tags))
}

fn check_route_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("route").and_then(|r| match r.as_str() {
        "hiking" | "foot" => Some(FeatureType::Trail),
        _ => None,
    })
}

fn check_leisure_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("leisure").and_then(|l| match l.as_str() {
        "park" | "nature_reserve" => Some(FeatureType::Park),
        "garden" => Some(FeatureType::GreenSpace),
        _ => None,
    })
}

fn check_boundary_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("boundary").and_then(|b| match b.as_str() {
        "protected_area" => Some(FeatureType::Park),
        _ => None,
    })
}

fn check_waterway_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("waterway").and_then(|w| match w.as_str() {
        "river" | "stream" | "canal" => Some(FeatureType::River),
        _ => None,
    })
}

fn check_natural_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("natural").and_then(|n| match n.as_str() {
        "water" => Some(FeatureType::Lake),
        "coastline" | "beach" => Some(FeatureType::Coastline),
        "wood" => Some(FeatureType::GreenSpace),
        _ => None,
    })
}

fn check_highway_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("highway").and_then(|h| match h.as_str() {
        "path" | "bridleway" | "track" => Some(FeatureType::Trail),
        "footway" | "cycleway" => Some(FeatureType::Footpath),
        _ => None,
    })
}

fn check_landuse_tags(tags: &HashMap<String, String>) -> Option<FeatureType> {
    tags.get("landuse").and_then(|l| match l.as_str() {
        "grass" | "meadow" | "forest" | "recreation_ground" | "village_green" => {
            Some(FeatureType::GreenSpace)
        }
        _ => None,
    })
}

// Overpass API response types

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}
