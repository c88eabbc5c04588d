use crate::constants::*;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub graphhopper_url: String,
    /// Optional: self-hosted GraphHopper instances usually run without a key
    pub graphhopper_api_key: Option<String>,
    pub graphhopper_profile: String,
    pub overpass_url: String,
    /// Popularity scoring is disabled (always 0) when unset
    pub popularity_url: Option<String>,
    pub route_generator: RouteGeneratorConfig,
}

/// Tuning knobs for candidate generation, filtering and selection.
///
/// The thresholds are empirical; they are kept as overridable defaults rather
/// than derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeneratorConfig {
    /// Offsets added to the per-call base seed, one round-trip request each.
    /// Spaced apart because adjacent seeds yield near-identical loops.
    pub round_trip_seed_offsets: Vec<u64>,

    /// End-to-origin distance (km) at which loop quality reaches 0
    pub closure_normalizer_km: f64,
    pub min_loop_quality_round_trip: f64,
    pub min_loop_quality_scenic: f64,

    /// Grid cell edge (m) used to quantize paths for backtrack detection
    pub backtrack_cell_m: f64,
    pub max_backtrack_ratio: f64,

    /// Isoperimetric ratio mapped to compactness 1.0
    pub compactness_normalizer: f64,
    pub min_compactness: f64,

    pub angular_samples: usize,
    pub angular_min_radius_m: f64,
    pub min_angular_spread: f64,

    pub proximity_samples: usize,
    pub proximity_min_radius_m: f64,
    /// Minimum separation along the route (fraction of length) for a pair to count
    pub proximity_min_separation: f64,
    pub proximity_close_m: f64,
    pub max_proximity_overlap: f64,

    /// Non-scenic candidates below this are dropped when trails are preferred
    pub min_terrain_score: f64,

    pub u_turn_angle_deg: f64,
    pub u_turn_samples: usize,
    /// Relative distance error above which a route is flagged
    pub distance_tolerance: f64,
    /// Highway share above which the highway issue becomes HIGH severity
    pub highway_high_share: f64,

    /// Minimum normalized bearing difference between selected routes
    pub diversity_threshold: f64,
    pub max_routes: usize,

    /// Scenic discovery radius as a fraction of target distance
    pub scenic_search_radius_factor: f64,

    pub routing_timeout_secs: u64,
    pub discovery_timeout_secs: u64,
    pub popularity_timeout_secs: u64,
}

impl Default for RouteGeneratorConfig {
    fn default() -> Self {
        Self {
            round_trip_seed_offsets: vec![0, 97, 211, 353, 499, 661],
            closure_normalizer_km: 1.0,
            min_loop_quality_round_trip: 0.7,
            min_loop_quality_scenic: 0.5,
            backtrack_cell_m: 30.0,
            max_backtrack_ratio: 0.25,
            compactness_normalizer: 0.10,
            min_compactness: 0.15,
            angular_samples: 20,
            angular_min_radius_m: 100.0,
            min_angular_spread: 0.25,
            proximity_samples: 100,
            proximity_min_radius_m: 150.0,
            proximity_min_separation: 0.30,
            proximity_close_m: 60.0,
            max_proximity_overlap: 0.25,
            min_terrain_score: 0.1,
            u_turn_angle_deg: 150.0,
            u_turn_samples: 50,
            distance_tolerance: 0.25,
            highway_high_share: 0.3,
            diversity_threshold: 0.15,
            max_routes: 3,
            scenic_search_radius_factor: 0.35,
            routing_timeout_secs: 30,
            discovery_timeout_secs: 10,
            popularity_timeout_secs: 10,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_seed_offsets(raw: &str) -> Result<Vec<u64>, String> {
    let offsets = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| format!("Invalid ROUTE_SEED_OFFSETS entry: '{}'", s))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if offsets.is_empty() {
        return Err("ROUTE_SEED_OFFSETS must contain at least one offset".to_string());
    }
    Ok(offsets)
}

impl RouteGeneratorConfig {
    pub fn from_env() -> Result<Self, String> {
        let d = Self::default();

        let round_trip_seed_offsets = match env::var("ROUTE_SEED_OFFSETS") {
            Ok(raw) => parse_seed_offsets(&raw)?,
            Err(_) => d.round_trip_seed_offsets,
        };

        let config = Self {
            round_trip_seed_offsets,
            closure_normalizer_km: env_or("ROUTE_CLOSURE_NORMALIZER_KM", d.closure_normalizer_km)?,
            min_loop_quality_round_trip: env_or(
                "ROUTE_MIN_LOOP_QUALITY_ROUND_TRIP",
                d.min_loop_quality_round_trip,
            )?,
            min_loop_quality_scenic: env_or(
                "ROUTE_MIN_LOOP_QUALITY_SCENIC",
                d.min_loop_quality_scenic,
            )?,
            backtrack_cell_m: env_or("ROUTE_BACKTRACK_CELL_M", d.backtrack_cell_m)?,
            max_backtrack_ratio: env_or("ROUTE_MAX_BACKTRACK_RATIO", d.max_backtrack_ratio)?,
            compactness_normalizer: env_or(
                "ROUTE_COMPACTNESS_NORMALIZER",
                d.compactness_normalizer,
            )?,
            min_compactness: env_or("ROUTE_MIN_COMPACTNESS", d.min_compactness)?,
            angular_samples: env_or("ROUTE_ANGULAR_SAMPLES", d.angular_samples)?,
            angular_min_radius_m: env_or("ROUTE_ANGULAR_MIN_RADIUS_M", d.angular_min_radius_m)?,
            min_angular_spread: env_or("ROUTE_MIN_ANGULAR_SPREAD", d.min_angular_spread)?,
            proximity_samples: env_or("ROUTE_PROXIMITY_SAMPLES", d.proximity_samples)?,
            proximity_min_radius_m: env_or(
                "ROUTE_PROXIMITY_MIN_RADIUS_M",
                d.proximity_min_radius_m,
            )?,
            proximity_min_separation: env_or(
                "ROUTE_PROXIMITY_MIN_SEPARATION",
                d.proximity_min_separation,
            )?,
            proximity_close_m: env_or("ROUTE_PROXIMITY_CLOSE_M", d.proximity_close_m)?,
            max_proximity_overlap: env_or(
                "ROUTE_MAX_PROXIMITY_OVERLAP",
                d.max_proximity_overlap,
            )?,
            min_terrain_score: env_or("ROUTE_MIN_TERRAIN_SCORE", d.min_terrain_score)?,
            u_turn_angle_deg: env_or("ROUTE_U_TURN_ANGLE_DEG", d.u_turn_angle_deg)?,
            u_turn_samples: env_or("ROUTE_U_TURN_SAMPLES", d.u_turn_samples)?,
            distance_tolerance: env_or("ROUTE_DISTANCE_TOLERANCE", d.distance_tolerance)?,
            highway_high_share: env_or("ROUTE_HIGHWAY_HIGH_SHARE", d.highway_high_share)?,
            diversity_threshold: env_or("ROUTE_DIVERSITY_THRESHOLD", d.diversity_threshold)?,
            max_routes: env_or("ROUTE_MAX_ROUTES", d.max_routes)?,
            scenic_search_radius_factor: env_or(
                "ROUTE_SCENIC_SEARCH_RADIUS_FACTOR",
                d.scenic_search_radius_factor,
            )?,
            routing_timeout_secs: env_or("ROUTE_ROUTING_TIMEOUT_SECS", d.routing_timeout_secs)?,
            discovery_timeout_secs: env_or(
                "ROUTE_DISCOVERY_TIMEOUT_SECS",
                d.discovery_timeout_secs,
            )?,
            popularity_timeout_secs: env_or(
                "ROUTE_POPULARITY_TIMEOUT_SECS",
                d.popularity_timeout_secs,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_routes == 0 {
            return Err("ROUTE_MAX_ROUTES must be at least 1".to_string());
        }
        if self.backtrack_cell_m <= 0.0 || self.closure_normalizer_km <= 0.0 {
            return Err("Grid cell size and closure normalizer must be positive".to_string());
        }
        if self.compactness_normalizer <= 0.0 {
            return Err("ROUTE_COMPACTNESS_NORMALIZER must be positive".to_string());
        }
        if self.angular_samples == 0 || self.proximity_samples < 2 || self.u_turn_samples < 3 {
            return Err("Sample counts are too small".to_string());
        }
        Ok(())
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_secs(self.routing_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn popularity_timeout(&self) -> Duration {
        Duration::from_secs(self.popularity_timeout_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            graphhopper_url: env::var("GRAPHHOPPER_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPHHOPPER_URL.to_string()),
            graphhopper_api_key: env::var("GRAPHHOPPER_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            graphhopper_profile: env::var("GRAPHHOPPER_PROFILE")
                .unwrap_or_else(|_| DEFAULT_GRAPHHOPPER_PROFILE.to_string()),
            overpass_url: env::var("OVERPASS_URL")
                .unwrap_or_else(|_| DEFAULT_OVERPASS_URL.to_string()),
            popularity_url: env::var("POPULARITY_URL").ok().filter(|u| !u.is_empty()),
            route_generator: RouteGeneratorConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
