//! Stable application-wide constants.
//!
//! Values here are structural invariants and default fallbacks for
//! env-var-based configuration. Empirically tuned thresholds of the candidate
//! pipeline live in [`RouteGeneratorConfig`](crate::config::RouteGeneratorConfig)
//! so they can be adjusted without a rebuild.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Upstream defaults ---

/// Public GraphHopper routing API.
pub const DEFAULT_GRAPHHOPPER_URL: &str = "https://graphhopper.com/api/1";
/// GraphHopper vehicle profile used for running loops.
pub const DEFAULT_GRAPHHOPPER_PROFILE: &str = "foot";
/// Main public Overpass endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

// --- Geometry ---

/// Mean Earth radius used by every great-circle computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Metres per degree of latitude on the mean sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_KM * 1000.0 * std::f64::consts::PI / 180.0;

// --- Scenic discovery ---

/// Features closer than this to the origin are useless as loop waypoints.
pub const SCENIC_MIN_FEATURE_DISTANCE_M: f64 = 200.0;
/// Decimal places used to collapse duplicate features (~100 m cells).
pub const SCENIC_DEDUP_DECIMALS: u32 = 3;
/// Result cap for a single Overpass discovery query.
pub const OVERPASS_RESULT_LIMIT: usize = 300;

// --- Waypoint selection ---

/// Lower bound of the feature ring, as a fraction of the ideal loop radius.
pub const WAYPOINT_RING_MIN_FACTOR: f64 = 0.3;
/// Upper bound of the feature ring, as a fraction of the ideal loop radius.
pub const WAYPOINT_RING_MAX_FACTOR: f64 = 1.2;
/// Below this many ring features the whole discovered set is used instead.
pub const WAYPOINT_MIN_RING_FEATURES: usize = 3;
/// Minimum filled quadrants before falling back to top-N by priority.
pub const WAYPOINT_MIN_QUADRANTS: usize = 2;
/// Number of features kept by the priority fallback.
pub const WAYPOINT_FALLBACK_COUNT: usize = 3;

// --- Metrics ---

/// Compass sectors used by the angular spread metric.
pub const ANGULAR_SECTORS: usize = 8;
/// Decimal places for repeated-edge detection in validation (~11 m).
pub const REPEATED_EDGE_DECIMALS: u32 = 4;
/// Points sampled between 20% and 60% of the route for its dominant bearing.
pub const DOMINANT_BEARING_SAMPLES: usize = 10;
pub const DOMINANT_BEARING_START_FRACTION: f64 = 0.2;
pub const DOMINANT_BEARING_END_FRACTION: f64 = 0.6;

// --- Difficulty classification ---

/// Climb per km (m/km) and distance (km) limits for "easy".
pub const EASY_MAX_GAIN_PER_KM: f64 = 10.0;
pub const EASY_MAX_DISTANCE_KM: f64 = 8.0;
/// Climb per km (m/km) and distance (km) limits for "moderate".
pub const MODERATE_MAX_GAIN_PER_KM: f64 = 25.0;
pub const MODERATE_MAX_DISTANCE_KM: f64 = 15.0;

// --- Request validation ---

pub const MIN_REQUEST_DISTANCE_KM: f64 = 1.0;
pub const MAX_REQUEST_DISTANCE_KM: f64 = 50.0;
