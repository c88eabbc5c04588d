use crate::constants::*;
use crate::models::{CandidateVariant, Coordinates, TurnInstruction};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One route generation call's input. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinates,
    pub target_distance_km: f64,
    pub prefer_trails: bool,
    pub avoid_hills: bool,
}

impl RouteRequest {
    pub fn new(origin: Coordinates, target_distance_km: f64) -> Self {
        RouteRequest {
            origin,
            target_distance_km,
            prefer_trails: false,
            avoid_hills: false,
        }
    }

    pub fn with_prefer_trails(mut self, prefer_trails: bool) -> Self {
        self.prefer_trails = prefer_trails;
        self
    }

    pub fn with_avoid_hills(mut self, avoid_hills: bool) -> Self {
        self.avoid_hills = avoid_hills;
        self
    }

    pub fn target_distance_meters(&self) -> f64 {
        self.target_distance_km * 1000.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl Difficulty {
    /// Classify by climb per kilometre and total length
    pub fn classify(elevation_gain_m: f64, distance_km: f64) -> Self {
        let gain_per_km = if distance_km > 0.0 {
            elevation_gain_m / distance_km
        } else {
            f64::INFINITY
        };

        if gain_per_km < EASY_MAX_GAIN_PER_KM && distance_km < EASY_MAX_DISTANCE_KM {
            Difficulty::Easy
        } else if gain_per_km < MODERATE_MAX_GAIN_PER_KM && distance_km < MODERATE_MAX_DISTANCE_KM
        {
            Difficulty::Moderate
        } else {
            Difficulty::Hard
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Moderate => write!(f, "moderate"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A finished running loop handed back to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRoute {
    pub id: Uuid,
    /// Google encoded polyline, precision 1e5
    pub polyline: String,
    pub coordinates: Vec<Coordinates>,
    pub distance_meters: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub duration_seconds: u64,
    pub difficulty: Difficulty,
    pub popularity_score: f64,
    pub quality_score: f64,
    pub loop_quality: f64,
    pub backtrack_ratio: f64,
    pub total_score: f64,
    pub variant: CandidateVariant,
    pub turn_instructions: Vec<TurnInstruction>,
}

// Request/Response types for API endpoints

#[derive(Debug, Deserialize)]
pub struct LoopRouteRequest {
    pub start_point: Coordinates,
    pub distance_km: f64,
    #[serde(default)]
    pub prefer_trails: bool,
    #[serde(default)]
    pub avoid_hills: bool,
}

impl LoopRouteRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_REQUEST_DISTANCE_KM..=MAX_REQUEST_DISTANCE_KM).contains(&self.distance_km) {
            return Err(format!(
                "distance_km must be between {} and {}",
                MIN_REQUEST_DISTANCE_KM, MAX_REQUEST_DISTANCE_KM
            ));
        }
        // Deserialization bypasses Coordinates::new
        Coordinates::new(self.start_point.lat, self.start_point.lng)?;
        Ok(())
    }

    pub fn into_route_request(self) -> RouteRequest {
        RouteRequest::new(self.start_point, self.distance_km)
            .with_prefer_trails(self.prefer_trails)
            .with_avoid_hills(self.avoid_hills)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteResponse {
    pub routes: Vec<GeneratedRoute>,
}
