use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Park,
    River,
    Trail,
    Coastline,
    Lake,
    Footpath,
    GreenSpace,
}

impl FeatureType {
    /// Preference weight when picking loop waypoints (higher is better)
    pub fn priority(&self) -> u8 {
        match self {
            FeatureType::Park => 5,
            FeatureType::River | FeatureType::Trail | FeatureType::Coastline => 4,
            FeatureType::Lake => 3,
            FeatureType::Footpath => 2,
            FeatureType::GreenSpace => 1,
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureType::Park => "park",
            FeatureType::River => "river",
            FeatureType::Trail => "trail",
            FeatureType::Coastline => "coastline",
            FeatureType::Lake => "lake",
            FeatureType::Footpath => "footpath",
            FeatureType::GreenSpace => "green_space",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "park" => Ok(FeatureType::Park),
            "river" => Ok(FeatureType::River),
            "trail" => Ok(FeatureType::Trail),
            "coastline" => Ok(FeatureType::Coastline),
            "lake" => Ok(FeatureType::Lake),
            "footpath" => Ok(FeatureType::Footpath),
            "green_space" => Ok(FeatureType::GreenSpace),
            _ => Err(format!("Invalid feature type: {}", s)),
        }
    }
}

/// A discovered geographic feature, positioned relative to the loop origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenicFeature {
    pub feature_type: FeatureType,
    pub name: String,
    pub position: Coordinates,
    /// Degrees in [0, 360) from the origin
    pub bearing_from_origin: f64,
    pub distance_km_from_origin: f64,
}

impl ScenicFeature {
    /// Create a feature, deriving bearing and distance from `origin`
    pub fn new(
        feature_type: FeatureType,
        name: impl Into<String>,
        position: Coordinates,
        origin: &Coordinates,
    ) -> Self {
        ScenicFeature {
            feature_type,
            name: name.into(),
            position,
            bearing_from_origin: origin.bearing_to(&position),
            distance_km_from_origin: origin.distance_to(&position),
        }
    }
}
