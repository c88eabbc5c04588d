use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a candidate came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", tag = "kind", content = "seed")]
pub enum CandidateVariant {
    RoundTrip(u64),
    ScenicWaypointFull,
    ScenicWaypointReversed,
    ScenicWaypointSubset,
}

impl CandidateVariant {
    /// Waypoint loops detour towards features on purpose
    pub fn is_scenic(&self) -> bool {
        !matches!(self, CandidateVariant::RoundTrip(_))
    }
}

impl fmt::Display for CandidateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateVariant::RoundTrip(seed) => write!(f, "round_trip:{}", seed),
            CandidateVariant::ScenicWaypointFull => write!(f, "scenic:full"),
            CandidateVariant::ScenicWaypointReversed => write!(f, "scenic:reversed"),
            CandidateVariant::ScenicWaypointSubset => write!(f, "scenic:subset"),
        }
    }
}

/// Request shaping for round-trip generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteBias {
    /// Prefer trails, paths and unpaved surfaces
    pub scenic: bool,
    /// Penalise steep edges
    pub avoid_hills: bool,
}

impl RouteBias {
    pub fn scenic() -> Self {
        RouteBias {
            scenic: true,
            avoid_hills: false,
        }
    }

    /// Whether an enhanced (weighted) request is needed at all
    pub fn is_enhanced(&self) -> bool {
        self.scenic || self.avoid_hills
    }
}

/// A contiguous run of points sharing one road class.
/// `start`/`end` are indices into the candidate's point list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoadClassSegment {
    pub start: usize,
    pub end: usize,
    pub road_class: String,
}

impl RoadClassSegment {
    pub fn new(start: usize, end: usize, road_class: impl Into<String>) -> Self {
        RoadClassSegment {
            start,
            end,
            road_class: road_class.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnInstruction {
    pub text: String,
    pub distance_m: f64,
    pub duration_ms: u64,
    /// Provider turn sign (0 = continue, negative = left, positive = right)
    pub sign: i32,
    /// First and last point index this instruction covers
    pub interval: [usize; 2],
}

/// A validated provider response; consumed once by the metrics pipeline.
#[derive(Debug, Clone)]
pub struct RawCandidateRoute {
    /// GeoJSON `[lng, lat]` pairs
    pub points: Vec<[f64; 2]>,
    pub distance_meters: f64,
    pub ascend_meters: f64,
    pub descend_meters: f64,
    pub duration_ms: u64,
    pub road_classes: Vec<RoadClassSegment>,
    pub instructions: Vec<TurnInstruction>,
    pub variant: CandidateVariant,
}

impl RawCandidateRoute {
    pub fn is_scenic(&self) -> bool {
        self.variant.is_scenic()
    }

    /// Re-tag provenance; providers cannot tell which waypoint variant they served
    pub fn with_variant(mut self, variant: CandidateVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Convert the raw point list, dropping anything out of range
    pub fn to_coordinates(&self) -> Vec<Coordinates> {
        self.points
            .iter()
            .filter_map(|p| Coordinates::from_lng_lat(*p).ok())
            .collect()
    }
}
