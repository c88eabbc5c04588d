use crate::models::{Coordinates, RoadClassSegment};
use serde::Serialize;

/// Share of a route's classified length per surface family, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RoadMix {
    pub highway: f64,
    pub residential: f64,
    pub trail: f64,
    pub path: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoadFamily {
    Highway,
    Residential,
    Trail,
    Path,
    Other,
}

fn classify(road_class: &str) -> RoadFamily {
    match road_class.to_ascii_lowercase().as_str() {
        "motorway" | "motorway_link" | "trunk" | "trunk_link" | "primary" | "primary_link" => {
            RoadFamily::Highway
        }
        "residential" | "tertiary" | "tertiary_link" | "secondary" | "secondary_link" => {
            RoadFamily::Residential
        }
        "track" | "bridleway" => RoadFamily::Trail,
        "path" | "footway" | "cycleway" | "pedestrian" | "steps" => RoadFamily::Path,
        _ => RoadFamily::Other,
    }
}

impl RoadMix {
    /// Sum segment lengths by family and normalise by the total classified length.
    /// Segment indices past the end of `coordinates` are clamped.
    pub fn from_segments(coordinates: &[Coordinates], segments: &[RoadClassSegment]) -> Self {
        if coordinates.len() < 2 || segments.is_empty() {
            return RoadMix::default();
        }
        let last = coordinates.len() - 1;

        let mut mix = RoadMix::default();
        let mut total = 0.0;
        for segment in segments {
            let start = segment.start.min(last);
            let end = segment.end.min(last);
            if end <= start {
                continue;
            }
            let length: f64 = coordinates[start..=end]
                .windows(2)
                .map(|w| w[0].distance_m(&w[1]))
                .sum();
            total += length;

            match classify(&segment.road_class) {
                RoadFamily::Highway => mix.highway += length,
                RoadFamily::Residential => mix.residential += length,
                RoadFamily::Trail => mix.trail += length,
                RoadFamily::Path => mix.path += length,
                RoadFamily::Other => {}
            }
        }

        if total <= 0.0 {
            return RoadMix::default();
        }
        RoadMix {
            highway: mix.highway / total,
            residential: mix.residential / total,
            trail: mix.trail / total,
            path: mix.path / total,
        }
    }

    /// Preference for off-road mileage, in [0, 1].
    pub fn terrain_score(&self) -> f64 {
        (1.5 * (self.trail + self.path) - 0.5 * self.residential - 2.0 * self.highway)
            .clamp(0.0, 1.0)
    }
}
