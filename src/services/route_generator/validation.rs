//! Structural checks on a finished route.
//!
//! Pure function of the route geometry, its reported distance and road mix;
//! no provider state is consulted.

use super::geometry::evenly_spaced_indices;
use super::terrain::RoadMix;
use crate::config::RouteGeneratorConfig;
use crate::constants::REPEATED_EDGE_DECIMALS;
use crate::models::geo::turn_angle;
use crate::models::Coordinates;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    DistanceMismatch,
    UTurn,
    RepeatedSegment,
    Highway,
    TooFewPoints,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::DistanceMismatch => "DISTANCE_MISMATCH",
            IssueKind::UTurn => "U_TURN",
            IssueKind::RepeatedSegment => "REPEATED_SEGMENT",
            IssueKind::Highway => "HIGHWAY",
            IssueKind::TooFewPoints => "TOO_FEW_POINTS",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub location: Option<Coordinates>,
    pub severity: Severity,
}

impl Issue {
    fn new(kind: IssueKind, severity: Severity, location: Option<Coordinates>) -> Self {
        Issue {
            kind,
            location,
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<Issue>,
    pub quality_score: f64,
}

impl ValidationResult {
    fn from_issues(issues: Vec<Issue>) -> Self {
        let high = issues.iter().filter(|i| i.severity == Severity::High).count();
        let medium = issues.len() - high;
        let quality_score = (1.0 - 0.3 * high as f64 - 0.1 * medium as f64).clamp(0.0, 1.0);

        ValidationResult {
            is_valid: high < 2,
            issues,
            quality_score,
        }
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

pub fn validate_route(
    coordinates: &[Coordinates],
    actual_distance_m: f64,
    target_distance_m: f64,
    road_mix: &RoadMix,
    config: &RouteGeneratorConfig,
) -> ValidationResult {
    if coordinates.len() < 3 {
        return ValidationResult {
            is_valid: false,
            issues: vec![Issue::new(IssueKind::TooFewPoints, Severity::High, None)],
            quality_score: 0.0,
        };
    }

    let mut issues = Vec::new();

    if target_distance_m > 0.0 {
        let deviation = (actual_distance_m - target_distance_m).abs() / target_distance_m;
        if deviation > config.distance_tolerance {
            issues.push(Issue::new(
                IssueKind::DistanceMismatch,
                Severity::High,
                None,
            ));
        }
    }

    issues.extend(find_u_turns(coordinates, config));
    issues.extend(find_repeated_segments(coordinates));

    if road_mix.highway > 0.0 {
        let severity = if road_mix.highway > config.highway_high_share {
            Severity::High
        } else {
            Severity::Medium
        };
        issues.push(Issue::new(IssueKind::Highway, severity, None));
    }

    ValidationResult::from_issues(issues)
}

fn find_u_turns(coordinates: &[Coordinates], config: &RouteGeneratorConfig) -> Vec<Issue> {
    let mut sampled: Vec<Coordinates> =
        evenly_spaced_indices(coordinates.len(), config.u_turn_samples)
            .into_iter()
            .map(|i| coordinates[i])
            .collect();
    // Zero-length legs have no heading
    sampled.dedup();

    sampled
        .windows(3)
        .filter(|w| turn_angle(&w[0], &w[1], &w[2]) > config.u_turn_angle_deg)
        .map(|w| Issue::new(IssueKind::UTurn, Severity::High, Some(w[1])))
        .collect()
}

/// One issue per distinct directed edge that appears more than once.
fn find_repeated_segments(coordinates: &[Coordinates]) -> Vec<Issue> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut issues = Vec::new();

    for w in coordinates.windows(2) {
        let from = w[0].grid_key(REPEATED_EDGE_DECIMALS);
        let to = w[1].grid_key(REPEATED_EDGE_DECIMALS);
        if from == to {
            continue;
        }
        let edge = (from, to);
        if !seen.insert(edge) && reported.insert(edge) {
            issues.push(Issue::new(
                IssueKind::RepeatedSegment,
                Severity::Medium,
                Some(w[0]),
            ));
        }
    }

    issues
}
