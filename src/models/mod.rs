pub mod candidate;
pub mod coordinates;
pub mod feature;
pub mod geo;
pub mod route;

pub use candidate::{
    CandidateVariant, RawCandidateRoute, RoadClassSegment, RouteBias, TurnInstruction,
};
pub use coordinates::Coordinates;
pub use feature::{FeatureType, ScenicFeature};
pub use route::{Difficulty, GeneratedRoute, RouteRequest};
