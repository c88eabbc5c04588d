pub mod graphhopper;
pub mod overpass;
pub mod polyline;
pub mod popularity;
pub mod providers;
pub mod route_generator;
