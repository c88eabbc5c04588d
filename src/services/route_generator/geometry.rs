use crate::models::geo::{self, LocalProjection};
use crate::models::Coordinates;

/// Signed polygon area via the Shoelace formula, planar (x, y) input.
/// The ring is closed implicitly.
pub fn shoelace_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = points.len();
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].0 * points[j].1;
        area -= points[j].0 * points[i].1;
    }

    area / 2.0
}

/// Closed-ring perimeter of planar points.
pub fn ring_perimeter(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len();
    (0..n)
        .map(|i| {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % n];
            ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
        })
        .sum()
}

/// 4πA/P² of the route polygon in a local projection around `origin`.
/// 1.0 for a circle, 0.0 for degenerate input.
pub fn isoperimetric_ratio(path: &[Coordinates], origin: &Coordinates) -> f64 {
    if path.len() < 3 {
        return 0.0;
    }

    let projection = LocalProjection::new(*origin);
    let planar: Vec<(f64, f64)> = path.iter().map(|p| projection.project(p)).collect();

    let area = shoelace_area(&planar).abs();
    let perimeter = ring_perimeter(&planar);
    if perimeter < 1e-9 {
        return 0.0;
    }

    (4.0 * std::f64::consts::PI * area) / (perimeter * perimeter)
}

/// Cumulative great-circle distance (meters) at each point; first entry is 0.
pub fn cumulative_distances_m(path: &[Coordinates]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(path.len());
    let mut total = 0.0;
    for (i, point) in path.iter().enumerate() {
        if i > 0 {
            total += path[i - 1].distance_m(point);
        }
        cumulative.push(total);
    }
    cumulative
}

/// `count` indices spread evenly over `0..len`, always including both ends.
/// Returns every index when `len <= count`.
pub fn evenly_spaced_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if len <= count {
        return (0..len).collect();
    }
    if count == 1 {
        return vec![0];
    }

    let step = (len - 1) as f64 / (count - 1) as f64;
    let mut indices: Vec<usize> = (0..count)
        .map(|i| ((i as f64 * step).round() as usize).min(len - 1))
        .collect();
    indices.dedup();
    indices
}

/// Index of the first point whose cumulative distance reaches `fraction` of the total.
pub fn index_at_fraction(cumulative: &[f64], fraction: f64) -> usize {
    let Some(&total) = cumulative.last() else {
        return 0;
    };
    let target = total * fraction.clamp(0.0, 1.0);
    cumulative
        .iter()
        .position(|&d| d >= target)
        .unwrap_or(cumulative.len().saturating_sub(1))
}

/// Circular mean of bearings in degrees, [0, 360). `None` when empty or
/// when the bearings cancel out.
pub fn circular_mean(bearings: &[f64]) -> Option<f64> {
    if bearings.is_empty() {
        return None;
    }
    let (sin_sum, cos_sum) = bearings.iter().fold((0.0, 0.0), |(s, c), b| {
        let rad = b.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let n = bearings.len() as f64;
    let (sin_mean, cos_mean) = (sin_sum / n, cos_sum / n);
    if sin_mean.abs() < 1e-12 && cos_mean.abs() < 1e-12 {
        return None;
    }
    Some(geo::normalize_degrees(sin_mean.atan2(cos_mean).to_degrees()))
}
