//! Planar geometric predicates shared across the crate.
//!
//! All functions here operate in raw coordinate space (degrees), not in
//! real-world units; see [`crate::distance`] for the kilometre conversion.

use crate::TrailPoint;

/// Planar Euclidean distance between two points, in coordinate units.
pub fn planar_distance(p1: &TrailPoint, p2: &TrailPoint) -> f64 {
    let dx = p1.longitude - p2.longitude;
    let dy = p1.latitude - p2.latitude;
    (dx * dx + dy * dy).sqrt()
}

/// Coordinate equality within a tolerance.
///
/// Intersection arithmetic rarely yields bit-exact matches to existing
/// vertices, so every point comparison in the crate goes through this.
pub fn points_equal(p1: &TrailPoint, p2: &TrailPoint, epsilon: f64) -> bool {
    (p1.longitude - p2.longitude).abs() <= epsilon && (p1.latitude - p2.latitude).abs() <= epsilon
}

/// Total planar length of a point sequence, in coordinate units.
pub fn polyline_planar_length(points: &[TrailPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| planar_distance(&w[0], &w[1]))
        .sum()
}
