//! Segment length computation.
//!
//! Lengths are a flat-earth approximation: the planar coordinate-space
//! length of a polyline multiplied by a fixed factor. This is only
//! reasonable over small bounding areas (a few degrees across) and is not
//! a geodesic calculation; there is no haversine correction and no
//! latitude-dependent longitude scaling. The factor is kept as-is rather
//! than "corrected" so that stored lengths stay comparable across runs.

use crate::error::{Result, SegmentationError};
use crate::geo_utils::polyline_planar_length;
use crate::TrailPoint;

/// Fixed conversion factor from coordinate-degree length to kilometres.
pub const KM_PER_DEGREE: f64 = 100.0;

/// Compute the length of a point sequence in kilometres.
///
/// Sums the planar distance between consecutive points and scales by
/// [`KM_PER_DEGREE`]. Fails with `InvalidGeometry` if fewer than 2 points
/// are supplied.
///
/// # Example
/// ```
/// use trail_segmenter::{compute_length, TrailPoint, KM_PER_DEGREE};
///
/// let points = vec![TrailPoint::new(0.0, 0.0), TrailPoint::new(1.0, 0.0)];
/// let length = compute_length(&points).unwrap();
/// assert!((length - KM_PER_DEGREE).abs() < 1e-9);
/// ```
pub fn compute_length(points: &[TrailPoint]) -> Result<f64> {
    if points.len() < 2 {
        return Err(SegmentationError::InvalidGeometry {
            point_count: points.len(),
            minimum_required: 2,
        });
    }
    Ok(polyline_planar_length(points) * KM_PER_DEGREE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_segment_length() {
        let points = vec![TrailPoint::new(0.0, 0.0), TrailPoint::new(0.0, 1.0)];
        let length = compute_length(&points).unwrap();
        assert!((length - KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn test_multi_segment_length() {
        let points = vec![
            TrailPoint::new(0.0, 0.0),
            TrailPoint::new(1.0, 0.0),
            TrailPoint::new(1.0, 1.0),
        ];
        let length = compute_length(&points).unwrap();
        assert!((length - 2.0 * KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_points() {
        let points = vec![TrailPoint::new(0.0, 0.0)];
        let err = compute_length(&points).unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::InvalidGeometry {
                point_count: 1,
                minimum_required: 2,
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        let err = compute_length(&[]).unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::InvalidGeometry { point_count: 0, .. }
        ));
    }
}
