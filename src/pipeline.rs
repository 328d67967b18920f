//! Segmentation pipeline: resolve crossings, measure, package records.

use log::info;

use crate::distance::compute_length;
use crate::error::Result;
use crate::intersection::resolve_intersections;
use crate::{Polyline, SegmentRecord, SegmentationConfig};

/// Run the full segmentation over one batch of polylines.
///
/// Resolves all pairwise crossings, then computes the length of every
/// resulting piece and packages it as a [`SegmentRecord`]. The function is
/// pure: identical input batches always yield an identical record list, in
/// the same order. Records are returned, never persisted; storage is the
/// caller's collaborator.
///
/// # Example
/// ```
/// use trail_segmenter::{segment_polylines, Polyline, SegmentationConfig, TrailPoint};
///
/// let trail = Polyline::new(vec![
///     TrailPoint::new(-96.8, 32.8),
///     TrailPoint::new(-96.7, 32.9),
/// ]).unwrap();
///
/// let records = segment_polylines(&[trail], &SegmentationConfig::default()).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].source_index, 0);
/// ```
pub fn segment_polylines(
    polylines: &[Polyline],
    config: &SegmentationConfig,
) -> Result<Vec<SegmentRecord>> {
    info!("Segmenting batch of {} polylines", polylines.len());

    let resolved = resolve_intersections(polylines, config);

    let mut records = Vec::with_capacity(resolved.len());
    for segment in resolved {
        let length_km = compute_length(segment.polyline.points())?;
        records.push(SegmentRecord {
            source_index: segment.source_index,
            length_km,
            points: segment.polyline.into_points(),
        });
    }

    info!(
        "Batch produced {} segment records from {} polylines",
        records.len(),
        polylines.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::KM_PER_DEGREE;
    use crate::geo_utils::points_equal;
    use crate::TrailPoint;

    fn pl(coords: &[(f64, f64)]) -> Polyline {
        Polyline::new(
            coords
                .iter()
                .map(|&(lng, lat)| TrailPoint::new(lng, lat))
                .collect(),
        )
        .unwrap()
    }

    fn crossing_batch() -> Vec<Polyline> {
        vec![
            pl(&[(0.0, 0.0), (2.0, 2.0)]),
            pl(&[(0.0, 2.0), (2.0, 0.0)]),
        ]
    }

    #[test]
    fn test_x_crossing_records() {
        let records =
            segment_polylines(&crossing_batch(), &SegmentationConfig::default()).unwrap();
        assert_eq!(records.len(), 4);

        // Each half of each diagonal is a unit-diagonal segment
        let expected = 2.0_f64.sqrt() * KM_PER_DEGREE;
        for record in &records {
            assert!((record.length_km - expected).abs() < 1e-6);
        }
        assert_eq!(records.iter().filter(|r| r.source_index == 0).count(), 2);
        assert_eq!(records.iter().filter(|r| r.source_index == 1).count(), 2);
    }

    #[test]
    fn test_no_crossing_emits_whole_polyline() {
        let trail = pl(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let records = segment_polylines(
            &[trail.clone()],
            &SegmentationConfig::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].points, trail.points());

        // Length conservation: the single record's length equals the
        // original's
        let original_length = compute_length(trail.points()).unwrap();
        assert!((records[0].length_km - original_length).abs() < 1e-12);
    }

    #[test]
    fn test_determinism() {
        let batch = crossing_batch();
        let config = SegmentationConfig::default();
        let first = segment_polylines(&batch, &config).unwrap();
        let second = segment_polylines(&batch, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resegmentation_is_idempotent() {
        let config = SegmentationConfig::default();
        let first = segment_polylines(&crossing_batch(), &config).unwrap();

        // Feed the output segments back in: all true crossings are
        // already resolved, so nothing splits further.
        let again: Vec<Polyline> = first
            .iter()
            .map(|r| Polyline::new(r.points.clone()).unwrap())
            .collect();
        let second = segment_polylines(&again, &config).unwrap();

        assert_eq!(second.len(), first.len());
        for (rerun, original) in second.iter().zip(&first) {
            assert_eq!(rerun.points.len(), original.points.len());
            for (p, q) in rerun.points.iter().zip(&original.points) {
                assert!(points_equal(p, q, 1e-9));
            }
            assert!((rerun.length_km - original.length_km).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shared_endpoint_batch_unchanged() {
        let a = pl(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = pl(&[(1.0, 0.0), (2.0, 0.0)]);
        let records =
            segment_polylines(&[a.clone(), b.clone()], &SegmentationConfig::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].points, a.points());
        assert_eq!(records[1].points, b.points());
    }

    #[test]
    fn test_empty_batch() {
        let records = segment_polylines(&[], &SegmentationConfig::default()).unwrap();
        assert!(records.is_empty());
    }
}
