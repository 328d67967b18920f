//! Intersection detection and polyline splitting.
//!
//! The resolver compares every unordered pair of input polylines whose
//! bounding boxes overlap (pruned with an R-tree), classifies each pair's
//! geometric intersection, and cuts both members of a crossing pair at the
//! shared point. Splitting is two-phase: all accepted crossing positions
//! are collected first, then the final segment list is built from scratch,
//! so no collection is ever mutated while being scanned.
//!
//! What counts as a crossing:
//! - the pair's intersection must be exactly one point after epsilon
//!   deduplication,
//! - the point must lie in the interior of *both* polylines. A shared or
//!   touching endpoint is not a crossing.
//!
//! Anything else (collinear overlapping runs, multiple crossing points)
//! is an ambiguous topology and leaves both polylines unsplit. That is a
//! policy decision, not an error: a run never aborts because one pair is
//! odd.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{coord, Line};
use log::debug;
use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{planar_distance, points_equal};
use crate::{Polyline, SegmentationConfig, TrailPoint};

/// A post-cut polyline, traceable to the input polyline it was cut from.
#[derive(Debug, Clone)]
pub struct ResolvedSegment {
    /// Index of the source polyline in the input batch
    pub source_index: usize,
    /// The cut piece (or the whole source polyline if it had no crossings)
    pub polyline: Polyline,
}

/// A crossing point discovered between two polylines.
///
/// References the polylines it splits by index into the input batch; the
/// point itself lies on both.
#[derive(Debug, Clone)]
pub struct IntersectionPoint {
    pub point: TrailPoint,
    /// Indices of the two polylines split at this point
    pub polylines: (usize, usize),
    /// Distance along each of the two polylines, in coordinate units
    pub along: (f64, f64),
}

/// Bounding box of one input polyline, for R-tree pruning.
struct PolylineBounds {
    index: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl PolylineBounds {
    /// Bounds inflated by epsilon so near-tolerance contacts at box edges
    /// still pair up.
    fn new(index: usize, line: &Polyline, epsilon: f64) -> Self {
        let b = line.bounds();
        Self {
            index,
            min: [b.min_lng - epsilon, b.min_lat - epsilon],
            max: [b.max_lng + epsilon, b.max_lat + epsilon],
        }
    }
}

impl RTreeObject for PolylineBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Outcome of intersecting one unordered pair of polylines.
enum PairCrossing {
    /// No intersection at all
    None,
    /// Exactly one interior crossing point
    Single {
        point: TrailPoint,
        /// Distance along the first polyline, in coordinate units
        along_a: f64,
        /// Distance along the second polyline, in coordinate units
        along_b: f64,
    },
    /// Collinear overlap, multiple crossings, or endpoint-only contact
    /// combined with other contact: not a single-point crossing
    Ambiguous,
}

/// Find pairwise crossings and cut the involved polylines at them.
///
/// Returns the flat list of post-cut polylines from all inputs, in input
/// order; polylines with zero crossings are emitted whole. Crossing
/// positions along one polyline are ordered by distance from its start,
/// so repeated runs over the same input produce identical output.
pub fn resolve_intersections(
    polylines: &[Polyline],
    config: &SegmentationConfig,
) -> Vec<ResolvedSegment> {
    let epsilon = config.epsilon;

    // Phase 1: discover all accepted crossings.
    let mut crossings: Vec<IntersectionPoint> = Vec::new();

    let tree = RTree::bulk_load(
        polylines
            .iter()
            .enumerate()
            .map(|(index, line)| PolylineBounds::new(index, line, epsilon))
            .collect(),
    );

    for (i, line_a) in polylines.iter().enumerate() {
        let query = PolylineBounds::new(i, line_a, epsilon).envelope();
        for candidate in tree.locate_in_envelope_intersecting(&query) {
            let j = candidate.index;
            // Each unordered pair is tested once
            if j <= i {
                continue;
            }
            match pair_crossing(line_a, &polylines[j], epsilon) {
                PairCrossing::Single {
                    point,
                    along_a,
                    along_b,
                } => {
                    debug!(
                        "Polylines {} and {} cross at ({}, {})",
                        i, j, point.longitude, point.latitude
                    );
                    crossings.push(IntersectionPoint {
                        point,
                        polylines: (i, j),
                        along: (along_a, along_b),
                    });
                }
                PairCrossing::Ambiguous => {
                    debug!(
                        "Polylines {} and {} have a non-point intersection, leaving both unsplit",
                        i, j
                    );
                }
                PairCrossing::None => {}
            }
        }
    }

    // Phase 2: rebuild the segment list from scratch.
    let mut cuts: Vec<Vec<(f64, TrailPoint)>> = vec![Vec::new(); polylines.len()];
    for crossing in &crossings {
        let (i, j) = crossing.polylines;
        cuts[i].push((crossing.along.0, crossing.point));
        cuts[j].push((crossing.along.1, crossing.point));
    }

    let mut segments = Vec::with_capacity(polylines.len());
    for (index, line) in polylines.iter().enumerate() {
        let mut positions = std::mem::take(&mut cuts[index]);
        positions.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.1.longitude
                        .partial_cmp(&b.1.longitude)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(
                    a.1.latitude
                        .partial_cmp(&b.1.latitude)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        // The same crossing point can be discovered against several
        // partners; keep one split per physical point.
        positions.dedup_by(|a, b| points_equal(&a.1, &b.1, epsilon));

        for piece in split_at(line, &positions, epsilon) {
            segments.push(ResolvedSegment {
                source_index: index,
                polyline: piece,
            });
        }
    }
    segments
}

/// Snap a computed intersection point onto an existing vertex when it is
/// within tolerance, so crossings through vertices reuse the vertex
/// coordinates exactly.
fn snap_to_vertex(point: TrailPoint, vertices: &[TrailPoint], epsilon: f64) -> TrailPoint {
    vertices
        .iter()
        .find(|v| points_equal(v, &point, epsilon))
        .copied()
        .unwrap_or(point)
}

/// Classify the intersection of one unordered pair of polylines.
fn pair_crossing(a: &Polyline, b: &Polyline, epsilon: f64) -> PairCrossing {
    let a_pts = a.points();
    let b_pts = b.points();

    // (point, distance along a, distance along b)
    let mut found: Vec<(TrailPoint, f64, f64)> = Vec::new();

    let mut prefix_a = 0.0;
    for wa in a_pts.windows(2) {
        let seg_a = Line::new(
            coord! { x: wa[0].longitude, y: wa[0].latitude },
            coord! { x: wa[1].longitude, y: wa[1].latitude },
        );
        let mut prefix_b = 0.0;
        for wb in b_pts.windows(2) {
            let seg_b = Line::new(
                coord! { x: wb[0].longitude, y: wb[0].latitude },
                coord! { x: wb[1].longitude, y: wb[1].latitude },
            );
            match line_intersection(seg_a, seg_b) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    let raw = TrailPoint::new(intersection.x, intersection.y);
                    let point = snap_to_vertex(snap_to_vertex(raw, a_pts, epsilon), b_pts, epsilon);

                    // A touch at either polyline's first or last vertex is
                    // not a crossing.
                    let terminal = points_equal(&point, a.first(), epsilon)
                        || points_equal(&point, a.last(), epsilon)
                        || points_equal(&point, b.first(), epsilon)
                        || points_equal(&point, b.last(), epsilon);
                    let seen = found.iter().any(|(q, _, _)| points_equal(q, &point, epsilon));
                    if !terminal && !seen {
                        let along_a = prefix_a + planar_distance(&wa[0], &point);
                        let along_b = prefix_b + planar_distance(&wb[0], &point);
                        found.push((point, along_a, along_b));
                    }
                }
                Some(LineIntersection::Collinear { .. }) => {
                    // Overlapping run: the pair's intersection cannot be a
                    // single point.
                    return PairCrossing::Ambiguous;
                }
                None => {}
            }
            prefix_b += planar_distance(&wb[0], &wb[1]);
        }
        prefix_a += planar_distance(&wa[0], &wa[1]);
    }

    match found.as_slice() {
        [] => PairCrossing::None,
        [(point, along_a, along_b)] => PairCrossing::Single {
            point: *point,
            along_a: *along_a,
            along_b: *along_b,
        },
        _ => PairCrossing::Ambiguous,
    }
}

/// Cut a polyline at the given sorted (distance-along, point) positions.
///
/// The concatenation of the returned pieces reconstructs the original
/// point sequence with the cut points inserted; a cut landing on an
/// existing vertex reuses that vertex as the piece boundary instead of
/// duplicating it.
fn split_at(line: &Polyline, cuts: &[(f64, TrailPoint)], epsilon: f64) -> Vec<Polyline> {
    if cuts.is_empty() {
        return vec![line.clone()];
    }

    let pts = line.points();
    let mut pieces: Vec<Polyline> = Vec::with_capacity(cuts.len() + 1);
    let mut current: Vec<TrailPoint> = vec![pts[0]];
    let mut travelled = 0.0;
    let mut cut_idx = 0;

    for w in pts.windows(2) {
        let seg_len = planar_distance(&w[0], &w[1]);

        // Consume the cuts that fall within this segment
        while cut_idx < cuts.len() && cuts[cut_idx].0 <= travelled + seg_len + epsilon {
            let cut_point = cuts[cut_idx].1;
            cut_idx += 1;

            let last = current[current.len() - 1];
            if !points_equal(&last, &cut_point, epsilon) {
                current.push(cut_point);
            }
            if current.len() >= 2 {
                let boundary = current[current.len() - 1];
                pieces.push(Polyline::from_cut(std::mem::replace(
                    &mut current,
                    vec![boundary],
                )));
            }
        }

        // Advance to the segment's end vertex
        let last = current[current.len() - 1];
        if !points_equal(&last, &w[1], epsilon) {
            current.push(w[1]);
        }
        travelled += seg_len;
    }

    if current.len() >= 2 {
        pieces.push(Polyline::from_cut(current));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pl(coords: &[(f64, f64)]) -> Polyline {
        Polyline::new(
            coords
                .iter()
                .map(|&(lng, lat)| TrailPoint::new(lng, lat))
                .collect(),
        )
        .unwrap()
    }

    fn resolve(polylines: &[Polyline]) -> Vec<ResolvedSegment> {
        resolve_intersections(polylines, &SegmentationConfig::default())
    }

    fn pieces_of(segments: &[ResolvedSegment], source: usize) -> Vec<Vec<TrailPoint>> {
        segments
            .iter()
            .filter(|s| s.source_index == source)
            .map(|s| s.polyline.points().to_vec())
            .collect()
    }

    #[test]
    fn test_x_crossing_splits_both() {
        let a = pl(&[(0.0, 0.0), (2.0, 2.0)]);
        let b = pl(&[(0.0, 2.0), (2.0, 0.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 4);

        let a_pieces = pieces_of(&segments, 0);
        assert_eq!(a_pieces.len(), 2);
        assert!(points_equal(&a_pieces[0][1], &TrailPoint::new(1.0, 1.0), 1e-9));
        assert!(points_equal(&a_pieces[1][0], &TrailPoint::new(1.0, 1.0), 1e-9));
        assert_eq!(a_pieces[0][0], TrailPoint::new(0.0, 0.0));
        assert_eq!(a_pieces[1][1], TrailPoint::new(2.0, 2.0));

        let b_pieces = pieces_of(&segments, 1);
        assert_eq!(b_pieces.len(), 2);
        assert!(points_equal(&b_pieces[0][1], &TrailPoint::new(1.0, 1.0), 1e-9));
    }

    #[test]
    fn test_shared_endpoint_no_split() {
        let a = pl(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = pl(&[(1.0, 0.0), (2.0, 0.0)]);
        let segments = resolve(&[a.clone(), b.clone()]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].polyline, a);
        assert_eq!(segments[1].polyline, b);
    }

    #[test]
    fn test_angled_endpoint_touch_no_split() {
        let a = pl(&[(0.0, 0.0), (1.0, 1.0)]);
        let b = pl(&[(1.0, 1.0), (2.0, 0.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_t_junction_no_split() {
        // B's endpoint lies on A's interior; an endpoint touch is not a
        // crossing for either member of the pair.
        let a = pl(&[(0.0, 0.0), (2.0, 0.0)]);
        let b = pl(&[(1.0, 0.0), (1.0, 1.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_disjoint_no_split() {
        let a = pl(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = pl(&[(5.0, 5.0), (6.0, 5.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_collinear_overlap_no_split() {
        let a = pl(&[(0.0, 0.0), (2.0, 0.0)]);
        let b = pl(&[(1.0, 0.0), (3.0, 0.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_identical_polylines_no_split() {
        let a = pl(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let segments = resolve(&[a.clone(), a.clone()]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].polyline, a);
    }

    #[test]
    fn test_double_crossing_is_ambiguous() {
        // B zigzags across A twice; the pair's intersection is not a
        // single point, so neither polyline is split.
        let a = pl(&[(0.0, 0.0), (4.0, 0.0)]);
        let b = pl(&[(1.0, -1.0), (2.0, 1.0), (3.0, -1.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_crossing_at_interior_vertex() {
        // The crossing coincides with A's interior vertex: the vertex
        // becomes a piece boundary without being duplicated.
        let a = pl(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let b = pl(&[(0.0, 2.0), (2.0, 0.0)]);
        let segments = resolve(&[a, b]);
        assert_eq!(segments.len(), 4);

        let a_pieces = pieces_of(&segments, 0);
        assert_eq!(a_pieces[0].len(), 2);
        assert_eq!(a_pieces[1].len(), 2);
        assert_eq!(a_pieces[0][1], TrailPoint::new(1.0, 1.0));
        assert_eq!(a_pieces[1][0], TrailPoint::new(1.0, 1.0));
    }

    #[test]
    fn test_cuts_from_multiple_partners_are_path_ordered() {
        // C crosses A before B does, but B is compared first; splits must
        // still come out ordered by distance from A's start.
        let a = pl(&[(0.0, 0.0), (4.0, 0.0)]);
        let b = pl(&[(3.0, -1.0), (3.0, 1.0)]);
        let c = pl(&[(1.0, -1.0), (1.0, 1.0)]);
        let segments = resolve(&[a, b, c]);
        assert_eq!(segments.len(), 7);

        let a_pieces = pieces_of(&segments, 0);
        assert_eq!(a_pieces.len(), 3);
        assert!(points_equal(&a_pieces[0][1], &TrailPoint::new(1.0, 0.0), 1e-9));
        assert!(points_equal(&a_pieces[1][1], &TrailPoint::new(3.0, 0.0), 1e-9));
        assert_eq!(a_pieces[2][1], TrailPoint::new(4.0, 0.0));
    }

    #[test]
    fn test_point_conservation_through_split() {
        let a = pl(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (4.0, 0.0)]);
        let b = pl(&[(3.0, -1.0), (3.0, 1.0)]);
        let segments = resolve(&[a.clone(), b]);

        // Concatenate A's pieces, dropping the shared boundary points
        let a_pieces = pieces_of(&segments, 0);
        let mut reconstructed: Vec<TrailPoint> = a_pieces[0].clone();
        for piece in &a_pieces[1..] {
            reconstructed.extend_from_slice(&piece[1..]);
        }

        // Every original vertex survives, in order, with the one cut
        // point inserted
        assert_eq!(reconstructed.len(), a.points().len() + 1);
        let mut original = a.points().iter();
        for p in &reconstructed {
            if points_equal(p, &TrailPoint::new(3.0, 0.0), 1e-9) {
                continue;
            }
            assert_eq!(p, original.next().unwrap());
        }
        assert!(original.next().is_none());
    }
}
