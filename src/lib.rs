//! # Trail Segmenter
//!
//! Trail-network segmentation for crowd-sourced trail geometry.
//!
//! Given a batch of polylines describing hiking paths, this library finds
//! the points where two trails physically cross, cuts both trails into
//! distinct segments at each crossing, and annotates every resulting
//! segment with its approximate real-world length. The output is a clean,
//! non-redundant list of segment records ready for a persistence layer.
//!
//! This is a pure transformation library: fetching raw map data is an
//! upstream producer's job and storing the finished records is a
//! downstream consumer's job.
//!
//! ## Features
//!
//! - **`parallel`** - Process geographic tiles in parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_segmenter::{segment_polylines, Polyline, SegmentationConfig, TrailPoint};
//!
//! // Two trails crossing at (1, 1)
//! let a = Polyline::new(vec![TrailPoint::new(0.0, 0.0), TrailPoint::new(2.0, 2.0)]).unwrap();
//! let b = Polyline::new(vec![TrailPoint::new(0.0, 2.0), TrailPoint::new(2.0, 0.0)]).unwrap();
//!
//! let records = segment_polylines(&[a, b], &SegmentationConfig::default()).unwrap();
//!
//! // Each trail is cut into two segments at the crossing
//! assert_eq!(records.len(), 4);
//! for record in &records {
//!     assert!(record.length_km > 0.0);
//! }
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SegmentationError};

// Planar predicates (distance, epsilon equality)
pub mod geo_utils;
pub use geo_utils::{planar_distance, points_equal, polyline_planar_length};

// Flat-earth length computation
pub mod distance;
pub use distance::{compute_length, KM_PER_DEGREE};

// Intersection detection and polyline splitting
pub mod intersection;
pub use intersection::{resolve_intersections, IntersectionPoint, ResolvedSegment};

// Pipeline: resolve, measure, package segment records
pub mod pipeline;
pub use pipeline::segment_polylines;

// GeoJSON feature ingestion
pub mod features;
pub use features::{trails_from_geojson, TrailFeature};

// Per-tile batching for large regions
pub mod tiles;
#[cfg(feature = "parallel")]
pub use tiles::segment_polylines_tiled_parallel;
pub use tiles::{segment_polylines_tiled, TileConfig};

/// Default coordinate tolerance, in degrees (~0.1 mm on the ground).
///
/// Used for vertex deduplication and for matching floating-point
/// intersection results against existing vertices.
pub const DEFAULT_EPSILON: f64 = 1e-9;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate, stored as `(longitude, latitude)` in degrees.
///
/// # Example
/// ```
/// use trail_segmenter::TrailPoint;
/// let point = TrailPoint::new(-96.8, 32.8); // Dallas
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl TrailPoint {
    /// Create a new point. Note the GeoJSON-style `(longitude, latitude)`
    /// argument order.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Check that the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.longitude >= -180.0
            && self.longitude <= 180.0
            && self.latitude >= -90.0
            && self.latitude <= 90.0
    }
}

/// Bounding box for a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Create bounds from points. Returns `None` for an empty slice.
    pub fn from_points(points: &[TrailPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;

        for p in points {
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
        }

        Some(Self {
            min_lng,
            max_lng,
            min_lat,
            max_lat,
        })
    }
}

/// An ordered sequence of at least 2 distinct points describing one trail
/// as drawn on a map.
///
/// Construction validates the input: coordinates must be finite and
/// in-range, consecutive duplicate points (within [`DEFAULT_EPSILON`]) are
/// collapsed, and fewer than 2 remaining points is an `InvalidGeometry`
/// error. Once built, a polyline is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<TrailPoint>,
}

impl Polyline {
    /// Validate and build a polyline from raw points.
    ///
    /// # Example
    /// ```
    /// use trail_segmenter::{Polyline, TrailPoint};
    ///
    /// let line = Polyline::new(vec![
    ///     TrailPoint::new(-96.8, 32.8),
    ///     TrailPoint::new(-96.8, 32.8), // duplicate, collapsed
    ///     TrailPoint::new(-96.7, 32.9),
    /// ]).unwrap();
    /// assert_eq!(line.points().len(), 2);
    /// ```
    pub fn new(points: Vec<TrailPoint>) -> Result<Self> {
        let mut cleaned: Vec<TrailPoint> = Vec::with_capacity(points.len());
        for p in points {
            if !p.is_valid() {
                return Err(SegmentationError::InvalidCoordinates {
                    message: format!("({}, {}) is not a valid coordinate", p.longitude, p.latitude),
                });
            }
            let duplicate = cleaned
                .last()
                .is_some_and(|last| points_equal(last, &p, DEFAULT_EPSILON));
            if !duplicate {
                cleaned.push(p);
            }
        }
        if cleaned.len() < 2 {
            return Err(SegmentationError::InvalidGeometry {
                point_count: cleaned.len(),
                minimum_required: 2,
            });
        }
        Ok(Self { points: cleaned })
    }

    /// Build a polyline from points already known to satisfy the
    /// invariants (used by the resolver for cut pieces).
    pub(crate) fn from_cut(points: Vec<TrailPoint>) -> Self {
        debug_assert!(points.len() >= 2);
        Self { points }
    }

    /// The polyline's points.
    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    /// Consume the polyline, returning its points.
    pub fn into_points(self) -> Vec<TrailPoint> {
        self.points
    }

    /// First point of the polyline.
    pub fn first(&self) -> &TrailPoint {
        &self.points[0]
    }

    /// Last point of the polyline.
    pub fn last(&self) -> &TrailPoint {
        &self.points[self.points.len() - 1]
    }

    /// Bounding box of the polyline.
    pub fn bounds(&self) -> Bounds {
        // A polyline is never empty
        Bounds::from_points(&self.points).unwrap_or(Bounds {
            min_lng: 0.0,
            max_lng: 0.0,
            min_lat: 0.0,
            max_lat: 0.0,
        })
    }
}

/// The unit of pipeline output: one cut trail segment with its computed
/// length and the index of the input polyline it was cut from.
///
/// Records carry no durable identity; assigning ids and deduplicating
/// against previously stored segments is the persistence layer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// The segment's points, a contiguous sub-sequence of the source
    /// polyline (with the crossing points inserted)
    pub points: Vec<TrailPoint>,
    /// Flat-earth length in kilometres, always recomputed from `points`
    pub length_km: f64,
    /// Index of the source polyline in the pipeline's input batch
    pub source_index: usize,
}

/// Configuration for segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Coordinate tolerance in degrees for vertex matching and crossing
    /// deduplication. Default: [`DEFAULT_EPSILON`]
    pub epsilon: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
