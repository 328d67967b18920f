//! Unified error handling for the trail-segmenter library.
//!
//! Malformed input fails fast with one of these variants before any output
//! is produced. Ambiguous intersection topologies are deliberately *not*
//! errors: the resolver handles them with a logged no-split policy.

use std::fmt;

/// Unified error type for segmentation operations.
#[derive(Debug, Clone)]
pub enum SegmentationError {
    /// Polyline has too few points for processing
    InvalidGeometry {
        point_count: usize,
        minimum_required: usize,
    },
    /// Polyline contains non-finite or out-of-range coordinates
    InvalidCoordinates { message: String },
    /// Feature input could not be parsed
    ParseError { message: String },
}

impl fmt::Display for SegmentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationError::InvalidGeometry {
                point_count,
                minimum_required,
            } => {
                write!(
                    f,
                    "Polyline has {} points, minimum {} required",
                    point_count, minimum_required
                )
            }
            SegmentationError::InvalidCoordinates { message } => {
                write!(f, "Invalid coordinates: {}", message)
            }
            SegmentationError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
        }
    }
}

impl std::error::Error for SegmentationError {}

/// Result type alias for segmentation operations.
pub type Result<T> = std::result::Result<T, SegmentationError>;
