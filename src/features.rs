//! GeoJSON feature ingestion.
//!
//! Converts map-feature data (a GeoJSON FeatureCollection, as produced by
//! OSM exports) into trail features ready to become [`Polyline`]s. Only
//! LineString geometries are kept; other feature types are skipped.
//! Positions may carry a third elevation ordinate, which is ignored.

use log::debug;
use serde::Deserialize;

use crate::error::{Result, SegmentationError};
use crate::{Polyline, TrailPoint};

/// A raw trail feature: an ordered coordinate list plus optional tags.
#[derive(Debug, Clone)]
pub struct TrailFeature {
    /// Name tag from the feature's properties, if present
    pub name: Option<String>,
    /// Raw coordinates in GeoJSON order (longitude, latitude)
    pub points: Vec<TrailPoint>,
}

impl TrailFeature {
    /// Validate the feature's coordinates into a [`Polyline`].
    pub fn into_polyline(self) -> Result<Polyline> {
        Polyline::new(self.points)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
    #[serde(other)]
    Other,
}

/// Extract trail features from GeoJSON text.
///
/// Fails fast with `ParseError` on malformed JSON or on positions with
/// fewer than two ordinates. Non-LineString geometries are skipped, not
/// errors.
///
/// # Example
/// ```
/// use trail_segmenter::trails_from_geojson;
///
/// let json = r#"{
///     "type": "FeatureCollection",
///     "features": [{
///         "type": "Feature",
///         "properties": { "name": "Ridge Loop" },
///         "geometry": {
///             "type": "LineString",
///             "coordinates": [[-96.8, 32.8], [-96.7, 32.9]]
///         }
///     }]
/// }"#;
///
/// let trails = trails_from_geojson(json).unwrap();
/// assert_eq!(trails.len(), 1);
/// assert_eq!(trails[0].name.as_deref(), Some("Ridge Loop"));
/// ```
pub fn trails_from_geojson(json: &str) -> Result<Vec<TrailFeature>> {
    let collection: FeatureCollection =
        serde_json::from_str(json).map_err(|e| SegmentationError::ParseError {
            message: e.to_string(),
        })?;

    let mut trails = Vec::new();
    for feature in collection.features {
        match feature.geometry {
            Some(Geometry::LineString { coordinates }) => {
                let mut points = Vec::with_capacity(coordinates.len());
                for position in &coordinates {
                    if position.len() < 2 {
                        return Err(SegmentationError::ParseError {
                            message: format!(
                                "position has {} ordinates, expected at least 2",
                                position.len()
                            ),
                        });
                    }
                    points.push(TrailPoint::new(position[0], position[1]));
                }
                let name = feature.properties.and_then(|p| p.name);
                trails.push(TrailFeature { name, points });
            }
            _ => debug!("Skipping non-LineString feature"),
        }
    }
    debug!("Parsed {} LineString features", trails.len());
    Ok(trails)
}
