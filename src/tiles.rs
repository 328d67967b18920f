//! Per-tile batching for large regions.
//!
//! Upstream ingestion fetches trails one fixed-size degree tile at a
//! time, so each tile's polylines form an independent batch that can be
//! segmented on its own. Trails straddling a tile boundary are not
//! resolved against neighbouring tiles; that is a known limitation
//! inherited from the tile-based fetching strategy.

use std::collections::BTreeMap;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::pipeline::segment_polylines;
use crate::{Polyline, SegmentRecord, SegmentationConfig, TrailPoint};

/// Configuration for tile batching.
#[derive(Debug, Clone)]
pub struct TileConfig {
    /// Tile edge length in degrees. Default: 2.0, the ingestion tile size
    pub tile_dim: f64,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self { tile_dim: 2.0 }
    }
}

/// Grid coordinates (column, row) of a tile.
pub type TileKey = (i32, i32);

/// The tile containing a point.
pub fn tile_for_point(point: &TrailPoint, tile_dim: f64) -> TileKey {
    (
        (point.longitude / tile_dim).floor() as i32,
        (point.latitude / tile_dim).floor() as i32,
    )
}

/// Group polyline indices by tile. A polyline belongs to the tile
/// containing its first point. BTreeMap keeps tile order deterministic.
fn group_by_tile(polylines: &[Polyline], config: &TileConfig) -> BTreeMap<TileKey, Vec<usize>> {
    let mut groups: BTreeMap<TileKey, Vec<usize>> = BTreeMap::new();
    for (index, line) in polylines.iter().enumerate() {
        let key = tile_for_point(line.first(), config.tile_dim);
        groups.entry(key).or_default().push(index);
    }
    groups
}

/// Segment one tile's polylines and map record indices back to positions
/// in the full input batch.
fn segment_tile(
    polylines: &[Polyline],
    indices: &[usize],
    config: &SegmentationConfig,
) -> Result<Vec<SegmentRecord>> {
    let batch: Vec<Polyline> = indices.iter().map(|&i| polylines[i].clone()).collect();
    let mut records = segment_polylines(&batch, config)?;
    for record in &mut records {
        record.source_index = indices[record.source_index];
    }
    Ok(records)
}

/// Segment polylines one geographic tile at a time.
///
/// Tiles are processed in ascending tile-key order and results are
/// concatenated, so output is deterministic. Each tile is resolved
/// independently; crossings between polylines in different tiles are not
/// detected.
pub fn segment_polylines_tiled(
    polylines: &[Polyline],
    config: &SegmentationConfig,
    tiles: &TileConfig,
) -> Result<Vec<SegmentRecord>> {
    let groups = group_by_tile(polylines, tiles);
    debug!(
        "Segmenting {} polylines across {} tiles",
        polylines.len(),
        groups.len()
    );

    let mut records = Vec::new();
    for (key, indices) in &groups {
        debug!("Tile {:?}: {} polylines", key, indices.len());
        records.extend(segment_tile(polylines, indices, config)?);
    }
    Ok(records)
}

/// Parallel variant of [`segment_polylines_tiled`]: tiles are resolved on
/// rayon workers. Tiles share no mutable state, and results are
/// concatenated in tile-key order, so the output is identical to the
/// sequential path.
#[cfg(feature = "parallel")]
pub fn segment_polylines_tiled_parallel(
    polylines: &[Polyline],
    config: &SegmentationConfig,
    tiles: &TileConfig,
) -> Result<Vec<SegmentRecord>> {
    let groups: Vec<(TileKey, Vec<usize>)> = group_by_tile(polylines, tiles).into_iter().collect();
    debug!(
        "Segmenting {} polylines across {} tiles (parallel)",
        polylines.len(),
        groups.len()
    );

    let per_tile: Vec<Vec<SegmentRecord>> = groups
        .par_iter()
        .map(|(_, indices)| segment_tile(polylines, indices, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(per_tile.into_iter().flatten().collect())
}
