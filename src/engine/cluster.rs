//! Zoom-dependent grouping of point features into visual clusters.
//!
//! Markers are binned on a screen-space grid whose cell size is the cluster
//! radius in world pixels, so per-frame work stays proportional to the
//! visible set: features outside the (padded) viewport bounds are pruned
//! before any binning happens.

use super::feature::{GeoFeature, Geometry};
use super::zoom::MAX_ZOOM;
use crate::geo::{LngLat, ViewportBounds};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Cluster radius in world pixels (Leaflet marker-cluster default).
const CLUSTER_RADIUS_PX: f64 = 80.0;

/// Degrees of slack around the viewport so edge markers don't pop while
/// panning.
const PRUNE_MARGIN_DEG: f64 = 0.5;

/// One marker in the clustered output.
#[derive(Clone, Debug)]
pub enum ClusterMarker<'a> {
    /// A point rendered individually.
    Single { feature: &'a GeoFeature, position: LngLat },
    /// A group of nearby points collapsed into one marker.
    Cluster {
        /// Mean position of the members.
        position: LngLat,
        count: usize,
        /// Smallest zoom at which the members separate; at `MAX_ZOOM` the
        /// cluster spiderfies into singles regardless.
        expands_at: f64,
        members: Vec<&'a GeoFeature>,
    },
}

impl ClusterMarker<'_> {
    pub fn count(&self) -> usize {
        match self {
            ClusterMarker::Single { .. } => 1,
            ClusterMarker::Cluster { count, .. } => *count,
        }
    }
}

/// Web Mercator world-pixel position at a zoom level (256px base tile).
#[inline(always)]
fn world_px(pos: LngLat, zoom: f64) -> (f64, f64) {
    let scale = 256.0 * 2f64.powf(zoom);
    let x = (pos.lng + 180.0) / 360.0;
    // Clamp away from the poles where Mercator diverges
    let lat = pos.lat.clamp(-85.0511, 85.0511);
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x * scale, y * scale)
}

#[inline(always)]
fn cell_at(pos: LngLat, zoom: f64) -> (i64, i64) {
    let (x, y) = world_px(pos, zoom);
    ((x / CLUSTER_RADIUS_PX).floor() as i64, (y / CLUSTER_RADIUS_PX).floor() as i64)
}

/// Smallest zoom above `zoom` at which the member positions land in more
/// than one grid cell. Coincident points never separate; they spiderfy at
/// max zoom.
fn expansion_zoom(positions: &[LngLat], zoom: f64) -> f64 {
    let mut z = zoom.floor() + 1.0;
    while z < MAX_ZOOM {
        let first = cell_at(positions[0], z);
        if positions[1..].iter().any(|&p| cell_at(p, z) != first) {
            return z;
        }
        z += 1.0;
    }
    MAX_ZOOM
}

/// Group the renderable point features of one layer for the current view.
///
/// Non-point geometries are ignored (the caller routes polygons and lines
/// elsewhere). At or above `MAX_ZOOM` every marker renders individually.
pub fn cluster<'a>(
    features: &[&'a GeoFeature],
    bounds: &ViewportBounds,
    zoom: f64,
) -> Vec<ClusterMarker<'a>> {
    let visible_bounds = bounds.padded(PRUNE_MARGIN_DEG);
    let visible: Vec<(&GeoFeature, LngLat)> = features
        .iter()
        .filter_map(|f| match f.geometry {
            Geometry::Point(pos) if visible_bounds.contains(pos) => Some((*f, pos)),
            _ => None,
        })
        .collect();

    if zoom >= MAX_ZOOM {
        return visible
            .into_iter()
            .map(|(feature, position)| ClusterMarker::Single { feature, position })
            .collect();
    }

    // Bin into grid cells; insertion order keeps output deterministic.
    let mut cells: HashMap<(i64, i64), Vec<(&GeoFeature, LngLat)>> = HashMap::new();
    let mut order: Vec<(i64, i64)> = Vec::new();
    for (feature, pos) in visible {
        let key = cell_at(pos, zoom);
        let bucket = cells.entry(key).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push((feature, pos));
    }

    let mut markers = Vec::with_capacity(order.len());
    for key in order {
        let members = cells.remove(&key).unwrap_or_default();
        if members.len() == 1 {
            let (feature, position) = members[0];
            markers.push(ClusterMarker::Single { feature, position });
        } else {
            let count = members.len();
            let positions: Vec<LngLat> = members.iter().map(|&(_, p)| p).collect();
            let mean = LngLat::new(
                positions.iter().map(|p| p.lng).sum::<f64>() / count as f64,
                positions.iter().map(|p| p.lat).sum::<f64>() / count as f64,
            );
            markers.push(ClusterMarker::Cluster {
                position: mean,
                count,
                expands_at: expansion_zoom(&positions, zoom),
                members: members.into_iter().map(|(f, _)| f).collect(),
            });
        }
    }
    markers
}
