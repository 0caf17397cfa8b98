//! Per-frame render pass: registry -> zoom policy -> validation -> style ->
//! clustering, emitting geographic primitives for the shell to project and
//! draw. Validation and style resolution for a pass always complete before
//! cluster/marker placement, so an invalid feature can never reach the
//! clustering or interaction layer. A pass borrows the caller's feature
//! collections for its lifetime only; nothing is cached across passes.

use super::centroid::centroid;
use super::cluster::{self, ClusterMarker};
use super::feature::{filter_valid, Diagnostic, GeoFeature, Geometry};
use super::interact::InteractionDispatcher;
use super::layers::LayerRegistry;
use super::style::{self, Style};
use super::zoom;
use crate::geo::{LatLng, LngLat, ViewportBounds};
use std::collections::HashMap;

/// Text placed at a polygon centroid.
#[derive(Clone, Debug)]
pub struct Label {
    pub position: LatLng,
    pub text: String,
}

/// A drawable geographic primitive with its resolved style.
pub enum Primitive<'a> {
    Polygon {
        layer_id: &'a str,
        feature: &'a GeoFeature,
        ring: &'a [LngLat],
        style: Style,
        label: Option<Label>,
    },
    Line {
        layer_id: &'a str,
        feature: &'a GeoFeature,
        coords: &'a [LngLat],
        style: Style,
    },
    Marker {
        layer_id: &'a str,
        feature: &'a GeoFeature,
        position: LngLat,
        style: Style,
        selected: bool,
    },
    ClusterBubble {
        layer_id: &'a str,
        position: LngLat,
        count: usize,
        expands_at: f64,
        style: Style,
    },
}

/// Output of one render pass. A new pass supersedes a stale one wholesale.
pub struct RenderPass<'a> {
    pub primitives: Vec<Primitive<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Style for a cluster bubble: the layer's own color at full configured
/// opacity (clusters have no single source feature).
fn cluster_style(layer: &super::layers::MapLayer) -> Style {
    let opacity = layer.opacity as f32 / 100.0;
    Style {
        fill_color: layer.color.clone(),
        stroke_color: layer.color.clone(),
        weight: 1.5,
        fill_opacity: opacity * 0.6,
        stroke_opacity: opacity * 0.8,
    }
}

/// Run a render pass over the caller-owned feature collections.
pub fn run<'a>(
    registry: &'a LayerRegistry,
    geo_features: &'a HashMap<String, Vec<GeoFeature>>,
    zoom_level: f64,
    bounds: &ViewportBounds,
    dispatcher: &InteractionDispatcher,
) -> RenderPass<'a> {
    let mut primitives = Vec::new();
    let mut diagnostics = Vec::new();

    for layer in registry.visible_layers() {
        if !zoom::is_renderable(&layer.id, zoom_level) {
            continue;
        }
        // An absent or empty collection renders nothing; not an error
        let Some(features) = geo_features.get(&layer.id) else { continue };

        let valid = filter_valid(&layer.id, features, &mut diagnostics);

        // Resolve every style up front so clustering only ever sees
        // validated, styled features.
        let styled: Vec<(&GeoFeature, Style)> = valid
            .iter()
            .map(|&f| {
                let base = style::resolve(layer, f);
                let s = if dispatcher.is_hovered(&layer.id, &f.id) {
                    style::hovered(&base, layer)
                } else {
                    base
                };
                (f, s)
            })
            .collect();

        let mut points: Vec<&GeoFeature> = Vec::new();
        let mut styles_by_id: HashMap<&str, &Style> = HashMap::new();

        for (feature, s) in &styled {
            styles_by_id.insert(feature.id.as_str(), s);
            match &feature.geometry {
                Geometry::Point(_) => points.push(feature),
                Geometry::Polygon(rings) => {
                    let ring = rings.first().map(|r| r.as_slice()).unwrap_or(&[]);
                    primitives.push(Primitive::Polygon {
                        layer_id: &layer.id,
                        feature,
                        ring,
                        style: s.clone(),
                        label: polygon_label(&layer.id, feature, ring),
                    });
                }
                Geometry::LineString(coords) => {
                    primitives.push(Primitive::Line {
                        layer_id: &layer.id,
                        feature,
                        coords,
                        style: s.clone(),
                    });
                }
            }
        }

        for marker in cluster::cluster(&points, bounds, zoom_level) {
            match marker {
                ClusterMarker::Single { feature, position } => {
                    let style = styles_by_id
                        .get(feature.id.as_str())
                        .map(|&s| s.clone())
                        .unwrap_or_else(|| cluster_style(layer));
                    primitives.push(Primitive::Marker {
                        layer_id: &layer.id,
                        feature,
                        position,
                        style,
                        selected: dispatcher.is_selected(&layer.id, &feature.id),
                    });
                }
                ClusterMarker::Cluster { position, count, expands_at, .. } => {
                    primitives.push(Primitive::ClusterBubble {
                        layer_id: &layer.id,
                        position,
                        count,
                        expands_at,
                        style: cluster_style(layer),
                    });
                }
            }
        }
    }

    RenderPass { primitives, diagnostics }
}

/// State boundaries carry a name + tribal-share label at their centroid.
/// A degenerate centroid just means no label for that polygon.
fn polygon_label(layer_id: &str, feature: &GeoFeature, ring: &[LngLat]) -> Option<Label> {
    if layer_id != "state_boundaries" {
        return None;
    }
    let position = centroid(ring)?;
    let tribal = feature.prop_f64("tribalPercentage").unwrap_or(0.0);
    Some(Label {
        position,
        text: format!("{} {:.1}%", feature.name(), tribal),
    })
}

/// Ray-casting point-in-ring test (even-odd rule).
fn point_in_ring(pos: LngLat, ring: &[LngLat]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.lat > pos.lat) != (b.lat > pos.lat) {
            let x = (b.lng - a.lng) * (pos.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if pos.lng < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// What the pointer is over.
pub enum Hit<'a> {
    Feature { layer_id: &'a str, feature: &'a GeoFeature },
    Cluster { expands_at: f64, position: LngLat },
}

#[inline(always)]
fn near(a: LngLat, b: LngLat, tolerance_deg: f64) -> bool {
    (a.lng - b.lng).abs() <= tolerance_deg && (a.lat - b.lat).abs() <= tolerance_deg
}

enum IndexEntry {
    Marker {
        layer_id: String,
        feature: GeoFeature,
        position: LngLat,
    },
    Bubble {
        position: LngLat,
        expands_at: f64,
    },
    Polygon {
        layer_id: String,
        feature: GeoFeature,
        ring: Vec<LngLat>,
    },
}

/// Result of an index lookup, borrowing the index's owned copies.
pub enum IndexHit<'a> {
    Feature { layer_id: &'a str, feature: &'a GeoFeature },
    Cluster { expands_at: f64, position: LngLat },
}

/// Owned snapshot of a pass's hit geometry. Pointer moves between view
/// changes test against this, so per-move cost is proportional to the
/// emitted primitives instead of a full validate/style/cluster pass.
pub struct HitIndex {
    entries: Vec<IndexEntry>,
}

impl HitIndex {
    pub fn from_pass(pass: &RenderPass<'_>) -> Self {
        let entries = pass
            .primitives
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::Marker { layer_id, feature, position, .. } => {
                    Some(IndexEntry::Marker {
                        layer_id: layer_id.to_string(),
                        feature: (*feature).clone(),
                        position: *position,
                    })
                }
                Primitive::ClusterBubble { position, expands_at, .. } => {
                    Some(IndexEntry::Bubble {
                        position: *position,
                        expands_at: *expands_at,
                    })
                }
                Primitive::Polygon { layer_id, feature, ring, .. } => {
                    Some(IndexEntry::Polygon {
                        layer_id: layer_id.to_string(),
                        feature: (*feature).clone(),
                        ring: ring.to_vec(),
                    })
                }
                Primitive::Line { .. } => None,
            })
            .collect();
        Self { entries }
    }

    /// Same matching rules and reverse draw order as `hit_test`.
    pub fn test(&self, pos: LngLat, marker_tolerance_deg: f64) -> Option<IndexHit<'_>> {
        for entry in self.entries.iter().rev() {
            match entry {
                IndexEntry::Marker { layer_id, feature, position } => {
                    if near(*position, pos, marker_tolerance_deg) {
                        return Some(IndexHit::Feature { layer_id, feature });
                    }
                }
                IndexEntry::Bubble { position, expands_at } => {
                    if near(*position, pos, marker_tolerance_deg) {
                        return Some(IndexHit::Cluster {
                            expands_at: *expands_at,
                            position: *position,
                        });
                    }
                }
                IndexEntry::Polygon { layer_id, feature, ring } => {
                    if point_in_ring(pos, ring) {
                        return Some(IndexHit::Feature { layer_id, feature });
                    }
                }
            }
        }
        None
    }
}

/// Find the topmost primitive under a geographic position. Markers and
/// cluster bubbles win within `marker_tolerance_deg`; polygons match by
/// containment. Primitives are tested in reverse draw order.
pub fn hit_test<'a>(
    pass: &'a RenderPass<'a>,
    pos: LngLat,
    marker_tolerance_deg: f64,
) -> Option<Hit<'a>> {
    for primitive in pass.primitives.iter().rev() {
        match primitive {
            Primitive::Marker { layer_id, feature, position, .. } => {
                if near(*position, pos, marker_tolerance_deg) {
                    return Some(Hit::Feature { layer_id, feature });
                }
            }
            Primitive::ClusterBubble { position, expands_at, .. } => {
                if near(*position, pos, marker_tolerance_deg) {
                    return Some(Hit::Cluster { expands_at: *expands_at, position: *position });
                }
            }
            Primitive::Polygon { layer_id, feature, ring, .. } => {
                if point_in_ring(pos, ring) {
                    return Some(Hit::Feature { layer_id, feature });
                }
            }
            Primitive::Line { .. } => {}
        }
    }
    None
}
