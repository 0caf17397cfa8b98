use crate::geo::LngLat;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// A property value. Feature attribute bags are duck-typed in the wire
/// format; inside the engine they are restricted to this closed set.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl PropValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(s) => write!(f, "{s}"),
            // Whole numbers print without a trailing .0 (counts, populations)
            PropValue::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            PropValue::Num(n) => write!(f, "{n:.1}"),
            PropValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Attribute bag attached to a feature. BTreeMap keeps fallback popup
/// output in a stable order.
pub type Properties = BTreeMap<String, PropValue>;

/// Feature geometry. `LineString` doubles as the permissive catch-all:
/// wire geometries the engine has no special handling for (rivers,
/// multi-part outlines) are decomposed into line strings by the loader
/// and rendered generically.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(LngLat),
    LineString(Vec<LngLat>),
    Polygon(Vec<Vec<LngLat>>),
}

impl Geometry {
    /// Exterior ring of a polygon. Only the first ring is authoritative;
    /// holes are carried through export but never rendered.
    pub fn exterior_ring(&self) -> Option<&[LngLat]> {
        match self {
            Geometry::Polygon(rings) => rings.first().map(|r| r.as_slice()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
        }
    }
}

/// A single geometric entity with attached attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub id: String,
    pub geometry: Geometry,
    pub properties: Properties,
}

impl GeoFeature {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: PropValue) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(PropValue::as_f64)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(PropValue::as_str)
    }

    /// Display name, falling back to the feature id.
    pub fn name(&self) -> &str {
        self.prop_str("name").unwrap_or(&self.id)
    }
}

/// Immutable reference data for a village. Selection is engine-owned
/// transient state, never a mutation of this record.
#[derive(Clone, Debug)]
pub struct Village {
    pub id: String,
    pub name: String,
    pub district: String,
    pub state: String,
    /// Canonical lng/lat order (see `geo` module docs).
    pub position: LngLat,
    pub population: u64,
    pub tribal_population: u64,
    pub forest_cover: f64,
    pub water_index: f64,
}

/// Report of a feature dropped by validation. Diagnostics are collected,
/// never raised — a malformed feature degrades to "not rendered".
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub layer_id: String,
    pub feature_id: String,
    pub reason: &'static str,
}

/// Point features must carry exactly one finite coordinate pair; polygons
/// must have a non-empty first ring. Everything else passes by default so
/// benign geometry kinds the engine does not know about still render.
pub fn check_geometry(feature: &GeoFeature) -> Option<&'static str> {
    match &feature.geometry {
        Geometry::Point(pos) => {
            if pos.is_finite() {
                None
            } else {
                Some("point coordinates not finite")
            }
        }
        Geometry::Polygon(rings) => match rings.first() {
            None => Some("polygon has no rings"),
            Some(ring) if ring.is_empty() => Some("polygon exterior ring is empty"),
            Some(_) => None,
        },
        _ => None,
    }
}

/// Feature sets large enough that serial validation would stall the input
/// loop go through rayon instead.
const PARALLEL_VALIDATION_THRESHOLD: usize = 4096;

/// Filter a layer's features down to the valid set, reporting drops.
/// Output order always matches input order, serial or parallel.
pub fn filter_valid<'a>(
    layer_id: &str,
    features: &'a [GeoFeature],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<&'a GeoFeature> {
    let verdicts: Vec<Option<&'static str>> = if features.len() >= PARALLEL_VALIDATION_THRESHOLD {
        features.par_iter().map(check_geometry).collect()
    } else {
        features.iter().map(check_geometry).collect()
    };

    let mut valid = Vec::with_capacity(features.len());
    for (feature, verdict) in features.iter().zip(verdicts) {
        match verdict {
            None => valid.push(feature),
            Some(reason) => diagnostics.push(Diagnostic {
                layer_id: layer_id.to_string(),
                feature_id: feature.id.clone(),
                reason,
            }),
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lng: f64, lat: f64) -> GeoFeature {
        GeoFeature::new("p", Geometry::Point(LngLat::new(lng, lat)))
    }

    #[test]
    fn test_point_accepts_iff_finite() {
        assert!(check_geometry(&point(78.9, 21.1)).is_none());
        assert!(check_geometry(&point(f64::NAN, 21.1)).is_some());
        assert!(check_geometry(&point(78.9, f64::INFINITY)).is_some());
    }

    #[test]
    fn test_polygon_rejects_iff_first_ring_missing_or_empty() {
        let no_rings = GeoFeature::new("a", Geometry::Polygon(vec![]));
        let empty_ring = GeoFeature::new("b", Geometry::Polygon(vec![vec![]]));
        let one_vertex =
            GeoFeature::new("c", Geometry::Polygon(vec![vec![LngLat::new(80.0, 20.0)]]));

        assert!(check_geometry(&no_rings).is_some());
        assert!(check_geometry(&empty_ring).is_some());
        assert!(check_geometry(&one_vertex).is_none());
    }

    #[test]
    fn test_unknown_kinds_pass_by_default() {
        let line = GeoFeature::new("l", Geometry::LineString(vec![]));
        assert!(check_geometry(&line).is_none());
    }

    #[test]
    fn test_filter_reports_and_preserves_order() {
        let features = vec![
            point(80.0, 20.0),
            point(f64::NAN, 0.0),
            point(81.0, 21.0),
        ];
        let mut diags = Vec::new();
        let valid = filter_valid("settlements", &features, &mut diags);

        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].geometry, features[0].geometry);
        assert_eq!(valid[1].geometry, features[2].geometry);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].layer_id, "settlements");
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut features = Vec::new();
        for i in 0..(PARALLEL_VALIDATION_THRESHOLD + 100) {
            let lng = if i % 7 == 0 { f64::NAN } else { 70.0 + (i % 30) as f64 };
            features.push(GeoFeature::new(
                format!("f{i}"),
                Geometry::Point(LngLat::new(lng, 20.0)),
            ));
        }

        let mut par_diags = Vec::new();
        let par: Vec<&str> = filter_valid("x", &features, &mut par_diags)
            .iter()
            .map(|f| f.id.as_str())
            .collect();

        let mut ser_diags = Vec::new();
        let head = &features[..100];
        let ser: Vec<&str> = filter_valid("x", head, &mut ser_diags)
            .iter()
            .map(|f| f.id.as_str())
            .collect();

        // Serial prefix agrees with the parallel run on the same features
        assert_eq!(&par[..ser.len()], &ser[..]);
        assert_eq!(
            par_diags.len(),
            features.iter().filter(|f| check_geometry(f).is_some()).count()
        );
    }
}
