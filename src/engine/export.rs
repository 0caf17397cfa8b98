//! GeoJSON boundary: export of the active feature set and the permissive
//! parser shared with the data loader. Export is a pure, synchronous
//! transform — nothing is persisted engine-side.

use super::feature::{GeoFeature, Geometry, Properties, PropValue};
use crate::geo::LngLat;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

fn pair(pos: LngLat) -> Vec<f64> {
    vec![pos.lng, pos.lat]
}

fn line(coords: &[LngLat]) -> Vec<Vec<f64>> {
    coords.iter().map(|&p| pair(p)).collect()
}

fn geometry_to_value(geometry: &Geometry) -> geojson::Value {
    match geometry {
        Geometry::Point(pos) => geojson::Value::Point(pair(*pos)),
        Geometry::LineString(coords) => geojson::Value::LineString(line(coords)),
        Geometry::Polygon(rings) => {
            geojson::Value::Polygon(rings.iter().map(|r| line(r)).collect())
        }
    }
}

fn prop_to_json(value: &PropValue) -> JsonValue {
    match value {
        PropValue::Str(s) => JsonValue::String(s.clone()),
        PropValue::Num(n) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        PropValue::Bool(b) => JsonValue::Bool(*b),
    }
}

fn prop_from_json(value: &JsonValue) -> Option<PropValue> {
    match value {
        JsonValue::String(s) => Some(PropValue::Str(s.clone())),
        JsonValue::Number(n) => n.as_f64().map(PropValue::Num),
        JsonValue::Bool(b) => Some(PropValue::Bool(*b)),
        // Nested objects/arrays/nulls fall outside the closed value set
        _ => None,
    }
}

/// Convert one engine feature to a wire feature.
pub fn to_geojson_feature(feature: &GeoFeature) -> Feature {
    let mut properties = JsonObject::new();
    for (key, value) in &feature.properties {
        properties.insert(key.clone(), prop_to_json(value));
    }
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geometry_to_value(&feature.geometry))),
        id: Some(geojson::feature::Id::String(feature.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Serialize the active feature set as a GeoJSON FeatureCollection.
pub fn export_geojson<'a>(features: impl IntoIterator<Item = &'a GeoFeature>) -> String {
    let collection = FeatureCollection {
        bbox: None,
        features: features.into_iter().map(to_geojson_feature).collect(),
        foreign_members: None,
    };
    GeoJson::FeatureCollection(collection).to_string()
}

fn coords_to_lnglat(coords: &[Vec<f64>]) -> Vec<LngLat> {
    coords
        .iter()
        .map(|c| LngLat::new(
            c.first().copied().unwrap_or(f64::NAN),
            c.get(1).copied().unwrap_or(f64::NAN),
        ))
        .collect()
}

/// Decompose one wire geometry into engine geometries. Multi-part kinds
/// split into parts; unknown-but-benign kinds degrade to line strings so
/// they still reach the generic renderer instead of being rejected.
fn decompose(value: &geojson::Value, out: &mut Vec<Geometry>) {
    match value {
        geojson::Value::Point(c) => out.push(Geometry::Point(LngLat::new(
            c.first().copied().unwrap_or(f64::NAN),
            c.get(1).copied().unwrap_or(f64::NAN),
        ))),
        geojson::Value::MultiPoint(points) => {
            for c in points {
                decompose(&geojson::Value::Point(c.clone()), out);
            }
        }
        geojson::Value::LineString(coords) => {
            out.push(Geometry::LineString(coords_to_lnglat(coords)));
        }
        geojson::Value::MultiLineString(lines) => {
            for coords in lines {
                out.push(Geometry::LineString(coords_to_lnglat(coords)));
            }
        }
        geojson::Value::Polygon(rings) => {
            out.push(Geometry::Polygon(rings.iter().map(|r| coords_to_lnglat(r)).collect()));
        }
        geojson::Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(Geometry::Polygon(rings.iter().map(|r| coords_to_lnglat(r)).collect()));
            }
        }
        geojson::Value::GeometryCollection(geometries) => {
            for g in geometries {
                decompose(&g.value, out);
            }
        }
    }
}

fn properties_from(feature: &Feature) -> Properties {
    let mut properties = Properties::new();
    if let Some(object) = &feature.properties {
        for (key, value) in object {
            if let Some(prop) = prop_from_json(value) {
                properties.insert(key.clone(), prop);
            }
        }
    }
    properties
}

fn id_of(feature: &Feature, fallback: usize) -> String {
    match &feature.id {
        Some(geojson::feature::Id::String(s)) => s.clone(),
        Some(geojson::feature::Id::Number(n)) => n.to_string(),
        None => format!("feature_{fallback}"),
    }
}

/// Extract engine features from parsed GeoJSON. Features without geometry
/// are skipped; multi-part geometries become one feature per part with an
/// indexed id suffix.
pub fn features_from_geojson(geojson: &GeoJson) -> Vec<GeoFeature> {
    let mut out = Vec::new();
    let mut push_feature = |feature: &Feature, fallback: usize| {
        let Some(geometry) = &feature.geometry else { return };
        let mut parts = Vec::new();
        decompose(&geometry.value, &mut parts);
        let id = id_of(feature, fallback);
        let multi = parts.len() > 1;
        for (i, part) in parts.into_iter().enumerate() {
            let part_id = if multi { format!("{id}_{i}") } else { id.clone() };
            out.push(GeoFeature {
                id: part_id,
                geometry: part,
                properties: properties_from(feature),
            });
        }
    };

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for (i, feature) in fc.features.iter().enumerate() {
                push_feature(feature, i);
            }
        }
        GeoJson::Feature(feature) => push_feature(feature, 0),
        GeoJson::Geometry(geometry) => {
            let mut parts = Vec::new();
            decompose(&geometry.value, &mut parts);
            for (i, part) in parts.into_iter().enumerate() {
                out.push(GeoFeature::new(format!("feature_{i}"), part));
            }
        }
    }
    out
}

/// Parse a GeoJSON document into engine features.
pub fn parse_geojson(content: &str) -> Result<Vec<GeoFeature>> {
    let geojson: GeoJson = content.parse().context("invalid GeoJSON")?;
    Ok(features_from_geojson(&geojson))
}
