//! Pure style resolution: a function of (layer, feature), no hidden state.
//! The hover variant is a computed override, never a mutation of the base
//! style, so stored and displayed styles cannot diverge.

use super::feature::GeoFeature;
use super::layers::MapLayer;

/// Stroke color applied to hovered features.
pub const HOVER_STROKE: &str = "#007bff";
/// Stroke color for boundary polygons.
const BOUNDARY_STROKE: &str = "#333333";

/// Resolved visual style for one feature. Colors are CSS hex strings; the
/// shell converts them to terminal colors at draw time.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub fill_color: String,
    pub stroke_color: String,
    pub weight: f32,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
}

/// Tribal-population choropleth ramp. Thresholds are inclusive lower
/// bounds evaluated top-down; first match wins.
pub fn tribal_population_color(tribal_percentage: f64) -> &'static str {
    if tribal_percentage >= 80.0 {
        "#7f1d1d" // very dark red
    } else if tribal_percentage >= 25.0 {
        "#dc2626" // dark red
    } else if tribal_percentage >= 15.0 {
        "#ef4444" // medium red
    } else if tribal_percentage >= 10.0 {
        "#f59e0b" // orange
    } else if tribal_percentage >= 5.0 {
        "#eab308" // yellow
    } else {
        "#22c55e" // green
    }
}

fn is_boundary_layer(layer_id: &str) -> bool {
    layer_id == "state_boundaries" || layer_id == "district_boundaries"
}

/// Resolve the base style for a feature on a layer.
///
/// Boundary layers shade by `tribalPercentage`; everything else uses the
/// layer color with a feature-level `color` property taking precedence.
/// Opacity scales linearly from the layer's 0-100 slider.
pub fn resolve(layer: &MapLayer, feature: &GeoFeature) -> Style {
    let opacity = layer.opacity as f32 / 100.0;
    let weight = match layer.id.as_str() {
        "state_boundaries" => 2.0,
        "district_boundaries" => 1.0,
        _ => 1.5,
    };

    if is_boundary_layer(&layer.id) {
        let tribal = feature.prop_f64("tribalPercentage").unwrap_or(0.0);
        Style {
            fill_color: tribal_population_color(tribal).to_string(),
            stroke_color: BOUNDARY_STROKE.to_string(),
            weight,
            fill_opacity: opacity * 0.6,
            stroke_opacity: opacity * 0.8,
        }
    } else {
        let color = feature
            .prop_str("color")
            .unwrap_or(&layer.color)
            .to_string();
        Style {
            fill_color: color.clone(),
            stroke_color: color,
            weight,
            fill_opacity: opacity * 0.6,
            stroke_opacity: opacity * 0.8,
        }
    }
}

/// Transient hover override: thicker highlighted stroke, brighter fill.
/// Reverting is just dropping the override and using the base style again.
pub fn hovered(base: &Style, layer: &MapLayer) -> Style {
    let opacity = layer.opacity as f32 / 100.0;
    Style {
        weight: 3.0,
        stroke_color: HOVER_STROKE.to_string(),
        fill_opacity: (opacity * 0.8).min(0.8),
        ..base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::feature::{Geometry, PropValue};
    use crate::engine::layers::{LayerCategory, LayerRegistry, MapLayer};
    use crate::geo::LngLat;

    fn boundary_feature(tribal: f64) -> GeoFeature {
        GeoFeature::new(
            "s1",
            Geometry::Polygon(vec![vec![LngLat::new(80.0, 20.0)]]),
        )
        .with_prop("tribalPercentage", PropValue::Num(tribal))
    }

    #[test]
    fn test_ramp_boundaries_snap_to_higher_bucket() {
        let cases = [
            (0.0, "#22c55e"),
            (4.9, "#22c55e"),
            (5.0, "#eab308"),
            (9.9, "#eab308"),
            (10.0, "#f59e0b"),
            (14.9, "#f59e0b"),
            (15.0, "#ef4444"),
            (24.9, "#ef4444"),
            (25.0, "#dc2626"),
            (80.0, "#7f1d1d"),
            (100.0, "#7f1d1d"),
        ];
        for (pct, expected) in cases {
            assert_eq!(tribal_population_color(pct), expected, "at {pct}%");
        }
    }

    #[test]
    fn test_boundary_layer_uses_ramp() {
        let reg = LayerRegistry::india_default();
        let layer = reg.get("state_boundaries").unwrap();
        let style = resolve(layer, &boundary_feature(22.85));
        assert_eq!(style.fill_color, "#ef4444");
        assert_eq!(style.stroke_color, "#333333");
        assert_eq!(style.weight, 2.0);
    }

    #[test]
    fn test_opacity_scaling() {
        let reg = LayerRegistry::india_default();
        let layer = reg.get("state_boundaries").unwrap(); // opacity 80
        let style = resolve(layer, &boundary_feature(0.0));
        assert!((style.fill_opacity - 0.8 * 0.6).abs() < 1e-6);
        assert!((style.stroke_opacity - 0.8 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_feature_color_overrides_layer_color() {
        let layer = MapLayer::new(
            "fra_claims",
            "FRA Claims",
            LayerCategory::Fra,
            true,
            100,
            "#8b5cf6",
            "",
        );
        let plain = GeoFeature::new("c1", Geometry::Point(LngLat::new(81.0, 20.0)));
        assert_eq!(resolve(&layer, &plain).fill_color, "#8b5cf6");

        let tinted = plain.with_prop("color", PropValue::Str("#ff00ff".into()));
        assert_eq!(resolve(&layer, &tinted).fill_color, "#ff00ff");
    }

    #[test]
    fn test_hover_is_override_not_mutation() {
        let reg = LayerRegistry::india_default();
        let layer = reg.get("state_boundaries").unwrap();
        let feature = boundary_feature(31.78);

        let base = resolve(layer, &feature);
        let hover = hovered(&base, layer);

        assert_eq!(hover.weight, 3.0);
        assert_eq!(hover.stroke_color, HOVER_STROKE);
        assert_eq!(hover.fill_color, base.fill_color);
        // Base style unchanged; hover-exit resolves to the same thing
        assert_eq!(resolve(layer, &feature), base);
    }
}
