//! Per-layer zoom gating. Bounds the number of on-screen primitives at low
//! zoom, where rendering every settlement point is a performance hazard and
//! visually meaningless anyway.

/// Zoom at which individual villages become meaningful. Below this,
/// settlement layers do not render (their points still cluster-count in the
/// status bar via the layer panel, but no primitives are emitted).
pub const VILLAGE_LEVEL: f64 = 11.0;

/// Zoom at/above which clusters always break apart into single markers.
pub const MAX_ZOOM: f64 = 18.0;

/// Whether a layer is eligible for rendering at the current zoom.
/// Boundary layers are always renderable; settlement points only at or
/// above village level; everything else defaults to renderable.
pub fn is_renderable(layer_id: &str, current_zoom: f64) -> bool {
    match layer_id {
        "state_boundaries" | "district_boundaries" => true,
        "settlements" => current_zoom >= VILLAGE_LEVEL,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlements_gated_by_village_level() {
        assert!(!is_renderable("settlements", VILLAGE_LEVEL - 0.1));
        assert!(!is_renderable("settlements", 4.0));
        assert!(is_renderable("settlements", VILLAGE_LEVEL));
        assert!(is_renderable("settlements", 18.0));
    }

    #[test]
    fn test_boundaries_always_renderable() {
        for zoom in [1.0, 4.0, VILLAGE_LEVEL, 18.0] {
            assert!(is_renderable("state_boundaries", zoom));
            assert!(is_renderable("district_boundaries", zoom));
        }
    }

    #[test]
    fn test_other_layers_default_renderable() {
        assert!(is_renderable("fra_claims", 2.0));
        assert!(is_renderable("water_bodies", 2.0));
    }
}
