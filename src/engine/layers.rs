//! Layer registry: the one place layer visibility and opacity are mutated.

/// Panel grouping for a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerCategory {
    Base,
    Fra,
    Satellite,
    Analysis,
}

/// A named, independently toggleable collection of features sharing a
/// rendering style. Created once from configuration; only `visible` and
/// `opacity` change afterwards.
#[derive(Clone, Debug)]
pub struct MapLayer {
    pub id: String,
    pub name: String,
    pub category: LayerCategory,
    pub visible: bool,
    /// 0-100, clamped on write.
    pub opacity: u8,
    /// Default feature color; boundary layers ignore this in favor of the
    /// tribal-percentage ramp.
    pub color: String,
    pub description: String,
}

impl MapLayer {
    pub fn new(
        id: &str,
        name: &str,
        category: LayerCategory,
        visible: bool,
        opacity: u8,
        color: &str,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            visible,
            opacity: opacity.min(100),
            color: color.to_string(),
            description: description.to_string(),
        }
    }
}

/// Exclusive owner of the `MapLayer` records.
pub struct LayerRegistry {
    layers: Vec<MapLayer>,
}

impl LayerRegistry {
    pub fn new(layers: Vec<MapLayer>) -> Self {
        Self { layers }
    }

    /// The FRA atlas layer set.
    pub fn india_default() -> Self {
        Self::new(vec![
            MapLayer::new(
                "state_boundaries",
                "State Boundaries",
                LayerCategory::Base,
                true,
                80,
                "#6b7280",
                "Priority state outlines with tribal population shading",
            ),
            MapLayer::new(
                "district_boundaries",
                "District Boundaries",
                LayerCategory::Base,
                false,
                70,
                "#9ca3af",
                "District outlines with FRA claim counts",
            ),
            MapLayer::new(
                "settlements",
                "Tribal Settlements",
                LayerCategory::Fra,
                true,
                90,
                "#3b82f6",
                "Village and habitation points, clustered at low zoom",
            ),
            MapLayer::new(
                "fra_claims",
                "FRA Claims",
                LayerCategory::Fra,
                true,
                75,
                "#8b5cf6",
                "Individual and community forest rights claim areas",
            ),
            MapLayer::new(
                "water_bodies",
                "Water Bodies",
                LayerCategory::Analysis,
                false,
                70,
                "#06b6d4",
                "Surface water relevant to habitat claims",
            ),
            MapLayer::new(
                "forest_cover",
                "Forest Cover",
                LayerCategory::Analysis,
                false,
                60,
                "#16a34a",
                "Dense and open forest extent",
            ),
        ])
    }

    pub fn get(&self, layer_id: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    /// Flip a layer's visibility. Unknown ids are a no-op, not an error.
    pub fn toggle(&mut self, layer_id: &str) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == layer_id) {
            layer.visible = !layer.visible;
        }
    }

    /// Set opacity, clamping to 0-100. Unknown ids are a no-op.
    pub fn set_opacity(&mut self, layer_id: &str, value: i32) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == layer_id) {
            layer.opacity = value.clamp(0, 100) as u8;
        }
    }

    /// Nudge opacity by a delta (slider keys in the shell).
    pub fn adjust_opacity(&mut self, layer_id: &str, delta: i32) {
        if let Some(layer) = self.layers.iter().find(|l| l.id == layer_id) {
            let next = layer.opacity as i32 + delta;
            self.set_opacity(layer_id, next);
        }
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn layers_by_category(&self, category: LayerCategory) -> Vec<&MapLayer> {
        self.layers.iter().filter(|l| l.category == category).collect()
    }

    pub fn visible_layers(&self) -> Vec<&MapLayer> {
        self.layers.iter().filter(|l| l.visible).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores() {
        let mut reg = LayerRegistry::india_default();
        let before = reg.get("settlements").unwrap().visible;
        reg.toggle("settlements");
        assert_ne!(reg.get("settlements").unwrap().visible, before);
        reg.toggle("settlements");
        assert_eq!(reg.get("settlements").unwrap().visible, before);
    }

    #[test]
    fn test_toggle_unknown_is_noop() {
        let mut reg = LayerRegistry::india_default();
        let count = reg.visible_layers().len();
        reg.toggle("no_such_layer");
        assert_eq!(reg.visible_layers().len(), count);
    }

    #[test]
    fn test_opacity_clamped() {
        let mut reg = LayerRegistry::india_default();
        reg.set_opacity("settlements", -10);
        assert_eq!(reg.get("settlements").unwrap().opacity, 0);
        reg.set_opacity("settlements", 150);
        assert_eq!(reg.get("settlements").unwrap().opacity, 100);
        reg.set_opacity("settlements", 55);
        assert_eq!(reg.get("settlements").unwrap().opacity, 55);
    }

    #[test]
    fn test_category_query() {
        let reg = LayerRegistry::india_default();
        let base = reg.layers_by_category(LayerCategory::Base);
        assert!(base.iter().all(|l| l.category == LayerCategory::Base));
        assert!(base.iter().any(|l| l.id == "state_boundaries"));
    }
}
