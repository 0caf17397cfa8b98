//! Interaction state machine.
//!
//! Hover and selection are the only mutable state here, and every
//! transition is a pure function from (state, event) to (new state,
//! outgoing callbacks) — no rendering-library objects are touched. Feature
//! events and map-level events are dispatched separately: a click on empty
//! map background never clears feature selection.

use super::feature::GeoFeature;
use crate::geo::{LatLng, ViewportBounds};

/// Identity of a feature within a layer, as held in transient UI state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRef {
    pub layer_id: String,
    pub feature_id: String,
}

impl FeatureRef {
    fn of(layer_id: &str, feature: &GeoFeature) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            feature_id: feature.id.clone(),
        }
    }
}

/// A discrete input event from the shell.
#[derive(Debug)]
pub enum Event<'a> {
    /// Pointer entered a feature's footprint.
    FeatureEnter { layer_id: &'a str, feature: &'a GeoFeature },
    /// Pointer left whatever feature was hovered.
    FeatureLeave,
    /// Click landed on a feature.
    FeatureClick { layer_id: &'a str, feature: &'a GeoFeature },
    /// Click landed on empty map background.
    MapClick(LatLng),
    /// Intermediate drag/zoom frame. Never produces callbacks.
    Move,
    /// Viewport movement settled.
    MoveEnd(ViewportBounds),
    /// Viewport zoom settled.
    ZoomEnd(ViewportBounds),
}

/// Callback invocations owed to the outside world after a transition.
/// Each corresponds to one external callback and fires at most once per
/// discrete input event.
#[derive(Clone, Debug, PartialEq)]
pub enum Outgoing {
    FeatureClick(GeoFeature),
    MapClick(LatLng),
    /// Dependent district/analytics lookup keyed by a feature property.
    DistrictClick(String),
    BoundsChange(ViewportBounds),
}

/// District key for the analytics lookup: settlements key by their
/// `village` property, boundary polygons by their display name.
fn district_key(layer_id: &str, feature: &GeoFeature) -> Option<String> {
    match layer_id {
        "settlements" => feature.prop_str("village").map(str::to_string),
        "state_boundaries" | "district_boundaries" => Some(feature.name().to_string()),
        _ => None,
    }
}

/// Routes feature- and map-level events to outgoing callbacks and owns the
/// hovered/selected/popup state.
#[derive(Default)]
pub struct InteractionDispatcher {
    hovered: Option<FeatureRef>,
    selected: Option<FeatureRef>,
    popup: Option<FeatureRef>,
}

impl InteractionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<&FeatureRef> {
        self.hovered.as_ref()
    }

    pub fn selected(&self) -> Option<&FeatureRef> {
        self.selected.as_ref()
    }

    /// Feature whose popup is open, if any.
    pub fn popup(&self) -> Option<&FeatureRef> {
        self.popup.as_ref()
    }

    /// Close the open popup (Esc in the shell). Selection is untouched.
    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn is_hovered(&self, layer_id: &str, feature_id: &str) -> bool {
        self.hovered
            .as_ref()
            .is_some_and(|h| h.layer_id == layer_id && h.feature_id == feature_id)
    }

    pub fn is_selected(&self, layer_id: &str, feature_id: &str) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|s| s.layer_id == layer_id && s.feature_id == feature_id)
    }

    /// Apply one input event, returning the callbacks to invoke.
    pub fn dispatch(&mut self, event: Event<'_>) -> Vec<Outgoing> {
        match event {
            Event::FeatureEnter { layer_id, feature } => {
                self.hovered = Some(FeatureRef::of(layer_id, feature));
                Vec::new()
            }
            Event::FeatureLeave => {
                self.hovered = None;
                Vec::new()
            }
            Event::FeatureClick { layer_id, feature } => {
                // Selecting a new feature implicitly deselects the previous
                // one; at most one feature is ever selected.
                let fref = FeatureRef::of(layer_id, feature);
                self.selected = Some(fref.clone());
                self.popup = Some(fref);

                let mut out = vec![Outgoing::FeatureClick(feature.clone())];
                if let Some(district) = district_key(layer_id, feature) {
                    out.push(Outgoing::DistrictClick(district));
                }
                out
            }
            Event::MapClick(latlng) => vec![Outgoing::MapClick(latlng)],
            Event::Move => Vec::new(),
            Event::MoveEnd(bounds) | Event::ZoomEnd(bounds) => {
                vec![Outgoing::BoundsChange(bounds)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::feature::{Geometry, PropValue};
    use crate::geo::LngLat;

    fn settlement(id: &str, village: &str) -> GeoFeature {
        GeoFeature::new(id, Geometry::Point(LngLat::new(80.0, 20.0)))
            .with_prop("village", PropValue::Str(village.to_string()))
    }

    #[test]
    fn test_hover_cycle_returns_to_idle() {
        let mut d = InteractionDispatcher::new();
        let f = settlement("v1", "Bastar");

        assert!(d.dispatch(Event::FeatureEnter { layer_id: "settlements", feature: &f }).is_empty());
        assert!(d.is_hovered("settlements", "v1"));

        assert!(d.dispatch(Event::FeatureLeave).is_empty());
        assert!(d.hovered().is_none());
        assert!(d.selected().is_none());
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut d = InteractionDispatcher::new();
        let a = settlement("a", "Bastar");
        let b = settlement("b", "Dantewada");

        d.dispatch(Event::FeatureClick { layer_id: "settlements", feature: &a });
        assert!(d.is_selected("settlements", "a"));

        d.dispatch(Event::FeatureClick { layer_id: "settlements", feature: &b });
        assert!(d.is_selected("settlements", "b"));
        assert!(!d.is_selected("settlements", "a"));
    }

    #[test]
    fn test_map_click_keeps_selection() {
        let mut d = InteractionDispatcher::new();
        let a = settlement("a", "Bastar");
        d.dispatch(Event::FeatureClick { layer_id: "settlements", feature: &a });

        let out = d.dispatch(Event::MapClick(LatLng::new(22.0, 79.0)));
        assert_eq!(out, vec![Outgoing::MapClick(LatLng::new(22.0, 79.0))]);
        assert!(d.is_selected("settlements", "a"));
    }

    #[test]
    fn test_click_emits_feature_and_district_callbacks() {
        let mut d = InteractionDispatcher::new();
        let f = settlement("v1", "Bastar");

        let out = d.dispatch(Event::FeatureClick { layer_id: "settlements", feature: &f });
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Outgoing::FeatureClick(clicked) if clicked.id == "v1"));
        assert_eq!(out[1], Outgoing::DistrictClick("Bastar".to_string()));
    }

    #[test]
    fn test_boundary_click_uses_name_as_district_key() {
        let mut d = InteractionDispatcher::new();
        let state = GeoFeature::new(
            "MP",
            Geometry::Polygon(vec![vec![LngLat::new(78.0, 23.0)]]),
        )
        .with_prop("name", PropValue::Str("Madhya Pradesh".into()));

        let out = d.dispatch(Event::FeatureClick { layer_id: "state_boundaries", feature: &state });
        assert!(out.contains(&Outgoing::DistrictClick("Madhya Pradesh".to_string())));
    }

    #[test]
    fn test_bounds_change_fires_once_per_settle() {
        let mut d = InteractionDispatcher::new();
        let bounds = ViewportBounds::new(LatLng::new(10.0, 70.0), LatLng::new(30.0, 90.0));

        let mut callbacks = Vec::new();
        for _ in 0..25 {
            callbacks.extend(d.dispatch(Event::Move));
        }
        callbacks.extend(d.dispatch(Event::MoveEnd(bounds)));

        let bound_changes = callbacks
            .iter()
            .filter(|o| matches!(o, Outgoing::BoundsChange(_)))
            .count();
        assert_eq!(bound_changes, 1);
    }
}
