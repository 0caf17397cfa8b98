use crate::engine::export::export_geojson;
use crate::engine::interact::Event as MapEvent;
use crate::engine::popup::{self, PopupContent};
use crate::engine::render::{self, HitIndex, IndexHit};
use crate::engine::{
    Basemap, GeoFeature, InteractionDispatcher, LayerRegistry, Outgoing, Village,
};
use crate::geo::{LngLat, ViewportBounds};
use crate::map::Viewport;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Frames without movement before a drag/zoom counts as settled and the
/// bounds-change callback fires. ~100ms at the 60fps poll rate.
const SETTLE_FRAMES: u8 = 6;

/// Pixel tolerance for marker hit-testing, converted to degrees at the
/// current zoom before each test.
const MARKER_HIT_PX: f64 = 6.0;

const EXPORT_PATH: &str = "fra-atlas-export.geojson";

/// Which kind of settle callback a pending viewport change owes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PendingSettle {
    Move,
    Zoom,
}

/// Owned snapshot of a hit-test result, so dispatching can mutate state
/// after the index borrow ends.
enum OwnedHit {
    Feature { layer_id: String, feature: GeoFeature },
    Cluster { expands_at: f64, position: LngLat },
    Nothing,
}

/// View state the hit index depends on. Hover and opacity change styles
/// only, never hit geometry, so they are deliberately absent.
#[derive(Clone, Debug, PartialEq)]
struct HitKey {
    zoom_bits: u64,
    center_bits: (u64, u64),
    width: usize,
    height: usize,
    visible: Vec<String>,
}

/// Application state: the engine pieces plus terminal-side view state.
pub struct App {
    pub viewport: Viewport,
    pub layers: LayerRegistry,
    pub dispatcher: InteractionDispatcher,
    pub geo_features: HashMap<String, Vec<GeoFeature>>,
    pub villages: Vec<Village>,
    pub selected_village: Option<usize>,
    pub basemap: Basemap,
    /// Layer targeted by the opacity keys; Tab cycles it.
    pub active_layer: usize,
    /// Popup panel content, rebuilt on each feature click.
    pub popup: Option<PopupContent>,
    /// Most recent outgoing callbacks, newest last.
    pub event_log: Vec<String>,
    /// Features dropped by validation in the latest render pass.
    pub dropped_count: usize,
    pub should_quit: bool,
    pub last_mouse: Option<(u16, u16)>,
    pub mouse_pos: Option<(u16, u16)>,
    dragged: bool,
    pending_settle: Option<PendingSettle>,
    idle_frames: u8,
    /// Hover/click geometry for the current view, rebuilt only when the
    /// view or visible layer set changes.
    hit_cache: Option<(HitKey, HitIndex)>,
}

impl App {
    pub fn new(width: usize, height: usize) -> Self {
        let (pw, ph) = Self::inner_pixels(width, height);
        Self {
            viewport: Viewport::india(pw, ph),
            layers: LayerRegistry::india_default(),
            dispatcher: InteractionDispatcher::new(),
            geo_features: HashMap::new(),
            villages: Vec::new(),
            selected_village: None,
            basemap: Basemap::Street,
            active_layer: 0,
            popup: None,
            event_log: Vec::new(),
            dropped_count: 0,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            dragged: false,
            pending_settle: None,
            idle_frames: 0,
            hit_cache: None,
        }
    }

    /// Braille pixel dimensions inside the map border and above the
    /// status bar (2x4 pixels per character cell).
    fn inner_pixels(width: usize, height: usize) -> (usize, usize) {
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        (inner_width * 2, inner_height * 4)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let (pw, ph) = Self::inner_pixels(width, height);
        self.viewport.width = pw;
        self.viewport.height = ph;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.mark_moved(PendingSettle::Move);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.mark_moved(PendingSettle::Zoom);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.mark_moved(PendingSettle::Zoom);
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::pixel_at(col, row);
        self.viewport.zoom_in_at(px, py);
        self.mark_moved(PendingSettle::Zoom);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::pixel_at(col, row);
        self.viewport.zoom_out_at(px, py);
        self.mark_moved(PendingSettle::Zoom);
    }

    /// Convert terminal column/row to braille pixel coordinates, offset
    /// for the one-cell border.
    fn pixel_at(col: u16, row: u16) -> (i32, i32) {
        (
            (col.saturating_sub(1)) as i32 * 2,
            (row.saturating_sub(1)) as i32 * 4,
        )
    }

    fn mark_moved(&mut self, kind: PendingSettle) {
        // A zoom settle subsumes a pending move settle, not vice versa
        if kind == PendingSettle::Zoom || self.pending_settle.is_none() {
            self.pending_settle = Some(kind);
        }
        self.idle_frames = 0;
        // Intermediate frames never reach the outside world
        self.dispatcher.dispatch(MapEvent::Move);
    }

    /// Per-frame tick. Fires the settle callback exactly once after the
    /// viewport has been still for SETTLE_FRAMES.
    pub fn tick(&mut self) {
        let Some(kind) = self.pending_settle else { return };
        self.idle_frames = self.idle_frames.saturating_add(1);
        if self.idle_frames < SETTLE_FRAMES {
            return;
        }
        self.pending_settle = None;

        let bounds = self.viewport.bounds();
        let event = match kind {
            PendingSettle::Move => MapEvent::MoveEnd(bounds),
            PendingSettle::Zoom => MapEvent::ZoomEnd(bounds),
        };
        let out = self.dispatcher.dispatch(event);
        self.process_outgoing(out);
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.update_hover();
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((x, y));
    }

    /// Mouse button released: a press-release with no drag in between is
    /// a click.
    pub fn end_drag(&mut self, col: u16, row: u16) {
        let was_drag = self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if !was_drag {
            self.click(col, row);
        }
    }

    /// Degrees per braille pixel at the current zoom, for marker hit
    /// tolerance.
    fn deg_per_px(&self) -> f64 {
        360.0 / (256.0 * 2f64.powf(self.viewport.zoom))
    }

    fn hit_key(&self) -> HitKey {
        HitKey {
            zoom_bits: self.viewport.zoom.to_bits(),
            center_bits: (
                self.viewport.center.lng.to_bits(),
                self.viewport.center.lat.to_bits(),
            ),
            width: self.viewport.width,
            height: self.viewport.height,
            visible: self
                .layers
                .visible_layers()
                .iter()
                .map(|l| l.id.clone())
                .collect(),
        }
    }

    /// Run one render pass and snapshot its hit geometry. Pointer moves
    /// within an unchanged view reuse the snapshot.
    fn ensure_hit_cache(&mut self) {
        let key = self.hit_key();
        if self.hit_cache.as_ref().is_some_and(|(k, _)| *k == key) {
            return;
        }
        let pass = render::run(
            &self.layers,
            &self.geo_features,
            self.viewport.zoom,
            &self.viewport.bounds(),
            &self.dispatcher,
        );
        self.dropped_count = pass.diagnostics.len();
        let index = HitIndex::from_pass(&pass);
        self.hit_cache = Some((key, index));
    }

    /// Hit-test one terminal cell against the cached index, snapshotting
    /// the result so the borrow ends before any dispatch.
    fn hit_at(&mut self, col: u16, row: u16) -> OwnedHit {
        let (px, py) = Self::pixel_at(col, row);
        let pos = self.viewport.unproject(px, py);
        let tolerance = MARKER_HIT_PX * self.deg_per_px();

        self.ensure_hit_cache();
        let Some((_, index)) = &self.hit_cache else {
            return OwnedHit::Nothing;
        };

        match index.test(pos, tolerance) {
            Some(IndexHit::Feature { layer_id, feature }) => OwnedHit::Feature {
                layer_id: layer_id.to_string(),
                feature: feature.clone(),
            },
            Some(IndexHit::Cluster { expands_at, position }) => {
                OwnedHit::Cluster { expands_at, position }
            }
            None => OwnedHit::Nothing,
        }
    }

    /// Keep hover state in sync with whatever is under the cursor.
    fn update_hover(&mut self) {
        let Some((col, row)) = self.mouse_pos else { return };
        match self.hit_at(col, row) {
            OwnedHit::Feature { layer_id, feature } => {
                if !self.dispatcher.is_hovered(&layer_id, &feature.id) {
                    self.dispatcher.dispatch(MapEvent::FeatureEnter {
                        layer_id: &layer_id,
                        feature: &feature,
                    });
                }
            }
            _ => {
                if self.dispatcher.hovered().is_some() {
                    self.dispatcher.dispatch(MapEvent::FeatureLeave);
                }
            }
        }
    }

    /// Route a click: feature select + popup, cluster expand, or map
    /// background.
    pub fn click(&mut self, col: u16, row: u16) {
        match self.hit_at(col, row) {
            OwnedHit::Feature { layer_id, feature } => {
                let out = self.dispatcher.dispatch(MapEvent::FeatureClick {
                    layer_id: &layer_id,
                    feature: &feature,
                });
                self.popup = Some(popup::build(&feature, &layer_id));

                // Boundary clicks zoom the view to the clicked polygon
                if matches!(layer_id.as_str(), "state_boundaries" | "district_boundaries") {
                    if let Some(ring) = feature.geometry.exterior_ring() {
                        if let Some(target) = ViewportBounds::of_ring(ring) {
                            self.viewport.fit_bounds(&target, 8.0);
                            self.mark_moved(PendingSettle::Zoom);
                        }
                    }
                }
                self.process_outgoing(out);
            }
            OwnedHit::Cluster { expands_at, position } => {
                self.viewport.center_on(position);
                self.viewport.zoom = expands_at.min(crate::map::MAX_ZOOM);
                self.mark_moved(PendingSettle::Zoom);
            }
            OwnedHit::Nothing => {
                let (px, py) = Self::pixel_at(col, row);
                let pos = self.viewport.unproject(px, py);
                let out = self.dispatcher.dispatch(MapEvent::MapClick(pos.to_lat_lng()));
                self.process_outgoing(out);
            }
        }
    }

    /// Close the popup panel, leaving selection intact.
    pub fn close_popup(&mut self) {
        self.dispatcher.close_popup();
        self.popup = None;
    }

    /// Record outgoing callbacks in the on-screen event log.
    fn process_outgoing(&mut self, outgoing: Vec<Outgoing>) {
        for out in outgoing {
            let line = match out {
                Outgoing::FeatureClick(feature) => format!("click: {}", feature.name()),
                Outgoing::MapClick(pos) => {
                    format!("map: {:.3}°N {:.3}°E", pos.lat, pos.lng)
                }
                Outgoing::DistrictClick(district) => format!("district: {district}"),
                Outgoing::BoundsChange(bounds) => format!(
                    "bounds: {:.2},{:.2} .. {:.2},{:.2}",
                    bounds.southwest.lat,
                    bounds.southwest.lng,
                    bounds.northeast.lat,
                    bounds.northeast.lng
                ),
            };
            self.event_log.push(line);
        }
        if self.event_log.len() > 50 {
            let drop = self.event_log.len() - 50;
            self.event_log.drain(..drop);
        }
    }

    /// Cycle the opacity-target layer.
    pub fn next_active_layer(&mut self) {
        let count = self.layers.layers().len();
        if count > 0 {
            self.active_layer = (self.active_layer + 1) % count;
        }
    }

    pub fn active_layer_id(&self) -> Option<String> {
        self.layers.layers().get(self.active_layer).map(|l| l.id.clone())
    }

    pub fn adjust_active_opacity(&mut self, delta: i32) {
        if let Some(id) = self.active_layer_id() {
            self.layers.adjust_opacity(&id, delta);
        }
    }

    /// Toggle the nth layer in registry order (digit hotkeys).
    pub fn toggle_layer_index(&mut self, index: usize) {
        if let Some(id) = self.layers.layers().get(index).map(|l| l.id.clone()) {
            self.layers.toggle(&id);
        }
    }

    pub fn cycle_basemap(&mut self) {
        self.basemap = self.basemap.next();
    }

    /// Select the next reference village and recenter on it.
    pub fn cycle_village(&mut self) {
        if self.villages.is_empty() {
            return;
        }
        let next = match self.selected_village {
            Some(i) => (i + 1) % self.villages.len(),
            None => 0,
        };
        self.selected_village = Some(next);
        let pos = self.villages[next].position;
        self.viewport.center_on(pos);
        if self.viewport.zoom < crate::engine::zoom::VILLAGE_LEVEL {
            self.viewport.zoom = crate::engine::zoom::VILLAGE_LEVEL + 1.0;
        }
        self.mark_moved(PendingSettle::Zoom);
    }

    pub fn clear_village(&mut self) {
        self.selected_village = None;
    }

    pub fn village(&self) -> Option<&Village> {
        self.selected_village.and_then(|i| self.villages.get(i))
    }

    /// Everything currently visible, serialized as one FeatureCollection.
    pub fn export_string(&self) -> String {
        let visible: Vec<&GeoFeature> = self
            .layers
            .visible_layers()
            .iter()
            .filter_map(|layer| self.geo_features.get(&layer.id))
            .flatten()
            .collect();
        export_geojson(visible)
    }

    /// Export hotkey: write the visible feature set next to the binary.
    pub fn export_to_file(&mut self) -> Result<()> {
        let doc = self.export_string();
        std::fs::write(Path::new(EXPORT_PATH), doc)
            .with_context(|| format!("writing {EXPORT_PATH}"))?;
        self.event_log.push(format!("exported: {EXPORT_PATH}"));
        Ok(())
    }

    pub fn zoom_label(&self) -> String {
        format!("z{:.0}", self.viewport.zoom)
    }

    pub fn center_label(&self) -> String {
        format!(
            "{:.2}°N, {:.2}°E",
            self.viewport.center.lat, self.viewport.center.lng
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    fn app_with_data() -> App {
        let mut app = App::new(120, 40);
        app.geo_features = data::demo_dataset();
        app.villages = data::demo_villages();
        app
    }

    #[test]
    fn test_settle_fires_bounds_change_once() {
        let mut app = app_with_data();
        for _ in 0..10 {
            app.pan(5, 0);
        }
        let before = app.event_log.len();
        for _ in 0..SETTLE_FRAMES + 2 {
            app.tick();
        }
        let bounds_lines: Vec<_> = app.event_log[before..]
            .iter()
            .filter(|l| l.starts_with("bounds:"))
            .collect();
        assert_eq!(bounds_lines.len(), 1);

        // Still again: no further callback
        let after = app.event_log.len();
        for _ in 0..20 {
            app.tick();
        }
        assert_eq!(app.event_log.len(), after);
    }

    #[test]
    fn test_zoom_settle_wins_over_move() {
        let mut app = app_with_data();
        app.pan(5, 0);
        app.zoom_in();
        for _ in 0..SETTLE_FRAMES + 2 {
            app.tick();
        }
        // One settle total, of the zoom kind (indistinguishable in the
        // log, but exactly one bounds line)
        let bounds_lines = app.event_log.iter().filter(|l| l.starts_with("bounds:")).count();
        assert_eq!(bounds_lines, 1);
    }

    #[test]
    fn test_export_contains_visible_layers_only() {
        let mut app = app_with_data();
        let doc = app.export_string();
        assert!(doc.contains("Madhya Pradesh"));
        // water_bodies hidden by default
        assert!(!doc.contains("Narmada"));

        app.layers.toggle("water_bodies");
        assert!(app.export_string().contains("Narmada"));
    }

    #[test]
    fn test_cycle_village_centers_viewport() {
        let mut app = app_with_data();
        app.cycle_village();
        let village = app.village().expect("village selected");
        assert_eq!(village.name, "Kanha Khapa");
        assert!((app.viewport.center.lng - village.position.lng).abs() < 1e-9);
        assert!(app.viewport.zoom > crate::engine::zoom::VILLAGE_LEVEL);
    }

    #[test]
    fn test_hover_hits_state_polygon() {
        let mut app = app_with_data();
        // Terminal cell at the map center, which sits inside Madhya Pradesh
        app.set_mouse_pos(60, 19);
        let hovered = app.dispatcher.hovered().expect("hover set");
        assert_eq!(hovered.layer_id, "state_boundaries");
        assert_eq!(hovered.feature_id, "MP");
    }

    #[test]
    fn test_hit_cache_reused_until_view_changes() {
        let mut app = app_with_data();
        app.set_mouse_pos(60, 19);
        let key = app.hit_cache.as_ref().unwrap().0.clone();

        // Pointer moves within the same view reuse the index
        app.set_mouse_pos(61, 19);
        assert_eq!(app.hit_cache.as_ref().unwrap().0, key);

        // Panning invalidates it
        app.pan(20, 0);
        app.set_mouse_pos(60, 19);
        let panned = app.hit_cache.as_ref().unwrap().0.clone();
        assert_ne!(panned, key);

        // So does toggling a layer
        app.layers.toggle("state_boundaries");
        app.set_mouse_pos(60, 19);
        assert_ne!(app.hit_cache.as_ref().unwrap().0, panned);
    }

    #[test]
    fn test_toggle_layer_index() {
        let mut app = app_with_data();
        let visible_before = app.layers.get("state_boundaries").unwrap().visible;
        app.toggle_layer_index(0);
        assert_ne!(app.layers.get("state_boundaries").unwrap().visible, visible_before);
    }
}
