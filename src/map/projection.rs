use crate::geo::{LatLng, LngLat, ViewportBounds};
use std::f64::consts::PI;

/// Leaflet-compatible zoom limits for the India view.
pub const MIN_ZOOM: f64 = 4.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Hard panning limits: India's bounding box.
const INDIA_SOUTH: f64 = 6.4627;
const INDIA_WEST: f64 = 68.1097;
const INDIA_NORTH: f64 = 35.5137;
const INDIA_EAST: f64 = 97.4152;

/// Web Mercator normalized x for a longitude (0..1 across the world)
#[inline(always)]
fn norm_x(lng: f64) -> f64 {
    (lng + 180.0) / 360.0
}

/// Web Mercator normalized y for a latitude (0 at north, 1 at south)
#[inline(always)]
fn norm_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn lat_of_norm_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Viewport representing the visible map area and zoom level.
/// Zoom is a Leaflet-style level: world width in pixels is `256 * 2^zoom`.
#[derive(Clone)]
pub struct Viewport {
    pub center: LngLat,
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center: LngLat, zoom: f64, width: usize, height: usize) -> Self {
        Self { center, zoom, width, height }
    }

    /// Initial view over India.
    pub fn india(width: usize, height: usize) -> Self {
        Self::new(LngLat::new(78.9629, 22.5937), 5.0, width, height)
    }

    /// World width in canvas pixels at the current zoom.
    #[inline(always)]
    fn world_px(&self) -> f64 {
        256.0 * 2f64.powf(self.zoom)
    }

    /// Pan the viewport by pixel delta.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let world = self.world_px();
        let x = norm_x(self.center.lng) + dx as f64 / world;
        let y = norm_y(self.center.lat) + dy as f64 / world;

        self.center = LngLat::new(x * 360.0 - 180.0, lat_of_norm_y(y));
        self.clamp_center();
    }

    fn clamp_center(&mut self) {
        self.center = LngLat::new(
            self.center.lng.clamp(INDIA_WEST, INDIA_EAST),
            self.center.lat.clamp(INDIA_SOUTH, INDIA_NORTH),
        );
    }

    /// Zoom in one level
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(MAX_ZOOM);
    }

    /// Zoom out one level
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    /// Zoom by a level delta keeping the point under the cursor fixed
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let anchor = self.unproject(px, py);

        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);

        // Pan so the anchor projects back under the cursor
        let (new_px, new_py) = self.project(anchor);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a geographic coordinate to pixel coordinates
    pub fn project(&self, pos: LngLat) -> (i32, i32) {
        let world = self.world_px();
        let px = (norm_x(pos.lng) - norm_x(self.center.lng)) * world + self.width as f64 / 2.0;
        let py = (norm_y(pos.lat) - norm_y(self.center.lat)) * world + self.height as f64 / 2.0;
        (px as i32, py as i32)
    }

    /// Unproject pixel coordinates back to geographic coordinates
    pub fn unproject(&self, px: i32, py: i32) -> LngLat {
        let world = self.world_px();
        let x = (px as f64 - self.width as f64 / 2.0) / world + norm_x(self.center.lng);
        let y = (py as f64 - self.height as f64 / 2.0) / world + norm_y(self.center.lat);
        LngLat::new(x * 360.0 - 180.0, lat_of_norm_y(y))
    }

    /// Geographic bounds of the visible area. Derived on settle events,
    /// not every intermediate frame.
    pub fn bounds(&self) -> ViewportBounds {
        let sw = self.unproject(0, self.height as i32);
        let ne = self.unproject(self.width as i32, 0);
        ViewportBounds::new(LatLng::new(sw.lat, sw.lng), LatLng::new(ne.lat, ne.lng))
    }

    /// Center and zoom the view so the given bounds fit with padding,
    /// like Leaflet's `fitBounds` on a boundary click.
    pub fn fit_bounds(&mut self, target: &ViewportBounds, padding_px: f64) {
        let dx = (norm_x(target.northeast.lng) - norm_x(target.southwest.lng)).abs();
        let dy = (norm_y(target.southwest.lat) - norm_y(target.northeast.lat)).abs();
        if dx <= 0.0 || dy <= 0.0 {
            return;
        }

        let usable_w = (self.width as f64 - 2.0 * padding_px).max(1.0);
        let usable_h = (self.height as f64 - 2.0 * padding_px).max(1.0);
        let world = (usable_w / dx).min(usable_h / dy);
        self.zoom = (world / 256.0).log2().clamp(MIN_ZOOM, MAX_ZOOM);

        let cx = (norm_x(target.southwest.lng) + norm_x(target.northeast.lng)) / 2.0;
        let cy = (norm_y(target.southwest.lat) + norm_y(target.northeast.lat)) / 2.0;
        self.center = LngLat::new(cx * 360.0 - 180.0, lat_of_norm_y(cy));
        self.clamp_center();
    }

    /// Recenter on a position without changing zoom.
    pub fn center_on(&mut self, pos: LngLat) {
        self.center = pos;
        self.clamp_center();
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10
            && px < self.width as i32 + 10
            && py >= -10
            && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::india(100, 100);
        let (x, y) = vp.project(vp.center);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_project_unproject_round_trip() {
        let vp = Viewport::new(LngLat::new(80.0, 22.0), 8.0, 300, 160);
        let p = LngLat::new(81.34, 19.56);
        let (px, py) = vp.project(p);
        let back = vp.unproject(px, py);
        // Integer pixel truncation bounds the error
        assert!((back.lng - p.lng).abs() < 0.02);
        assert!((back.lat - p.lat).abs() < 0.02);
    }

    #[test]
    fn test_pan_clamps_to_india() {
        let mut vp = Viewport::india(100, 100);
        for _ in 0..500 {
            vp.pan(-100, 0);
        }
        assert!(vp.center.lng >= INDIA_WEST);
    }

    #[test]
    fn test_bounds_orientation() {
        let vp = Viewport::india(200, 100);
        let b = vp.bounds();
        assert!(b.southwest.lat < b.northeast.lat);
        assert!(b.southwest.lng < b.northeast.lng);
    }

    #[test]
    fn test_fit_bounds_contains_target() {
        let mut vp = Viewport::india(320, 160);
        let target = ViewportBounds::new(LatLng::new(17.7, 80.7), LatLng::new(22.2, 86.9));
        vp.fit_bounds(&target, 8.0);

        let view = vp.bounds();
        assert!(view.southwest.lat <= target.southwest.lat);
        assert!(view.northeast.lat >= target.northeast.lat);
        assert!(view.southwest.lng <= target.southwest.lng);
        assert!(view.northeast.lng >= target.northeast.lng);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::india(100, 100);
        for _ in 0..30 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
        for _ in 0..30 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
