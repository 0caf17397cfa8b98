//! Canonical coordinate types.
//!
//! Geometry coordinates and `Village` positions are stored in GeoJSON order
//! (`lng`, `lat`). Anything crossing the callback boundary — viewport bounds,
//! map-click positions — uses Leaflet order (`lat`, `lng`). The two orders
//! never share a type, so a swap is a compile error rather than a settlement
//! rendered in the Arabian Sea.

/// A geographic position in GeoJSON order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Both components finite (NaN/inf come in via untrusted GeoJSON).
    #[inline(always)]
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng { lat: self.lat, lng: self.lng }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(pair: [f64; 2]) -> Self {
        Self { lng: pair[0], lat: pair[1] }
    }
}

/// A geographic position in Leaflet callback order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Viewport corners as southwest/northeast, emitted on settle events only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportBounds {
    pub southwest: LatLng,
    pub northeast: LatLng,
}

impl ViewportBounds {
    pub fn new(southwest: LatLng, northeast: LatLng) -> Self {
        Self { southwest, northeast }
    }

    /// Containment test used for visible-bounds pruning.
    #[inline(always)]
    pub fn contains(&self, pos: LngLat) -> bool {
        pos.lat >= self.southwest.lat
            && pos.lat <= self.northeast.lat
            && pos.lng >= self.southwest.lng
            && pos.lng <= self.northeast.lng
    }

    /// Grow the box by a margin in degrees (keeps markers near the edge
    /// from popping while panning).
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            southwest: LatLng::new(self.southwest.lat - margin, self.southwest.lng - margin),
            northeast: LatLng::new(self.northeast.lat + margin, self.northeast.lng + margin),
        }
    }

    /// Smallest bounds covering a ring. `None` for an empty ring.
    pub fn of_ring(ring: &[LngLat]) -> Option<Self> {
        let first = ring.first()?;
        let mut min_lng = first.lng;
        let mut max_lng = first.lng;
        let mut min_lat = first.lat;
        let mut max_lat = first.lat;
        for p in &ring[1..] {
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
        }
        Some(Self::new(
            LatLng::new(min_lat, min_lng),
            LatLng::new(max_lat, max_lng),
        ))
    }
}

/// Fast equirectangular distance approximation in kilometers.
/// Good for small distances (<1000km), avoids expensive trig.
#[inline(always)]
pub fn fast_distance_km(a: LngLat, b: LngLat) -> f64 {
    const R: f64 = 6371.0; // Earth radius in km
    const DEG_TO_RAD: f64 = 0.017453292519943295; // π/180

    let dlat = (b.lat - a.lat) * DEG_TO_RAD;
    let dlon = (b.lng - a.lng) * DEG_TO_RAD;

    let lat_avg = (a.lat + b.lat) * 0.5 * DEG_TO_RAD;
    let cos_lat = lat_avg.cos();

    let dx = dlon * cos_lat;
    let dy = dlat;

    R * (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let b = ViewportBounds::new(LatLng::new(10.0, 70.0), LatLng::new(30.0, 90.0));
        assert!(b.contains(LngLat::new(80.0, 20.0)));
        assert!(!b.contains(LngLat::new(60.0, 20.0)));
        assert!(!b.contains(LngLat::new(80.0, 40.0)));
    }

    #[test]
    fn test_ring_bounds() {
        let ring = vec![
            LngLat::new(74.0, 21.0),
            LngLat::new(82.0, 24.0),
            LngLat::new(78.0, 26.0),
        ];
        let b = ViewportBounds::of_ring(&ring).unwrap();
        assert_eq!(b.southwest.lng, 74.0);
        assert_eq!(b.northeast.lat, 26.0);
        assert!(ViewportBounds::of_ring(&[]).is_none());
    }

    #[test]
    fn test_distance_delhi_agra() {
        // Delhi to Agra is roughly 180km as the crow flies
        let d = fast_distance_km(LngLat::new(77.2, 28.6), LngLat::new(78.0, 27.2));
        assert!(d > 150.0 && d < 210.0, "got {d}");
    }
}
