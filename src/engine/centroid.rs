//! Area-weighted polygon centroid for label placement and view fitting.

use crate::geo::{LatLng, LngLat};

/// Signed-area centroid of a ring. Accepts open or closed rings (vertex
/// pairs wrap). Returns `None` when the signed area is zero or the result
/// is non-finite — collinear or single-point rings have no centroid, and
/// callers skip label placement rather than propagate NaN.
pub fn centroid(ring: &[LngLat]) -> Option<LatLng> {
    if ring.len() < 3 {
        return None;
    }

    let mut total_area = 0.0;
    let mut lat_acc = 0.0;
    let mut lng_acc = 0.0;

    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let cross = a.lng * b.lat - b.lng * a.lat;
        total_area += cross;
        lat_acc += (a.lat + b.lat) * cross;
        lng_acc += (a.lng + b.lng) * cross;
    }

    total_area *= 0.5;
    let lat = lat_acc / (6.0 * total_area);
    let lng = lng_acc / (6.0 * total_area);

    if lat.is_finite() && lng.is_finite() {
        Some(LatLng::new(lat, lng))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Vec<LngLat> {
        coords.iter().map(|&(lng, lat)| LngLat::new(lng, lat)).collect()
    }

    #[test]
    fn test_unit_square_open() {
        let c = centroid(&ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])).unwrap();
        assert!((c.lat - 0.5).abs() < 1e-9);
        assert!((c.lng - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unit_square_closed() {
        let c = centroid(&ring(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]))
        .unwrap();
        assert!((c.lat - 0.5).abs() < 1e-9);
        assert!((c.lng - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_winding_direction_irrelevant() {
        let cw = centroid(&ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])).unwrap();
        assert!((cw.lat - 0.5).abs() < 1e-9);
        assert!((cw.lng - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_rings_yield_none() {
        // Collinear: zero signed area
        assert!(centroid(&ring(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)])).is_none());
        // Repeated single point
        assert!(centroid(&ring(&[(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)])).is_none());
        // Too few vertices
        assert!(centroid(&ring(&[(0.0, 0.0), (1.0, 0.0)])).is_none());
        assert!(centroid(&[]).is_none());
    }
}
