use crate::engine::export::features_from_geojson;
use crate::engine::feature::{GeoFeature, Geometry, PropValue, Village};
use crate::geo::LngLat;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Layer data files looked up under the data directory, one GeoJSON
/// FeatureCollection per layer.
const LAYER_FILES: [(&str, &str); 6] = [
    ("state_boundaries", "state_boundaries.json"),
    ("district_boundaries", "district_boundaries.json"),
    ("settlements", "settlements.json"),
    ("fra_claims", "fra_claims.json"),
    ("water_bodies", "water_bodies.json"),
    ("forest_cover", "forest_cover.json"),
];

/// Load every available layer file. Missing files are skipped; parse
/// failures warn and leave that one layer empty.
pub fn load_all_geojson(
    geo_features: &mut HashMap<String, Vec<GeoFeature>>,
    data_dir: &Path,
) -> Result<()> {
    for (layer_id, filename) in LAYER_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match load_layer(&path) {
            Ok(features) => {
                geo_features.insert(layer_id.to_string(), features);
            }
            Err(e) => eprintln!("Warning: Failed to load {filename}: {e}"),
        }
    }
    Ok(())
}

/// Parse one layer file with simd-json (layer files can run to tens of
/// megabytes of coordinates).
fn load_layer(path: &Path) -> Result<Vec<GeoFeature>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: geojson::GeoJson = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(features_from_geojson(&geojson))
}

fn ring(coords: &[(f64, f64)]) -> Vec<LngLat> {
    coords.iter().map(|&(lng, lat)| LngLat::new(lng, lat)).collect()
}

fn state(
    code: &str,
    name: &str,
    coords: &[(f64, f64)],
    tribal_population: f64,
    population: f64,
    tribal_percentage: f64,
    fra_claims: f64,
    districts: f64,
    forest_cover: f64,
    priority: &str,
) -> GeoFeature {
    GeoFeature::new(code, Geometry::Polygon(vec![ring(coords)]))
        .with_prop("name", PropValue::Str(name.to_string()))
        .with_prop("code", PropValue::Str(code.to_string()))
        .with_prop("tribalPopulation", PropValue::Num(tribal_population))
        .with_prop("population", PropValue::Num(population))
        .with_prop("tribalPercentage", PropValue::Num(tribal_percentage))
        .with_prop("fraClaimsCount", PropValue::Num(fra_claims))
        .with_prop("districts", PropValue::Num(districts))
        .with_prop("forestCover", PropValue::Num(forest_cover))
        .with_prop("priority", PropValue::Str(priority.to_string()))
}

fn settlement(id: &str, name: &str, village: &str, lng: f64, lat: f64, population: f64) -> GeoFeature {
    GeoFeature::new(id, Geometry::Point(LngLat::new(lng, lat)))
        .with_prop("name", PropValue::Str(name.to_string()))
        .with_prop("village", PropValue::Str(village.to_string()))
        .with_prop("population", PropValue::Num(population))
}

/// Built-in dataset: the four FRA priority states with census figures,
/// plus sample districts, settlements, claims and overlays. Used when no
/// GeoJSON files are present on disk.
pub fn demo_dataset() -> HashMap<String, Vec<GeoFeature>> {
    let mut geo_features = HashMap::new();

    geo_features.insert(
        "state_boundaries".to_string(),
        vec![
            state(
                "MP",
                "Madhya Pradesh",
                &[
                    (74.029, 21.082), (76.234, 20.932), (78.912, 21.168), (81.643, 22.305),
                    (82.654, 24.215), (81.987, 25.312), (80.156, 26.034), (78.234, 26.187),
                    (76.345, 25.832), (74.892, 24.743), (73.987, 23.156), (74.029, 21.082),
                ],
                15_316_784.0, 85_358_965.0, 21.09, 2287.0, 55.0, 25.15, "high",
            ),
            state(
                "OR",
                "Odisha",
                &[
                    (81.338, 17.780), (82.211, 17.836), (83.101, 18.302), (83.892, 18.302),
                    (84.341, 18.795), (85.095, 19.565), (85.605, 20.097), (86.089, 20.736),
                    (86.797, 21.004), (86.814, 21.993), (86.237, 22.147), (85.221, 22.127),
                    (84.681, 21.993), (84.395, 21.719), (84.007, 21.545), (83.771, 21.177),
                    (83.370, 20.756), (82.667, 20.324), (82.419, 19.874), (81.896, 19.565),
                    (81.522, 19.177), (81.111, 18.795), (80.781, 18.271), (81.338, 17.780),
                ],
                9_590_756.0, 45_429_399.0, 22.85, 1342.0, 30.0, 33.16, "high",
            ),
            state(
                "TG",
                "Telangana",
                &[
                    (77.234, 15.234), (79.987, 15.567), (81.234, 17.456), (80.456, 19.234),
                    (78.789, 19.567), (77.456, 18.234), (77.234, 15.234),
                ],
                3_504_543.0, 39_362_732.0, 9.34, 645.0, 33.0, 24.0, "medium",
            ),
            state(
                "TR",
                "Tripura",
                &[
                    (91.234, 22.567), (92.456, 22.789), (92.789, 24.234), (92.234, 24.567),
                    (91.567, 24.234), (91.234, 23.456), (91.234, 22.567),
                ],
                1_166_813.0, 4_169_794.0, 31.78, 234.0, 8.0, 73.68, "high",
            ),
        ],
    );

    geo_features.insert(
        "district_boundaries".to_string(),
        vec![
            GeoFeature::new(
                "dist_mandla",
                Geometry::Polygon(vec![ring(&[
                    (80.0, 22.2), (81.0, 22.2), (81.1, 23.0), (80.2, 23.1), (80.0, 22.2),
                ])]),
            )
            .with_prop("name", PropValue::Str("Mandla".into()))
            .with_prop("state", PropValue::Str("Madhya Pradesh".into()))
            .with_prop("population", PropValue::Num(1_054_905.0))
            .with_prop("tribalPercentage", PropValue::Num(57.9))
            .with_prop("forestCover", PropValue::Num(44.2))
            .with_prop("fraClaimsCount", PropValue::Num(412.0)),
            GeoFeature::new(
                "dist_mayurbhanj",
                Geometry::Polygon(vec![ring(&[
                    (85.8, 21.3), (86.8, 21.4), (86.7, 22.2), (85.9, 22.1), (85.8, 21.3),
                ])]),
            )
            .with_prop("name", PropValue::Str("Mayurbhanj".into()))
            .with_prop("state", PropValue::Str("Odisha".into()))
            .with_prop("population", PropValue::Num(2_519_738.0))
            .with_prop("tribalPercentage", PropValue::Num(58.7))
            .with_prop("forestCover", PropValue::Num(40.8))
            .with_prop("fraClaimsCount", PropValue::Num(386.0)),
        ],
    );

    geo_features.insert(
        "settlements".to_string(),
        vec![
            settlement("set_kanha", "Kanha Khapa", "Mandla", 80.61, 22.33, 840.0),
            settlement("set_bichhiya", "Bichhiya", "Mandla", 80.71, 22.45, 1320.0),
            settlement("set_motinala", "Motinala", "Mandla", 80.84, 22.39, 615.0),
            settlement("set_baripada", "Baripada Tola", "Mayurbhanj", 86.73, 21.93, 2140.0),
            settlement("set_karanjia", "Karanjia", "Mayurbhanj", 85.97, 21.76, 980.0),
            settlement("set_jashipur", "Jashipur", "Mayurbhanj", 86.00, 21.97, 1475.0),
            settlement("set_utnoor", "Utnoor", "Adilabad", 78.76, 19.37, 1890.0),
            settlement("set_ambassa", "Ambassa", "Dhalai", 91.85, 23.94, 1260.0),
        ],
    );

    geo_features.insert(
        "fra_claims".to_string(),
        vec![
            GeoFeature::new(
                "claim_ifr_101",
                Geometry::Polygon(vec![ring(&[
                    (80.60, 22.30), (80.64, 22.30), (80.64, 22.34), (80.60, 22.34), (80.60, 22.30),
                ])]),
            )
            .with_prop("name", PropValue::Str("IFR Claim 101".into()))
            .with_prop("claimType", PropValue::Str("individual".into()))
            .with_prop("status", PropValue::Str("granted".into()))
            .with_prop("areaHectares", PropValue::Num(2.4)),
            GeoFeature::new(
                "claim_cfr_17",
                Geometry::Polygon(vec![ring(&[
                    (86.00, 21.90), (86.10, 21.90), (86.10, 22.00), (86.00, 22.00), (86.00, 21.90),
                ])]),
            )
            .with_prop("name", PropValue::Str("CFR Claim 17".into()))
            .with_prop("claimType", PropValue::Str("community".into()))
            .with_prop("status", PropValue::Str("pending".into()))
            .with_prop("areaHectares", PropValue::Num(134.0))
            .with_prop("color", PropValue::Str("#f59e0b".into())),
        ],
    );

    geo_features.insert(
        "water_bodies".to_string(),
        vec![
            GeoFeature::new(
                "river_narmada",
                Geometry::LineString(ring(&[
                    (81.6, 22.8), (81.0, 22.7), (80.3, 22.6), (79.6, 22.8), (78.8, 22.7),
                    (78.0, 22.5), (77.2, 22.3), (76.3, 22.2),
                ])),
            )
            .with_prop("name", PropValue::Str("Narmada".into()))
            .with_prop("waterQuality", PropValue::Str("moderate".into())),
            GeoFeature::new(
                "tank_kanha",
                Geometry::Polygon(vec![ring(&[
                    (80.55, 22.28), (80.58, 22.28), (80.58, 22.31), (80.55, 22.31), (80.55, 22.28),
                ])]),
            )
            .with_prop("name", PropValue::Str("Kanha Tank".into()))
            .with_prop("areaHectares", PropValue::Num(18.0)),
        ],
    );

    geo_features.insert(
        "forest_cover".to_string(),
        vec![GeoFeature::new(
            "forest_kanha",
            Geometry::Polygon(vec![ring(&[
                (80.45, 22.20), (80.95, 22.20), (80.95, 22.55), (80.45, 22.55), (80.45, 22.20),
            ])]),
        )
        .with_prop("name", PropValue::Str("Kanha Reserve".into()))
        .with_prop("density", PropValue::Str("dense".into()))],
    );

    geo_features
}

/// Reference villages for the search/selection panel.
pub fn demo_villages() -> Vec<Village> {
    vec![
        Village {
            id: "vil_kanha".into(),
            name: "Kanha Khapa".into(),
            district: "Mandla".into(),
            state: "Madhya Pradesh".into(),
            position: LngLat::new(80.61, 22.33),
            population: 840,
            tribal_population: 712,
            forest_cover: 72.5,
            water_index: 58.0,
        },
        Village {
            id: "vil_baripada".into(),
            name: "Baripada Tola".into(),
            district: "Mayurbhanj".into(),
            state: "Odisha".into(),
            position: LngLat::new(86.73, 21.93),
            population: 2140,
            tribal_population: 1260,
            forest_cover: 48.3,
            water_index: 66.0,
        },
        Village {
            id: "vil_utnoor".into(),
            name: "Utnoor".into(),
            district: "Adilabad".into(),
            state: "Telangana".into(),
            position: LngLat::new(78.76, 19.37),
            population: 1890,
            tribal_population: 1554,
            forest_cover: 38.9,
            water_index: 41.0,
        },
        Village {
            id: "vil_ambassa".into(),
            name: "Ambassa".into(),
            district: "Dhalai".into(),
            state: "Tripura".into(),
            position: LngLat::new(91.85, 23.94),
            population: 1260,
            tribal_population: 980,
            forest_cover: 77.2,
            water_index: 63.0,
        },
    ]
}

/// Case-insensitive substring search over name, district and state.
pub fn search_villages<'a>(villages: &'a [Village], query: &str) -> Vec<&'a Village> {
    let q = query.to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    villages
        .iter()
        .filter(|v| {
            v.name.to_lowercase().contains(&q)
                || v.district.to_lowercase().contains(&q)
                || v.state.to_lowercase().contains(&q)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::feature::check_geometry;

    #[test]
    fn test_demo_dataset_is_valid() {
        let data = demo_dataset();
        for (layer_id, features) in &data {
            for feature in features {
                assert!(
                    check_geometry(feature).is_none(),
                    "demo feature {} in {layer_id} failed validation",
                    feature.id
                );
            }
        }
        assert_eq!(data["state_boundaries"].len(), 4);
    }

    #[test]
    fn test_madhya_pradesh_centroid_inside_bbox() {
        let data = demo_dataset();
        let mp = &data["state_boundaries"][0];
        let ring = mp.geometry.exterior_ring().unwrap();
        let c = crate::engine::centroid::centroid(ring).unwrap();
        let b = crate::geo::ViewportBounds::of_ring(ring).unwrap();
        assert!(b.contains(LngLat::new(c.lng, c.lat)));
    }

    #[test]
    fn test_village_search() {
        let villages = demo_villages();
        assert_eq!(search_villages(&villages, "mandla").len(), 1);
        assert_eq!(search_villages(&villages, "odisha").len(), 1);
        assert!(search_villages(&villages, "").is_empty());
        assert!(search_villages(&villages, "zzz").is_empty());
    }
}
