use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fra_atlas::engine::feature::{filter_valid, GeoFeature, Geometry, PropValue};
use fra_atlas::engine::{cluster, render, style, InteractionDispatcher, LayerRegistry};
use fra_atlas::geo::{LatLng, LngLat, ViewportBounds};
use std::collections::HashMap;

fn india_bounds() -> ViewportBounds {
    ViewportBounds::new(LatLng::new(6.0, 68.0), LatLng::new(36.0, 98.0))
}

/// Deterministic settlement points spread over central India, a few of
/// them malformed so validation has real work to do.
fn settlements(n: usize) -> Vec<GeoFeature> {
    (0..n)
        .map(|i| {
            let lng = if i % 997 == 0 {
                f64::NAN
            } else {
                70.0 + (i % 250) as f64 * 0.1
            };
            let lat = 15.0 + (i / 250 % 120) as f64 * 0.1;
            GeoFeature::new(format!("s{i}"), Geometry::Point(LngLat::new(lng, lat)))
                .with_prop("village", PropValue::Str(format!("village {}", i % 40)))
        })
        .collect()
}

fn state_polygons(n: usize) -> Vec<GeoFeature> {
    (0..n)
        .map(|i| {
            let lng = 70.0 + (i % 25) as f64;
            let lat = 10.0 + (i / 25) as f64;
            GeoFeature::new(
                format!("p{i}"),
                Geometry::Polygon(vec![vec![
                    LngLat::new(lng, lat),
                    LngLat::new(lng + 0.8, lat),
                    LngLat::new(lng + 0.8, lat + 0.8),
                    LngLat::new(lng, lat + 0.8),
                ]]),
            )
            .with_prop("tribalPercentage", PropValue::Num((i % 90) as f64))
        })
        .collect()
}

fn bench_validation(c: &mut Criterion) {
    let features = settlements(10_000);
    c.bench_function("validate_10k_points", |b| {
        b.iter(|| {
            let mut diags = Vec::new();
            black_box(filter_valid("settlements", black_box(&features), &mut diags))
        })
    });
}

fn bench_style_resolution(c: &mut Criterion) {
    let registry = LayerRegistry::india_default();
    let layer = registry.get("state_boundaries").unwrap();
    let polygons = state_polygons(1_000);
    c.bench_function("resolve_1k_styles", |b| {
        b.iter(|| {
            for feature in &polygons {
                black_box(style::resolve(black_box(layer), feature));
            }
        })
    });
}

fn bench_clustering(c: &mut Criterion) {
    let features = settlements(5_000);
    let mut diags = Vec::new();
    let valid = filter_valid("settlements", &features, &mut diags);
    let bounds = india_bounds();

    c.bench_function("cluster_5k_points_z12", |b| {
        b.iter(|| black_box(cluster::cluster(black_box(&valid), &bounds, 12.0)))
    });
    c.bench_function("cluster_5k_points_z6", |b| {
        b.iter(|| black_box(cluster::cluster(black_box(&valid), &bounds, 6.0)))
    });
}

fn bench_render_pass(c: &mut Criterion) {
    let mut geo_features = HashMap::new();
    geo_features.insert("settlements".to_string(), settlements(5_000));
    geo_features.insert("state_boundaries".to_string(), state_polygons(500));
    let registry = LayerRegistry::india_default();
    let dispatcher = InteractionDispatcher::new();
    let bounds = india_bounds();

    c.bench_function("render_pass_mixed_z12", |b| {
        b.iter(|| {
            black_box(render::run(
                &registry,
                black_box(&geo_features),
                12.0,
                &bounds,
                &dispatcher,
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_validation,
    bench_style_resolution,
    bench_clustering,
    bench_render_pass
);
criterion_main!(benches);
