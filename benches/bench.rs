// Criterion benchmarks for Intake Geo

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use intake_geo::core::{distance::haversine_distance, fallback::fallback_candidates, Matcher};
use intake_geo::models::{GeoPoint, ProviderRecord};

fn create_provider(id: i64, lat: f64, lon: f64) -> ProviderRecord {
    // Every seventh provider carries a coordinate that does not parse
    let latitude = if id % 7 == 0 {
        "unknown".into()
    } else {
        format!("{:.6}", lat).as_str().into()
    };

    ProviderRecord {
        id,
        name: format!("Provider {}", id),
        address: Some(format!("{} Main St, Springfield, IL 62704", id)),
        provider_type: Some("Physical Therapy".to_string()),
        npi: None,
        latitude: Some(latitude),
        longitude: Some(lon.into()),
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(39.7817),
                black_box(-89.6501),
                black_box(41.8781),
                black_box(-87.6298),
            )
        });
    });
}

fn bench_fallback_candidates(c: &mut Criterion) {
    c.bench_function("fallback_candidates", |b| {
        b.iter(|| fallback_candidates(black_box("123 Apt 4B Main St, Springfield, IL 62704")));
    });
}

fn bench_matching(c: &mut Criterion) {
    let matcher = Matcher::default();
    let reference = GeoPoint::new(39.7817, -89.6501);

    let mut group = c.benchmark_group("matching");

    for provider_count in [10, 100, 1000, 5000].iter() {
        let providers: Vec<ProviderRecord> = (0..*provider_count)
            .map(|i| {
                let lat_offset = (i as f64 * 0.003) % 2.0;
                let lon_offset = (i as f64 * 0.007) % 2.0;
                create_provider(i, 38.8 + lat_offset, -90.6 + lon_offset)
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("find_nearest", provider_count),
            provider_count,
            |b, _| {
                b.iter(|| matcher.find_nearest(black_box(reference), black_box(&providers)).matches.len());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_fallback_candidates,
    bench_matching
);

criterion_main!(benches);
