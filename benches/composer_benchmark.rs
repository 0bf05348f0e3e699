use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{thread_rng, Rng};
use travel_package_optimizer::{
    Currency, OfferKind, OptimizerConfig, PackageOptimizer, PricedOffer, TripRequest,
};

fn random_offers(kind: OfferKind, count: usize) -> Vec<PricedOffer> {
    let mut rng = thread_rng();
    let usd = Currency::parse("USD").unwrap();
    (0..count)
        .map(|i| {
            PricedOffer::new(
                kind,
                format!("{}{}", kind, i),
                format!("{} {}", kind, i),
                rng.gen_range(1_000..200_000),
                usd.clone(),
                kind.default_unit(),
            )
            .unwrap()
        })
        .collect()
}

// Cost grows with flights x hotels; activities are a sort on top
pub fn composer_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_package");
    let trip = TripRequest::round_trip(
        "LIS",
        "JFK",
        chrono::NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2025, 2, 5).unwrap(),
        2,
    );
    let optimizer = PackageOptimizer::new(OptimizerConfig::default());

    for size in [10usize, 50, 250].iter() {
        let flights = random_offers(OfferKind::Flight, *size);
        let hotels = random_offers(OfferKind::Hotel, *size);
        let activities = random_offers(OfferKind::Activity, *size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(
                    optimizer
                        .optimize(&trip, &flights, &hotels, &activities)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, composer_benchmark);
criterion_main!(benches);
