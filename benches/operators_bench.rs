use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vod_placement::catalog::{Catalog, NodeId};
use vod_placement::models::SimConfig;
use vod_placement::operators::Operator;
use vod_placement::placement::Placement;

fn bench_operators(c: &mut Criterion) {
    let catalog = Catalog::new(&SimConfig::default()).expect("reference scenario should validate");
    let current = Placement::from_catalogs([
        (NodeId::Asn1, [2, 6, 7, 8].into_iter().collect()),
        (NodeId::Asn2, [5, 8, 9].into_iter().collect()),
    ]);
    let operators = [
        Operator::Random,
        Operator::Remove(1),
        Operator::Replace {
            count: 2,
            fill: false,
        },
        Operator::Replace {
            count: 2,
            fill: true,
        },
        Operator::Swap(2),
    ];
    let mut group = c.benchmark_group("operators");

    for operator in operators {
        group.bench_with_input(
            BenchmarkId::from_parameter(operator),
            &operator,
            |b, operator| {
                let mut rng = StdRng::seed_from_u64(42);
                b.iter(|| black_box(operator.apply(&catalog, &current, &mut rng)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_operators);
criterion_main!(benches);
