use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use stratum::component::Component;
use stratum::world::World;

#[derive(Component)]
struct A(#[expect(unused)] u32);

#[derive(Component)]
struct B(#[expect(unused)] u64);

fn benchmark(c: &mut Criterion) {
    const COUNT: usize = 100_000;

    c.bench_function("bulk_insert", |bencher| {
        bencher.iter(|| {
            let mut world = World::new();
            let entities = world
                .spawn_iter((0..COUNT).map(|_| black_box(A(123))))
                .unwrap();

            for entity in entities {
                world.insert(entity, black_box(B(321))).unwrap();
            }
        })
    });
}

criterion_group!(
    name = this;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(4));
    targets = benchmark,
);
criterion_main!(this);
