use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use stratum::component::Component;
use stratum::world::World;

#[derive(Component)]
struct A(#[expect(unused)] u32);

#[derive(Component)]
struct B(#[expect(unused)] u64);

fn benchmark(c: &mut Criterion) {
    c.bench_function("bulk_remove", |bencher| {
        bencher.iter(|| {
            let mut world = World::new();
            let entities = world
                .spawn_iter((0..10_000).map(|_| (A(123), B(321))))
                .unwrap();

            for entity in entities {
                world.remove::<B>(entity).unwrap();
            }
        })
    });
}

criterion_group!(
    name = this;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5));
    targets = benchmark,
);
criterion_main!(this);
