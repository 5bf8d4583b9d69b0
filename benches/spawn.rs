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
    const COUNT: usize = 10_000;

    let mut group = c.benchmark_group("bulk_spawn");

    group.bench_function("spawn", |bencher| {
        bencher.iter(|| {
            let mut world = World::new();

            for _ in 0..COUNT {
                world.spawn(black_box((A(123), B(321)))).unwrap();
            }
        })
    });
    group.bench_function("spawn_iter", |bencher| {
        bencher.iter(|| {
            let mut world = World::new();

            world
                .spawn_iter((0..COUNT).map(|_| black_box((A(123), B(321)))))
                .unwrap();
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
