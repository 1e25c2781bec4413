//! Benchmarks for the per-frame CPU work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cloudchamber::integrator::{self, DT_MAX};
use cloudchamber::trails::{Orthographic, TrailBuffer, View};
use cloudchamber::{
    Backend, ChamberConfig, EmissionSampler, IntegrationParams, IsotopeCatalog, ParticleStore,
    Simulation,
};

fn filled_store(capacity: usize) -> ParticleStore {
    let mut sampler = EmissionSampler::seeded(IsotopeCatalog::builtin(), 42);
    let mut store = ParticleStore::new(capacity).unwrap();
    for _ in 0..capacity {
        let origin = sampler.random_in_cube(18.0);
        store.emit(&sampler.sample("Th-232 chain (α+β)", origin, 20.0));
    }
    store
}

fn bench_integrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate");
    let params = IntegrationParams::from_vapor(DT_MAX, 1.5, 0.5, 20.0);

    for count in [5_000usize, 50_000] {
        let read = filled_store(count);
        let mut write = ParticleStore::new(count).unwrap();

        for backend in [Backend::Sequential, Backend::Parallel] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", backend), count),
                &count,
                |b, _| {
                    b.iter(|| {
                        integrator::integrate(&read, &mut write, &params, black_box(7), backend);
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_trails(c: &mut Criterion) {
    let store = filled_store(5_000);
    let projection = Orthographic::new(View::TopDown, 20.0);
    let mut trails = TrailBuffer::new(512, 512).unwrap();

    c.bench_function("trails_update_5000", |b| {
        b.iter(|| trails.update(black_box(0.96), store.slots(), &projection))
    });
}

fn bench_simulation_step(c: &mut Criterion) {
    let config = ChamberConfig {
        max_particles: 20_000,
        emission_rate: 400.0,
        seed: Some(1),
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    for _ in 0..120 {
        sim.step(1.0 / 60.0);
    }

    c.bench_function("simulation_step", |b| b.iter(|| sim.step(black_box(1.0 / 60.0))));
}

criterion_group!(benches, bench_integrate, bench_trails, bench_simulation_step);
criterion_main!(benches);
