//! Throughput of a full manager tick over a populated open field.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use thicket_gameplay::prelude::*;

fn populated(count: usize) -> (NpcManager, TileGrid, PlayerState) {
    let map = TileGrid::open(128, 128, 16.0).expect("valid grid");
    let mut npcs = NpcManager::new(EngineTuning::default().with_seed(42));
    for i in 0..count {
        let species = Species::all()[i % 4];
        let position = Vec2::new((i % 100) as f32 * 20.0, (i / 100) as f32 * 20.0);
        npcs.spawn(species, position);
    }
    let player = PlayerState::new(Vec2::new(1000.0, 1000.0)).with_health(u32::MAX);
    (npcs, map, player)
}

fn bench_update_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_all");
    for count in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (mut npcs, map, mut player) = populated(count);
            b.iter(|| {
                let reports = npcs.update_all(black_box(1.0 / 60.0), &mut player, &map);
                npcs.events().drain();
                reports
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update_all);
criterion_main!(benches);
