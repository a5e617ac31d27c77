//! Island generation and tick throughput.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use royale::game::IslandMap;
use royale::{tick, MatchConfig, MatchState};

fn bench_generate(c: &mut Criterion) {
    c.bench_function("island_generate", |b| {
        b.iter(|| IslandMap::generate(black_box(4242)))
    });
}

fn bench_tick(c: &mut Criterion) {
    let config = MatchConfig::default();
    let mut names = StdRng::seed_from_u64(1);
    let state = match MatchState::new(1, 4242, 0.0, &config, &mut names) {
        Ok(state) => state,
        Err(e) => panic!("world generation failed: {}", e),
    };

    c.bench_function("tick_full_match", |b| {
        let mut rng = StdRng::seed_from_u64(2);
        b.iter_batched(
            || state.clone(),
            |mut s| tick(&mut s, black_box(10.0), &config, &mut rng),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_generate, bench_tick);
criterion_main!(benches);
