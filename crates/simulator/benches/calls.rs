use alloy_primitives::U256;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sibyl_simulator::Simulator;

#[path = "../tests/common/mod.rs"]
mod common;

use common::{chain_with_counter, count_calldata, tick_calldata, CALL_GAS, DEPLOYER, READ_GAS};

// ---------------------------------------------------------------------------
// Benchmark: static_call
// ---------------------------------------------------------------------------

fn bench_static_call(c: &mut Criterion) {
    let (chain, counter) = chain_with_counter();
    let sim = Simulator::new(chain);
    sim.fork_latest().unwrap();
    let input = count_calldata();

    c.bench_function("static_call/count", |b| {
        b.iter(|| {
            black_box(
                sim.static_call(DEPLOYER, counter, input.clone(), READ_GAS)
                    .unwrap(),
            )
        })
    });
}

// ---------------------------------------------------------------------------
// Benchmark: call + rollback
// ---------------------------------------------------------------------------

fn bench_call_rollback(c: &mut Criterion) {
    let (chain, counter) = chain_with_counter();
    let sim = Simulator::new(chain);
    sim.fork_latest().unwrap();
    let input = tick_calldata();

    c.bench_function("call/tick_then_rollback", |b| {
        b.iter(|| {
            let snapshot = sim.snapshot().unwrap();
            black_box(
                sim.call(DEPLOYER, counter, input.clone(), CALL_GAS, U256::ZERO)
                    .unwrap(),
            );
            sim.rollback(snapshot).unwrap();
        })
    });
}

// ---------------------------------------------------------------------------
// Benchmark: fork
// ---------------------------------------------------------------------------

fn bench_fork(c: &mut Criterion) {
    let (chain, _) = chain_with_counter();
    let sim = Simulator::new(chain);

    c.bench_function("fork/latest", |b| b.iter(|| sim.fork_latest().unwrap()));
}

criterion_group!(benches, bench_static_call, bench_call_rollback, bench_fork);
criterion_main!(benches);
