use std::hint::black_box;
use std::time::Instant;

use cubefield_packer::{PackConfig, generate};

fn bench_pack(target_count: usize, iterations: usize) {
    let mut tests_n = 0;
    let start = Instant::now();
    for i in 0..iterations {
        let config = PackConfig {
            target_count,
            seed: Some(i as u64),
            ..PackConfig::default()
        };
        let mut packer = generate(config).expect("valid config");
        for batch in packer.by_ref() {
            black_box(batch.expect("packing succeeds"));
        }
        tests_n += packer.tests_n();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    let per_run_tests = tests_n / iterations as u64;
    println!(
        "  pack ({target_count} placements, {iterations} iters): {per_iter:?}/iter, {per_run_tests} tests/run, total {elapsed:?}"
    );
}

fn bench_batch_size(batch_size: usize, iterations: usize) {
    let start = Instant::now();
    for i in 0..iterations {
        let config = PackConfig {
            target_count: 1000,
            batch_size,
            seed: Some(i as u64),
            ..PackConfig::default()
        };
        let batches = generate(config)
            .expect("valid config")
            .filter_map(Result::ok)
            .count();
        black_box(batches);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  batch size {batch_size} (1000 placements): {per_iter:?}/iter");
}

fn main() {
    println!("=== Packing Benchmarks ===\n");

    println!("Full runs:");
    bench_pack(100, 100);
    bench_pack(1000, 10);
    bench_pack(6000, 1);

    println!("\nBatch size:");
    bench_batch_size(1, 5);
    bench_batch_size(20, 5);
    bench_batch_size(500, 5);

    println!("\n=== Done ===");
}
