use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logcount::{run_analysis_with, AnalysisConfig};
use std::{fs::File, io::Write, num::NonZeroUsize, path::Path};
use tempfile::tempdir;

fn create_log_file(path: &Path, lines: usize) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    for j in 0..lines {
        writeln!(
            file,
            "2024-01-01T00:00:{:02} INFO worker {} TODO: fix bug {} ERROR timeout on line {}",
            j % 60,
            j % 8,
            j,
            j
        )?;
    }
    Ok(())
}

fn config(buffer_size: usize, threads: usize) -> AnalysisConfig {
    AnalysisConfig {
        buffer_size,
        thread_count: NonZeroUsize::new(threads).unwrap(),
        ..AnalysisConfig::default()
    }
}

fn bench_buffer_size(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.log");
    create_log_file(&path, 50_000).unwrap();
    let patterns = ["ERROR", "TODO", "worker 3", "timeout", "missing"];

    let mut group = c.benchmark_group("Buffer Size");
    for size in [10, 100, 1000, 10_000] {
        let cfg = config(size, 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), &cfg, |b, cfg| {
            b.iter(|| black_box(run_analysis_with(cfg, &path, patterns, |_| {}, || false)));
        });
    }
    group.finish();
}

fn bench_filter_scaling(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.log");
    create_log_file(&path, 20_000).unwrap();

    let mut group = c.benchmark_group("Filter Scaling");
    for filter_count in [1, 4, 16, 64] {
        let patterns: Vec<String> = (0..filter_count).map(|i| format!("bug {}", i)).collect();
        let cfg = config(100, num_cpus::get());
        group.bench_with_input(
            BenchmarkId::from_parameter(filter_count),
            &patterns,
            |b, patterns| {
                b.iter(|| {
                    black_box(run_analysis_with(
                        &cfg,
                        &path,
                        patterns.iter().cloned(),
                        |_| {},
                        || false,
                    ))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_buffer_size, bench_filter_scaling);
criterion_main!(benches);
