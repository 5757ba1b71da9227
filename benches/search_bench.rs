use bi::buffer::MemoryBuffer;
use bi::search::SearchEngine;
use bi::{EditorConfig, Session};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 253) as u8).collect()
}

/// 見つからないパターンでバッファ全体を一周する
fn bench_search_wrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_wrap");
    group.measurement_time(Duration::from_secs(10));

    let buffer = MemoryBuffer::from_bytes(sample(64 * 1024));

    group.bench_function("literal_not_found", |b| {
        let mut engine = SearchEngine::new();
        engine.set_literal(vec![0xff, 0xfe, 0xfd]);
        b.iter(|| engine.find_next(black_box(&buffer), 0))
    });

    group.bench_function("regex_not_found", |b| {
        let mut engine = SearchEngine::new();
        engine.set_regex("zz[0-9]+").unwrap();
        b.iter(|| engine.find_next(black_box(&buffer), 0))
    });

    group.finish();
}

/// 置換は毎回新しいセッションに対して行う
fn bench_substitute(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitute");

    let text = "abc-".repeat(4096).into_bytes();
    group.bench_function("regex_replace_all", |b| {
        b.iter_batched(
            || Session::from_bytes(text.clone(), EditorConfig::default()),
            |mut session| session.execute_line(black_box("s/b+c/XY")),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("hex_replace_all", |b| {
        b.iter_batched(
            || Session::from_bytes(text.clone(), EditorConfig::default()),
            |mut session| session.execute_line(black_box("s//2d//00 00")),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_search_wrap, bench_substitute);
criterion_main!(benches);
