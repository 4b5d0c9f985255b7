//! Lexer throughput benchmarks.
//!
//! Run with `cargo bench --package glyphc-lex`.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use glyphc_lex::lex;
use glyphc_util::FileId;

fn token_count(source: &str) -> usize {
    lex(source, FileId::DUMMY).tokens.len()
}

fn bench_lexer_function(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let source = "add :: (a: i32, b: i32) -> i32 { return a + b; }";
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("simple_function", |b| b.iter(|| token_count(black_box(source))));

    group.finish();
}

fn bench_lexer_loop_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_loop_heavy");

    let source = r#"
        main :: () -> i32 {
            s : i32 = 0;
            i : i32 = 0;
            while i < 1000 {
                i = i + 1;
                if i == 500 { continue; }
                if i == 900 { break; }
                s = s + i * 2 - 1;
            }
            return s;
        }
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("loop_heavy", |b| b.iter(|| token_count(black_box(source))));

    group.finish();
}

fn bench_lexer_comments(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_comments");

    group.bench_function("nested_block_comment", |b| {
        b.iter(|| token_count(black_box("/* a /* b /* c */ d */ e */ main :: () -> i32 { return 0; }")))
    });

    group.finish();
}

fn bench_lexer_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_numbers");

    group.bench_function("integer", |b| b.iter(|| token_count(black_box("123456"))));
    group.bench_function("float", |b| b.iter(|| token_count(black_box("3.14159"))));

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_function,
    bench_lexer_loop_heavy,
    bench_lexer_comments,
    bench_lexer_numbers
);
criterion_main!(benches);
