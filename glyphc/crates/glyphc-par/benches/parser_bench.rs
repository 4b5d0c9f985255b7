//! Parser throughput benchmarks.
//!
//! Run with `cargo bench --package glyphc-par`.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use glyphc_lex::lex;
use glyphc_par::parse;
use glyphc_util::FileId;

fn node_count(source: &str) -> usize {
    let tokens = lex(source, FileId::DUMMY).tokens;
    parse(tokens).ast.len()
}

fn bench_parser_function(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let source = "add :: (a: i32, b: i32) -> i32 { return a + b; }";
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("simple_function", |b| b.iter(|| node_count(black_box(source))));

    group.finish();
}

fn bench_parser_precedence_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_precedence_chain");

    let source = "main :: () -> i32 { return 1 + 2 * 3 - 4 / 2 + 5 % 2 == 4 && 1 < 2 || 3 >= 3; }";
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("precedence_chain", |b| b.iter(|| node_count(black_box(source))));

    group.finish();
}

fn bench_parser_loop_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_loop_heavy");

    let source = r#"
        main :: () -> i32 {
            s : i32 = 0;
            i : i32 = 0;
            while i < 1000 {
                i = i + 1;
                if i == 500 { continue; }
                if i == 900 { break; }
                s = s + i;
            }
            return s;
        }
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("loop_heavy", |b| b.iter(|| node_count(black_box(source))));

    group.finish();
}

criterion_group!(benches, bench_parser_function, bench_parser_precedence_chain, bench_parser_loop_heavy);
criterion_main!(benches);
