//! Benchmarks for rule loading and keyword matching.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chatcsv::interest;
use chatcsv::matcher;
use chatcsv::rules::RuleTable;

fn rule_source(rows: usize) -> String {
    let mut source = String::from("keyword,response,redirect_page\n");
    for i in 0..rows {
        if i % 3 == 0 {
            source.push_str(&format!("kw{i},response {i}, with a comma,page{i}.html\n"));
        } else {
            source.push_str(&format!("kw{i},response {i}\n"));
        }
    }
    source
}

fn bench_load(c: &mut Criterion) {
    let source = rule_source(1_000);
    c.bench_function("load_1k_rules", |bench| {
        bench.iter(|| black_box(RuleTable::load(black_box(&source))))
    });
}

fn bench_find(c: &mut Criterion) {
    let table = RuleTable::load(&rule_source(1_000));

    c.bench_function("find_hit_1k", |bench| {
        bench.iter(|| black_box(matcher::find(black_box("please tell me about kw999"), &table)))
    });
    c.bench_function("find_miss_1k", |bench| {
        bench.iter(|| black_box(matcher::find(black_box("nothing to see here"), &table)))
    });
}

fn bench_extract(c: &mut Criterion) {
    c.bench_function("extract_interests", |bench| {
        bench.iter(|| black_box(interest::extract(black_box("Can you HELP me with a joke about Rust?"))))
    });
}

criterion_group!(benches, bench_load, bench_find, bench_extract);
criterion_main!(benches);
