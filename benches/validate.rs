use criterion::{black_box, criterion_group, criterion_main, Criterion};

use reload_trigger::{RuleSet, TabDescriptor};

fn make_rules(patterns: usize) -> RuleSet {
    let mut rules = RuleSet::new();
    for i in 0..patterns {
        rules.add_pattern_rule(format!(r"/^https?:\/\/(localhost|127\.0\.0\.1):{}/", 8000 + i));
    }
    rules
}

fn bench_validate(c: &mut Criterion) {
    let tab = TabDescriptor::new("http://localhost:8000/app/index.html").with_id(1);

    // A single pattern rule that matches.
    let single = make_rules(1);
    c.bench_function("validate/single_pattern_match", |b| {
        b.iter(|| black_box(single.validate(black_box(&tab))));
    });

    // The first rule fails, so the remaining 63 are skipped.
    let mut short_circuit = RuleSet::new();
    short_circuit.add_url_rule("https://never.test/");
    short_circuit.extend(make_rules(63).rules().iter().cloned());
    c.bench_function("validate/short_circuit_64", |b| {
        b.iter(|| black_box(short_circuit.validate(black_box(&tab))));
    });

    let mut custom = RuleSet::new();
    custom
        .add_url_rule("http://localhost:8000/app/index.html")
        .add_custom_rule(|t| t.id.is_some());
    c.bench_function("validate/url_and_custom", |b| {
        b.iter(|| black_box(custom.validate(black_box(&tab))));
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
