use criterion::{criterion_group, criterion_main, Criterion};
use engine::tokenizer::tokenize;

static DESCRIPTION: &str = "Lightweight trail running shoes with a breathable \
mesh upper, cushioned midsole, and grippy rubber outsole. Designed for long \
runs on mixed terrain; the reinforced toe cap protects against rocks and \
roots while the padded collar keeps debris out. Machine washable, available \
in six colors, made in Portugal by a family-owned factory.";

fn bench_tokenize(c: &mut Criterion) {
    let text = DESCRIPTION.repeat(50);
    c.bench_function("tokenize_description", |b| b.iter(|| tokenize(&text, false)));
    c.bench_function("tokenize_description_stemmed", |b| {
        b.iter(|| tokenize(&text, true))
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
