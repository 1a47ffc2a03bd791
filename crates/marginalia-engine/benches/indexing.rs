use criterion::{Criterion, criterion_group, criterion_main};
use marginalia_engine::anchoring::TextIndex;
use marginalia_engine::content::{PlainText, markdown};
mod common;

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexing");
    group.sample_size(20);

    let content = common::generate_markdown_content(200);
    let tree = markdown::render(&content);
    let plain = PlainText::new(&content);

    group.bench_function("render_markdown", |b| {
        b.iter(|| markdown::render(std::hint::black_box(&content)));
    });

    group.bench_function("index_content_tree", |b| {
        b.iter(|| TextIndex::build(std::hint::black_box(&tree)));
    });

    group.bench_function("index_plain_text", |b| {
        b.iter(|| TextIndex::build(std::hint::black_box(&plain)));
    });

    let index = TextIndex::build(&tree);
    group.bench_function("locate", |b| {
        b.iter(|| {
            for offset in (0..index.len()).step_by(97) {
                std::hint::black_box(index.locate(offset));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_indexing);
criterion_main!(benches);
