use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shroud::markup::{parse_document, MarkupTransformer};
use shroud::MarkerCodec;

const REPLY: &str = "Sure, here are the details you asked for. You can reach Ann Lee by email at \
ann.lee@example.com during office hours. Her direct line is 555-0142 if anything is urgent. \
Ann Lee also shares an office with Bob Jones (bob.jones@example.com, 555-0199).\n\n";

fn long_reply() -> String {
    REPLY.repeat(50)
}

fn items() -> Vec<&'static str> {
    vec!["Ann Lee", "ann.lee@example.com", "555-0142", "Bob Jones", "bob.jones@example.com", "555-0199", "Ann"]
}

fn bench_apply(c: &mut Criterion) {
    let codec = MarkerCodec::new().unwrap();
    let text = long_reply();

    let mut group = c.benchmark_group("apply_redactions");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("fresh_text", |b| {
        b.iter(|| codec.apply_redactions(black_box(&text), items()))
    });

    // WHY: Re-application over already-marked text is the common path for stored turns
    let marked = codec.apply_redactions(&text, items());
    group.bench_function("already_marked", |b| {
        b.iter(|| codec.apply_redactions(black_box(&marked), items()))
    });
    group.finish();
}

fn bench_parse_and_transform(c: &mut Criterion) {
    let codec = MarkerCodec::new().unwrap();
    let transformer = MarkupTransformer::new().unwrap();
    let marked = codec.apply_redactions(&long_reply(), items());

    let mut group = c.benchmark_group("render_path");
    group.throughput(Throughput::Bytes(marked.len() as u64));

    group.bench_function("parse_markers", |b| b.iter(|| codec.parse_markers(black_box(&marked))));

    let document = parse_document(&marked);
    group.bench_function("transform_tree", |b| b.iter(|| transformer.transform(black_box(&document))));
    group.finish();
}

criterion_group!(benches, bench_apply, bench_parse_and_transform);
criterion_main!(benches);
