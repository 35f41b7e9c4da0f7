use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wr3223_rs::wr3223::frame::{block_check, build_read_request, extract_value, parse_response};

fn benchmark_build_request(c: &mut Criterion) {
    c.bench_function("build_read_request", |b| {
        b.iter(|| {
            let request = build_read_request(black_box(12), black_box("MD"));
            let _ = black_box(request);
        })
    });
}

fn benchmark_extract_value(c: &mut Criterion) {
    let raw = b"\x02T3  -12.5 \x03";

    c.bench_function("extract_value", |b| {
        b.iter(|| black_box(extract_value(black_box(raw))))
    });
}

fn benchmark_parse_response(c: &mut Criterion) {
    let mut raw = hex::decode("02524c3833332e03").unwrap();
    let bcc = block_check(&raw[1..]);
    raw.push(bcc);

    c.bench_function("parse_response", |b| {
        b.iter(|| {
            let _ = black_box(parse_response(black_box(&raw)));
        })
    });
}

criterion_group!(
    benches,
    benchmark_build_request,
    benchmark_extract_value,
    benchmark_parse_response
);
criterion_main!(benches);
