//! Codec benchmarks.
//!
//! Criterion counterpart of `jsonbench bench`: buffer encode and decode of a
//! synthetic file tree through every codec that has the slot. Useful when the
//! fixture corpus is not checked out.

// criterion_group! generates undocumentable items
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsonbench::corpus::fixtures::{GolangNode, GolangRoot};
use jsonbench::registry::{self, Value};
use jsonbench::{Fixture, Shape};

fn node(name: String, depth: usize, fanout: usize) -> GolangNode {
    let kids = if depth == 0 {
        Vec::new()
    } else {
        (0..fanout)
            .map(|i| node(format!("{name}/{i}"), depth - 1, fanout))
            .collect()
    };
    GolangNode {
        touches: kids.len() as i64 + 1,
        cl_weight: 0.25 * (depth as f64 + 1.0),
        min_t: 1_257_894_000,
        max_t: 1_257_894_000 + depth as i64,
        mean_t: 1_257_894_000,
        name,
        kids,
    }
}

fn document() -> Vec<u8> {
    let root = GolangRoot {
        tree: Some(node(String::new(), 5, 4)),
        username: "gopher".to_string(),
        mod_time: 1_257_894_000,
    };
    serde_json::to_vec(&root).unwrap_or_default()
}

fn ready(bytes: &[u8], shape: Shape) -> Value {
    let mut value = Fixture::GolangSource.empty(shape);
    let decode = registry::reference().decode.unwrap();
    decode(bytes, &mut value).unwrap();
    value
}

fn bench_encode(c: &mut Criterion) {
    let bytes = document();
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    for shape in Shape::ALL {
        let value = ready(&bytes, shape);
        for codec in registry::codecs() {
            let Some(encode) = codec.encode else {
                continue;
            };
            group.bench_with_input(
                BenchmarkId::new(codec.name, shape),
                &value,
                |b, value| b.iter(|| encode(black_box(value)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let bytes = document();
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    for shape in Shape::ALL {
        for codec in registry::codecs() {
            let Some(decode) = codec.decode else {
                continue;
            };
            group.bench_with_input(
                BenchmarkId::new(codec.name, shape),
                bytes.as_slice(),
                |b, bytes| {
                    b.iter(|| {
                        let mut target = Fixture::GolangSource.empty(shape);
                        decode(black_box(bytes), &mut target).unwrap();
                        target
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
