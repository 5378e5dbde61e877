//! Object writer benchmarks
//!
//! Measures serialization and flushing of many small objects, with and
//! without compression, and tagged page generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdf_weave::writer::{PdfWriter, TrailerInfo, WriterSettings};
use pdf_weave::{
    Dictionary, DocumentConfig, Object, ObjectRef, PageSize, PdfDocument, PdfVersion, StructOptions,
    StructType,
};

fn write_objects(count: usize, compress: bool, reverse: bool) -> Vec<u8> {
    let settings = WriterSettings::new(PdfVersion::V1_5).with_compress(compress);
    let writer = PdfWriter::new(Vec::new(), settings).unwrap();
    let refs: Vec<_> = (0..count)
        .map(|i| {
            let mut dict = Dictionary::new();
            dict.insert("Type".into(), Object::name("Item"));
            dict.insert("Index".into(), Object::from(i));
            let r = writer.allocate_stream(dict).unwrap();
            writer.write(r, format!("BT /F1 12 Tf 72 {} Td (line {}) Tj ET\n", i % 700, i)).unwrap();
            r
        })
        .collect();

    let order: Vec<ObjectRef> = if reverse {
        refs.iter().rev().copied().collect()
    } else {
        refs.clone()
    };
    for r in order {
        let _ = writer.finalize(r).unwrap();
    }
    writer.end(TrailerInfo::new(refs[0])).unwrap()
}

fn bench_flush_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush_order");
    for count in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("in_order", count), &count, |b, &n| {
            b.iter(|| black_box(write_objects(n, false, false)))
        });
        group.bench_with_input(BenchmarkId::new("reverse", count), &count, |b, &n| {
            b.iter(|| black_box(write_objects(n, false, true)))
        });
    }
    group.finish();
}

fn bench_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression");
    for compress in [false, true] {
        group.bench_with_input(BenchmarkId::new("objects_1000", compress), &compress, |b, &on| {
            b.iter(|| black_box(write_objects(1_000, on, false)))
        });
    }
    group.finish();
}

fn bench_tagged_pages(c: &mut Criterion) {
    c.bench_function("tagged_pages_50", |b| {
        b.iter(|| {
            let config = DocumentConfig::new().with_tagged(true);
            let mut doc = PdfDocument::new(Vec::new(), config).unwrap();
            for _ in 0..50 {
                doc.add_page(PageSize::A4).unwrap();
                for line in 0..20 {
                    let p = doc
                        .begin_structure(None, StructType::P, StructOptions::default())
                        .unwrap();
                    doc.mark_content(p, |content| {
                        content.write(format!("BT 72 {} Td (paragraph) Tj ET\n", 800 - line * 30))
                    })
                    .unwrap();
                    let _ = doc.end_structure(p).unwrap();
                }
            }
            black_box(doc.end().unwrap())
        })
    });
}

criterion_group!(benches, bench_flush_order, bench_compression, bench_tagged_pages);
criterion_main!(benches);
