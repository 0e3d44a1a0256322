use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tagwire::{
    Bool, Dictionary, Int64, StringDictionary, Tag, TagArray, TagFactory, Utf8String, Varint,
    VarintArray, Version,
};

/// Документ: словарь с вложенным массивом из `items` записей.
fn document(items: usize) -> Tag {
    let records = (0..items)
        .map(|i| {
            let mut record = Dictionary::new();
            record.put("id", Varint(i as u64));
            record.put("name", Utf8String::from(format!("item-{i}")));
            record.put("active", Bool(i % 2 == 0));
            record.put("balance", Int64(-(i as i64) * 1000));
            Tag::from(record)
        })
        .collect();

    let mut meta = StringDictionary::new();
    meta.put("source", "bench");
    meta.put("schema", "records");

    let mut doc = Dictionary::new();
    doc.put("version", Version::new(1, 2, 0, 0));
    doc.put("meta", meta);
    doc.put("path", VarintArray((0..16).collect()));
    doc.put("records", TagArray(records));
    Tag::from(doc)
}

fn serialize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag_serialize");

    for items in [1usize, 100, 1000] {
        let tag = document(items);
        group.throughput(Throughput::Bytes(tag.size()));
        group.bench_with_input(BenchmarkId::new("to_bytes", items), &tag, |b, tag| {
            b.iter(|| black_box(tag.to_bytes().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("size", items), &tag, |b, tag| {
            b.iter(|| black_box(tag.size()));
        });
    }

    group.finish();
}

fn deserialize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag_deserialize");
    let factory = TagFactory::new();

    for items in [1usize, 100, 1000] {
        let bytes = document(items).to_bytes().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("from_bytes", items), &bytes, |b, bytes| {
            b.iter(|| black_box(factory.from_bytes(black_box(bytes)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("skip", items), &bytes, |b, bytes| {
            b.iter(|| {
                let mut cursor = Cursor::new(black_box(bytes));
                black_box(factory.skip(&mut cursor).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, serialize_benchmark, deserialize_benchmark);
criterion_main!(benches);
