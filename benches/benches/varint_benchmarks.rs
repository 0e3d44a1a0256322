use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tagwire::codec::{
    decode, encode, encoded_size, read_signed_varint, read_varint, write_signed_varint,
    write_varint, MAX_VARINT_LEN,
};

/// Значения на границах каждой длины кодирования.
const SIZE_CASES: [(&str, u64); 9] = [
    ("1_byte", 0xF7),
    ("2_bytes", 0xF8 + 0xFF),
    ("3_bytes", 0xF8 + 0xFFFF),
    ("4_bytes", 0xF8 + 0xFF_FFFF),
    ("5_bytes", 0xF8 + 0xFFFF_FFFF),
    ("6_bytes", 0xF8 + 0xFF_FFFF_FFFF),
    ("7_bytes", 0xF8 + 0xFFFF_FFFF_FFFF),
    ("8_bytes", 0xF8 + 0xFF_FFFF_FFFF_FFFF),
    ("9_bytes", u64::MAX),
];

fn encoding_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");

    for (name, value) in SIZE_CASES {
        group.bench_with_input(BenchmarkId::new("encode", name), &value, |b, &value| {
            let mut buf = [0u8; MAX_VARINT_LEN];
            b.iter(|| encode(black_box(value), black_box(&mut buf)).unwrap());
        });

        group.bench_with_input(
            BenchmarkId::new("write_varint", name),
            &value,
            |b, &value| {
                let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
                b.iter(|| {
                    buf.clear();
                    write_varint(black_box(&mut buf), black_box(value)).unwrap();
                });
            },
        );
    }

    group.finish();
}

fn decoding_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    for (name, value) in SIZE_CASES {
        let encoded = tagwire::codec::to_vec(value);

        group.bench_with_input(BenchmarkId::new("decode", name), &encoded, |b, buf| {
            b.iter(|| black_box(decode(black_box(buf)).unwrap()));
        });

        group.bench_with_input(
            BenchmarkId::new("read_varint", name),
            &encoded,
            |b, buf| {
                b.iter(|| {
                    let mut cursor = Cursor::new(black_box(buf));
                    black_box(read_varint(&mut cursor).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn size_calculation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("size_calculation");

    for (name, value) in SIZE_CASES {
        group.bench_with_input(
            BenchmarkId::new("encoded_size", name),
            &value,
            |b, &value| {
                b.iter(|| black_box(encoded_size(black_box(value))));
            },
        );
    }

    group.finish();
}

fn batch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_operations");

    let mut rng = SmallRng::seed_from_u64(42);
    let values: Vec<u64> = (0..1000)
        .map(|i| match i % 4 {
            0 => rng.gen_range(0..0xF8),
            1 => rng.gen_range(0xF8..0x1_0000),
            2 => rng.gen_range(0x1_0000..0x1_0000_0000),
            _ => rng.gen(),
        })
        .collect();

    group.bench_function("encode_1000_random_values", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(values.len() * 5);
            for &value in &values {
                write_varint(&mut buf, black_box(value)).unwrap();
            }
            black_box(buf);
        });
    });

    let mut stream = Vec::new();
    for &value in &values {
        write_varint(&mut stream, value).unwrap();
    }

    group.bench_function("decode_1000_random_values", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(&stream);
            let mut total = 0u64;
            for _ in 0..values.len() {
                total = total.wrapping_add(read_varint(&mut cursor).unwrap().0);
            }
            black_box(total);
        });
    });

    let signed: Vec<i64> = values.iter().map(|&v| v as i64).collect();
    group.bench_function("signed_roundtrip_1000", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(signed.len() * 5);
            for &value in &signed {
                write_signed_varint(&mut buf, black_box(value)).unwrap();
            }
            let mut cursor = Cursor::new(&buf);
            for _ in 0..signed.len() {
                black_box(read_signed_varint(&mut cursor).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    encoding_benchmark,
    decoding_benchmark,
    size_calculation_benchmark,
    batch_benchmark
);
criterion_main!(benches);
