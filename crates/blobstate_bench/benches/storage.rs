//! Blob store and hashing benchmarks.

use blobstate_bench::random_data;
use blobstate_storage::{BlobStore, ContentHash, InMemoryBlobStore, PutExpectations};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark SHA-384 over content of various sizes.
fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("sha384");

    for size in [256usize, 4096, 65536, 1 << 20] {
        let data = random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(ContentHash::compute(black_box(data))));
        });
    }

    group.finish();
}

/// Benchmark verified blob writes.
fn bench_blob_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("blob_put");

    for size in [4096usize, 65536] {
        let data = random_data(size);
        let expect = PutExpectations::new()
            .with_size(size as u64)
            .with_hash(ContentHash::compute(&data));
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("verified", size), &data, |b, data| {
            let store = InMemoryBlobStore::new();
            let mut i = 0u64;
            b.iter(|| {
                let path = format!("resources/bench/{i}");
                i += 1;
                black_box(store.put("default", &path, &mut &data[..], &expect).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hash, bench_blob_put);

criterion_main!(benches);
