use bbx_core::{AudioFormat, FrameFormat};
use bbx_engine::{Buffer, BufferId, ComponentId};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const BUFFER_SIZES: &[usize] = &[256, 1024, 4096, 16384];

fn fmt() -> AudioFormat {
    AudioFormat::new(FrameFormat::S16Le, 48_000, 2, true)
}

fn bench_reserve_commit_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_reserve_commit");

    for &size in BUFFER_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let buf = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), size * 2, false, false, false);
            let chunk = vec![0xAAu8; size];

            b.iter(|| {
                let r = buf.write_reserve(size).unwrap();
                buf.write_into(&r, black_box(&chunk));
                buf.write_commit(size);

                let r = buf.read_reserve(size).unwrap();
                let mut out = vec![0u8; size];
                buf.read_from(&r, &mut out);
                buf.read_commit(size);
                black_box(out);
            });
        });
    }

    group.finish();
}

fn bench_wraparound_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_wraparound");

    for &size in BUFFER_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            // Ring sized to exactly `size` forces every reserve past the
            // first to straddle the wrap point.
            let buf = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), size, false, false, false);
            let quarter = size / 4;
            let chunk = vec![0x55u8; quarter];

            b.iter(|| {
                for _ in 0..4 {
                    let r = buf.write_reserve(quarter).unwrap();
                    buf.write_into(&r, black_box(&chunk));
                    buf.write_commit(quarter);
                    let r = buf.read_reserve(quarter).unwrap();
                    let mut out = vec![0u8; quarter];
                    buf.read_from(&r, &mut out);
                    buf.read_commit(quarter);
                    black_box(&out);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reserve_commit_roundtrip, bench_wraparound_roundtrip);
criterion_main!(benches);
