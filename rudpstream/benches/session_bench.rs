// rudpstream session benchmarks using criterion.
//
// Measures:
//   - Frame encode / decode throughput
//   - Fragmentation + first flush of one message
//   - Lossless loopback transfer between two sessions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use bytes::Bytes;
use rudpstream::frame::{self, Command, SegmentHeader};
use rudpstream::{DatagramQueue, Session, SessionConfig};

fn push_header() -> SegmentHeader {
    SegmentHeader {
        command: Command::Push,
        message_id: 1,
        remaining_count: 0,
        declared_window: 32,
        timestamp: 42,
        sequence_number: 7,
        ack_base: 3,
    }
}

// ---------------------------------------------------------------------------
// Frame encode / decode
// ---------------------------------------------------------------------------

fn bench_frame_codec(c: &mut Criterion) {
    let sizes: &[usize] = &[0, 64, 512, 1355];

    let mut group = c.benchmark_group("frame");
    for &size in sizes {
        let payload = vec![0xABu8; size];
        let encoded = frame::encode(&push_header(), &payload);
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &payload, |b, p| {
            b.iter(|| black_box(frame::encode(&push_header(), p)));
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, e| {
            b.iter(|| {
                let mut data = e.clone();
                black_box(frame::decode(&mut data).unwrap());
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Send + flush
// ---------------------------------------------------------------------------

fn bench_send_flush(c: &mut Criterion) {
    let sizes: &[usize] = &[1024, 16 * 1024, 40 * 1024];

    let mut group = c.benchmark_group("send_flush");
    for &size in sizes {
        let payload = Bytes::from(vec![0x5Au8; size]);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}B")),
            &payload,
            |b, p| {
                b.iter(|| {
                    let wire = DatagramQueue::new();
                    let mut s = Session::new(SessionConfig::default(), wire.clone()).unwrap();
                    s.send(p.clone(), 1).unwrap();
                    s.flush(0);
                    black_box(wire.drain());
                });
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Loopback transfer
// ---------------------------------------------------------------------------

fn bench_loopback(c: &mut Criterion) {
    const MESSAGES: usize = 64;
    const SIZE: usize = 4096;

    let mut group = c.benchmark_group("loopback");
    group.throughput(Throughput::Bytes((MESSAGES * SIZE) as u64));
    group.bench_function("64x4KiB", |b| {
        let payload = Bytes::from(vec![0x11u8; SIZE]);
        b.iter(|| {
            let a_wire = DatagramQueue::new();
            let b_wire = DatagramQueue::new();
            let mut a = Session::new(SessionConfig::default(), a_wire.clone()).unwrap();
            let mut r = Session::new(SessionConfig::default(), b_wire.clone()).unwrap();
            for i in 0..MESSAGES {
                a.send(payload.clone(), i as i64).unwrap();
            }

            let mut received = 0;
            let mut now = 0;
            while received < MESSAGES {
                a.flush(now);
                for d in a_wire.drain() {
                    r.input(d.data, now).unwrap();
                }
                while let Some(m) = r.recv() {
                    black_box(m);
                    received += 1;
                }
                for d in b_wire.drain() {
                    a.input(d.data, now).unwrap();
                }
                now += 10;
            }
        });
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion harness
// ---------------------------------------------------------------------------

criterion_group! {
    name = session_benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5));
    targets =
        bench_frame_codec,
        bench_send_flush,
        bench_loopback
}

criterion_main!(session_benches);
