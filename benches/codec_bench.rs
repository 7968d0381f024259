//! Performance benchmarks for the scanner codec.
//!
//! Measures report decoding, single-shot serial framing and the accumulating
//! decoder over bursts of reads.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use scanport_core::{CommandName, SymbologyCode, Transport};
use scanport_protocol::{
    FrameAccumulator, SerialFrameCodec, SerialReply, decode_report_packet, decode_serial_frame,
    encode_command, encode_report_packet,
};
use std::hint::black_box;
use tokio_util::codec::Decoder;

/// Build a serial window holding `count` EAN-13 reads separated by CR/LF.
fn serial_burst(count: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(count * 15);
    for _ in 0..count {
        raw.extend_from_slice(b"4006381333931\r\n");
    }
    raw
}

fn bench_decode_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_report");
    group.throughput(Throughput::Elements(1));

    let full = encode_report_packet(&[b'7'; 60], SymbologyCode::CODE128);
    let status_only = encode_report_packet(&[], SymbologyCode::GENERIC);

    group.bench_function("full_payload", |b| {
        b.iter(|| black_box(decode_report_packet(black_box(&full))));
    });
    group.bench_function("status_only", |b| {
        b.iter(|| black_box(decode_report_packet(black_box(&status_only))));
    });

    group.finish();
}

fn bench_decode_serial(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_serial");
    group.throughput(Throughput::Elements(1));

    let clean = b"4006381333931\r\n".to_vec();
    let mut noisy = vec![0u8; 180];
    noisy.extend_from_slice(&clean);

    group.bench_function("clean_window", |b| {
        b.iter(|| black_box(decode_serial_frame(black_box(&clean))));
    });
    group.bench_function("noisy_window", |b| {
        b.iter(|| black_box(decode_serial_frame(black_box(&noisy))));
    });
    group.bench_function("classify_reply", |b| {
        let frame = decode_serial_frame(&clean).unwrap();
        b.iter(|| black_box(SerialReply::classify(black_box(&frame))));
    });

    group.finish();
}

fn bench_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");

    for count in [1usize, 10, 100] {
        let raw = serial_burst(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("burst", count), &raw, |b, raw| {
            b.iter(|| {
                let mut acc = FrameAccumulator::new();
                acc.feed(black_box(raw));
                black_box(acc.drain_frames().count());
            });
        });

        group.bench_with_input(BenchmarkId::new("split_reads", count), &raw, |b, raw| {
            b.iter(|| {
                let mut acc = FrameAccumulator::new();
                for chunk in raw.chunks(7) {
                    acc.feed(black_box(chunk));
                }
                black_box(acc.drain_frames().count());
            });
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("serial_codec");
    let raw = serial_burst(50);
    group.throughput(Throughput::Elements(50));

    group.bench_function("decode_burst", |b| {
        b.iter(|| {
            let mut codec = SerialFrameCodec::new();
            let mut buffer = BytesMut::from(&raw[..]);
            let mut frames = 0;
            while let Ok(Some(frame)) = codec.decode(&mut buffer) {
                black_box(frame);
                frames += 1;
            }
            black_box(frames);
        });
    });

    group.bench_function("encode_commands", |b| {
        b.iter(|| {
            black_box(encode_command(CommandName::Enable, Transport::Report));
            black_box(encode_command(CommandName::Enable, Transport::Serial));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_report,
    bench_decode_serial,
    bench_accumulator,
    bench_codec
);
criterion_main!(benches);
