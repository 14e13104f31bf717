//! Benchmarks for the SID per-sample hot path
//!
//! Run with: cargo bench --bench chip

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sid6581::{ParameterUpdate, Sid, SidBackend, SidConfig, SidProcessor};
use std::hint::black_box;

/// Three gated voices: triangle, pulse and sawtooth
fn three_voice_chip() -> Sid {
    let mut chip = Sid::new(44_100.0).unwrap();
    chip.write_register(0x00, 0x45); // Voice 1 frequency (440 Hz)
    chip.write_register(0x01, 0x1D);
    chip.write_register(0x06, 0xF0); // Voice 1 sustain max
    chip.write_register(0x04, 0x11); // Triangle + gate
    chip.write_register(0x07, 0xDA); // Voice 2 frequency (659 Hz)
    chip.write_register(0x08, 0x2B);
    chip.write_register(0x0A, 0x00); // Voice 2 pulse width 50%
    chip.write_register(0x0B, 0x08);
    chip.write_register(0x0D, 0xF0);
    chip.write_register(0x0B, 0x41); // Pulse + gate
    chip.write_register(0x0E, 0xA3); // Voice 3 frequency (220 Hz)
    chip.write_register(0x0F, 0x0E);
    chip.write_register(0x14, 0xF0);
    chip.write_register(0x12, 0x21); // Sawtooth + gate
    chip.write_register(0x18, 0x0F); // Volume max
    chip
}

fn bench_clock_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock");
    let mut chip = three_voice_chip();

    for iterations in [100, 1000, 10000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            iterations,
            |b, &iterations| {
                b.iter(|| {
                    for _ in 0..iterations {
                        black_box(chip.compute_next_sample());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_generate_samples_into(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_samples_into");
    let mut chip = three_voice_chip();

    for block in [128, 882, 4410].iter() {
        let mut buffer = vec![0.0f32; *block];
        group.bench_with_input(BenchmarkId::from_parameter(block), block, |b, _| {
            b.iter(|| {
                chip.generate_samples_into(&mut buffer);
                black_box(&buffer);
            });
        });
    }

    group.finish();
}

fn bench_filtered_voices(c: &mut Criterion) {
    let mut chip = three_voice_chip();
    chip.write_register(0x15, 0x03); // Cutoff lo
    chip.write_register(0x16, 0x40); // Cutoff hi
    chip.write_register(0x17, 0xF7); // Max resonance, all voices routed
    chip.write_register(0x18, 0x1F); // Low-pass, volume max

    c.bench_function("filtered_three_voices", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(chip.compute_next_sample());
            }
        });
    });
}

fn bench_combined_waveforms(c: &mut Criterion) {
    let mut chip = three_voice_chip();
    chip.write_register(0x04, 0x31); // Triangle + sawtooth
    chip.write_register(0x0B, 0x61); // Pulse + sawtooth
    chip.write_register(0x12, 0x71); // Pulse + triangle + sawtooth

    c.bench_function("combined_waveforms", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(chip.compute_next_sample());
            }
        });
    });
}

fn bench_noise_and_sync(c: &mut Criterion) {
    let mut chip = three_voice_chip();
    chip.write_register(0x04, 0x83); // Noise + sync + gate
    chip.write_register(0x0B, 0x15); // Triangle + ring + gate

    c.bench_function("noise_sync_ring", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(chip.compute_next_sample());
            }
        });
    });
}

fn bench_sparse_updates(c: &mut Criterion) {
    let mut chip = three_voice_chip();
    let update = ParameterUpdate::new()
        .with_frequency(0, 0x1CD6)
        .with_cutoff(0x03, 0x80)
        .with_mode_volume(0x1F);

    c.bench_function("apply_update", |b| {
        b.iter(|| chip.apply(black_box(&update)));
    });

    c.bench_function("parse_json_update", |b| {
        b.iter(|| {
            black_box(ParameterUpdate::from_json(black_box(
                r#"{"fq1": 7382, "cutL": 3, "cutH": 128, "typeVol": 31}"#,
            )))
        });
    });
}

fn bench_processor_block(c: &mut Criterion) {
    let config = SidConfig::pal().with_sample_rate(48_000.0);
    let (mut processor, control, _frames) = SidProcessor::with_channels(config).unwrap();
    control
        .send(
            ParameterUpdate::new()
                .with_frequency(0, 0x4A3F)
                .with_sustain_release(0, 0xF0)
                .with_mode_volume(0x0F)
                .with_control(0, 0x41)
                .with_pulse_width(0, 0x0800),
        )
        .unwrap();
    let mut left = vec![0.0f32; 128];
    let mut right = vec![0.0f32; 128];

    c.bench_function("processor_stereo_block_128", |b| {
        b.iter(|| {
            processor
                .process(&mut [&mut left[..], &mut right[..]])
                .unwrap();
            black_box(&left);
        });
    });
}

fn bench_full_register_dump_load(c: &mut Criterion) {
    let mut chip = three_voice_chip();
    let regs = chip.dump_registers();

    c.bench_function("register_dump_load_cycle", |b| {
        b.iter(|| {
            chip.load_registers(black_box(&regs));
            black_box(chip.dump_registers());
        });
    });
}

criterion_group!(
    benches,
    bench_clock_iterations,
    bench_generate_samples_into,
    bench_filtered_voices,
    bench_combined_waveforms,
    bench_noise_and_sync,
    bench_sparse_updates,
    bench_processor_block,
    bench_full_register_dump_load
);
criterion_main!(benches);
