//! SID Chip Demo
//!
//! Drives the engine the way a host would: an audio thread renders blocks
//! through a [`SidProcessor`] while the main thread streams JSON control
//! messages, stepping an arpeggio on every frame marker. Prints level
//! statistics when done.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example chip_demo
//! ```

use std::thread;
use std::time::Duration;

use anyhow::Context;
use sid6581::sid::Register;
use sid6581::{SidBackend, SidConfig, SidProcessor};

const SAMPLE_RATE: f64 = 48_000.0;
const BLOCK: usize = 128;
const SECONDS: usize = 2;

/// C major arpeggio, PAL frequency register values
const ARPEGGIO: [u16; 4] = [0x1167, 0x15ED, 0x1A13, 0x22CE];

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    println!("\n╔══════════════════════════════════════════════════════════╗");
    println!("║        SID 6581/8580 Engine Demo (pulse arpeggio)        ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    let config = SidConfig::from_json(r#"{"model": "6581", "frameRate": 50.0}"#)
        .context("demo configuration")?;
    let (mut processor, control, frames) =
        SidProcessor::with_channels(config).context("creating processor")?;

    // The host announces its sample rate first; everything before it is
    // buffered into the initial register image.
    control.send_json(
        r#"{"pw1": 2048, "ad1": 9, "sr1": 160, "cutH": 48, "res": 241, "typeVol": 31}"#,
    )?;
    control.send_json(&format!(r#"{{"sampleRate": {SAMPLE_RATE}}}"#))?;

    let blocks = SECONDS * SAMPLE_RATE as usize / BLOCK;
    let audio = thread::spawn(move || -> sid6581::Result<(Vec<f32>, Vec<u8>)> {
        let mut rendered = Vec::with_capacity(blocks * BLOCK);
        let mut block = [0.0f32; BLOCK];
        for _ in 0..blocks {
            processor.process_mono(&mut block)?;
            rendered.extend_from_slice(&block);
            // pace roughly like a real device callback
            thread::sleep(Duration::from_micros(200));
        }
        let registers = processor
            .engine()
            .map(|engine| engine.dump_registers().to_vec())
            .unwrap_or_default();
        Ok((rendered, registers))
    });

    let mut step = 0;
    while !audio.is_finished() {
        let Some(marker) = frames.recv_timeout(Duration::from_millis(50)) else {
            continue;
        };
        // Release for one frame, then gate the next note
        let sent = match marker.frame % 4 {
            3 => control.send_json(r#"{"wg1": 64}"#),
            0 => {
                let fq = ARPEGGIO[step % ARPEGGIO.len()];
                step += 1;
                control.send_json(&format!(r#"{{"fq1": {fq}, "wg1": 65}}"#))
            }
            _ => Ok(()),
        };
        // the audio thread drops its receiver when it finishes
        if sent.is_err() {
            break;
        }
    }

    let (rendered, registers) = audio
        .join()
        .map_err(|_| anyhow::anyhow!("audio thread panicked"))??;

    let peak = rendered.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let rms = (rendered.iter().map(|s| (*s as f64).powi(2)).sum::<f64>()
        / rendered.len() as f64)
        .sqrt();

    println!("Model:          {}", config.model);
    println!("Samples:        {}", rendered.len());
    println!("Notes played:   {step}");
    println!("Peak level:     {peak:.4}");
    println!("RMS level:      {rms:.4}");

    println!("\nFinal register image:");
    for (addr, value) in registers.iter().enumerate() {
        if let Some(register) = Register::from_addr(addr as u8) {
            let name = register.to_string();
            println!("  ${addr:02X}  {name:<26} ${value:02X}");
        }
    }
    println!("\n✓ Demo complete!\n");
    Ok(())
}
