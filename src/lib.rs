//! MOS 6581/8580 SID Emulator Core
//!
//! A sample-accurate software model of the Commodore 64 Sound Interface
//! Device: three voices with phase accumulators, combined waveforms, noise,
//! hard sync and ring modulation, the ADSR envelope generator with its
//! hardware quirks, and the shared multimode filter in both 6581 and 8580
//! flavours.
//!
//! # Features
//! - Fixed-point oscillators and envelopes clocked once per host sample
//! - Per-model combined waveform tables, built once and shared
//! - Register-level and sparse JSON parameter updates
//! - Lock-free control queue drained by the audio thread at block boundaries
//! - Advisory frame markers at the configured frame rate (50 Hz PAL)
//!
//! # Quick start
//! ## Core emulator only
//! ```
//! use sid6581::Sid;
//! let mut chip = Sid::new(44_100.0).unwrap();
//! chip.write_register(0x00, 0x45); // Voice 1 frequency lo (440 Hz)
//! chip.write_register(0x01, 0x1D); // Voice 1 frequency hi
//! chip.write_register(0x06, 0xF0); // Voice 1 sustain max
//! chip.write_register(0x18, 0x0F); // Volume max
//! chip.write_register(0x04, 0x11); // Triangle + gate
//! let sample = chip.compute_next_sample();
//! assert!(sample.abs() <= 1.0);
//! ```
//!
//! ## Streaming updates from a control thread
//! ```
//! use sid6581::{ParameterUpdate, SidConfig, SidProcessor};
//! let config = SidConfig::pal().with_sample_rate(48_000.0);
//! let (mut processor, control, _frames) = SidProcessor::with_channels(config).unwrap();
//! control.send_json(r#"{"fq1": 7493, "sr1": 240, "typeVol": 15, "wg1": 17}"#).unwrap();
//! control.send(ParameterUpdate::new().with_cutoff(0, 0x80)).unwrap();
//!
//! let mut block = [0.0f32; 128];
//! processor.process_mono(&mut block).unwrap();
//! ```

#![warn(missing_docs)]

pub mod backend; // Engine abstraction
pub mod config; // Engine configuration
pub mod control; // Control/audio thread queues
pub mod frame_clock; // Frame boundary tracking
pub mod processor; // Host block processor
pub mod sid; // SID emulation (core)

/// Error types for SID emulator operations
#[derive(thiserror::Error, Debug)]
pub enum SidError {
    /// Sample rate was not a finite positive number
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// Audio was requested before a sample rate was supplied
    #[error("Engine not initialized: no sample rate received yet")]
    NotInitialized,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Control message could not be parsed
    #[error("Invalid parameter update: {0}")]
    InvalidUpdate(#[from] serde_json::Error),

    /// Control queue is full; the message was dropped
    #[error("Control queue full")]
    QueueFull,

    /// The other end of a channel has been dropped
    #[error("Channel disconnected")]
    Disconnected,
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, SidError>;

// Public API exports
pub use backend::SidBackend;
pub use config::SidConfig;
pub use control::{
    control_channel, frame_channel, ControlMessage, ControlReceiver, ControlSender, FrameMarker,
    FrameReceiver, FrameSender,
};
pub use frame_clock::FrameClock;
pub use processor::SidProcessor;
pub use sid::{ChipModel, ChipParameters, ParameterUpdate, Sid};
