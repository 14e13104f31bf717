//! SID Emulation Domain
//!
//! MOS 6581/8580 Sound Interface Device emulation: three oscillator/envelope
//! voices, combined waveforms, noise, the shared multimode filter and the
//! output stage.
//!
//! Implementation:
//! - `chip` - per-sample engine tying the voices, filter and frame clock together
//! - `params` - register snapshot, sparse updates and sample-rate-derived constants

// Internal modules
pub mod chip;
pub mod constants;
pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod params;
pub mod registers;
pub mod waveforms;

// Re-export public API
pub use chip::Sid;
pub use envelope::{EnvelopeFlags, EnvelopeGenerator, EnvelopePhase};
pub use filter::{FilterCoefficients, FilterMixer};
pub use oscillator::{SyncSource, VoiceOscillator};
pub use params::{DerivedConstants, FilterUpdate, ParameterStore, ParameterUpdate, VoiceUpdate};
pub use registers::{ChipModel, ChipParameters, ControlFlags, FilterMode, Register};
pub use waveforms::{combined_tables, CombinedWaveform};
