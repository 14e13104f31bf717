//! Backend trait abstraction for SID engine implementations
//!
//! The audio processor and the control plumbing only talk to this interface,
//! so alternative engines (a different filter model, a test double) can be
//! dropped in without touching the host glue.

use crate::config::SidConfig;
use crate::sid::constants::REGISTER_COUNT;
use crate::sid::ParameterUpdate;
use crate::Result;

/// Common interface for SID engines
///
/// # Example
///
/// ```
/// use sid6581::{SidBackend, Sid};
///
/// fn play_note<B: SidBackend>(chip: &mut B) {
///     chip.write_register(0x00, 0x8A); // Voice 1 frequency low
///     chip.write_register(0x01, 0x42); // Voice 1 frequency high
///     chip.write_register(0x06, 0xF0); // Voice 1 sustain max
///     chip.write_register(0x18, 0x0F); // Volume max
///     chip.write_register(0x04, 0x11); // Triangle + gate
///
///     chip.clock();
///     let sample = chip.get_sample();
/// }
/// ```
pub trait SidBackend: Send {
    /// Create an engine with PAL timing and the default chip model
    fn new(sample_rate: f64) -> Result<Self>
    where
        Self: Sized;

    /// Create an engine from a configuration and host sample rate
    fn with_config(config: &SidConfig, sample_rate: f64) -> Result<Self>
    where
        Self: Sized;

    /// Reset voices, filter and registers; sample rate and model are kept
    fn reset(&mut self);

    /// Merge a sparse parameter update
    fn apply(&mut self, update: &ParameterUpdate);

    /// Write a chip register ($00-$18); other addresses are ignored
    fn write_register(&mut self, addr: u8, value: u8);

    /// Read a chip register, 0x00 for unmapped addresses
    fn read_register(&self, addr: u8) -> u8;

    /// Load all writable registers at once
    fn load_registers(&mut self, regs: &[u8; REGISTER_COUNT]) {
        for (addr, &value) in regs.iter().enumerate() {
            self.write_register(addr as u8, value);
        }
    }

    /// Dump all writable registers
    fn dump_registers(&self) -> [u8; REGISTER_COUNT] {
        let mut out = [0u8; REGISTER_COUNT];
        for (addr, r) in out.iter_mut().enumerate() {
            *r = self.read_register(addr as u8);
        }
        out
    }

    /// Produce the next output sample
    fn clock(&mut self);

    /// Get the last generated audio sample
    fn get_sample(&self) -> f32;

    /// Generate multiple audio samples
    fn generate_samples(&mut self, count: usize) -> Vec<f32> {
        let mut samples = vec![0.0; count];
        self.generate_samples_into(&mut samples);
        samples
    }

    /// Generate samples into a caller-provided buffer
    ///
    /// Allocation-free; prefer this on the audio thread.
    fn generate_samples_into(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            self.clock();
            *sample = self.get_sample();
        }
    }

    /// True when the last sample fell on a frame boundary
    fn frame_boundary(&self) -> bool {
        false
    }

    /// Frame boundaries passed so far
    fn frame_count(&self) -> u64 {
        0
    }

    /// Per-voice levels of the last sample, normalized to [-1.0, 1.0]
    fn get_channel_outputs(&self) -> [f32; 3];

    /// Mute or unmute a voice (0-2)
    fn set_channel_mute(&mut self, channel: usize, mute: bool);

    /// Check if a voice is muted
    fn is_channel_muted(&self, channel: usize) -> bool;
}
