//! SID Voice Oscillator
//!
//! 24-bit phase accumulator feeding the waveform selector. The accumulator is
//! kept in 24.16 fixed point so that the fractional chip-cycles-per-sample
//! ratio accumulates without drift.
//!
//! Waveform priority when several bits are set: noise, then pulse (plain or
//! combined), then sawtooth (plain or combined with triangle), then triangle.
//! The plain pulse and sawtooth are band-limited by smoothing their edges over
//! the per-sample phase increment.

use super::constants::{
    ACCUMULATOR_FIXED_MASK, ACCUMULATOR_MASK, ACCUMULATOR_MSB, FRAC_BITS, NOISE_CLOCK_BIT,
    NOISE_LFSR_MASK, NOISE_LFSR_SEED,
};
use super::registers::{ChipModel, ControlFlags, VoiceRegisters};
use super::waveforms::{CombinedTables, CombinedWaveform};

/// Phase edge information a voice exposes to the voice it modulates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSource {
    /// Accumulator MSB rose during the source's latest tick
    pub msb_rising: bool,
    /// Accumulator MSB after the source's latest tick (0 or 0x800000)
    pub msb: u32,
}

/// Per-voice oscillator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOscillator {
    /// Phase, 24.16 fixed point
    accumulator: u64,
    prev_phase: u32,
    msb_rising: bool,
    noise_lfsr: u32,
    prev_output: u16,
}

impl Default for VoiceOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceOscillator {
    /// Power-on oscillator with a seeded noise register
    pub fn new() -> Self {
        VoiceOscillator {
            accumulator: 0,
            prev_phase: 0,
            msb_rising: false,
            noise_lfsr: NOISE_LFSR_SEED,
            prev_output: 0,
        }
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Integer 24-bit phase
    pub fn phase(&self) -> u32 {
        (self.accumulator >> FRAC_BITS) as u32 & ACCUMULATOR_MASK
    }

    /// Noise shift register contents (23 bits)
    pub fn noise_register(&self) -> u32 {
        self.noise_lfsr
    }

    /// Last waveform output
    pub fn output(&self) -> u16 {
        self.prev_output
    }

    /// Edge information for the voice this one modulates
    pub fn sync_source(&self) -> SyncSource {
        SyncSource {
            msb_rising: self.msb_rising,
            msb: self.phase() & ACCUMULATOR_MSB,
        }
    }

    /// Advance by one output sample and return the 16-bit waveform output
    ///
    /// `step_ratio` is the chip-cycles-per-sample ratio in 16.16 fixed point.
    pub fn clock(
        &mut self,
        regs: &VoiceRegisters,
        step_ratio: u64,
        source: SyncSource,
        model: ChipModel,
        tables: &CombinedTables,
    ) -> u16 {
        let ctrl = regs.control_flags();
        let increment = regs.frequency as u64 * step_ratio;

        if ctrl.test() || (ctrl.contains(ControlFlags::SYNC) && source.msb_rising) {
            self.accumulator = 0;
        } else {
            self.accumulator = (self.accumulator + increment) & ACCUMULATOR_FIXED_MASK;
        }
        let phase = self.phase();
        self.msb_rising = phase & ACCUMULATOR_MSB > self.prev_phase & ACCUMULATOR_MSB;

        let wave = ctrl.waveform();
        let output = if wave.is_empty() {
            // floating DAC: keep the last level
            self.prev_output
        } else {
            let out = self.waveform(ctrl, regs, phase, increment, source, model, tables);
            self.prev_output = out;
            out
        };

        self.prev_phase = phase;
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn waveform(
        &mut self,
        ctrl: ControlFlags,
        regs: &VoiceRegisters,
        phase: u32,
        increment: u64,
        source: SyncSource,
        model: ChipModel,
        tables: &CombinedTables,
    ) -> u16 {
        let wave = ctrl.waveform();
        if wave.contains(ControlFlags::NOISE) {
            self.noise(ctrl, phase, increment)
        } else if wave.contains(ControlFlags::PULSE) {
            pulse(ctrl, regs, phase, increment, source, model, tables)
        } else if wave.contains(ControlFlags::SAWTOOTH) {
            sawtooth(ctrl, phase, increment, model, tables)
        } else {
            triangle(ctrl, phase, source)
        }
    }

    fn noise(&mut self, ctrl: ControlFlags, phase: u32, increment: u64) -> u16 {
        let toggled = (phase ^ self.prev_phase) & NOISE_CLOCK_BIT != 0;
        // Above this rate the clock bit toggles more than once per sample.
        let saturated = increment >> FRAC_BITS >= NOISE_CLOCK_BIT as u64;
        if toggled || saturated {
            let lfsr = self.noise_lfsr;
            let feedback = ((lfsr >> 22) ^ (lfsr >> 17)) & 1 != 0;
            self.noise_lfsr = ((lfsr << 1) | (feedback || ctrl.test()) as u32) & NOISE_LFSR_MASK;
        }

        // Noise mixed with any other waveform locks up to zero on the chip.
        let others = ControlFlags::TRIANGLE | ControlFlags::SAWTOOTH | ControlFlags::PULSE;
        if ctrl.intersects(others) {
            return 0;
        }
        let t = self.noise_lfsr;
        (((t & 0x10_0000) >> 5)
            | ((t & 0x4_0000) >> 4)
            | ((t & 0x4000) >> 1)
            | ((t & 0x800) << 1)
            | ((t & 0x200) << 2)
            | ((t & 0x20) << 5)
            | ((t & 0x04) << 7)
            | ((t & 0x01) << 8)) as u16
    }
}

/// Phase XORed with the ring source's MSB when ring modulation is on
fn ring_phase(ctrl: ControlFlags, phase: u32, source: SyncSource) -> u32 {
    if ctrl.contains(ControlFlags::RING) {
        phase ^ source.msb
    } else {
        phase
    }
}

/// Fold a 24-bit phase into a rising-then-falling ramp
fn fold(phase: u32) -> u32 {
    if phase & ACCUMULATOR_MSB != 0 {
        phase ^ ACCUMULATOR_MASK
    } else {
        phase
    }
}

fn triangle(ctrl: ControlFlags, phase: u32, source: SyncSource) -> u16 {
    (fold(ring_phase(ctrl, phase, source)) >> 7) as u16
}

fn sawtooth(
    ctrl: ControlFlags,
    phase: u32,
    increment: u64,
    model: ChipModel,
    tables: &CombinedTables,
) -> u16 {
    let ramp = phase >> 8;
    if ctrl.contains(ControlFlags::TRIANGLE) {
        return tables.lookup(CombinedWaveform::TriSaw, ramp >> 4, model, true);
    }

    // Steepen the ramp by the phase increment and fold the overshoot back
    // down so the reset edge spans one sample.
    let slope = increment as f64 / (1u64 << FRAC_BITS) as f64 / 0x120_0000 as f64;
    let mut out = ramp as f64;
    out += out * slope;
    if out > 65_535.0 {
        out = 65_535.0 - (out - 65_536.0) / slope;
    }
    out as u16
}

fn pulse(
    ctrl: ControlFlags,
    regs: &VoiceRegisters,
    phase: u32,
    increment: u64,
    source: SyncSource,
    model: ChipModel,
    tables: &CombinedTables,
) -> u16 {
    let cycles = increment >> FRAC_BITS;

    // Keep the pulse at least one sample wide on each side.
    let mut width = regs.pulse_width as u32 * 16;
    let min_width = (cycles >> 9) as u32;
    if width > 0 && width < min_width {
        width = min_width;
    }
    let max_width = min_width ^ 0xFFFF;
    if width > max_width {
        width = max_width;
    }
    let position = phase >> 8;
    let wave = ctrl.waveform();

    if wave == ControlFlags::PULSE {
        if ctrl.test() {
            return 0xFFFF;
        }
        return band_limited_pulse(position, width, cycles >> 16);
    }

    let high = position >= width || ctrl.test();
    if !high {
        return 0;
    }
    if wave.contains(ControlFlags::TRIANGLE) {
        if wave.contains(ControlFlags::SAWTOOTH) {
            tables.lookup(CombinedWaveform::PulseTriSaw, position >> 4, model, true)
        } else {
            let folded = fold(ring_phase(ctrl, phase, source)) >> 11;
            tables.lookup(CombinedWaveform::PulseSaw, folded, model, false)
        }
    } else if wave.contains(ControlFlags::SAWTOOTH) {
        tables.lookup(CombinedWaveform::PulseSaw, position >> 4, model, true)
    } else {
        0xFFFF
    }
}

/// Pulse whose edges ramp over the samples a transition spans.
///
/// `edge_cycles` is the phase increment in units of 65536 cycles; zero means
/// the edge is shorter than a sample and the output is a hard pulse.
fn band_limited_pulse(position: u32, width: u32, edge_cycles: u64) -> u16 {
    if edge_cycles == 0 {
        return if position < width { 0 } else { 0xFFFF };
    }
    let slope = 256.0 / edge_cycles as f64;
    let position = position as f64;
    let width = width as f64;

    if position < width {
        let limit = ((65_535.0 - width) * slope).min(65_535.0);
        (limit - (width - position) * slope).max(0.0) as u16
    } else {
        let limit = (width * slope).min(65_535.0);
        let out = (65_535.0 - position) * slope - limit;
        if out >= 0.0 {
            0xFFFF
        } else {
            (out as i64 & 0xFFFF) as u16
        }
    }
}
