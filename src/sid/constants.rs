//! SID Hardware Constants
//!
//! Clocks, register bit masks and the fixed lookup tables shared by the
//! envelope generator, oscillators and output stage.

/// C64 PAL system clock (Hz)
pub const PAL_CLOCK_HZ: u32 = 985_248;

/// C64 NTSC system clock (Hz)
pub const NTSC_CLOCK_HZ: u32 = 1_022_727;

/// Number of voices on the chip
pub const VOICE_COUNT: usize = 3;

/// Writable registers ($00-$18)
pub const REGISTER_COUNT: usize = 25;

/// Read-only voice 3 oscillator register
pub const OSC3_ADDR: u8 = 0x1B;

/// Read-only voice 3 envelope register
pub const ENV3_ADDR: u8 = 0x1C;

/// Fractional bits used by the fixed-point clock ratio, phase accumulator and
/// envelope rate counter.
pub const FRAC_BITS: u32 = 16;

/// One chip cycle in fixed-point units.
pub const FIXED_ONE: u64 = 1 << FRAC_BITS;

/// Phase accumulator width (integer part).
pub const ACCUMULATOR_BITS: u32 = 24;

/// Mask of the 24-bit integer phase.
pub const ACCUMULATOR_MASK: u32 = 0x00FF_FFFF;

/// Mask of the fixed-point accumulator (24 integer + 16 fractional bits).
pub const ACCUMULATOR_FIXED_MASK: u64 = (1 << (ACCUMULATOR_BITS + FRAC_BITS)) - 1;

/// Accumulator MSB, used for sync/ring-modulation edges and triangle folding.
pub const ACCUMULATOR_MSB: u32 = 0x0080_0000;

/// Accumulator bit whose toggle clocks the noise LFSR.
pub const NOISE_CLOCK_BIT: u32 = 0x0010_0000;

/// Envelope rate counter wraps at this many chip cycles.
pub const RATE_COUNTER_WRAP: u64 = 0x8000 << FRAC_BITS;

/// Meaningful bits of the noise shift register.
pub const NOISE_LFSR_MASK: u32 = 0x007F_FFFF;

/// Noise LFSR power-on value.
pub const NOISE_LFSR_SEED: u32 = 0x007F_FFF8;

/// Waveform output midpoint; voice outputs are centred around this value.
pub const WAVEFORM_MIDPOINT: f64 = 32_768.0;

/// Output normalization: full-scale voice swing × voice count × max volume.
pub const OUTPUT_SCALE: f64 = 65_536.0 * VOICE_COUNT as f64 * 16.0;

/// Envelope rate periods in chip cycles, indexed by a 4-bit rate nibble.
///
/// Entry 0 is a placeholder: the shortest period depends on the sample rate
/// (see [`crate::sid::params::DerivedConstants`]).
pub const ENVELOPE_PERIODS: [u32; 16] = [
    9, 32, 63, 95, 149, 220, 267, 313, 392, 977, 1954, 3126, 3907, 11720, 19532, 31251,
];

/// Floor of the shortest envelope period in chip cycles.
pub const MIN_ENVELOPE_PERIOD: u32 = 9;

/// Run-length seed for the exponential decay prescaler: (run length, divider).
///
/// Runs are laid out from envelope level 0 upward; the final run fills the
/// remainder of the table.
const EXP_PRESCALER_RUNS: [(usize, u8); 7] = [
    (1, 1),
    (6, 30),
    (8, 16),
    (12, 8),
    (28, 4),
    (39, 2),
    (162, 1),
];

const fn build_exp_prescaler() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut start = 0;
    let mut run = 0;
    while run < EXP_PRESCALER_RUNS.len() {
        let (len, divider) = EXP_PRESCALER_RUNS[run];
        let mut i = start;
        while i < 256 {
            table[i] = divider;
            i += 1;
        }
        start += len;
        run += 1;
    }
    table
}

/// Decay/release prescaler indexed by the current envelope level.
///
/// Outside attack the envelope only steps once the exponential counter
/// reaches this divider, which slows the discharge as the level approaches
/// zero.
pub const EXP_PRESCALER: [u8; 256] = build_exp_prescaler();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_prescaler_breakpoints() {
        assert_eq!(EXP_PRESCALER[0], 1);
        assert_eq!(EXP_PRESCALER[1], 30);
        assert_eq!(EXP_PRESCALER[6], 30);
        assert_eq!(EXP_PRESCALER[7], 16);
        assert_eq!(EXP_PRESCALER[14], 16);
        assert_eq!(EXP_PRESCALER[15], 8);
        assert_eq!(EXP_PRESCALER[26], 8);
        assert_eq!(EXP_PRESCALER[27], 4);
        assert_eq!(EXP_PRESCALER[54], 4);
        assert_eq!(EXP_PRESCALER[55], 2);
        assert_eq!(EXP_PRESCALER[93], 2);
        assert_eq!(EXP_PRESCALER[94], 1);
        assert_eq!(EXP_PRESCALER[255], 1);
    }

    #[test]
    fn test_exp_prescaler_never_zero() {
        assert!(EXP_PRESCALER.iter().all(|&d| d > 0));
    }

    #[test]
    fn test_envelope_periods_monotonic() {
        for i in 1..ENVELOPE_PERIODS.len() {
            assert!(ENVELOPE_PERIODS[i] > ENVELOPE_PERIODS[i - 1]);
        }
        assert!(ENVELOPE_PERIODS[15] < 0x8000);
    }

    #[test]
    fn test_output_scale() {
        assert_eq!(OUTPUT_SCALE, 3_145_728.0);
    }
}
