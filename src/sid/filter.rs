//! SID Filter and Output Mixer
//!
//! Routes each voice either into the shared two-integrator state-variable
//! filter or straight to the output bus, applies the selected filter outputs
//! and scales by the master volume.

use super::constants::{OUTPUT_SCALE, VOICE_COUNT, WAVEFORM_MIDPOINT};
use super::params::DerivedConstants;
use super::registers::{ChipModel, FilterMode, FilterRegisters};

/// Per-sample filter coefficients derived from the cutoff/resonance registers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    /// Integrator gain per sample (0..1)
    pub cutoff: f64,
    /// Band-pass feedback gain
    pub resonance: f64,
}

impl FilterCoefficients {
    /// Compute coefficients for the current registers and chip model
    pub fn new(regs: &FilterRegisters, model: ChipModel, constants: &DerivedConstants) -> Self {
        let raw = (regs.cutoff_lo & 0x07) as f64 / 8.0 + regs.cutoff_hi as f64 + 0.2;
        let res = regs.resonance() as f64;
        match model {
            ChipModel::Mos8580 => FilterCoefficients {
                cutoff: 1.0 - (raw * constants.cutoff_ratio_8580).exp(),
                resonance: 2f64.powf((4.0 - res) / 8.0),
            },
            ChipModel::Mos6581 => FilterCoefficients {
                // the 6581 curve bottoms out below register value 24
                cutoff: if raw < 24.0 {
                    0.035
                } else {
                    1.0 - 1.263 * (raw * constants.cutoff_ratio_6581).exp()
                },
                resonance: if regs.resonance_routing > 0x5F {
                    8.0 / res
                } else {
                    1.41
                },
            },
        }
    }
}

/// Signed voice level fed to the mixer: waveform centred on zero, scaled by envelope
pub fn voice_level(waveform: u16, envelope: u8) -> f64 {
    (waveform as f64 - WAVEFORM_MIDPOINT) * (envelope as f64 / 256.0)
}

/// Shared filter state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterMixer {
    low_pass: f64,
    band_pass: f64,
}

impl FilterMixer {
    /// Filter with discharged integrators
    pub fn new() -> Self {
        Self::default()
    }

    /// Discharge both integrators
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mix one sample of voice levels into a normalized output value
    pub fn mix(
        &mut self,
        levels: &[f64; VOICE_COUNT],
        regs: &FilterRegisters,
        coefficients: FilterCoefficients,
    ) -> f64 {
        let mode = regs.mode();
        let mut filter_in = 0.0;
        let mut output = 0.0;

        for (voice, &level) in levels.iter().enumerate() {
            if regs.routes_voice(voice) {
                filter_in += level;
            } else if voice != 2 || !mode.contains(FilterMode::VOICE3_OFF) {
                output += level;
            }
        }

        let FilterCoefficients { cutoff, resonance } = coefficients;
        let feedback = filter_in + self.band_pass * resonance + self.low_pass;
        if mode.contains(FilterMode::HIGHPASS) {
            output -= feedback;
        }
        self.band_pass -= feedback * cutoff;
        if mode.contains(FilterMode::BANDPASS) {
            output -= self.band_pass;
        }
        self.low_pass += self.band_pass * cutoff;
        if mode.contains(FilterMode::LOWPASS) {
            output += self.low_pass;
        }

        output / OUTPUT_SCALE * regs.volume() as f64
    }

    /// Low-pass integrator state
    pub fn low_pass(&self) -> f64 {
        self.low_pass
    }

    /// Band-pass integrator state
    pub fn band_pass(&self) -> f64 {
        self.band_pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid::constants::PAL_CLOCK_HZ;
    use approx::assert_relative_eq;

    fn constants() -> DerivedConstants {
        DerivedConstants::new(PAL_CLOCK_HZ, 44_100.0).unwrap()
    }

    fn regs(cutoff_hi: u8, resonance_routing: u8, mode_volume: u8) -> FilterRegisters {
        FilterRegisters {
            cutoff_lo: 0,
            cutoff_hi,
            resonance_routing,
            mode_volume,
        }
    }

    #[test]
    fn test_voice_level_centred() {
        assert_eq!(voice_level(0x8000, 255), 0.0);
        assert_eq!(voice_level(0xFFFF, 0), 0.0);
        assert_relative_eq!(voice_level(0, 128), -16_384.0);
    }

    #[test]
    fn test_8580_cutoff_monotonic() {
        let c = constants();
        let low = FilterCoefficients::new(&regs(0x10, 0, 0), ChipModel::Mos8580, &c);
        let high = FilterCoefficients::new(&regs(0xF0, 0, 0), ChipModel::Mos8580, &c);
        assert!(high.cutoff > low.cutoff);
        assert!(high.cutoff < 1.0);
        assert_relative_eq!(low.resonance, 2f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_6581_curves() {
        let c = constants();
        let floor = FilterCoefficients::new(&regs(10, 0x50, 0), ChipModel::Mos6581, &c);
        assert_eq!(floor.cutoff, 0.035);
        assert_eq!(floor.resonance, 1.41);
        let open = FilterCoefficients::new(&regs(200, 0x80, 0), ChipModel::Mos6581, &c);
        assert!(open.cutoff > 0.035);
        assert_relative_eq!(open.resonance, 1.0);
    }

    #[test]
    fn test_unfiltered_mix_scaled_by_volume() {
        let c = constants();
        let r = regs(0, 0, 0x0F);
        let coeffs = FilterCoefficients::new(&r, ChipModel::Mos8580, &c);
        let mut mixer = FilterMixer::new();
        let out = mixer.mix(&[32_767.0, 0.0, 0.0], &r, coeffs);
        assert_relative_eq!(out, 32_767.0 / OUTPUT_SCALE * 15.0);

        let silent = regs(0, 0, 0x00);
        assert_eq!(mixer.mix(&[32_767.0, 0.0, 0.0], &silent, coeffs), 0.0);
    }

    #[test]
    fn test_voice3_off_only_affects_direct_path() {
        let c = constants();
        let muted = regs(0, 0, 0x8F);
        let coeffs = FilterCoefficients::new(&muted, ChipModel::Mos8580, &c);
        let mut mixer = FilterMixer::new();
        assert_eq!(mixer.mix(&[0.0, 0.0, 10_000.0], &muted, coeffs), 0.0);

        // routed into the filter it still reaches the low-pass output
        let routed = regs(0xFF, 0x04, 0x9F);
        let coeffs = FilterCoefficients::new(&routed, ChipModel::Mos8580, &c);
        let mut mixer = FilterMixer::new();
        let mut nonzero = false;
        for _ in 0..10 {
            if mixer.mix(&[0.0, 0.0, 10_000.0], &routed, coeffs) != 0.0 {
                nonzero = true;
            }
        }
        assert!(nonzero);
    }

    #[test]
    fn test_routed_voice_drives_integrators() {
        let c = constants();
        let r = regs(0x80, 0x01, 0x1F);
        let coeffs = FilterCoefficients::new(&r, ChipModel::Mos8580, &c);
        let mut mixer = FilterMixer::new();
        mixer.mix(&[10_000.0, 0.0, 0.0], &r, coeffs);
        assert!(mixer.band_pass() != 0.0);
        assert!(mixer.low_pass() != 0.0);
    }

    #[test]
    fn test_lowpass_settles_on_dc() {
        let c = constants();
        let r = regs(0x80, 0x01, 0x1F);
        let coeffs = FilterCoefficients::new(&r, ChipModel::Mos8580, &c);
        let mut mixer = FilterMixer::new();
        for _ in 0..20_000 {
            mixer.mix(&[10_000.0, 0.0, 0.0], &r, coeffs);
        }
        let out = mixer.mix(&[10_000.0, 0.0, 0.0], &r, coeffs);
        // the integrator loop inverts the signal
        assert_relative_eq!(mixer.low_pass(), -10_000.0, max_relative = 1e-3);
        assert_relative_eq!(out, -10_000.0 / OUTPUT_SCALE * 15.0, max_relative = 1e-3);
    }
}
