//! SID Envelope Generator
//!
//! ADSR envelope driven by a 15-bit rate counter. Each sample the counter
//! advances by the chip-cycles-per-sample ratio; when it crosses the period of
//! the active rate nibble the 8-bit envelope counter steps once. Outside the
//! attack phase an exponential prescaler (indexed by the current level)
//! additionally divides the step rate, giving the chip's characteristic
//! piecewise-exponential decay and release curves.
//!
//! Known hardware quirks reproduced here:
//! - a rising gate whose new release nibble is higher than the previous one
//!   skips the rate check for that sample
//! - reaching zero during decay/release latches the counter at zero until
//!   the next gate-on

use bitflags::bitflags;

use super::constants::{EXP_PRESCALER, RATE_COUNTER_WRAP};
use super::params::DerivedConstants;
use super::registers::VoiceRegisters;

bitflags! {
    /// Envelope state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EnvelopeFlags: u8 {
        /// Gate seen on the previous sample
        const GATE = 0x01;
        /// Counter latched at zero
        const HOLD_ZERO = 0x10;
        /// Decaying towards / holding at the sustain level
        const DECAY_SUSTAIN = 0x40;
        /// Rising towards 255
        const ATTACK = 0x80;
    }
}

/// Envelope phase selecting which rate nibble is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    /// Gate on, rising at the attack rate
    Attack,
    /// Gate on, falling to and holding at the sustain level
    DecaySustain,
    /// Gate off, falling at the release rate
    Release,
}

/// Per-voice ADSR state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvelopeGenerator {
    flags: EnvelopeFlags,
    counter: u8,
    /// Chip cycles since the last step, 15.16 fixed point
    rate_counter: u64,
    exp_counter: u8,
    prev_sustain_release: u8,
}

impl EnvelopeGenerator {
    /// Create a silent envelope in release
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by one output sample and return the envelope level
    pub fn clock(&mut self, regs: &VoiceRegisters, constants: &DerivedConstants) -> u8 {
        let gate = regs.control_flags().gate();
        let mut skip_rate_check = false;

        if gate != self.flags.contains(EnvelopeFlags::GATE) {
            if gate {
                self.flags =
                    EnvelopeFlags::GATE | EnvelopeFlags::ATTACK | EnvelopeFlags::DECAY_SUSTAIN;
                skip_rate_check = regs.release() > self.prev_sustain_release & 0x0F;
            } else {
                self.flags.remove(
                    EnvelopeFlags::GATE | EnvelopeFlags::ATTACK | EnvelopeFlags::DECAY_SUSTAIN,
                );
            }
        }
        self.prev_sustain_release = regs.sustain_release;

        self.rate_counter = (self.rate_counter + constants.clock_ratio) % RATE_COUNTER_WRAP;

        let rate = match self.phase() {
            EnvelopePhase::Attack => regs.attack(),
            EnvelopePhase::DecaySustain => regs.decay(),
            EnvelopePhase::Release => regs.release(),
        } as usize;
        let period = constants.envelope_periods[rate];
        let step = constants.envelope_steps[rate] as i16;

        // Fires only in the sample where the counter crosses the period.
        if !skip_rate_check
            && self.rate_counter >= period
            && self.rate_counter < period + constants.clock_ratio
        {
            self.rate_counter -= period;
            let attacking = self.flags.contains(EnvelopeFlags::ATTACK);
            if attacking || self.advance_prescaler() {
                if !self.flags.contains(EnvelopeFlags::HOLD_ZERO) {
                    if attacking {
                        self.step_attack(step);
                    } else if !self.flags.contains(EnvelopeFlags::DECAY_SUSTAIN)
                        || self.counter > regs.sustain() * 0x11
                    {
                        self.step_down(step);
                    }
                }
                self.exp_counter = 0;
            }
        }

        self.counter
    }

    fn advance_prescaler(&mut self) -> bool {
        self.exp_counter = self.exp_counter.wrapping_add(1);
        self.exp_counter == EXP_PRESCALER[self.counter as usize]
    }

    fn step_attack(&mut self, step: i16) {
        let next = self.counter as i16 + step;
        if next >= 0xFF {
            self.counter = 0xFF;
            self.flags.remove(EnvelopeFlags::ATTACK);
        } else {
            self.counter = next as u8;
        }
    }

    fn step_down(&mut self, step: i16) {
        let next = self.counter as i16 - step;
        if next <= 0 {
            if self.counter != 0 {
                self.flags.insert(EnvelopeFlags::HOLD_ZERO);
            }
            self.counter = 0;
        } else {
            self.counter = next as u8;
        }
    }

    /// Active phase
    pub fn phase(&self) -> EnvelopePhase {
        if self.flags.contains(EnvelopeFlags::ATTACK) {
            EnvelopePhase::Attack
        } else if self.flags.contains(EnvelopeFlags::DECAY_SUSTAIN) {
            EnvelopePhase::DecaySustain
        } else {
            EnvelopePhase::Release
        }
    }

    /// Current envelope level (0-255)
    pub fn level(&self) -> u8 {
        self.counter
    }

    /// Current state bits
    pub fn flags(&self) -> EnvelopeFlags {
        self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid::constants::PAL_CLOCK_HZ;

    fn constants() -> DerivedConstants {
        DerivedConstants::new(PAL_CLOCK_HZ, 44_100.0).unwrap()
    }

    fn voice(control: u8, attack_decay: u8, sustain_release: u8) -> VoiceRegisters {
        VoiceRegisters {
            control,
            attack_decay,
            sustain_release,
            ..Default::default()
        }
    }

    fn run(env: &mut EnvelopeGenerator, regs: &VoiceRegisters, c: &DerivedConstants, n: usize) {
        for _ in 0..n {
            env.clock(regs, c);
        }
    }

    #[test]
    fn test_starts_silent_in_release() {
        let env = EnvelopeGenerator::new();
        assert_eq!(env.level(), 0);
        assert_eq!(env.phase(), EnvelopePhase::Release);
    }

    #[test]
    fn test_gate_on_enters_attack() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        env.clock(&voice(0x01, 0x00, 0x00), &c);
        assert_eq!(env.phase(), EnvelopePhase::Attack);
        assert!(env.flags().contains(EnvelopeFlags::GATE));
    }

    #[test]
    fn test_fastest_attack_reaches_full_then_decays_to_sustain() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        // attack 0, decay 1, sustain 8
        let regs = voice(0x01, 0x01, 0x80);
        run(&mut env, &regs, &c, 200);
        assert_eq!(env.phase(), EnvelopePhase::DecaySustain);
        run(&mut env, &regs, &c, 20_000);
        assert_eq!(env.level(), 0x88);
    }

    #[test]
    fn test_sustain_holds_while_gated() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        let regs = voice(0x01, 0x00, 0xF0);
        run(&mut env, &regs, &c, 2_000);
        assert_eq!(env.level(), 0xFF);
        run(&mut env, &regs, &c, 2_000);
        assert_eq!(env.level(), 0xFF);
    }

    #[test]
    fn test_release_reaches_zero_and_latches() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        run(&mut env, &voice(0x01, 0x00, 0xF0), &c, 1_000);
        assert_eq!(env.level(), 0xFF);

        let released = voice(0x00, 0x00, 0xF0);
        run(&mut env, &released, &c, 50_000);
        assert_eq!(env.level(), 0);
        assert!(env.flags().contains(EnvelopeFlags::HOLD_ZERO));
        run(&mut env, &released, &c, 5_000);
        assert_eq!(env.level(), 0);
    }

    #[test]
    fn test_regate_clears_hold_zero() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        run(&mut env, &voice(0x01, 0x00, 0x00), &c, 1_000);
        run(&mut env, &voice(0x00, 0x00, 0x00), &c, 50_000);
        assert!(env.flags().contains(EnvelopeFlags::HOLD_ZERO));
        run(&mut env, &voice(0x01, 0x00, 0x00), &c, 100);
        assert!(!env.flags().contains(EnvelopeFlags::HOLD_ZERO));
        assert!(env.level() > 0);
    }

    #[test]
    fn test_slowest_attack_is_slow() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        let regs = voice(0x01, 0xF0, 0xF0);
        // one step every 31251 cycles, about 1.4 samples per cycle ratio 22.3
        run(&mut env, &regs, &c, 44_100);
        let level = env.level();
        assert!(level > 20 && level < 40, "level after 1s: {level}");
        assert_eq!(env.phase(), EnvelopePhase::Attack);
    }

    #[test]
    fn test_ungated_power_on_stays_silent() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        let regs = voice(0x00, 0x00, 0x00);
        for _ in 0..1_000 {
            assert_eq!(env.clock(&regs, &c), 0);
        }
        assert!(!env.flags().contains(EnvelopeFlags::HOLD_ZERO));
    }

    #[test]
    fn test_release_skip_on_higher_release_nibble() {
        let c = constants();
        let mut env = EnvelopeGenerator::new();
        assert!(env.clock(&voice(0x01, 0x00, 0x00), &c) > 0);

        // previous release nibble 0, new gate with release 5: the skipped
        // check lets the rate counter overrun the period and wrap first
        let mut env = EnvelopeGenerator::new();
        let regs = voice(0x01, 0x00, 0xF5);
        let first_step = (1..=4_000).find(|_| env.clock(&regs, &c) > 0);
        let first_step = first_step.unwrap();
        assert!(first_step > 1_400, "first step at sample {first_step}");

        // sustain 15 holds the attacked level
        run(&mut env, &regs, &c, 1_000);
        assert_eq!(env.level(), 0xFF);
        assert_eq!(env.phase(), EnvelopePhase::DecaySustain);
    }
}
