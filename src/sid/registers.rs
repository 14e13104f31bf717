//! SID Register Definitions
//!
//! Typed view of the chip's 25 writable registers ($00-$18): three voice
//! blocks of seven registers followed by the four filter/volume registers.
//! Every field is masked to its hardware width at the write site.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::constants::{REGISTER_COUNT, VOICE_COUNT};

/// Emulated chip revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChipModel {
    /// First NMOS revision (C64 breadbin)
    #[serde(rename = "6581")]
    Mos6581,
    /// HMOS-II revision (C64C)
    #[default]
    #[serde(rename = "8580")]
    Mos8580,
}

impl fmt::Display for ChipModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipModel::Mos6581 => write!(f, "MOS 6581"),
            ChipModel::Mos8580 => write!(f, "MOS 8580"),
        }
    }
}

bitflags! {
    /// Voice control register ($04/$0B/$12) bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlFlags: u8 {
        /// Envelope gate (note on)
        const GATE = 0x01;
        /// Hard sync to the source voice
        const SYNC = 0x02;
        /// Ring-modulate triangle with the source voice
        const RING = 0x04;
        /// Hold the oscillator at zero
        const TEST = 0x08;
        /// Triangle waveform
        const TRIANGLE = 0x10;
        /// Sawtooth waveform
        const SAWTOOTH = 0x20;
        /// Pulse waveform
        const PULSE = 0x40;
        /// Noise waveform
        const NOISE = 0x80;
        /// All waveform-select bits
        const WAVEFORMS = 0xF0;
    }
}

impl ControlFlags {
    /// Create control flags from a raw register value
    pub fn from_register(value: u8) -> Self {
        ControlFlags::from_bits_truncate(value)
    }

    /// Waveform-select bits only
    pub fn waveform(self) -> Self {
        self & ControlFlags::WAVEFORMS
    }

    /// True when the gate bit is set
    pub fn gate(self) -> bool {
        self.contains(ControlFlags::GATE)
    }

    /// True when the test bit is set
    pub fn test(self) -> bool {
        self.contains(ControlFlags::TEST)
    }
}

bitflags! {
    /// Filter mode / volume register ($18) upper-nibble bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FilterMode: u8 {
        /// Low-pass output enabled
        const LOWPASS = 0x10;
        /// Band-pass output enabled
        const BANDPASS = 0x20;
        /// High-pass output enabled
        const HIGHPASS = 0x40;
        /// Voice 3 disconnected from the direct output
        const VOICE3_OFF = 0x80;
    }
}

/// Registers of a single voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceRegisters {
    /// Oscillator frequency (16-bit)
    pub frequency: u16,
    /// Pulse width (12-bit)
    pub pulse_width: u16,
    /// Waveform + gate byte
    pub control: u8,
    /// Attack (high nibble) / decay (low nibble)
    pub attack_decay: u8,
    /// Sustain (high nibble) / release (low nibble)
    pub sustain_release: u8,
}

impl VoiceRegisters {
    /// Set the pulse width, keeping the low 12 bits
    pub fn set_pulse_width(&mut self, value: u16) {
        self.pulse_width = value & 0x0FFF;
    }

    /// Control register as flags
    pub fn control_flags(&self) -> ControlFlags {
        ControlFlags::from_register(self.control)
    }

    /// Attack rate nibble
    pub fn attack(&self) -> u8 {
        self.attack_decay >> 4
    }

    /// Decay rate nibble
    pub fn decay(&self) -> u8 {
        self.attack_decay & 0x0F
    }

    /// Sustain level nibble
    pub fn sustain(&self) -> u8 {
        self.sustain_release >> 4
    }

    /// Release rate nibble
    pub fn release(&self) -> u8 {
        self.sustain_release & 0x0F
    }
}

/// Shared filter and volume registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterRegisters {
    /// Cutoff low bits (3-bit)
    pub cutoff_lo: u8,
    /// Cutoff high byte
    pub cutoff_hi: u8,
    /// Resonance (high nibble) + filter routing (low nibble)
    pub resonance_routing: u8,
    /// Filter mode (high nibble) + master volume (low nibble)
    pub mode_volume: u8,
}

impl FilterRegisters {
    /// Set the cutoff low bits, keeping the low 3 bits
    pub fn set_cutoff_lo(&mut self, value: u8) {
        self.cutoff_lo = value & 0x07;
    }

    /// 11-bit cutoff register value
    pub fn cutoff(&self) -> u16 {
        ((self.cutoff_hi as u16) << 3) | (self.cutoff_lo & 0x07) as u16
    }

    /// Resonance nibble
    pub fn resonance(&self) -> u8 {
        self.resonance_routing >> 4
    }

    /// True when `voice` (0-2) is routed into the filter
    pub fn routes_voice(&self, voice: usize) -> bool {
        voice < VOICE_COUNT && self.resonance_routing & (1 << voice) != 0
    }

    /// Filter mode bits
    pub fn mode(&self) -> FilterMode {
        FilterMode::from_bits_truncate(self.mode_volume)
    }

    /// Master volume nibble
    pub fn volume(&self) -> u8 {
        self.mode_volume & 0x0F
    }
}

/// Complete register snapshot consumed by one sample tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipParameters {
    /// Voice 1-3 registers
    pub voices: [VoiceRegisters; VOICE_COUNT],
    /// Filter and volume registers
    pub filter: FilterRegisters,
}

impl ChipParameters {
    /// Create an all-zero snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw chip register ($00-$18). Other addresses are ignored.
    pub fn write_register(&mut self, addr: u8, value: u8) {
        let Some(reg) = Register::from_addr(addr) else {
            return;
        };
        match reg {
            Register::FreqLo(v) => {
                let voice = &mut self.voices[v];
                voice.frequency = (voice.frequency & 0xFF00) | value as u16;
            }
            Register::FreqHi(v) => {
                let voice = &mut self.voices[v];
                voice.frequency = (voice.frequency & 0x00FF) | ((value as u16) << 8);
            }
            Register::PwLo(v) => {
                let voice = &mut self.voices[v];
                voice.set_pulse_width((voice.pulse_width & 0x0F00) | value as u16);
            }
            Register::PwHi(v) => {
                let voice = &mut self.voices[v];
                voice.set_pulse_width(
                    (voice.pulse_width & 0x00FF) | (((value & 0x0F) as u16) << 8),
                );
            }
            Register::Control(v) => self.voices[v].control = value,
            Register::AttackDecay(v) => self.voices[v].attack_decay = value,
            Register::SustainRelease(v) => self.voices[v].sustain_release = value,
            Register::CutoffLo => self.filter.set_cutoff_lo(value),
            Register::CutoffHi => self.filter.cutoff_hi = value,
            Register::ResonanceRouting => self.filter.resonance_routing = value,
            Register::ModeVolume => self.filter.mode_volume = value,
        }
    }

    /// Read back a raw chip register ($00-$18), 0 for other addresses
    pub fn read_register(&self, addr: u8) -> u8 {
        match Register::from_addr(addr) {
            Some(Register::FreqLo(v)) => self.voices[v].frequency as u8,
            Some(Register::FreqHi(v)) => (self.voices[v].frequency >> 8) as u8,
            Some(Register::PwLo(v)) => self.voices[v].pulse_width as u8,
            Some(Register::PwHi(v)) => (self.voices[v].pulse_width >> 8) as u8,
            Some(Register::Control(v)) => self.voices[v].control,
            Some(Register::AttackDecay(v)) => self.voices[v].attack_decay,
            Some(Register::SustainRelease(v)) => self.voices[v].sustain_release,
            Some(Register::CutoffLo) => self.filter.cutoff_lo,
            Some(Register::CutoffHi) => self.filter.cutoff_hi,
            Some(Register::ResonanceRouting) => self.filter.resonance_routing,
            Some(Register::ModeVolume) => self.filter.mode_volume,
            None => 0,
        }
    }

    /// Raw register image ($00-$18)
    pub fn to_registers(&self) -> [u8; REGISTER_COUNT] {
        let mut regs = [0u8; REGISTER_COUNT];
        for (addr, r) in regs.iter_mut().enumerate() {
            *r = self.read_register(addr as u8);
        }
        regs
    }

    /// Build a snapshot from a raw register image
    pub fn from_registers(regs: &[u8; REGISTER_COUNT]) -> Self {
        let mut params = Self::new();
        for (addr, &value) in regs.iter().enumerate() {
            params.write_register(addr as u8, value);
        }
        params
    }
}

/// Writable SID register, with voice registers carrying the voice index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Frequency low byte - $00/$07/$0E
    FreqLo(usize),
    /// Frequency high byte - $01/$08/$0F
    FreqHi(usize),
    /// Pulse width low byte - $02/$09/$10
    PwLo(usize),
    /// Pulse width high nibble - $03/$0A/$11
    PwHi(usize),
    /// Control register - $04/$0B/$12
    Control(usize),
    /// Attack/decay - $05/$0C/$13
    AttackDecay(usize),
    /// Sustain/release - $06/$0D/$14
    SustainRelease(usize),
    /// Filter cutoff low bits - $15
    CutoffLo,
    /// Filter cutoff high byte - $16
    CutoffHi,
    /// Resonance + filter routing - $17
    ResonanceRouting,
    /// Filter mode + volume - $18
    ModeVolume,
}

impl Register {
    /// Convert a raw register address to a Register, `None` past $18
    pub fn from_addr(addr: u8) -> Option<Self> {
        let addr = addr as usize;
        if addr < 7 * VOICE_COUNT {
            let voice = addr / 7;
            return Some(match addr % 7 {
                0 => Register::FreqLo(voice),
                1 => Register::FreqHi(voice),
                2 => Register::PwLo(voice),
                3 => Register::PwHi(voice),
                4 => Register::Control(voice),
                5 => Register::AttackDecay(voice),
                _ => Register::SustainRelease(voice),
            });
        }
        match addr {
            0x15 => Some(Register::CutoffLo),
            0x16 => Some(Register::CutoffHi),
            0x17 => Some(Register::ResonanceRouting),
            0x18 => Some(Register::ModeVolume),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::FreqLo(v) => write!(f, "Voice {} Frequency Low", v + 1),
            Register::FreqHi(v) => write!(f, "Voice {} Frequency High", v + 1),
            Register::PwLo(v) => write!(f, "Voice {} Pulse Width Low", v + 1),
            Register::PwHi(v) => write!(f, "Voice {} Pulse Width High", v + 1),
            Register::Control(v) => write!(f, "Voice {} Control", v + 1),
            Register::AttackDecay(v) => write!(f, "Voice {} Attack/Decay", v + 1),
            Register::SustainRelease(v) => write!(f, "Voice {} Sustain/Release", v + 1),
            Register::CutoffLo => write!(f, "Filter Cutoff Low"),
            Register::CutoffHi => write!(f, "Filter Cutoff High"),
            Register::ResonanceRouting => write!(f, "Resonance/Routing"),
            Register::ModeVolume => write!(f, "Mode/Volume"),
        }
    }
}
