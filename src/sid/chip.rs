//! SID engine
//!
//! Runs the three envelope/oscillator pairs in voice order, then the filter
//! and output stage, once per host sample. All state lives inline; a tick
//! neither allocates nor locks.

use super::constants::{ENV3_ADDR, OSC3_ADDR, VOICE_COUNT, WAVEFORM_MIDPOINT};
use super::envelope::EnvelopeGenerator;
use super::filter::{voice_level, FilterMixer};
use super::oscillator::VoiceOscillator;
use super::params::{DerivedConstants, ParameterStore, ParameterUpdate};
use super::registers::{ChipModel, ChipParameters};
use super::waveforms::combined_tables;
use crate::backend::SidBackend;
use crate::config::SidConfig;
use crate::frame_clock::FrameClock;
use crate::Result;

/// Voice whose accumulator drives `voice`'s hard sync and ring modulation.
///
/// Voice 1 is modulated by voice 3, voice 2 by voice 1, voice 3 by voice 2.
/// Voice 1 therefore sees voice 3's state from the previous sample.
pub const fn sync_source(voice: usize) -> usize {
    (voice + VOICE_COUNT - 1) % VOICE_COUNT
}

/// Three-voice SID engine
#[derive(Debug, Clone)]
pub struct Sid {
    store: ParameterStore,
    envelopes: [EnvelopeGenerator; VOICE_COUNT],
    oscillators: [VoiceOscillator; VOICE_COUNT],
    filter: FilterMixer,
    frame_clock: FrameClock,
    frame_boundary: bool,

    last_sample: f32,
    last_channels: [f32; VOICE_COUNT],
    user_mute: [bool; VOICE_COUNT],
}

impl Sid {
    /// Create an engine with PAL timing and the 8580 model
    pub fn new(sample_rate: f64) -> Result<Self> {
        Self::with_config(&SidConfig::default(), sample_rate)
    }

    /// Create an engine from a configuration
    pub fn with_config(config: &SidConfig, sample_rate: f64) -> Result<Self> {
        config.validate()?;
        let store = ParameterStore::new(config.clock_hz, config.model, sample_rate)?;
        Ok(Sid {
            store,
            envelopes: Default::default(),
            oscillators: Default::default(),
            filter: FilterMixer::new(),
            frame_clock: FrameClock::new(sample_rate, config.frame_rate),
            frame_boundary: false,
            last_sample: 0.0,
            last_channels: [0.0; VOICE_COUNT],
            user_mute: [false; VOICE_COUNT],
        })
    }

    /// Create an engine for a specific clock and model with 50 Hz frames
    pub fn with_clock(clock_hz: u32, model: ChipModel, sample_rate: f64) -> Result<Self> {
        let config = SidConfig {
            clock_hz,
            model,
            ..SidConfig::default()
        };
        Self::with_config(&config, sample_rate)
    }

    /// Return to the power-on state; sample rate, model and mutes are kept
    pub fn reset(&mut self) {
        self.store.clear();
        for envelope in &mut self.envelopes {
            envelope.reset();
        }
        for oscillator in &mut self.oscillators {
            oscillator.reset();
        }
        self.filter.reset();
        self.frame_clock.reset();
        self.frame_boundary = false;
        self.last_sample = 0.0;
        self.last_channels = [0.0; VOICE_COUNT];
    }

    /// Merge a sparse parameter update
    pub fn apply(&mut self, update: &ParameterUpdate) {
        self.store.apply(update);
        self.frame_clock.set_sample_rate(self.store.sample_rate());
    }

    /// Change the host sample rate; voice and filter state are kept
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        self.store.set_sample_rate(sample_rate)?;
        self.frame_clock.set_sample_rate(sample_rate);
        Ok(())
    }

    /// Switch the emulated chip revision
    pub fn set_model(&mut self, model: ChipModel) {
        self.store.set_model(model);
    }

    /// Emulated chip revision
    pub fn model(&self) -> ChipModel {
        self.store.model()
    }

    /// Write a chip register ($00-$18)
    pub fn write_register(&mut self, addr: u8, value: u8) {
        self.store.write_register(addr, value);
    }

    /// Read a chip register. $1B and $1C return voice 3's oscillator and
    /// envelope; other unmapped addresses read 0.
    pub fn read_register(&self, addr: u8) -> u8 {
        match addr {
            OSC3_ADDR => self.osc3(),
            ENV3_ADDR => self.env3(),
            _ => self.store.snapshot().read_register(addr),
        }
    }

    /// Compute the next output sample
    pub fn compute_next_sample(&mut self) -> f32 {
        self.frame_boundary = self.frame_clock.clock();

        let tables = combined_tables();
        let params = self.store.snapshot();
        let constants = self.store.constants();
        let model = self.store.model();

        let mut levels = [0.0; VOICE_COUNT];
        for voice in 0..VOICE_COUNT {
            let regs = &params.voices[voice];
            let envelope = self.envelopes[voice].clock(regs, constants);
            let source = self.oscillators[sync_source(voice)].sync_source();
            let waveform =
                self.oscillators[voice].clock(regs, constants.clock_ratio, source, model, tables);

            let level = if self.user_mute[voice] {
                0.0
            } else {
                voice_level(waveform, envelope)
            };
            levels[voice] = level;
            self.last_channels[voice] = (level / WAVEFORM_MIDPOINT) as f32;
        }

        let sample = self
            .filter
            .mix(&levels, &params.filter, self.store.filter_coefficients());
        self.last_sample = sample as f32;
        self.last_sample
    }

    /// Upper 8 bits of voice 3's waveform output
    pub fn osc3(&self) -> u8 {
        (self.oscillators[2].output() >> 8) as u8
    }

    /// Voice 3's envelope level
    pub fn env3(&self) -> u8 {
        self.envelopes[2].level()
    }

    /// Current register snapshot
    pub fn parameters(&self) -> &ChipParameters {
        self.store.snapshot()
    }

    /// Constants derived from the current sample rate
    pub fn constants(&self) -> &DerivedConstants {
        self.store.constants()
    }

    /// Host sample rate (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.store.sample_rate()
    }

    /// Envelope generator of a voice
    pub fn envelope(&self, voice: usize) -> Option<&EnvelopeGenerator> {
        self.envelopes.get(voice)
    }

    /// Oscillator of a voice
    pub fn oscillator(&self, voice: usize) -> Option<&VoiceOscillator> {
        self.oscillators.get(voice)
    }

    /// Shared filter state
    pub fn filter(&self) -> &FilterMixer {
        &self.filter
    }

    /// Frame marker clock
    pub fn frame_clock(&self) -> &FrameClock {
        &self.frame_clock
    }

    /// Per-voice levels of the last sample
    pub fn last_channels(&self) -> [f32; VOICE_COUNT] {
        self.last_channels
    }
}

impl SidBackend for Sid {
    fn new(sample_rate: f64) -> Result<Self> {
        Sid::new(sample_rate)
    }

    fn with_config(config: &SidConfig, sample_rate: f64) -> Result<Self> {
        Sid::with_config(config, sample_rate)
    }

    fn reset(&mut self) {
        Sid::reset(self)
    }

    fn apply(&mut self, update: &ParameterUpdate) {
        Sid::apply(self, update)
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        Sid::write_register(self, addr, value)
    }

    fn read_register(&self, addr: u8) -> u8 {
        Sid::read_register(self, addr)
    }

    fn clock(&mut self) {
        self.compute_next_sample();
    }

    fn get_sample(&self) -> f32 {
        self.last_sample
    }

    fn frame_boundary(&self) -> bool {
        self.frame_boundary
    }

    fn frame_count(&self) -> u64 {
        self.frame_clock.frame_count()
    }

    fn get_channel_outputs(&self) -> [f32; 3] {
        self.last_channels
    }

    fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        if let Some(m) = self.user_mute.get_mut(channel) {
            *m = mute;
        }
    }

    fn is_channel_muted(&self, channel: usize) -> bool {
        self.user_mute.get(channel).copied().unwrap_or(false)
    }
}
