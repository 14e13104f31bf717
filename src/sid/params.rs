//! Parameter Store
//!
//! Holds the latest committed register snapshot together with the constants
//! derived from the sample rate. Controllers send sparse [`ParameterUpdate`]s;
//! absent fields keep their previous value.
//!
//! The wire form is a flat JSON object with `sampleRate`, per-voice `fq1..3`,
//! `pw1..3`, `wg1..3`, `ad1..3`, `sr1..3` and the global `cutL`, `cutH`,
//! `res`, `typeVol` keys.
//! Unknown keys are ignored and `null` means "unchanged".

use serde::{Deserialize, Serialize};

use super::constants::{
    ENVELOPE_PERIODS, FIXED_ONE, FRAC_BITS, MIN_ENVELOPE_PERIOD, PAL_CLOCK_HZ, RATE_COUNTER_WRAP,
    VOICE_COUNT,
};
use super::filter::FilterCoefficients;
use super::registers::{ChipModel, ChipParameters};
use crate::{Result, SidError};

/// Sparse update of one voice's registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceUpdate {
    /// Frequency (16-bit)
    pub frequency: Option<u16>,
    /// Pulse width (12-bit)
    pub pulse_width: Option<u16>,
    /// Waveform + gate byte
    pub control: Option<u8>,
    /// Attack/decay byte
    pub attack_decay: Option<u8>,
    /// Sustain/release byte
    pub sustain_release: Option<u8>,
}

/// Sparse update of the filter and volume registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterUpdate {
    /// Cutoff low bits
    pub cutoff_lo: Option<u8>,
    /// Cutoff high byte
    pub cutoff_hi: Option<u8>,
    /// Resonance + routing byte
    pub resonance_routing: Option<u8>,
    /// Mode + volume byte
    pub mode_volume: Option<u8>,
}

/// Sparse parameter update delivered by a controller
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "WireUpdate", into = "WireUpdate")]
pub struct ParameterUpdate {
    /// New host sample rate (Hz)
    pub sample_rate: Option<f64>,
    /// Voice 1-3 updates
    pub voices: [VoiceUpdate; VOICE_COUNT],
    /// Filter/volume update
    pub filter: FilterUpdate,
}

impl ParameterUpdate {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON wire form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the JSON wire form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Set a voice's frequency; out-of-range voices are ignored
    pub fn with_frequency(mut self, voice: usize, frequency: u16) -> Self {
        if let Some(v) = self.voices.get_mut(voice) {
            v.frequency = Some(frequency);
        }
        self
    }

    /// Set a voice's pulse width (masked to 12 bits)
    pub fn with_pulse_width(mut self, voice: usize, pulse_width: u16) -> Self {
        if let Some(v) = self.voices.get_mut(voice) {
            v.pulse_width = Some(pulse_width & 0x0FFF);
        }
        self
    }

    /// Set a voice's waveform + gate byte
    pub fn with_control(mut self, voice: usize, control: u8) -> Self {
        if let Some(v) = self.voices.get_mut(voice) {
            v.control = Some(control);
        }
        self
    }

    /// Set a voice's attack/decay byte
    pub fn with_attack_decay(mut self, voice: usize, attack_decay: u8) -> Self {
        if let Some(v) = self.voices.get_mut(voice) {
            v.attack_decay = Some(attack_decay);
        }
        self
    }

    /// Set a voice's sustain/release byte
    pub fn with_sustain_release(mut self, voice: usize, sustain_release: u8) -> Self {
        if let Some(v) = self.voices.get_mut(voice) {
            v.sustain_release = Some(sustain_release);
        }
        self
    }

    /// Set both cutoff registers
    pub fn with_cutoff(mut self, lo: u8, hi: u8) -> Self {
        self.filter.cutoff_lo = Some(lo & 0x07);
        self.filter.cutoff_hi = Some(hi);
        self
    }

    /// Set the resonance + routing byte
    pub fn with_resonance_routing(mut self, value: u8) -> Self {
        self.filter.resonance_routing = Some(value);
        self
    }

    /// Set the mode + volume byte
    pub fn with_mode_volume(mut self, value: u8) -> Self {
        self.filter.mode_volume = Some(value);
        self
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject updates that would put the engine in an unusable state
    pub fn validate(&self) -> Result<()> {
        match self.sample_rate {
            Some(rate) if !is_valid_sample_rate(rate) => Err(SidError::InvalidSampleRate(rate)),
            _ => Ok(()),
        }
    }

    /// Fold `later` on top of this update; fields present in `later` win
    pub fn merge(&mut self, later: &ParameterUpdate) {
        merge_field(&mut self.sample_rate, later.sample_rate);
        for (voice, next) in self.voices.iter_mut().zip(later.voices.iter()) {
            merge_field(&mut voice.frequency, next.frequency);
            merge_field(&mut voice.pulse_width, next.pulse_width);
            merge_field(&mut voice.control, next.control);
            merge_field(&mut voice.attack_decay, next.attack_decay);
            merge_field(&mut voice.sustain_release, next.sustain_release);
        }
        merge_field(&mut self.filter.cutoff_lo, later.filter.cutoff_lo);
        merge_field(&mut self.filter.cutoff_hi, later.filter.cutoff_hi);
        merge_field(&mut self.filter.resonance_routing, later.filter.resonance_routing);
        merge_field(&mut self.filter.mode_volume, later.filter.mode_volume);
    }

    /// Merge the register fields into a snapshot (the sample rate is not a register)
    pub fn merge_into(&self, params: &mut ChipParameters) {
        for (regs, update) in params.voices.iter_mut().zip(self.voices.iter()) {
            if let Some(frequency) = update.frequency {
                regs.frequency = frequency;
            }
            if let Some(pulse_width) = update.pulse_width {
                regs.set_pulse_width(pulse_width);
            }
            if let Some(control) = update.control {
                regs.control = control;
            }
            if let Some(attack_decay) = update.attack_decay {
                regs.attack_decay = attack_decay;
            }
            if let Some(sustain_release) = update.sustain_release {
                regs.sustain_release = sustain_release;
            }
        }
        let filter = &mut params.filter;
        if let Some(lo) = self.filter.cutoff_lo {
            filter.set_cutoff_lo(lo);
        }
        if let Some(hi) = self.filter.cutoff_hi {
            filter.cutoff_hi = hi;
        }
        if let Some(value) = self.filter.resonance_routing {
            filter.resonance_routing = value;
        }
        if let Some(value) = self.filter.mode_volume {
            filter.mode_volume = value;
        }
    }

    fn touches_filter_curve(&self) -> bool {
        self.sample_rate.is_some()
            || self.filter.cutoff_lo.is_some()
            || self.filter.cutoff_hi.is_some()
            || self.filter.resonance_routing.is_some()
    }
}

fn merge_field<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// True for finite, strictly positive sample rates
pub fn is_valid_sample_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Flat JSON representation of [`ParameterUpdate`]
///
/// Values arrive as JSON numbers; they are truncated to integers and masked to
/// the register width rather than rejected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct WireUpdate {
    #[serde(rename = "sampleRate", default, skip_serializing_if = "Option::is_none")]
    sample_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fq1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pw1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wg1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ad1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sr1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fq2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pw2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wg2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ad2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sr2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fq3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pw3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wg3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ad3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sr3: Option<f64>,
    #[serde(rename = "cutL", default, skip_serializing_if = "Option::is_none")]
    cut_lo: Option<f64>,
    #[serde(rename = "cutH", default, skip_serializing_if = "Option::is_none")]
    cut_hi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    res: Option<f64>,
    #[serde(rename = "typeVol", default, skip_serializing_if = "Option::is_none")]
    type_vol: Option<f64>,
}

/// Truncate a JSON number to an integer register value and mask it
fn masked(value: Option<f64>, mask: u32) -> Option<u32> {
    // `as i64` saturates and maps NaN to 0; negatives wrap through two's complement.
    value.map(|v| (v as i64 as u32) & mask)
}

fn voice_from_wire(
    fq: Option<f64>,
    pw: Option<f64>,
    wg: Option<f64>,
    ad: Option<f64>,
    sr: Option<f64>,
) -> VoiceUpdate {
    VoiceUpdate {
        frequency: masked(fq, 0xFFFF).map(|v| v as u16),
        pulse_width: masked(pw, 0x0FFF).map(|v| v as u16),
        control: masked(wg, 0xFF).map(|v| v as u8),
        attack_decay: masked(ad, 0xFF).map(|v| v as u8),
        sustain_release: masked(sr, 0xFF).map(|v| v as u8),
    }
}

impl From<WireUpdate> for ParameterUpdate {
    fn from(w: WireUpdate) -> Self {
        ParameterUpdate {
            sample_rate: w.sample_rate,
            voices: [
                voice_from_wire(w.fq1, w.pw1, w.wg1, w.ad1, w.sr1),
                voice_from_wire(w.fq2, w.pw2, w.wg2, w.ad2, w.sr2),
                voice_from_wire(w.fq3, w.pw3, w.wg3, w.ad3, w.sr3),
            ],
            filter: FilterUpdate {
                cutoff_lo: masked(w.cut_lo, 0x07).map(|v| v as u8),
                cutoff_hi: masked(w.cut_hi, 0xFF).map(|v| v as u8),
                resonance_routing: masked(w.res, 0xFF).map(|v| v as u8),
                mode_volume: masked(w.type_vol, 0xFF).map(|v| v as u8),
            },
        }
    }
}

impl From<ParameterUpdate> for WireUpdate {
    fn from(u: ParameterUpdate) -> Self {
        let [v1, v2, v3] = u.voices;
        let f = |v: Option<u16>| v.map(f64::from);
        let b = |v: Option<u8>| v.map(f64::from);
        WireUpdate {
            sample_rate: u.sample_rate,
            fq1: f(v1.frequency),
            pw1: f(v1.pulse_width),
            wg1: b(v1.control),
            ad1: b(v1.attack_decay),
            sr1: b(v1.sustain_release),
            fq2: f(v2.frequency),
            pw2: f(v2.pulse_width),
            wg2: b(v2.control),
            ad2: b(v2.attack_decay),
            sr2: b(v2.sustain_release),
            fq3: f(v3.frequency),
            pw3: f(v3.pulse_width),
            wg3: b(v3.control),
            ad3: b(v3.attack_decay),
            sr3: b(v3.sustain_release),
            cut_lo: b(u.filter.cutoff_lo),
            cut_hi: b(u.filter.cutoff_hi),
            res: b(u.filter.resonance_routing),
            type_vol: b(u.filter.mode_volume),
        }
    }
}

/// Constants derived from the chip clock and host sample rate
///
/// Pure function of `(clock_hz, sample_rate)`: recomputing for the same pair
/// yields bit-identical values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedConstants {
    /// Host sample rate (Hz)
    pub sample_rate: f64,
    /// Chip cycles per output sample, 16.16 fixed point
    pub clock_ratio: u64,
    /// 8580 cutoff exponent scale
    pub cutoff_ratio_8580: f64,
    /// 6581 cutoff exponent scale
    pub cutoff_ratio_6581: f64,
    /// Envelope rate periods, 16.16 fixed point chip cycles
    pub envelope_periods: [u64; 16],
    /// Envelope counter step per rate period
    pub envelope_steps: [u8; 16],
}

impl DerivedConstants {
    /// Derive constants for a clock/sample-rate pair
    ///
    /// Fails for non-positive rates and for rates so low that one sample
    /// spans a full rate-counter period (about 30 Hz at the PAL clock).
    pub fn new(clock_hz: u32, sample_rate: f64) -> Result<Self> {
        if !is_valid_sample_rate(sample_rate) {
            return Err(SidError::InvalidSampleRate(sample_rate));
        }
        let ratio = (clock_hz as f64 / sample_rate) * FIXED_ONE as f64;
        if ratio.round() >= RATE_COUNTER_WRAP as f64 {
            return Err(SidError::InvalidSampleRate(sample_rate));
        }
        let clock_ratio = ratio.round() as u64;

        let mut envelope_periods = ENVELOPE_PERIODS.map(|p| (p as u64) << FRAC_BITS);
        let shortest = clock_ratio.max((MIN_ENVELOPE_PERIOD as u64) << FRAC_BITS);
        envelope_periods[0] = shortest;

        // The shortest period cannot fire more than once per sample, so the
        // counter takes proportionally larger steps instead.
        let mut envelope_steps = [1u8; 16];
        let fast_step = shortest.div_ceil((MIN_ENVELOPE_PERIOD as u64) << FRAC_BITS);
        envelope_steps[0] = fast_step.min(u8::MAX as u64) as u8;

        Ok(DerivedConstants {
            sample_rate,
            clock_ratio,
            cutoff_ratio_8580: -2.0 * std::f64::consts::PI * (12_500.0 / 256.0) / sample_rate,
            cutoff_ratio_6581: -2.0 * std::f64::consts::PI * (20_000.0 / 256.0) / sample_rate,
            envelope_periods,
            envelope_steps,
        })
    }

    /// Chip cycles per output sample as a float
    pub fn clock_ratio_f64(&self) -> f64 {
        self.clock_ratio as f64 / FIXED_ONE as f64
    }
}

/// Latest committed register snapshot plus derived constants
#[derive(Debug, Clone)]
pub struct ParameterStore {
    clock_hz: u32,
    model: ChipModel,
    params: ChipParameters,
    constants: DerivedConstants,
    filter_coefficients: FilterCoefficients,
}

impl ParameterStore {
    /// Create a store for the given clock, chip model and sample rate
    pub fn new(clock_hz: u32, model: ChipModel, sample_rate: f64) -> Result<Self> {
        if clock_hz == 0 {
            return Err(SidError::ConfigError("chip clock must be non-zero".into()));
        }
        let constants = DerivedConstants::new(clock_hz, sample_rate)?;
        let params = ChipParameters::new();
        let filter_coefficients = FilterCoefficients::new(&params.filter, model, &constants);
        Ok(ParameterStore {
            clock_hz,
            model,
            params,
            constants,
            filter_coefficients,
        })
    }

    /// PAL clock, 8580 model
    pub fn with_sample_rate(sample_rate: f64) -> Result<Self> {
        Self::new(PAL_CLOCK_HZ, ChipModel::default(), sample_rate)
    }

    /// Merge a sparse update into the snapshot.
    ///
    /// An invalid `sample_rate` is skipped (the rest of the update still
    /// applies); controllers are expected to call [`ParameterUpdate::validate`]
    /// before sending.
    pub fn apply(&mut self, update: &ParameterUpdate) {
        update.merge_into(&mut self.params);
        if let Some(rate) = update.sample_rate {
            if let Ok(constants) = DerivedConstants::new(self.clock_hz, rate) {
                self.constants = constants;
            }
        }
        if update.touches_filter_curve() {
            self.refresh_filter();
        }
    }

    /// Replace the whole register snapshot
    pub fn load(&mut self, params: &ChipParameters) {
        self.params = *params;
        self.refresh_filter();
    }

    /// Write a raw chip register ($00-$18)
    pub fn write_register(&mut self, addr: u8, value: u8) {
        self.params.write_register(addr, value);
        if (0x15..=0x17).contains(&addr) {
            self.refresh_filter();
        }
    }

    /// Change the sample rate, recomputing every derived constant
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        self.constants = DerivedConstants::new(self.clock_hz, sample_rate)?;
        self.refresh_filter();
        Ok(())
    }

    /// Switch the emulated chip revision
    pub fn set_model(&mut self, model: ChipModel) {
        self.model = model;
        self.refresh_filter();
    }

    /// Clear all registers, keeping clock, model and sample rate
    pub fn clear(&mut self) {
        self.load(&ChipParameters::new());
    }

    fn refresh_filter(&mut self) {
        self.filter_coefficients =
            FilterCoefficients::new(&self.params.filter, self.model, &self.constants);
    }

    /// Current register snapshot
    pub fn snapshot(&self) -> &ChipParameters {
        &self.params
    }

    /// Current derived constants
    pub fn constants(&self) -> &DerivedConstants {
        &self.constants
    }

    /// Filter coefficients for the current snapshot
    pub fn filter_coefficients(&self) -> FilterCoefficients {
        self.filter_coefficients
    }

    /// Emulated chip revision
    pub fn model(&self) -> ChipModel {
        self.model
    }

    /// Chip clock (Hz)
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Host sample rate (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.constants.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_update_maps_named_fields() {
        let json = r#"{"fq1": 17034, "wg1": 17, "sr3": 240, "cutH": 255, "typeVol": 31}"#;
        let update = ParameterUpdate::from_json(json).unwrap();
        assert_eq!(update.voices[0].frequency, Some(17034));
        assert_eq!(update.voices[0].control, Some(0x11));
        assert_eq!(update.voices[2].sustain_release, Some(0xF0));
        assert_eq!(update.filter.cutoff_hi, Some(0xFF));
        assert_eq!(update.filter.mode_volume, Some(0x1F));
        assert_eq!(update.voices[1], VoiceUpdate::default());
        assert!(update.sample_rate.is_none());
    }

    #[test]
    fn test_json_null_and_unknown_keys_ignored() {
        let update = ParameterUpdate::from_json(r#"{"fq2": null, "bogus": 12, "res": 7}"#).unwrap();
        assert_eq!(update.voices[1].frequency, None);
        assert_eq!(update.filter.resonance_routing, Some(7));
    }

    #[test]
    fn test_json_values_masked_not_rejected() {
        let json = r#"{"pw1": 65535, "wg1": 511, "cutL": 255, "fq1": -1, "ad1": 3.9}"#;
        let update = ParameterUpdate::from_json(json).unwrap();
        assert_eq!(update.voices[0].pulse_width, Some(0x0FFF));
        assert_eq!(update.voices[0].control, Some(0xFF));
        assert_eq!(update.filter.cutoff_lo, Some(0x07));
        assert_eq!(update.voices[0].frequency, Some(0xFFFF));
        assert_eq!(update.voices[0].attack_decay, Some(3));
    }

    #[test]
    fn test_json_round_trip_keeps_present_fields() {
        let update = ParameterUpdate::new()
            .with_sample_rate(48_000.0)
            .with_frequency(1, 0x1234)
            .with_mode_volume(0x0F);
        let json = update.to_json().unwrap();
        assert!(json.contains("\"sampleRate\":48000"));
        assert!(!json.contains("fq1"));
        assert_eq!(ParameterUpdate::from_json(&json).unwrap(), update);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            ParameterUpdate::from_json("{fq1: 3"),
            Err(SidError::InvalidUpdate(_))
        ));
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut store = ParameterStore::with_sample_rate(44_100.0).unwrap();
        store.apply(&ParameterUpdate::new().with_frequency(0, 1000).with_control(0, 0x11));
        store.apply(&ParameterUpdate::new().with_attack_decay(0, 0x22));
        let voice = store.snapshot().voices[0];
        assert_eq!(voice.frequency, 1000);
        assert_eq!(voice.control, 0x11);
        assert_eq!(voice.attack_decay, 0x22);
    }

    #[test]
    fn test_sample_rate_change_keeps_registers() {
        let mut store = ParameterStore::with_sample_rate(44_100.0).unwrap();
        store.apply(&ParameterUpdate::new().with_frequency(2, 777));
        let before = *store.constants();
        store.apply(&ParameterUpdate::new().with_sample_rate(96_000.0));
        assert_eq!(store.snapshot().voices[2].frequency, 777);
        assert!(store.constants().clock_ratio < before.clock_ratio);
        assert_eq!(store.sample_rate(), 96_000.0);
    }

    #[test]
    fn test_invalid_sample_rate_rejected() {
        assert!(matches!(
            ParameterStore::with_sample_rate(0.0),
            Err(SidError::InvalidSampleRate(_))
        ));
        assert!(ParameterStore::with_sample_rate(-44_100.0).is_err());
        assert!(ParameterStore::with_sample_rate(f64::NAN).is_err());
        assert!(ParameterUpdate::new().with_sample_rate(0.0).validate().is_err());

        let mut store = ParameterStore::with_sample_rate(44_100.0).unwrap();
        store.apply(&ParameterUpdate::new().with_sample_rate(-1.0).with_frequency(0, 5));
        assert_eq!(store.sample_rate(), 44_100.0);
        assert_eq!(store.snapshot().voices[0].frequency, 5);
    }

    #[test]
    fn test_sample_rate_below_rate_counter_period_rejected() {
        assert!(matches!(
            DerivedConstants::new(PAL_CLOCK_HZ, 1e-4),
            Err(SidError::InvalidSampleRate(_))
        ));
        assert!(DerivedConstants::new(PAL_CLOCK_HZ, 30.0).is_err());

        let lowest = DerivedConstants::new(PAL_CLOCK_HZ, 31.0).unwrap();
        assert!(lowest.clock_ratio < RATE_COUNTER_WRAP);
        assert_eq!(lowest.envelope_steps[0], u8::MAX);

        let mut store = ParameterStore::with_sample_rate(44_100.0).unwrap();
        store.apply(&ParameterUpdate::new().with_sample_rate(1e-4));
        assert_eq!(store.sample_rate(), 44_100.0);
    }

    #[test]
    fn test_derived_constants_at_44100() {
        let c = DerivedConstants::new(PAL_CLOCK_HZ, 44_100.0).unwrap();
        let ratio = c.clock_ratio_f64();
        assert!((ratio - 985_248.0 / 44_100.0).abs() < 1e-4);
        // shortest period is the clock ratio itself, fired every sample
        assert_eq!(c.envelope_periods[0], c.clock_ratio);
        assert_eq!(c.envelope_steps[0], 3);
        assert_eq!(c.envelope_steps[1], 1);
        assert_eq!(c.envelope_periods[15], 31_251 << FRAC_BITS);
    }

    #[test]
    fn test_shortest_period_floor_at_high_rates() {
        let c = DerivedConstants::new(PAL_CLOCK_HZ, 192_000.0).unwrap();
        assert_eq!(c.envelope_periods[0], 9 << FRAC_BITS);
        assert_eq!(c.envelope_steps[0], 1);
    }

    #[test]
    fn test_merge_later_fields_win() {
        let mut first = ParameterUpdate::new().with_frequency(0, 1).with_control(0, 0x10);
        first.merge(&ParameterUpdate::new().with_frequency(0, 2));
        assert_eq!(first.voices[0].frequency, Some(2));
        assert_eq!(first.voices[0].control, Some(0x10));
    }

    #[test]
    fn test_register_write_refreshes_filter() {
        let mut store = ParameterStore::with_sample_rate(44_100.0).unwrap();
        let before = store.filter_coefficients();
        store.write_register(0x16, 0xFF);
        assert!(store.filter_coefficients().cutoff > before.cutoff);
    }
}
