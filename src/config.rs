//! Engine configuration
//!
//! Chip clock, chip revision, optional initial sample rate and the control
//! plumbing sizes. Loadable from JSON so hosts can keep presets on disk.

use serde::{Deserialize, Serialize};

use crate::sid::constants::{NTSC_CLOCK_HZ, PAL_CLOCK_HZ};
use crate::sid::params::DerivedConstants;
use crate::sid::ChipModel;
use crate::{Result, SidError};

/// Default frame marker rate (PAL vertical blank)
pub const DEFAULT_FRAME_RATE: f64 = 50.0;

/// Default control queue depth
pub const DEFAULT_CONTROL_QUEUE_CAPACITY: usize = 256;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SidConfig {
    /// Chip clock in Hz
    pub clock_hz: u32,
    /// Emulated chip revision
    pub model: ChipModel,
    /// Host sample rate; `None` defers initialization to the first
    /// `sampleRate` control update
    pub sample_rate: Option<f64>,
    /// Frame marker rate in Hz
    pub frame_rate: f64,
    /// Pending control updates before senders see `QueueFull`
    pub control_queue_capacity: usize,
}

impl SidConfig {
    /// PAL C64 timing (985 248 Hz clock, 50 Hz frames)
    pub fn pal() -> Self {
        SidConfig {
            clock_hz: PAL_CLOCK_HZ,
            model: ChipModel::default(),
            sample_rate: None,
            frame_rate: DEFAULT_FRAME_RATE,
            control_queue_capacity: DEFAULT_CONTROL_QUEUE_CAPACITY,
        }
    }

    /// NTSC C64 timing (1 022 727 Hz clock, 60 Hz frames)
    pub fn ntsc() -> Self {
        SidConfig {
            clock_hz: NTSC_CLOCK_HZ,
            frame_rate: 60.0,
            ..Self::pal()
        }
    }

    /// Set the initial sample rate
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Set the chip revision
    pub fn with_model(mut self, model: ChipModel) -> Self {
        self.model = model;
        self
    }

    /// Parse a JSON configuration; absent fields take PAL defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SidConfig = serde_json::from_str(json)
            .map_err(|e| SidError::ConfigError(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field before the engine is built
    pub fn validate(&self) -> Result<()> {
        if self.clock_hz == 0 {
            return Err(SidError::ConfigError("chip clock must be non-zero".into()));
        }
        if let Some(rate) = self.sample_rate {
            DerivedConstants::new(self.clock_hz, rate)?;
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(SidError::ConfigError(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.control_queue_capacity == 0 {
            return Err(SidError::ConfigError(
                "control queue capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SidConfig {
    fn default() -> Self {
        Self::pal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pal_8580() {
        let config = SidConfig::default();
        assert_eq!(config.clock_hz, 985_248);
        assert_eq!(config.model, ChipModel::Mos8580);
        assert_eq!(config.sample_rate, None);
        assert_eq!(config.frame_rate, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ntsc_timing() {
        let config = SidConfig::ntsc();
        assert_eq!(config.clock_hz, 1_022_727);
        assert_eq!(config.frame_rate, 60.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            SidConfig::pal().with_sample_rate(0.0).validate(),
            Err(SidError::InvalidSampleRate(_))
        ));
        assert!(SidConfig::pal().with_sample_rate(1e-4).validate().is_err());
        let no_clock = SidConfig {
            clock_hz: 0,
            ..SidConfig::pal()
        };
        assert!(no_clock.validate().is_err());
        let no_frames = SidConfig {
            frame_rate: 0.0,
            ..SidConfig::pal()
        };
        assert!(no_frames.validate().is_err());
        let no_queue = SidConfig {
            control_queue_capacity: 0,
            ..SidConfig::pal()
        };
        assert!(no_queue.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = SidConfig::from_json(r#"{"model": "6581", "sampleRate": 48000}"#).unwrap();
        assert_eq!(config.model, ChipModel::Mos6581);
        assert_eq!(config.sample_rate, Some(48_000.0));
        assert_eq!(config.clock_hz, PAL_CLOCK_HZ);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            SidConfig::from_json("not json"),
            Err(SidError::ConfigError(_))
        ));
        assert!(matches!(
            SidConfig::from_json(r#"{"sampleRate": -1}"#),
            Err(SidError::InvalidSampleRate(_))
        ));
    }
}
