//! Frame Clock
//!
//! Counts output samples and raises an advisory marker once per video frame
//! (50 Hz on PAL). Player routines that update registers once per frame can
//! key off the marker; audio output does not depend on it.

use crate::config::DEFAULT_FRAME_RATE;

/// Sample-driven frame marker generator
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    frame_rate: f64,
    /// Samples per frame at the current sample rate (fractional)
    samples_per_frame: f64,
    /// Samples since the last marker
    sample_count: u32,
    /// Markers raised since construction or reset
    frame_count: u64,
}

impl FrameClock {
    /// Create a frame clock for a sample rate and frame rate (Hz)
    pub fn new(sample_rate: f64, frame_rate: f64) -> Self {
        FrameClock {
            frame_rate,
            samples_per_frame: sample_rate / frame_rate,
            sample_count: 0,
            frame_count: 0,
        }
    }

    /// Clock by one sample
    /// Returns true when a frame boundary falls on this sample
    pub fn clock(&mut self) -> bool {
        self.sample_count += 1;
        if self.sample_count as f64 >= self.samples_per_frame {
            self.sample_count = 0;
            self.frame_count += 1;
            true
        } else {
            false
        }
    }

    /// Follow a sample rate change; the position within the frame is kept
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.samples_per_frame = sample_rate / self.frame_rate;
    }

    /// Samples since the last marker
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Markers raised so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Samples per frame at the current sample rate
    pub fn samples_per_frame(&self) -> f64 {
        self.samples_per_frame
    }

    /// Frame rate in Hz
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Reset counters
    pub fn reset(&mut self) {
        self.sample_count = 0;
        self.frame_count = 0;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(44_100.0, DEFAULT_FRAME_RATE)
    }
}
