//! Combined Waveform Tables
//!
//! Selecting more than one waveform connects the generators' output bit-lines
//! together; neighbouring bits pull each other towards their level and the DAC
//! switches only above a threshold. Each combination is modelled as a 4096-entry
//! table (12-bit oscillator index to 16-bit output) built once per process.

use std::sync::OnceLock;

use super::registers::ChipModel;

/// Number of entries per table (12-bit index)
pub const TABLE_SIZE: usize = 4096;

/// Waveform combinations resolved by table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinedWaveform {
    /// Triangle + sawtooth
    TriSaw,
    /// Pulse + sawtooth (also pulse + triangle)
    PulseSaw,
    /// Pulse + triangle + sawtooth
    PulseTriSaw,
}

impl CombinedWaveform {
    /// Bit-line interaction parameters: (bit multiplier, neighbour falloff, DAC threshold)
    fn shape(self) -> (f64, f64, f64) {
        match self {
            CombinedWaveform::TriSaw => (0.8, 2.4, 0.64),
            CombinedWaveform::PulseSaw => (1.4, 1.9, 0.68),
            CombinedWaveform::PulseTriSaw => (0.8, 2.5, 0.64),
        }
    }
}

/// The three combined-waveform tables
pub struct CombinedTables {
    tri_saw: [u16; TABLE_SIZE],
    pulse_saw: [u16; TABLE_SIZE],
    pulse_tri_saw: [u16; TABLE_SIZE],
}

impl CombinedTables {
    fn new() -> Self {
        CombinedTables {
            tri_saw: build_table(CombinedWaveform::TriSaw),
            pulse_saw: build_table(CombinedWaveform::PulseSaw),
            pulse_tri_saw: build_table(CombinedWaveform::PulseTriSaw),
        }
    }

    /// Look up a combined output.
    ///
    /// When `halved_on_6581` is set and the 6581 is emulated, only the low
    /// 11 index bits reach the table.
    pub fn lookup(
        &self,
        wave: CombinedWaveform,
        index: u32,
        model: ChipModel,
        halved_on_6581: bool,
    ) -> u16 {
        let mut index = index as usize & (TABLE_SIZE - 1);
        if halved_on_6581 && model == ChipModel::Mos6581 {
            index &= 0x7FF;
        }
        self.table(wave)[index]
    }

    /// Raw table for a combination
    pub fn table(&self, wave: CombinedWaveform) -> &[u16; TABLE_SIZE] {
        match wave {
            CombinedWaveform::TriSaw => &self.tri_saw,
            CombinedWaveform::PulseSaw => &self.pulse_saw,
            CombinedWaveform::PulseTriSaw => &self.pulse_tri_saw,
        }
    }
}

fn build_table(wave: CombinedWaveform) -> [u16; TABLE_SIZE] {
    let (bit_mul, bit_strength, threshold) = wave.shape();
    let mut table = [0u16; TABLE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut value = 0u16;
        for j in 0..12i32 {
            let mut bit_level = 0.0;
            for k in 0..12i32 {
                let bit = ((i >> k) & 1) as f64 - 0.5;
                bit_level += bit_mul / bit_strength.powi((k - j).abs()) * bit;
            }
            if bit_level >= threshold {
                value |= 1 << j;
            }
        }
        *entry = value * 12;
    }
    table
}

static COMBINED_TABLES: OnceLock<CombinedTables> = OnceLock::new();

/// Shared tables, built on first use
pub fn combined_tables() -> &'static CombinedTables {
    COMBINED_TABLES.get_or_init(CombinedTables::new)
}
