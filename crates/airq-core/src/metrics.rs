//! Metrics and quality assessment for sensor data
//!
//! This module provides quality level assessment and thresholds for
//! determining environmental quality based on sensor readings, and the
//! score aggregation that folds the five channels into one overall rating.

use crate::sensors::RawGasSample;

/// Readings below this are [`QualityLevel::Good`].
const VALUE_GOOD_BELOW: i32 = 30;
/// Readings below this (and not good) are [`QualityLevel::Normal`].
const VALUE_NORMAL_BELOW: i32 = 60;

const GAS_GOOD_BELOW: u16 = 200;
const GAS_NORMAL_BELOW: u16 = 400;

/// Number of channels folded into the overall rating.
pub const CHANNEL_COUNT: usize = 5;

/// Quality level assessment for one sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityLevel {
    #[default]
    Good,
    Normal,
    Bad,
    /// The channel could not be read. Only the DHT11 channels report this.
    Error,
}

impl QualityLevel {
    /// Classify a whole-unit reading (temperature, humidity, particulates).
    ///
    /// The same thresholds apply to every channel.
    pub const fn from_value(value: i32) -> Self {
        if value < VALUE_GOOD_BELOW {
            Self::Good
        } else if value < VALUE_NORMAL_BELOW {
            Self::Normal
        } else {
            Self::Bad
        }
    }

    /// Classify a raw MQ135 sample.
    pub const fn from_gas(sample: RawGasSample) -> Self {
        let raw = sample.value();
        if raw < GAS_GOOD_BELOW {
            Self::Good
        } else if raw < GAS_NORMAL_BELOW {
            Self::Normal
        } else {
            Self::Bad
        }
    }

    /// Numeric score used for aggregation. Errors weigh the same as Bad.
    pub const fn score(self) -> u8 {
        match self {
            Self::Good => 0,
            Self::Normal => 1,
            Self::Bad | Self::Error => 2,
        }
    }

    /// Get the display label for this quality level
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Normal => "NORMAL",
            Self::Bad => "BAD",
            Self::Error => "ERR",
        }
    }
}

/// Combined rating across all channels. Never carries an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverallQuality {
    #[default]
    Good,
    Normal,
    Bad,
}

impl OverallQuality {
    /// Average the channel scores and map the result back to a level.
    ///
    /// The average truncates, so a mix leans toward the milder rating:
    /// scores `[0, 1, 2, 2, 2]` average to 1, not 2.
    pub fn aggregate(levels: [QualityLevel; CHANNEL_COUNT]) -> Self {
        let sum: u32 = levels.iter().map(|level| level.score() as u32).sum();
        Self::from_score(sum / CHANNEL_COUNT as u32)
    }

    pub const fn from_score(score: u32) -> Self {
        match score {
            0 => Self::Good,
            1 => Self::Normal,
            _ => Self::Bad,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Normal => "NORMAL",
            Self::Bad => "BAD",
        }
    }
}
