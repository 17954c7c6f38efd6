//! Shared layout and timing constants for the screens
//!
//! Positions are in 6x8 character cells: column 0..21, row 0..8.

/// Ticks spent on the cat animation.
pub const ANIMATION_TICKS: u8 = 3;
/// Ticks spent on the temperature/humidity/gas values.
pub const ENVIRONMENT_VALUES_TICKS: u8 = 5;
/// Ticks spent on the temperature/humidity/gas levels.
pub const ENVIRONMENT_LEVELS_TICKS: u8 = 2;
/// Ticks spent on the particulate values.
pub const PARTICULATE_VALUES_TICKS: u8 = 5;
/// Ticks spent on the particulate levels.
pub const PARTICULATE_LEVELS_TICKS: u8 = 2;

/// Column where environment values and levels start.
pub const ENVIRONMENT_FIELD_COLUMN: u8 = 14;
/// Cells blanked before an environment field is rewritten.
pub const ENVIRONMENT_FIELD_WIDTH: usize = 8;

pub const TEMPERATURE_ROW: u8 = 2;
pub const HUMIDITY_ROW: u8 = 4;
pub const GAS_LEVEL_ROW: u8 = 6;
pub const GAS_RAW_ROW: u8 = 7;

/// Column where particulate values and levels start.
pub const PARTICULATE_FIELD_COLUMN: u8 = 8;
/// Cells blanked before a particulate field is rewritten.
pub const PARTICULATE_FIELD_WIDTH: usize = 11;

pub const PM25_ROW: u8 = 2;
pub const PM10_ROW: u8 = 6;

/// Where the animation caption starts.
pub const CAPTION_COLUMN: u8 = 2;
pub const CAPTION_ROW: u8 = 7;
