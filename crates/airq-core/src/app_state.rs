//! Last known readings and their quality levels.
//!
//! [`MonitorState`] is owned by the control loop and updated in place each
//! tick. Failed reads never clear a value: the screens keep showing the last
//! good reading. The two decoders differ in how a failure shows up in the
//! levels:
//!
//! - DHT11: both temperature and humidity levels become
//!   [`QualityLevel::Error`].
//! - SDS018: the levels are recomputed from the retained values, so the
//!   failure is invisible on screen.

use log::{debug, warn};

use crate::config::MonitorConfig;
use crate::metrics::{OverallQuality, QualityLevel};
use crate::sensors::{EnvironmentReading, ParticulateReading, RawGasSample, SensorError};

/// Per-channel quality levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLevels {
    pub temperature: QualityLevel,
    pub humidity: QualityLevel,
    pub gas: QualityLevel,
    pub pm25: QualityLevel,
    pub pm10: QualityLevel,
}

impl ChannelLevels {
    /// Levels in aggregation order: temperature, humidity, gas, PM2.5, PM10.
    pub const fn as_array(&self) -> [QualityLevel; 5] {
        [
            self.temperature,
            self.humidity,
            self.gas,
            self.pm25,
            self.pm10,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorState {
    pub environment: EnvironmentReading,
    pub particulate: ParticulateReading,
    pub gas: RawGasSample,
    pub levels: ChannelLevels,
    pub overall: OverallQuality,
}

impl MonitorState {
    /// Start from the configured readings with every level Good.
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            environment: config.initial_environment,
            particulate: config.initial_particulate,
            gas: RawGasSample::default(),
            levels: ChannelLevels::default(),
            overall: OverallQuality::default(),
        }
    }

    pub fn record_gas(&mut self, sample: RawGasSample) {
        self.gas = sample;
        self.levels.gas = QualityLevel::from_gas(sample);
    }

    pub fn record_environment(&mut self, result: Result<EnvironmentReading, SensorError>) {
        match result {
            Ok(reading) => {
                self.environment = reading;
                self.levels.temperature = QualityLevel::from_value(reading.temperature as i32);
                self.levels.humidity = QualityLevel::from_value(reading.humidity as i32);
            }
            Err(e) => {
                warn!("Keeping last environment reading: {}", e);
                self.levels.temperature = QualityLevel::Error;
                self.levels.humidity = QualityLevel::Error;
            }
        }
    }

    pub fn record_particulate(&mut self, result: Result<ParticulateReading, SensorError>) {
        match result {
            Ok(reading) => self.particulate = reading,
            Err(e) => debug!("Keeping last particulate reading: {}", e),
        }

        self.levels.pm25 = QualityLevel::from_value(self.particulate.pm25() as i32);
        self.levels.pm10 = QualityLevel::from_value(self.particulate.pm10() as i32);
    }

    /// Fold the current levels into the overall rating.
    pub fn update_overall(&mut self) -> OverallQuality {
        self.overall = OverallQuality::aggregate(self.levels.as_array());
        self.overall
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}
