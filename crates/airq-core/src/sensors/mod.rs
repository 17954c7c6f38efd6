pub mod dht11;
pub mod mq135;
pub mod sds018;

use thiserror_no_std::Error;

pub use dht11::{DataLine, Dht11, EnvironmentReading, OpenDrainLine};
pub use mq135::{AnalogInput, Mq135, RawGasSample};
pub use sds018::{ParticulateReading, Sds018};

/// Errors reported by the sensor drivers.
///
/// Every variant is local to one read: the control loop decides what to do
/// with the channel and tries again on a later tick.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: timed out waiting for {stage}")]
    Timeout {
        sensor: &'static str,
        stage: &'static str,
    },
    #[error("{sensor}: checksum mismatch (computed {computed}, received {received})")]
    Checksum {
        sensor: &'static str,
        computed: u8,
        received: u8,
    },
    #[error("{sensor}: malformed frame ({details})")]
    Frame {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: data line error during {operation}")]
    Line {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: serial receive failed")]
    Serial { sensor: &'static str },
}

impl SensorError {
    /// Whether the error came from a failed integrity check.
    pub const fn is_checksum(&self) -> bool {
        matches!(self, Self::Checksum { .. })
    }

    /// Whether the error came from a missed timing deadline.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Trait for sensors that produce typed readings.
///
/// Reads are blocking: the control loop is single threaded and a sensor owns
/// its bus for the whole transaction.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings;

    /// Put the sensor bus in its idle state. Called once before the first read.
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Read the sensor and return typed readings.
    fn read(&mut self) -> Result<Self::Readings, SensorError>;
}

/// Sum of `bytes` truncated to 8 bits, the checksum used by both the DHT11 and
/// the SDS018.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_wraps_to_eight_bits() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x0A, 0x00, 0x14, 0x00, 0x01, 0x02]), 0x21);
        assert_eq!(checksum(&[0xFF, 0x01]), 0x00);
        assert_eq!(checksum(&[200, 100, 50, 10]), ((200 + 100 + 50 + 10) % 256) as u8);
    }

    #[test]
    fn checksum_matches_modular_sum_for_every_byte_value() {
        for a in 0..=255u8 {
            let payload = [a, 0x80, a.wrapping_mul(3), 0x7F];
            let expected = payload.iter().map(|b| *b as u32).sum::<u32>() % 256;
            assert_eq!(checksum(&payload) as u32, expected);
        }
    }

    #[test]
    fn error_kind_helpers() {
        let timeout = SensorError::Timeout {
            sensor: "DHT11",
            stage: "ack low",
        };
        let crc = SensorError::Checksum {
            sensor: "DHT11",
            computed: 1,
            received: 2,
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_checksum());
        assert!(crc.is_checksum());
    }
}
