//! SDS018 particulate sensor frame parser
//!
//! The SDS018 streams a 10-byte report once per second at 9600 baud:
//!
//! | Byte | Meaning          |
//! |------|------------------|
//! | 0    | head `0xAA`      |
//! | 1    | command `0xC0`   |
//! | 2-3  | PM2.5 x10, LE    |
//! | 4-5  | PM10 x10, LE     |
//! | 6-7  | device id        |
//! | 8    | checksum         |
//! | 9    | tail `0xAB`      |
//!
//! The checksum is the 8-bit sum of bytes 2..=7.

use embedded_io::Read;
use log::{debug, error, warn};

use super::{Sensor, SensorError, checksum};

const SENSOR: &str = "SDS018";

pub const FRAME_HEAD: u8 = 0xAA;
pub const DATA_COMMAND: u8 = 0xC0;
pub const FRAME_TAIL: u8 = 0xAB;

/// Bytes between the command byte and the checksum.
const PAYLOAD_LEN: usize = 6;

/// Particulate concentrations in tenths of ug/m3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticulateReading {
    pub pm25_tenths: u16,
    pub pm10_tenths: u16,
}

impl ParticulateReading {
    pub const fn new(pm25_tenths: u16, pm10_tenths: u16) -> Self {
        Self {
            pm25_tenths,
            pm10_tenths,
        }
    }

    /// PM2.5 in whole ug/m3, truncated.
    pub const fn pm25(&self) -> u16 {
        self.pm25_tenths / 10
    }

    /// PM10 in whole ug/m3, truncated.
    pub const fn pm10(&self) -> u16 {
        self.pm10_tenths / 10
    }

    /// Validate the trailing checksum and tail bytes and decode the payload.
    ///
    /// The tail is checked first: a frame with a bad tail is rejected even if
    /// its checksum happens to match.
    pub fn from_payload(
        payload: &[u8; PAYLOAD_LEN],
        received_checksum: u8,
        tail: u8,
    ) -> Result<Self, SensorError> {
        if tail != FRAME_TAIL {
            return Err(SensorError::Frame {
                sensor: SENSOR,
                details: "bad tail byte",
            });
        }

        let computed = checksum(payload);
        if computed != received_checksum {
            return Err(SensorError::Checksum {
                sensor: SENSOR,
                computed,
                received: received_checksum,
            });
        }

        Ok(Self {
            pm25_tenths: u16::from_le_bytes([payload[0], payload[1]]),
            pm10_tenths: u16::from_le_bytes([payload[2], payload[3]]),
        })
    }
}

/// SDS018 reader over any blocking byte source.
pub struct Sds018<S> {
    serial: S,
}

impl<S> Sds018<S>
where
    S: Read,
{
    pub fn new(serial: S) -> Self {
        Self { serial }
    }

    pub fn release(self) -> S {
        self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Read and validate one data frame.
    ///
    /// Scans forward to the next head byte, then requires the data command
    /// immediately after it. A wrong command ends the call without looking for
    /// another head; the next call starts scanning fresh.
    pub fn read_frame(&mut self) -> Result<ParticulateReading, SensorError> {
        self.sync_to_head()?;

        let command = self.receive()?;
        if command != DATA_COMMAND {
            warn!("SDS018 unexpected command byte {:#04x}", command);
            return Err(SensorError::Frame {
                sensor: SENSOR,
                details: "not a data frame",
            });
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        for byte in payload.iter_mut() {
            *byte = self.receive()?;
        }
        let received_checksum = self.receive()?;
        let tail = self.receive()?;

        let reading = ParticulateReading::from_payload(&payload, received_checksum, tail)
            .inspect_err(|e| warn!("SDS018 frame rejected: {}", e))?;

        debug!(
            "SDS018: PM2.5 {} PM10 {} (tenths)",
            reading.pm25_tenths, reading.pm10_tenths
        );
        Ok(reading)
    }

    fn sync_to_head(&mut self) -> Result<(), SensorError> {
        let mut skipped: u32 = 0;
        while self.receive()? != FRAME_HEAD {
            skipped += 1;
        }
        if skipped > 0 {
            debug!("SDS018 skipped {} bytes before frame head", skipped);
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<u8, SensorError> {
        let mut byte = [0u8; 1];
        self.serial.read_exact(&mut byte).map_err(|e| {
            error!("SDS018 serial receive failed: {:?}", e);
            SensorError::Serial { sensor: SENSOR }
        })?;
        Ok(byte[0])
    }
}

impl<S> Sensor for Sds018<S>
where
    S: Read,
{
    type Readings = ParticulateReading;

    fn read(&mut self) -> Result<ParticulateReading, SensorError> {
        self.read_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptedSerial;

    const SAMPLE_FRAME: [u8; 10] = [0xAA, 0xC0, 0x0A, 0x00, 0x14, 0x00, 0x01, 0x02, 0x21, 0xAB];

    #[test]
    fn decodes_reference_frame() {
        let mut sds = Sds018::new(ScriptedSerial::from_bytes(&SAMPLE_FRAME));

        let reading = sds.read().unwrap();

        assert_eq!(reading, ParticulateReading::new(10, 20));
        assert_eq!(reading.pm25(), 1);
        assert_eq!(reading.pm10(), 2);
    }

    #[test]
    fn flipped_checksum_is_rejected() {
        let mut frame = SAMPLE_FRAME;
        frame[8] = !frame[8];
        let mut sds = Sds018::new(ScriptedSerial::from_bytes(&frame));

        let err = sds.read().unwrap_err();

        assert!(err.is_checksum());
        assert_eq!(
            err,
            SensorError::Checksum {
                sensor: "SDS018",
                computed: 0x21,
                received: 0xDE,
            }
        );
    }

    #[test]
    fn resynchronizes_past_leading_garbage() {
        let mut bytes = [0u8; 14];
        bytes[..4].copy_from_slice(&[0x13, 0xAB, 0xC0, 0x00]);
        bytes[4..].copy_from_slice(&SAMPLE_FRAME);
        let mut sds = Sds018::new(ScriptedSerial::from_bytes(&bytes));

        assert_eq!(sds.read().unwrap(), ParticulateReading::new(10, 20));
    }

    #[test]
    fn little_endian_pairs_cover_full_range() {
        let payload = [0x34, 0x12, 0xFF, 0xFF, 0x00, 0x00];
        let sum = checksum(&payload);

        let reading = ParticulateReading::from_payload(&payload, sum, FRAME_TAIL).unwrap();

        assert_eq!(reading, ParticulateReading::new(0x1234, 0xFFFF));
    }

    #[test]
    fn wrong_command_fails_without_rescanning() {
        // A bad command byte followed by a complete valid frame: the first call
        // must fail, the second must find the valid frame.
        let mut bytes = [0u8; 12];
        bytes[..2].copy_from_slice(&[0xAA, 0xC5]);
        bytes[2..].copy_from_slice(&SAMPLE_FRAME);
        let mut sds = Sds018::new(ScriptedSerial::from_bytes(&bytes));

        assert_eq!(
            sds.read().unwrap_err(),
            SensorError::Frame {
                sensor: "SDS018",
                details: "not a data frame",
            }
        );
        assert_eq!(sds.release().remaining(), SAMPLE_FRAME.len());
    }

    #[test]
    fn second_call_restarts_scanning_after_failure() {
        let mut bytes = [0u8; 12];
        bytes[..2].copy_from_slice(&[0xAA, 0xC5]);
        bytes[2..].copy_from_slice(&SAMPLE_FRAME);
        let mut sds = Sds018::new(ScriptedSerial::from_bytes(&bytes));

        assert!(sds.read().is_err());
        assert_eq!(sds.read().unwrap(), ParticulateReading::new(10, 20));
    }

    #[test]
    fn bad_tail_fails_for_any_checksum() {
        let payloads = [[0x0A, 0x00, 0x14, 0x00, 0x01, 0x02], [0xFF; 6], [0; 6]];

        for payload in payloads {
            let valid = checksum(&payload);
            for tail in [0x00, 0xAA, 0xAC, 0xFF] {
                for received in [valid, valid.wrapping_add(1)] {
                    let err = ParticulateReading::from_payload(&payload, received, tail)
                        .unwrap_err();
                    assert_eq!(
                        err,
                        SensorError::Frame {
                            sensor: "SDS018",
                            details: "bad tail byte",
                        }
                    );
                }
            }
        }
    }

    #[test]
    fn exhausted_stream_reports_serial_error() {
        let mut sds = Sds018::new(ScriptedSerial::from_bytes(&SAMPLE_FRAME[..6]));

        assert_eq!(
            sds.read().unwrap_err(),
            SensorError::Serial { sensor: "SDS018" }
        );
    }
}
