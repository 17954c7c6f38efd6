//! DHT11 temperature/humidity decoder
//!
//! The DHT11 talks over a single open-drain data line. The host pulls the
//! line low for 18 ms, releases it, and the sensor answers with a low/high
//! handshake followed by 40 bits. Every bit is a low gap followed by a high
//! pulse whose width carries the value: ~26 us for a 0, ~70 us for a 1.
//!
//! There is no hardware timer capture here. Pulse widths are measured by
//! polling the line once per microsecond through the [`DataLine`] port and a
//! [`DelayNs`] provider, which lets tests swap in a simulated clock.
//!
//! A transaction walks these phases in order and stops at the first failure:
//! `RequestLow -> ReleaseHigh -> AckLow -> AckHigh -> AckEnd ->
//! BitStart/BitEnd x 40`, then the checksum is verified.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::{debug, error, warn};

use super::{Sensor, SensorError, checksum};

const SENSOR: &str = "DHT11";

/// Host start signal: line held low for at least 18 ms.
const START_SIGNAL_LOW_MS: u32 = 18;
/// Host releases the line high for 30 us before listening.
const START_SIGNAL_HIGH_US: u32 = 30;
/// Delay between line polls.
const POLL_DELAY_US: u32 = 1;
/// Upper bound on polls for any single edge or pulse (~1 ms).
const MAX_POLLS: u16 = 1000;
/// High pulses longer than this many polls decode as a 1.
const ONE_BIT_MIN_WIDTH: u16 = 40;
/// Humidity integral, humidity decimal, temperature integral, temperature
/// decimal, checksum.
const FRAME_BYTES: usize = 5;

/// Port to the physical single-wire data line.
///
/// Implementors switch the pin direction and drive or sample the level.
/// Timing is supplied separately by a [`DelayNs`] provider.
pub trait DataLine: ErrorType {
    /// Take control of the line so the host can drive it.
    fn set_as_output(&mut self) -> Result<(), Self::Error>;

    /// Hand the line back to the sensor and listen.
    fn set_as_input(&mut self) -> Result<(), Self::Error>;

    fn drive_low(&mut self) -> Result<(), Self::Error>;

    fn drive_high(&mut self) -> Result<(), Self::Error>;

    /// Sample the current line level.
    fn is_high(&mut self) -> Result<bool, Self::Error>;
}

/// [`DataLine`] over an open-drain embedded-hal pin with an external pull-up.
///
/// An open-drain output is always readable, so switching to input just means
/// releasing the line to the pull-up.
pub struct OpenDrainLine<P> {
    pin: P,
}

impl<P> OpenDrainLine<P>
where
    P: InputPin + OutputPin,
{
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: ErrorType> ErrorType for OpenDrainLine<P> {
    type Error = P::Error;
}

impl<P> DataLine for OpenDrainLine<P>
where
    P: InputPin + OutputPin,
{
    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn drive_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }
}

/// Step of a DHT11 transaction, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RequestLow,
    ReleaseHigh,
    /// Sensor pulls the line low to acknowledge.
    AckLow,
    /// Sensor releases the line high after the acknowledge.
    AckHigh,
    /// Sensor pulls low again right before the first bit.
    AckEnd,
    /// Waiting for the high pulse of the given bit (0..40).
    BitStart(u8),
    /// Measuring the high pulse of the given bit (0..40).
    BitEnd(u8),
}

impl Phase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RequestLow => "start signal low",
            Self::ReleaseHigh => "start signal release",
            Self::AckLow => "response low",
            Self::AckHigh => "response high",
            Self::AckEnd => "response end",
            Self::BitStart(_) => "bit start",
            Self::BitEnd(_) => "bit end",
        }
    }
}

/// One successful DHT11 measurement.
///
/// Only the integral bytes are used. The DHT11 reports whole units, and
/// negative temperatures are outside its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentReading {
    /// Temperature in whole degrees Celsius.
    pub temperature: i16,
    /// Relative humidity in whole percent.
    pub humidity: i16,
}

impl EnvironmentReading {
    pub const fn new(temperature: i16, humidity: i16) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// Decode a raw 5-byte frame, verifying the trailing checksum byte.
    pub fn from_frame(frame: &[u8; FRAME_BYTES]) -> Result<Self, SensorError> {
        let computed = checksum(&frame[..4]);
        if computed != frame[4] {
            return Err(SensorError::Checksum {
                sensor: SENSOR,
                computed,
                received: frame[4],
            });
        }

        Ok(Self {
            temperature: frame[2] as i16,
            humidity: frame[0] as i16,
        })
    }
}

/// Bit-banged DHT11 driver.
pub struct Dht11<L, D> {
    line: L,
    delay: D,
}

impl<L, D> Dht11<L, D>
where
    L: DataLine,
    D: DelayNs,
{
    pub fn new(line: L, delay: D) -> Self {
        Self { line, delay }
    }

    /// Give back the line and delay provider.
    pub fn release(self) -> (L, D) {
        (self.line, self.delay)
    }

    pub fn line_mut(&mut self) -> &mut L {
        &mut self.line
    }

    /// Park the line in input mode with the latch high, the bus idle state.
    pub fn idle(&mut self) -> Result<(), SensorError> {
        self.line
            .set_as_input()
            .map_err(|e| Self::line_error(e, "idle input"))?;
        self.line
            .drive_high()
            .map_err(|e| Self::line_error(e, "idle high"))
    }

    /// Run one full transaction and decode the result.
    ///
    /// Never retries. A failed read leaves nothing behind, so the caller keeps
    /// whatever reading it had before.
    pub fn read_measurement(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.send_start_signal()?;
        self.wait_for_response()?;
        let frame = self.read_frame()?;

        let reading = EnvironmentReading::from_frame(&frame).inspect_err(|_| {
            warn!(
                "DHT11 checksum mismatch: frame {:02x} {:02x} {:02x} {:02x} {:02x}",
                frame[0], frame[1], frame[2], frame[3], frame[4]
            );
        })?;

        debug!(
            "DHT11: {} C, {} %",
            reading.temperature, reading.humidity
        );
        Ok(reading)
    }

    fn send_start_signal(&mut self) -> Result<(), SensorError> {
        self.line
            .set_as_output()
            .map_err(|e| Self::line_error(e, Phase::RequestLow.label()))?;
        self.line
            .drive_low()
            .map_err(|e| Self::line_error(e, Phase::RequestLow.label()))?;
        self.delay.delay_ms(START_SIGNAL_LOW_MS);

        self.line
            .drive_high()
            .map_err(|e| Self::line_error(e, Phase::ReleaseHigh.label()))?;
        self.delay.delay_us(START_SIGNAL_HIGH_US);
        self.line
            .set_as_input()
            .map_err(|e| Self::line_error(e, Phase::ReleaseHigh.label()))
    }

    fn wait_for_response(&mut self) -> Result<(), SensorError> {
        self.wait_for_level(false, Phase::AckLow)?;
        self.wait_for_level(true, Phase::AckHigh)?;
        self.wait_for_level(false, Phase::AckEnd)
    }

    fn read_frame(&mut self) -> Result<[u8; FRAME_BYTES], SensorError> {
        let mut frame = [0u8; FRAME_BYTES];

        for (index, byte) in frame.iter_mut().enumerate() {
            for bit in 0..8u8 {
                let bit_index = index as u8 * 8 + bit;

                self.wait_for_level(true, Phase::BitStart(bit_index))?;
                let width = self.measure_high_pulse(bit_index)?;

                if width > ONE_BIT_MIN_WIDTH {
                    *byte |= 1 << (7 - bit);
                }
            }
        }

        Ok(frame)
    }

    /// Poll until the line reaches `high`, giving up after [`MAX_POLLS`].
    fn wait_for_level(&mut self, high: bool, phase: Phase) -> Result<(), SensorError> {
        for _ in 0..MAX_POLLS {
            if self.sample(phase)? == high {
                return Ok(());
            }
            self.delay.delay_us(POLL_DELAY_US);
        }

        Err(Self::timeout(phase))
    }

    /// Count polls while the line stays high.
    fn measure_high_pulse(&mut self, bit_index: u8) -> Result<u16, SensorError> {
        let phase = Phase::BitEnd(bit_index);
        let mut width: u16 = 0;

        while self.sample(phase)? {
            self.delay.delay_us(POLL_DELAY_US);
            width += 1;
            if width > MAX_POLLS {
                return Err(Self::timeout(phase));
            }
        }

        Ok(width)
    }

    fn sample(&mut self, phase: Phase) -> Result<bool, SensorError> {
        self.line
            .is_high()
            .map_err(|e| Self::line_error(e, phase.label()))
    }

    fn timeout(phase: Phase) -> SensorError {
        match phase {
            Phase::BitStart(bit) | Phase::BitEnd(bit) => {
                warn!("DHT11 timed out at {} of bit {}", phase.label(), bit)
            }
            _ => warn!("DHT11 timed out at {}", phase.label()),
        }

        SensorError::Timeout {
            sensor: SENSOR,
            stage: phase.label(),
        }
    }

    fn line_error(e: L::Error, operation: &'static str) -> SensorError {
        error!("DHT11 data line failed during {}: {:?}", operation, e);
        SensorError::Line {
            sensor: SENSOR,
            operation,
        }
    }
}

impl<L, D> Sensor for Dht11<L, D>
where
    L: DataLine,
    D: DelayNs,
{
    type Readings = EnvironmentReading;

    fn init(&mut self) -> Result<(), SensorError> {
        self.idle()
    }

    fn read(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.read_measurement()
    }
}
