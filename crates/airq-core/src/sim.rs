//! Simulated hardware ports for host builds.
//!
//! Everything here runs on a [`SimClock`] that only moves when someone
//! delays, so the bit-banged DHT11 timing is deterministic in tests and in
//! the desktop simulator.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::Point;
use embedded_hal::delay::DelayNs;
use heapless::{Deque, Vec};

use crate::display::{COLUMNS, Display, ROWS};
use crate::sensors::{AnalogInput, DataLine, Sensor, SensorError};

/// Monotonic simulated time in nanoseconds.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ns: Cell<u64>,
}

impl SimClock {
    pub const fn new() -> Self {
        Self {
            now_ns: Cell::new(0),
        }
    }

    pub fn now_us(&self) -> u64 {
        self.now_ns.get() / 1_000
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }

    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get().saturating_add(ns));
    }
}

/// [`DelayNs`] that advances a [`SimClock`] instead of sleeping.
#[derive(Debug, Clone, Copy)]
pub struct SimDelay<'a> {
    clock: &'a SimClock,
}

impl<'a> SimDelay<'a> {
    pub const fn new(clock: &'a SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_ns(us as u64 * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ns(ms as u64 * 1_000_000);
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    high: bool,
    duration_us: u32,
}

/// Handshake (3) + 40 bits x 2 + trailing low.
const WAVEFORM_CAPACITY: usize = 96;

const RELEASE_US: u32 = 20;
const ACK_US: u32 = 80;
const BIT_GAP_US: u32 = 50;
const ZERO_PULSE_US: u32 = 26;
const ONE_PULSE_US: u32 = 70;

/// A DHT11 on the end of a simulated data line.
///
/// The sensor replays its waveform each time the host finishes a start
/// signal (low, then high, then switch to input). Outside a response the
/// line floats high on its pull-up.
pub struct SimulatedDht11Line<'a> {
    clock: &'a SimClock,
    waveform: Vec<Segment, WAVEFORM_CAPACITY>,
    /// Level held once the waveform has played out.
    tail_high: bool,
    output: bool,
    driven_low: bool,
    low_since_us: Option<u64>,
    start_signal_us: Option<u64>,
    requested: bool,
    response_from_us: Option<u64>,
}

impl<'a> SimulatedDht11Line<'a> {
    fn with_waveform(clock: &'a SimClock, tail_high: bool) -> Self {
        Self {
            clock,
            waveform: Vec::new(),
            tail_high,
            output: false,
            driven_low: false,
            low_since_us: None,
            start_signal_us: None,
            requested: false,
            response_from_us: None,
        }
    }

    /// A healthy sensor that answers every request with `frame`.
    pub fn responding(clock: &'a SimClock, frame: [u8; 5]) -> Self {
        let mut line = Self::with_waveform(clock, true);
        line.load_frame(frame);
        line
    }

    /// Nothing connected: the line never leaves the pull-up level.
    pub fn silent(clock: &'a SimClock) -> Self {
        Self::with_waveform(clock, true)
    }

    /// Acknowledges, then holds the line high through the first bit.
    pub fn stuck_high_after_ack(clock: &'a SimClock) -> Self {
        let mut line = Self::with_waveform(clock, true);
        line.push_handshake();
        line.push(false, BIT_GAP_US);
        line
    }

    /// Sends only the first `bits` bits of `frame`, then holds the line low.
    pub fn truncated(clock: &'a SimClock, frame: [u8; 5], bits: u8) -> Self {
        let mut line = Self::with_waveform(clock, false);
        line.push_handshake();
        line.push_bits(&frame, bits.min(40), ZERO_PULSE_US, ONE_PULSE_US);
        line
    }

    /// Like [`Self::responding`], but with the given high-pulse widths for
    /// 0 and 1 bits.
    pub fn with_pulse_widths(
        clock: &'a SimClock,
        frame: [u8; 5],
        zero_us: u32,
        one_us: u32,
    ) -> Self {
        let mut line = Self::with_waveform(clock, true);
        line.push_handshake();
        line.push_bits(&frame, 40, zero_us, one_us);
        line.push(false, BIT_GAP_US);
        line
    }

    /// Pulls the line low to acknowledge and never lets go.
    pub fn stuck_low_in_ack(clock: &'a SimClock) -> Self {
        let mut line = Self::with_waveform(clock, false);
        line.push(true, RELEASE_US);
        line
    }

    /// Acknowledges low, releases high and never starts the first bit.
    pub fn stuck_high_in_ack(clock: &'a SimClock) -> Self {
        let mut line = Self::with_waveform(clock, true);
        line.push(true, RELEASE_US);
        line.push(false, ACK_US);
        line
    }

    /// Answer future requests with `frame`.
    pub fn load_frame(&mut self, frame: [u8; 5]) {
        self.waveform.clear();
        self.tail_high = true;
        self.push_handshake();
        self.push_bits(&frame, 40, ZERO_PULSE_US, ONE_PULSE_US);
        self.push(false, BIT_GAP_US);
    }

    /// Answer future requests with silence.
    pub fn disconnect(&mut self) {
        self.waveform.clear();
        self.tail_high = true;
    }

    /// How long the host held the last start signal low.
    pub fn start_signal_us(&self) -> Option<u64> {
        self.start_signal_us
    }

    fn push(&mut self, high: bool, duration_us: u32) {
        self.waveform.push(Segment { high, duration_us }).ok();
    }

    fn push_handshake(&mut self) {
        self.push(true, RELEASE_US);
        self.push(false, ACK_US);
        self.push(true, ACK_US);
    }

    fn push_bits(&mut self, frame: &[u8; 5], bits: u8, zero_us: u32, one_us: u32) {
        for index in 0..bits as usize {
            let bit = frame[index / 8] & (0x80 >> (index % 8)) != 0;
            self.push(false, BIT_GAP_US);
            self.push(true, if bit { one_us } else { zero_us });
        }
    }

    fn sensor_level(&self, started_us: u64) -> bool {
        let mut elapsed = self.clock.now_us().saturating_sub(started_us);
        for segment in self.waveform.iter() {
            let duration = segment.duration_us as u64;
            if elapsed < duration {
                return segment.high;
            }
            elapsed -= duration;
        }
        self.tail_high
    }
}

impl embedded_hal::digital::ErrorType for SimulatedDht11Line<'_> {
    type Error = Infallible;
}

impl DataLine for SimulatedDht11Line<'_> {
    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        self.output = true;
        self.response_from_us = None;
        Ok(())
    }

    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        self.output = false;
        if self.requested {
            self.requested = false;
            self.response_from_us = Some(self.clock.now_us());
        }
        Ok(())
    }

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        self.driven_low = true;
        if self.output {
            self.low_since_us = Some(self.clock.now_us());
        }
        Ok(())
    }

    fn drive_high(&mut self) -> Result<(), Self::Error> {
        self.driven_low = false;
        if let Some(since) = self.low_since_us.take() {
            self.start_signal_us = Some(self.clock.now_us() - since);
            self.requested = true;
        }
        Ok(())
    }

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.output {
            return Ok(!self.driven_low);
        }
        Ok(match self.response_from_us {
            Some(started) => self.sensor_level(started),
            None => true,
        })
    }
}

const SERIAL_CAPACITY: usize = 256;

/// Byte source that replays queued bytes, then reports end of stream.
#[derive(Default)]
pub struct ScriptedSerial {
    bytes: Deque<u8, SERIAL_CAPACITY>,
}

impl ScriptedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut serial = Self::new();
        serial.push_bytes(bytes);
        serial
    }

    /// Queue raw bytes. Bytes beyond the capacity are dropped.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            if self.bytes.push_back(*byte).is_err() {
                break;
            }
        }
    }

    /// Queue a well-formed data frame.
    pub fn push_frame(&mut self, pm25_tenths: u16, pm10_tenths: u16) {
        self.push_bytes(&data_frame(pm25_tenths, pm10_tenths));
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

/// Encode a 10-byte SDS018 data frame with device id `01 02`.
pub fn data_frame(pm25_tenths: u16, pm10_tenths: u16) -> [u8; 10] {
    let [pm25_lo, pm25_hi] = pm25_tenths.to_le_bytes();
    let [pm10_lo, pm10_hi] = pm10_tenths.to_le_bytes();
    let payload = [pm25_lo, pm25_hi, pm10_lo, pm10_hi, 0x01, 0x02];
    let sum = crate::sensors::checksum(&payload);

    [
        0xAA, 0xC0, payload[0], payload[1], payload[2], payload[3], payload[4], payload[5], sum,
        0xAB,
    ]
}

impl embedded_io::ErrorType for ScriptedSerial {
    type Error = Infallible;
}

impl embedded_io::Read for ScriptedSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.bytes.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

const ADC_SCRIPT_CAPACITY: usize = 16;

/// Converter that cycles through scripted values, reporting busy for a fixed
/// number of polls per conversion.
pub struct ScriptedAdc {
    values: Vec<u16, ADC_SCRIPT_CAPACITY>,
    next: usize,
    busy_polls: u32,
    pending: u32,
    conversions: u32,
    polls: u32,
}

impl ScriptedAdc {
    pub fn new(values: &[u16], busy_polls: u32) -> Self {
        let mut script = Vec::new();
        for value in values.iter().take(ADC_SCRIPT_CAPACITY) {
            script.push(*value).ok();
        }

        Self {
            values: script,
            next: 0,
            busy_polls,
            pending: 0,
            conversions: 0,
            polls: 0,
        }
    }

    pub fn conversions(&self) -> u32 {
        self.conversions
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl AnalogInput for ScriptedAdc {
    fn start_conversion(&mut self) {
        self.conversions += 1;
        self.pending = self.busy_polls;
    }

    fn is_complete(&mut self) -> bool {
        self.polls += 1;
        if self.pending == 0 {
            return true;
        }
        self.pending -= 1;
        false
    }

    fn read_value(&mut self) -> u16 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

const SENSOR_SCRIPT_CAPACITY: usize = 16;

/// Sensor that returns queued results in order.
pub struct ScriptedSensor<R> {
    results: Deque<Result<R, SensorError>, SENSOR_SCRIPT_CAPACITY>,
    reads: u32,
}

impl<R> ScriptedSensor<R> {
    pub fn new() -> Self {
        Self {
            results: Deque::new(),
            reads: 0,
        }
    }

    pub fn then(mut self, result: Result<R, SensorError>) -> Self {
        self.push(result);
        self
    }

    pub fn push(&mut self, result: Result<R, SensorError>) {
        self.results.push_back(result).ok();
    }

    /// How many times the sensor has been read.
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl<R> Default for ScriptedSensor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Sensor for ScriptedSensor<R> {
    type Readings = R;

    /// An exhausted script reads as a timeout.
    fn read(&mut self) -> Result<R, SensorError> {
        self.reads += 1;
        self.results.pop_front().unwrap_or(Err(SensorError::Timeout {
            sensor: "SCRIPTED",
            stage: "script exhausted",
        }))
    }
}

const COLS: usize = COLUMNS as usize;
const LINES: usize = ROWS as usize;
const RECORDED_LINES: usize = 32;

/// [`Display`] that keeps the character grid and a log of primitives.
///
/// Text lands in a 21 x 8 grid of ASCII cells; anything past the edge is
/// dropped. Lines are recorded until the next clear.
pub struct TextGridDisplay {
    cells: [[u8; COLS]; LINES],
    cursor: (u8, u8),
    lines: Vec<(Point, Point), RECORDED_LINES>,
    rects: u32,
    fills: u32,
    pixels: u32,
    clears: u32,
    flushes: u32,
}

impl Default for TextGridDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGridDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[b' '; COLS]; LINES],
            cursor: (0, 0),
            lines: Vec::new(),
            rects: 0,
            fills: 0,
            pixels: 0,
            clears: 0,
            flushes: 0,
        }
    }

    /// Contents of one character row, with trailing blanks removed.
    pub fn row_text(&self, row: u8) -> &str {
        self.cells
            .get(row as usize)
            .and_then(|cells| core::str::from_utf8(cells).ok())
            .map(str::trim_end)
            .unwrap_or("")
    }

    pub fn cursor(&self) -> (u8, u8) {
        self.cursor
    }

    /// Lines drawn since the last clear.
    pub fn lines(&self) -> &[(Point, Point)] {
        &self.lines
    }

    pub fn rects(&self) -> u32 {
        self.rects
    }

    pub fn fills(&self) -> u32 {
        self.fills
    }

    pub fn pixels(&self) -> u32 {
        self.pixels
    }

    pub fn clears(&self) -> u32 {
        self.clears
    }

    pub fn flushes(&self) -> u32 {
        self.flushes
    }
}

impl Display for TextGridDisplay {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cells = [[b' '; COLS]; LINES];
        self.cursor = (0, 0);
        self.lines.clear();
        self.clears += 1;
        Ok(())
    }

    fn move_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        self.cursor = (col, row);
        Ok(())
    }

    fn write_char(&mut self, ch: char) -> Result<(), Self::Error> {
        let (col, row) = (self.cursor.0 as usize, self.cursor.1 as usize);
        if col < COLS && row < LINES {
            self.cells[row][col] = if ch.is_ascii() { ch as u8 } else { b'?' };
        }
        self.cursor.0 = self.cursor.0.saturating_add(1);
        Ok(())
    }

    fn draw_line(
        &mut self,
        start: Point,
        end: Point,
        _color: BinaryColor,
    ) -> Result<(), Self::Error> {
        self.lines.push((start, end)).ok();
        Ok(())
    }

    fn draw_rect(
        &mut self,
        _top_left: Point,
        _bottom_right: Point,
        _color: BinaryColor,
    ) -> Result<(), Self::Error> {
        self.rects += 1;
        Ok(())
    }

    fn fill_rect(
        &mut self,
        _top_left: Point,
        _bottom_right: Point,
        _color: BinaryColor,
    ) -> Result<(), Self::Error> {
        self.fills += 1;
        Ok(())
    }

    fn draw_pixel(&mut self, _point: Point, _color: BinaryColor) -> Result<(), Self::Error> {
        self.pixels += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Read;

    #[test]
    fn delay_advances_clock() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);

        delay.delay_ms(18);
        delay.delay_us(30);

        assert_eq!(clock.now_us(), 18_030);
    }

    #[test]
    fn line_floats_high_until_requested() {
        let clock = SimClock::new();
        let mut line = SimulatedDht11Line::responding(&clock, [0; 5]);

        line.set_as_input().unwrap();
        assert!(line.is_high().unwrap());
        SimDelay::new(&clock).delay_us(30);
        assert!(line.is_high().unwrap());
        assert_eq!(line.start_signal_us(), None);
    }

    #[test]
    fn response_starts_after_release() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        let mut line = SimulatedDht11Line::responding(&clock, [0; 5]);

        line.set_as_output().unwrap();
        line.drive_low().unwrap();
        assert!(!line.is_high().unwrap());
        delay.delay_ms(18);
        line.drive_high().unwrap();
        line.set_as_input().unwrap();

        assert!(line.is_high().unwrap());
        delay.delay_us(RELEASE_US);
        assert!(!line.is_high().unwrap());
        assert_eq!(line.start_signal_us(), Some(18_000));
    }

    #[test]
    fn scripted_serial_drains_then_ends() {
        let mut serial = ScriptedSerial::from_bytes(&[1, 2, 3]);
        let mut buf = [0u8; 2];

        assert_eq!(serial.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(serial.read(&mut buf).unwrap(), 1);
        assert_eq!(serial.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn data_frame_matches_reference_bytes() {
        assert_eq!(
            data_frame(10, 20),
            [0xAA, 0xC0, 0x0A, 0x00, 0x14, 0x00, 0x01, 0x02, 0x21, 0xAB]
        );
    }

    #[test]
    fn text_grid_clips_at_the_right_edge() {
        let mut display = TextGridDisplay::new();

        display.move_cursor(18, 1).unwrap();
        display.write_text("ABCDEF").unwrap();

        assert_eq!(display.row_text(1), "                  ABC");
        assert_eq!(display.row_text(9), "");
    }

    #[test]
    fn scripted_sensor_plays_back_in_order() {
        let mut sensor = ScriptedSensor::new().then(Ok(1u8)).then(Ok(2u8));

        assert_eq!(sensor.read(), Ok(1));
        assert_eq!(sensor.read(), Ok(2));
        assert!(sensor.read().unwrap_err().is_timeout());
        assert_eq!(sensor.reads(), 3);
    }
}
