//! SDS018 byte source on a blocking UART

use esp_hal::Blocking;
use esp_hal::uart::{RxError, Uart};
use thiserror_no_std::Error;

/// SDS018 line rate.
pub const SDS018_BAUD: u32 = 9600;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("UART receive failed: {0:?}")]
pub struct SerialError(pub RxError);

// The no_std derive only provides Display.
impl core::error::Error for SerialError {}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// [`embedded_io::Read`] over the receive side of a UART.
pub struct SerialPort<'d> {
    uart: Uart<'d, Blocking>,
}

impl<'d> SerialPort<'d> {
    pub fn new(uart: Uart<'d, Blocking>) -> Self {
        Self { uart }
    }
}

impl embedded_io::ErrorType for SerialPort<'_> {
    type Error = SerialError;
}

impl embedded_io::Read for SerialPort<'_> {
    /// Blocks until at least one byte has arrived.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read(buf).map_err(SerialError)
    }
}
