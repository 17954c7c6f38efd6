//! MQ135 on ADC1
//!
//! The ESP32-S3 converter is 12 bits wide; readings are scaled down to the
//! 10-bit range the gas thresholds are written for.

use airq_core::sensors::AnalogInput;
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::peripherals::{ADC1, GPIO1};

/// Shift from a 12-bit conversion to 10 bits.
const RESOLUTION_SHIFT: u16 = 2;

pub struct GasAdc<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<GPIO1<'d>, ADC1<'d>>,
    last: u16,
}

impl<'d> GasAdc<'d> {
    pub fn new(adc: Adc<'d, ADC1<'d>, Blocking>, pin: AdcPin<GPIO1<'d>, ADC1<'d>>) -> Self {
        Self { adc, pin, last: 0 }
    }
}

impl AnalogInput for GasAdc<'_> {
    fn start_conversion(&mut self) {
        // The first poll of `read_oneshot` starts the conversion.
        self.last = 0;
    }

    fn is_complete(&mut self) -> bool {
        match self.adc.read_oneshot(&mut self.pin) {
            Ok(raw) => {
                self.last = raw;
                true
            }
            Err(_) => false,
        }
    }

    fn read_value(&mut self) -> u16 {
        self.last >> RESOLUTION_SHIFT
    }
}
