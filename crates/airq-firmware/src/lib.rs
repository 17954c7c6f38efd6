//! ESP32-S3 firmware-specific modules for airq-rs
//!
//! Adapters from esp-hal peripherals to the sensor ports defined in
//! `airq_core`. Everything here needs the ESP32-S3 target.

#![no_std]

pub mod gas_adc;
pub mod serial;

pub use gas_adc::GasAdc;
pub use serial::SerialPort;
