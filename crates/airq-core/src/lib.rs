//! Hardware-independent core library for airq-rs
//!
//! This crate contains all platform-agnostic logic for the airq air quality
//! monitor: the DHT11, SDS018 and MQ135 sensor protocols, quality
//! classification and aggregation, the screen rotation state machine and the
//! framebuffer-backed character display.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod app_state;
pub mod config;
pub mod display;
pub mod display_manager;
pub mod framebuffer;
pub mod metrics;
pub mod monitor;
pub mod pages;
pub mod sensors;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
