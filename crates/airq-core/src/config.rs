//! Runtime timing and start-up values for the monitor loop.

use crate::sensors::{EnvironmentReading, ParticulateReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Wait after power-up before the first tick, so the sensors settle.
    pub warm_up_ms: u32,
    /// Pause at the end of every tick.
    pub tick_ms: u32,
    /// Frames per animation tick.
    pub animation_frames: u8,
    pub animation_frame_ms: u32,
    /// Shown until the first successful DHT11 read.
    pub initial_environment: EnvironmentReading,
    /// Shown until the first successful SDS018 read.
    pub initial_particulate: ParticulateReading,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            warm_up_ms: 2000,
            tick_ms: 1000,
            animation_frames: 6,
            animation_frame_ms: 500,
            initial_environment: EnvironmentReading::new(25, 50),
            initial_particulate: ParticulateReading::new(150, 200),
        }
    }
}

impl MonitorConfig {
    pub fn with_warm_up_ms(mut self, warm_up_ms: u32) -> Self {
        self.warm_up_ms = warm_up_ms;
        self
    }

    pub fn with_tick_ms(mut self, tick_ms: u32) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the animation length. A zero frame count still plays one frame.
    pub fn with_animation(mut self, frames: u8, frame_ms: u32) -> Self {
        self.animation_frames = frames.max(1);
        self.animation_frame_ms = frame_ms;
        self
    }

    pub fn with_initial_environment(mut self, reading: EnvironmentReading) -> Self {
        self.initial_environment = reading;
        self
    }

    pub fn with_initial_particulate(mut self, reading: ParticulateReading) -> Self {
        self.initial_particulate = reading;
        self
    }
}
