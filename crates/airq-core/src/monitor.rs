//! The perpetual control loop.
//!
//! One [`Monitor::tick`]:
//!
//! 1. sample the MQ135 and classify it,
//! 2. fold the five channel levels into the overall rating,
//! 3. read the DHT11 or SDS018 if the current screen asks for it,
//! 4. render the screen and advance the rotation,
//! 5. wait out the tick delay.
//!
//! A decode acquired in step 3 shows up in the overall rating on the next
//! tick.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::app_state::MonitorState;
use crate::config::MonitorConfig;
use crate::display::Display;
use crate::pages::{Acquisition, PageManager};
use crate::sensors::{AnalogInput, EnvironmentReading, Mq135, ParticulateReading, Sensor};

pub struct Monitor<G, E, P> {
    gas: Mq135<G>,
    environment: E,
    particulate: P,
    state: MonitorState,
    pages: PageManager,
    config: MonitorConfig,
}

impl<G, E, P> Monitor<G, E, P>
where
    G: AnalogInput,
    E: Sensor<Readings = EnvironmentReading>,
    P: Sensor<Readings = ParticulateReading>,
{
    pub fn new(gas: Mq135<G>, environment: E, particulate: P, config: MonitorConfig) -> Self {
        Self {
            gas,
            environment,
            particulate,
            state: MonitorState::new(&config),
            pages: PageManager::new(&config),
            config,
        }
    }

    /// Idle the sensor buses and wait for the sensors to settle.
    ///
    /// A sensor that fails to idle is logged and left for the first read to
    /// report.
    pub fn warm_up<T: DelayNs>(&mut self, delay: &mut T) {
        if let Err(e) = self.environment.init() {
            warn!("Environment sensor init failed: {}", e);
        }
        if let Err(e) = self.particulate.init() {
            warn!("Particulate sensor init failed: {}", e);
        }

        info!("Warming up for {} ms", self.config.warm_up_ms);
        delay.delay_ms(self.config.warm_up_ms);
    }

    /// Run one control-loop iteration.
    ///
    /// Sensor failures are absorbed into [`MonitorState`]; only display
    /// errors come back, after the tick delay has still been served. A tick
    /// that finds an out-of-range screen index resets the rotation and skips
    /// the delay.
    pub fn tick<D, T>(&mut self, display: &mut D, delay: &mut T) -> Result<(), D::Error>
    where
        D: Display,
        T: DelayNs,
    {
        let sample = self.gas.sample();
        self.state.record_gas(sample);
        let overall = self.state.update_overall();
        debug!("Gas {} -> overall {}", sample.value(), overall.label());

        match self.pages.needs() {
            Acquisition::Environment => {
                let result = self.environment.read();
                self.state.record_environment(result);
            }
            Acquisition::Particulate => {
                let result = self.particulate.read();
                self.state.record_particulate(result);
            }
            Acquisition::Nothing => {}
        }

        // An out-of-range screen is repaired without drawing or waiting.
        let valid_screen = self.pages.current().is_some();
        let result = self.pages.tick(display, delay, &self.state);
        if valid_screen {
            delay.delay_ms(self.config.tick_ms);
        }
        result
    }

    /// Tick forever. Display errors are logged and the loop carries on.
    pub fn run<D, T>(&mut self, display: &mut D, delay: &mut T) -> !
    where
        D: Display,
        T: DelayNs,
    {
        loop {
            if let Err(e) = self.tick(display, delay) {
                error!("Display error: {:?}", e);
            }
        }
    }

    /// Start from the given rotation position instead of the animation.
    pub fn with_pages(mut self, pages: PageManager) -> Self {
        self.pages = pages;
        self
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn pages(&self) -> &PageManager {
        &self.pages
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    pub fn particulate_mut(&mut self) -> &mut P {
        &mut self.particulate
    }

    pub fn gas_mut(&mut self) -> &mut Mq135<G> {
        &mut self.gas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{OverallQuality, QualityLevel};
    use crate::pages::PageId;
    use crate::sensors::SensorError;
    use crate::sim::{ScriptedAdc, ScriptedSensor, SimClock, SimDelay, TextGridDisplay};

    type TestMonitor = Monitor<
        ScriptedAdc,
        ScriptedSensor<EnvironmentReading>,
        ScriptedSensor<ParticulateReading>,
    >;

    fn monitor(gas: &[u16]) -> TestMonitor {
        Monitor::new(
            Mq135::new(ScriptedAdc::new(gas, 0)),
            ScriptedSensor::new(),
            ScriptedSensor::new(),
            MonitorConfig::default(),
        )
    }

    fn run_ticks(monitor: &mut TestMonitor, display: &mut TextGridDisplay, ticks: usize) {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        for _ in 0..ticks {
            monitor.tick(display, &mut delay).unwrap();
        }
    }

    #[test]
    fn warm_up_waits_two_seconds() {
        let clock = SimClock::new();
        let mut monitor = monitor(&[100]);

        monitor.warm_up(&mut SimDelay::new(&clock));

        assert_eq!(clock.now_ms(), 2000);
    }

    #[test]
    fn animation_tick_takes_four_seconds() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        let mut monitor = monitor(&[100]);
        let mut display = TextGridDisplay::new();

        monitor.tick(&mut display, &mut delay).unwrap();

        assert_eq!(clock.now_ms(), 3000 + 1000);
    }

    #[test]
    fn invalid_screen_resets_without_waiting() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        let config = MonitorConfig::default();
        let mut monitor = monitor(&[100]).with_pages(PageManager::from_raw(&config, 7, 1));
        let mut display = TextGridDisplay::new();

        monitor.tick(&mut display, &mut delay).unwrap();

        assert_eq!(clock.now_ms(), 0);
        assert_eq!(monitor.pages().current(), Some(PageId::Animation));
        assert_eq!(display.flushes(), 0);

        // The next tick is a normal animation tick again.
        monitor.tick(&mut display, &mut delay).unwrap();
        assert_eq!(clock.now_ms(), 4000);
    }

    #[test]
    fn sensors_are_read_only_on_their_value_screens() {
        let mut monitor = monitor(&[100]);
        let mut display = TextGridDisplay::new();

        // Three animation ticks, then five environment value ticks.
        run_ticks(&mut monitor, &mut display, 8);
        assert_eq!(monitor.environment_mut().reads(), 5);
        assert_eq!(monitor.particulate_mut().reads(), 0);

        // Two level ticks, then five particulate value ticks.
        run_ticks(&mut monitor, &mut display, 7);
        assert_eq!(monitor.environment_mut().reads(), 5);
        assert_eq!(monitor.particulate_mut().reads(), 5);
    }

    #[test]
    fn environment_failure_shows_last_value_and_err_levels() {
        let mut monitor = monitor(&[100]);
        monitor
            .environment_mut()
            .push(Ok(EnvironmentReading::new(27, 41)));
        let mut display = TextGridDisplay::new();

        // Animation x3, first environment read succeeds, the rest time out.
        run_ticks(&mut monitor, &mut display, 5);

        assert_eq!(display.row_text(2), "Temperature : 27 C");
        assert_eq!(monitor.state().levels.temperature, QualityLevel::Error);
        assert_eq!(monitor.state().levels.humidity, QualityLevel::Error);
    }

    #[test]
    fn particulate_failure_keeps_previous_value() {
        let mut monitor = monitor(&[100]);
        monitor
            .particulate_mut()
            .push(Ok(ParticulateReading::new(655, 123)));
        monitor.particulate_mut().push(Err(SensorError::Checksum {
            sensor: "SDS018",
            computed: 1,
            received: 2,
        }));
        let mut display = TextGridDisplay::new();

        run_ticks(&mut monitor, &mut display, 12);

        assert_eq!(monitor.pages().current(), Some(PageId::ParticulateValues));
        assert_eq!(display.row_text(2), "PM2.5 : 65.5 ug/m3");
        assert_eq!(display.row_text(6), "PM10  : 12.3 ug/m3");
        assert_eq!(monitor.state().levels.pm25, QualityLevel::Bad);
    }

    #[test]
    fn overall_lags_acquisition_by_one_tick() {
        let mut monitor = monitor(&[500]);
        let mut display = TextGridDisplay::new();

        // Gas Bad alone: 2 / 5 = 0.
        run_ticks(&mut monitor, &mut display, 3);
        assert_eq!(monitor.state().overall, OverallQuality::Good);

        // First environment tick fails after the overall was computed.
        run_ticks(&mut monitor, &mut display, 1);
        assert_eq!(monitor.state().overall, OverallQuality::Good);

        // 2 + 2 + 2 + 0 + 0 = 6, 6 / 5 = 1
        run_ticks(&mut monitor, &mut display, 1);
        assert_eq!(monitor.state().overall, OverallQuality::Normal);
    }
}
