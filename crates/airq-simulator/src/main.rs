//! Desktop simulator for the airq-rs air quality monitor.
//!
//! Runs the real `airq_core` control loop against simulated sensors: the
//! DHT11 decoder bit-bangs a simulated waveform, the SDS018 parser reads
//! scripted serial frames and the MQ135 sampler reads a synthetic converter.
//! Every few reads a sensor misbehaves so the ERR and retained-value paths
//! show up on screen.
//!
//! Without features the simulator runs headless: it plays a number of ticks
//! on simulated time and prints the final panel as text. With `--features
//! window` it opens an SDL2 window and runs in real time.
//!
//! ```text
//! cargo run -p airq-simulator -- 20
//! RUST_LOG=debug cargo run -p airq-simulator --features window
//! ```

use airq_core::config::MonitorConfig;
use airq_core::display_manager::DisplayManager;
use airq_core::framebuffer::FlushStyle;
use airq_core::monitor::Monitor;
use airq_core::sensors::{
    AnalogInput, Dht11, EnvironmentReading, Mq135, ParticulateReading, Sds018, Sensor,
    SensorError, checksum,
};
use airq_core::sim::{ScriptedSerial, SimClock, SimDelay, SimulatedDht11Line, data_frame};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::SimulatorDisplay;
use log::info;

use airq_core::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

/// Ticks played in headless mode when no count is given: one full rotation.
#[cfg(not(feature = "window"))]
const DEFAULT_TICKS: usize = 17;

/// Every Nth DHT11 read gets no answer.
const DHT_DROPOUT_EVERY: u32 = 7;
/// Every Nth SDS018 frame has its checksum corrupted.
const SDS_CORRUPT_EVERY: u32 = 4;

// ---------------------------------------------------------------------------
// Mock sensors
// ---------------------------------------------------------------------------

/// Synthetic 10-bit gas converter drifting through all three levels.
struct MockGasAdc {
    conversions: u32,
}

impl MockGasAdc {
    fn new() -> Self {
        Self { conversions: 0 }
    }
}

impl AnalogInput for MockGasAdc {
    fn start_conversion(&mut self) {
        self.conversions += 1;
    }

    fn is_complete(&mut self) -> bool {
        true
    }

    fn read_value(&mut self) -> u16 {
        let t = self.conversions as f64;
        let raw = 300.0 + 220.0 * (t / 9.0).sin() + 25.0 * (t / 2.3).cos();
        raw.clamp(0.0, 1023.0) as u16
    }
}

/// DHT11 decoder wired to a simulated sensor that follows a slow sine.
struct SimulatedEnvironment<'a> {
    dht: Dht11<SimulatedDht11Line<'a>, SimDelay<'a>>,
    reads: u32,
}

impl<'a> SimulatedEnvironment<'a> {
    fn new(clock: &'a SimClock) -> Self {
        Self {
            dht: Dht11::new(SimulatedDht11Line::silent(clock), SimDelay::new(clock)),
            reads: 0,
        }
    }

    fn next_frame(&self) -> [u8; 5] {
        let t = self.reads as f64;
        let temperature = (26.0 + 6.0 * (t / 11.0).sin()) as u8;
        let humidity = (48.0 + 15.0 * (t / 17.0).cos()) as u8;

        let mut frame = [humidity, 0, temperature, 0, 0];
        frame[4] = checksum(&frame[..4]);
        frame
    }
}

impl Sensor for SimulatedEnvironment<'_> {
    type Readings = EnvironmentReading;

    fn init(&mut self) -> Result<(), SensorError> {
        self.dht.init()
    }

    fn read(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.reads += 1;
        if self.reads % DHT_DROPOUT_EVERY == 0 {
            self.dht.line_mut().disconnect();
        } else {
            let frame = self.next_frame();
            self.dht.line_mut().load_frame(frame);
        }
        self.dht.read()
    }
}

/// SDS018 parser fed by a scripted serial stream.
struct SimulatedParticulate {
    sds: Sds018<ScriptedSerial>,
    frames: u32,
}

impl SimulatedParticulate {
    fn new() -> Self {
        Self {
            sds: Sds018::new(ScriptedSerial::new()),
            frames: 0,
        }
    }
}

impl Sensor for SimulatedParticulate {
    type Readings = ParticulateReading;

    fn read(&mut self) -> Result<ParticulateReading, SensorError> {
        self.frames += 1;
        let t = self.frames as f64;
        let pm25 = (280.0 + 220.0 * (t / 5.0).sin()).max(0.0) as u16;
        let pm10 = (450.0 + 300.0 * (t / 7.0).cos()).max(0.0) as u16;

        let mut frame = data_frame(pm25, pm10);
        if self.frames % SDS_CORRUPT_EVERY == 0 {
            frame[8] = !frame[8];
        }

        let serial = self.sds.serial_mut();
        // Line noise before the frame head.
        serial.push_bytes(&[0x00, 0xAB, 0x42]);
        serial.push_bytes(&frame);

        self.sds.read()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the panel as text, two pixel rows per line.
#[cfg_attr(feature = "window", allow(dead_code))]
fn render_ascii(display: &SimulatorDisplay<BinaryColor>) -> String {
    let width = DISPLAY_WIDTH_PX as i32;
    let height = DISPLAY_HEIGHT_PX as i32;
    let mut out = String::with_capacity(((width + 3) * height / 2) as usize);

    out.push('+');
    out.extend(std::iter::repeat_n('-', width as usize));
    out.push_str("+\n");
    for y in (0..height).step_by(2) {
        out.push('|');
        for x in 0..width {
            let top = display.get_pixel(Point::new(x, y)).is_on();
            let bottom = display.get_pixel(Point::new(x, y + 1)).is_on();
            out.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push_str("|\n");
    }
    out.push('+');
    out.extend(std::iter::repeat_n('-', width as usize));
    out.push('+');
    out
}

fn panel() -> SimulatorDisplay<BinaryColor> {
    SimulatorDisplay::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX))
}

fn flush_style() -> FlushStyle<BinaryColor> {
    FlushStyle::new(BinaryColor::On, BinaryColor::Off)
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

#[cfg(not(feature = "window"))]
fn run(config: MonitorConfig, sensor_clock: &SimClock) {
    let ticks = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let loop_clock = SimClock::new();
    let mut delay = SimDelay::new(&loop_clock);
    let mut display = DisplayManager::new(panel(), flush_style());
    let mut monitor = Monitor::new(
        Mq135::new(MockGasAdc::new()),
        SimulatedEnvironment::new(sensor_clock),
        SimulatedParticulate::new(),
        config,
    );

    monitor.warm_up(&mut delay);
    for tick in 0..ticks {
        if let Err(e) = monitor.tick(&mut display, &mut delay) {
            log::error!("Display error: {:?}", e);
        }

        let state = monitor.state();
        info!(
            "tick {:>3} [{:>6} ms] screen {:?}: {} C {} % gas {} PM2.5 {} PM10 {} -> {}",
            tick,
            loop_clock.now_ms(),
            monitor.pages().current(),
            state.environment.temperature,
            state.environment.humidity,
            state.gas.value(),
            state.particulate.pm25(),
            state.particulate.pm10(),
            state.overall.label()
        );
    }

    println!("{}", render_ascii(display.target()));
}

// ---------------------------------------------------------------------------
// Window mode
// ---------------------------------------------------------------------------

#[cfg(feature = "window")]
mod window {
    use std::convert::Infallible;
    use std::time::Duration;

    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;
    use embedded_graphics_simulator::{
        BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    };
    use embedded_hal::delay::DelayNs;
    use log::info;

    /// Pixel scale factor for the simulator window.
    const WINDOW_SCALE: u32 = 4;

    /// Simulator display that repaints its window after every flush.
    pub struct LiveWindow {
        display: SimulatorDisplay<BinaryColor>,
        window: Window,
    }

    impl LiveWindow {
        pub fn new(display: SimulatorDisplay<BinaryColor>) -> Self {
            let output_settings = OutputSettingsBuilder::new()
                .theme(BinaryColorTheme::OledBlue)
                .scale(WINDOW_SCALE)
                .build();
            Self {
                display,
                window: Window::new("airq Simulator", &output_settings),
            }
        }

        fn refresh(&mut self) {
            self.window.update(&self.display);
            if self
                .window
                .events()
                .any(|event| matches!(event, SimulatorEvent::Quit))
            {
                info!("Simulator exiting");
                std::process::exit(0);
            }
        }
    }

    impl OriginDimensions for LiveWindow {
        fn size(&self) -> Size {
            self.display.size()
        }
    }

    impl DrawTarget for LiveWindow {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.display.draw_iter(pixels)?;
            self.refresh();
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Self::Color>,
        {
            self.display.fill_contiguous(area, colors)?;
            self.refresh();
            Ok(())
        }
    }

    /// Wall-clock delay for the control loop, keeping the window responsive.
    pub struct StdDelay;

    impl DelayNs for StdDelay {
        fn delay_ns(&mut self, ns: u32) {
            std::thread::sleep(Duration::from_nanos(ns as u64));
        }
    }
}

#[cfg(feature = "window")]
fn run(config: MonitorConfig, sensor_clock: &SimClock) {
    let mut display = DisplayManager::new(window::LiveWindow::new(panel()), flush_style());
    let mut delay = window::StdDelay;
    let mut monitor = Monitor::new(
        Mq135::new(MockGasAdc::new()),
        SimulatedEnvironment::new(sensor_clock),
        SimulatedParticulate::new(),
        config,
    );

    monitor.warm_up(&mut delay);
    monitor.run(&mut display, &mut delay)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting airq-rs simulator");
    info!("Display: {}x{}", DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX);

    // The DHT11 waveform runs on its own simulated clock in both modes, so
    // bit timing does not depend on the host scheduler.
    let sensor_clock = SimClock::new();
    run(MonitorConfig::default(), &sensor_clock);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_drops_out_periodically() {
        let clock = SimClock::new();
        let mut environment = SimulatedEnvironment::new(&clock);
        environment.init().unwrap();

        for read in 1..=DHT_DROPOUT_EVERY {
            let result = environment.read();
            if read == DHT_DROPOUT_EVERY {
                assert!(result.unwrap_err().is_timeout());
            } else {
                let reading = result.unwrap();
                assert!((20..=32).contains(&reading.temperature));
            }
        }
    }

    #[test]
    fn particulate_skips_noise_and_rejects_corrupt_frames() {
        let mut particulate = SimulatedParticulate::new();

        for frame in 1..=SDS_CORRUPT_EVERY {
            let result = particulate.read();
            assert_eq!(result.is_err(), frame == SDS_CORRUPT_EVERY);
        }
    }

    #[test]
    fn ascii_render_has_panel_dimensions() {
        let mut display = panel();
        Pixel(Point::new(0, 0), BinaryColor::On)
            .draw(&mut display)
            .unwrap();

        let text = render_ascii(&display);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 32 + 2);
        assert!(lines[1].starts_with("|▀"));
    }
}
