#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use airq_core::config::MonitorConfig;
use airq_core::display_manager::DisplayManager;
use airq_core::framebuffer::FlushStyle;
use airq_core::monitor::Monitor;
use airq_core::sensors::{Dht11, Mq135, OpenDrainLine, Sds018};
use airq_firmware::serial::SDS018_BAUD;
use airq_firmware::{GasAdc, SerialPort};
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::prelude::{DrawTarget, Point};
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, Level, Output, OutputConfig, Pull};
use esp_hal::main;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::uart::{Config as UartConfig, Uart};
use log::info;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

const DISPLAY_WIDTH: u16 = 320;
const DISPLAY_HEIGHT: u16 = 240;

/// The 128x64 monochrome canvas is drawn at 2x, centered on the panel.
const CANVAS_SCALE: u32 = 2;
const CANVAS_ORIGIN: Point = Point::new(32, 56);

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "the framebuffer and display driver live on main's stack"
)]
#[main]
fn main() -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    let mut delay = Delay::new();

    info!("airq-rs starting");

    // DHT11: open-drain data line with the internal pull-up
    let mut dht_pin = Flex::new(peripherals.GPIO4);
    dht_pin.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    dht_pin.set_input_enable(true);
    dht_pin.set_output_enable(true);
    let dht = Dht11::new(OpenDrainLine::new(dht_pin), Delay::new());

    // SDS018: UART1 at 9600 baud. The sensor streams on its own; TX is wired
    // but never written.
    let uart = Uart::new(
        peripherals.UART1,
        UartConfig::default().with_baudrate(SDS018_BAUD),
    )
    .expect("Failed to initialize UART")
    .with_rx(peripherals.GPIO18)
    .with_tx(peripherals.GPIO17);
    let sds = Sds018::new(SerialPort::new(uart));

    // MQ135: analog output on GPIO1 (ADC1 channel 0)
    let mut adc_config = AdcConfig::new();
    let gas_pin = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
    let adc = Adc::new(peripherals.ADC1, adc_config);
    let gas = Mq135::new(GasAdc::new(adc, gas_pin));

    // Configure and initialize the display

    // 1. Configure SPI bus
    let spi_bus = Spi::new(peripherals.SPI2, SpiConfig::default())
        .expect("Failed to initialize SPI")
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);

    // 2. Create a dummy CS pin (we don't use hardware CS for this display)
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());

    // 3. Wrap the SPI bus as a SPI device (required by embedded-hal traits)
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).expect("CS pin is infallible");

    // 4. Set up DC (Data/Command) pin
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());

    // 5. Create a buffer for SPI batching (larger = faster, uses more RAM)
    let mut spi_buffer = [0u8; 512];

    // 6. Create display interface
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);

    // 7. Build and initialize the display driver
    let mut panel = MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .init(&mut delay)
        .expect("Failed to initialize display");
    panel
        .clear(Rgb565::BLACK)
        .expect("Failed to clear display");

    let style = FlushStyle::new(Rgb565::WHITE, Rgb565::BLACK)
        .with_origin(CANVAS_ORIGIN)
        .with_scale(CANVAS_SCALE);
    let mut display = DisplayManager::new(panel, style);

    info!("Peripherals initialized");

    let mut monitor = Monitor::new(gas, dht, sds, MonitorConfig::default());
    monitor.warm_up(&mut delay);
    monitor.run(&mut display, &mut delay)
}
