//! Opsis - printer camera + telemetry display firmware
//!
//! Main firmware binary for ESP32 boards with a 480x320 SPI TFT.
//! Wires the ESP-IDF network stack and the display driver into the
//! board-agnostic loop from `opsis-core`.

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::info;

use opsis_core::app::App;
use opsis_core::config::Config;
use opsis_core::traits::NetworkLink;

mod broker;
mod camera;
mod net;
mod platform;
mod screen;

/// Embedded device configuration (compiled into firmware)
/// Edit opsis.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../opsis.toml");

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Opsis firmware starting...");

    let config = Config::parse(EMBEDDED_CONFIG)?;

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut display = screen::init(
        peripherals.spi2,
        peripherals.pins.gpio18,
        peripherals.pins.gpio23,
        peripherals.pins.gpio5,
        peripherals.pins.gpio2,
        peripherals.pins.gpio4,
    )?;
    info!("Display initialized");

    let network = net::EspNetwork::connect(peripherals.modem, sys_loop, nvs, &config.wifi)?;
    if let Some(addr) = network.local_addr() {
        info!("WiFi connected with IP address: {addr}");
    }

    let mut broker = broker::EspBroker::new(&config.broker);
    let mut camera = camera::EspCamera::new();
    let mut platform = platform::EspPlatform;
    let mut app = App::new(&config);

    info!("Entering main loop");
    app.run(
        &mut broker,
        &network,
        &mut camera,
        &mut platform,
        &mut display,
    );

    Ok(())
}
