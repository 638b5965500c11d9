//! SPI TFT bring-up
//!
//! ILI9486 panel, 480x320 in landscape. Pin mapping matches the common
//! ESP32 + 3.5" TFT wiring: SCLK 18, MOSI 23, CS 5, DC 2, RST 4.

use anyhow::anyhow;
use display_interface_spi::SPIInterface;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{Gpio2, Gpio4, Gpio5, Gpio18, Gpio23, Output, PinDriver};
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::config::{Config as SpiConfig, DriverConfig};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SPI2};
use mipidsi::models::ILI9486Rgb565;
use mipidsi::options::{ColorOrder, Orientation, Rotation};
use mipidsi::{Builder, Display};

pub type Screen = Display<
    SPIInterface<SpiDeviceDriver<'static, SpiDriver<'static>>, PinDriver<'static, Gpio2, Output>>,
    ILI9486Rgb565,
    PinDriver<'static, Gpio4, Output>,
>;

/// Bring the panel up and blank it
pub fn init(
    spi: SPI2,
    sclk: Gpio18,
    mosi: Gpio23,
    cs: Gpio5,
    dc: Gpio2,
    rst: Gpio4,
) -> anyhow::Result<Screen> {
    let device = SpiDeviceDriver::new_single(
        spi,
        sclk,
        mosi,
        None::<esp_idf_hal::gpio::AnyIOPin>,
        Some(cs),
        &DriverConfig::new(),
        &SpiConfig::new().baudrate(40.MHz().into()).write_only(true),
    )?;

    let dc = PinDriver::output(dc)?;
    let rst = PinDriver::output(rst)?;
    let di = SPIInterface::new(device, dc);

    let mut delay = Ets;
    let mut display = Builder::new(ILI9486Rgb565, di)
        .reset_pin(rst)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .color_order(ColorOrder::Bgr)
        .init(&mut delay)
        .map_err(|e| anyhow!("display init failed: {e:?}"))?;

    display
        .clear(Rgb565::BLACK)
        .map_err(|e| anyhow!("display clear failed: {e:?}"))?;

    Ok(display)
}
