//! In-memory display surface for host tests

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::Pixel;

use crate::surface::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Full-size Rgb565 framebuffer implementing the `DrawTarget` contract,
/// including silently ignoring out-of-bounds pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Vec<Rgb565>,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; (DISPLAY_WIDTH * DISPLAY_HEIGHT) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb565 {
        self.pixels[(y * DISPLAY_WIDTH + x) as usize]
    }

    pub fn fill_all(&mut self, color: Rgb565) {
        self.pixels.fill(color);
    }

    /// Number of pixels currently holding `color`
    pub fn count(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|&&c| c == color).count()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Infallible>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < DISPLAY_WIDTH
                && (point.y as u32) < DISPLAY_HEIGHT
            {
                self.pixels[(point.y as u32 * DISPLAY_WIDTH + point.x as u32) as usize] = color;
            }
        }
        Ok(())
    }
}
