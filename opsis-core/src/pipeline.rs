//! Incremental JPEG decode/render pipeline
//!
//! Decodes the staged camera still and pushes it to the display as 16x16
//! pixel tiles through a render callback. The callback can stop decoding
//! early (image running off the bottom of the screen); tiles that overhang
//! the right edge are clipped by the `DrawTarget` contract, which ignores
//! out-of-bounds pixels.
//!
//! The image's intrinsic width is read from the header before any pixel
//! work; anything wider than the camera region is rejected without a
//! partial draw. Decoding is always 1:1, no downsampling.
//!
//! The pipeline holds no state across invocations. Every cycle is
//! independent and idempotent given the same buffer contents.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use jpeg_decoder::{Decoder, ImageInfo, PixelFormat};
use thiserror::Error;

use crate::surface::{DISPLAY_HEIGHT, MAX_IMAGE_WIDTH};

/// Tile edge length. Matches the largest JPEG MCU so a tile never spans
/// two decode units.
pub const TILE_SIZE: u32 = 16;

/// Whether the render callback wants more tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFlow {
    /// Decode and deliver the next tile
    Continue,
    /// Halt decoding immediately. Early exit, not an error.
    Stop,
}

/// One decoded pixel block. Not retained after the callback returns.
pub struct Tile<'a> {
    /// Origin within the image, which is also the draw origin
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Row-major Rgb565 pixels, `width * height` entries
    pub pixels: &'a [Rgb565],
}

/// Decode pipeline failures
#[derive(Debug, Error)]
pub enum PipelineError<E: core::fmt::Debug> {
    /// Header parse or entropy decode failure
    #[error("jpeg decode: {0}")]
    Jpeg(#[from] jpeg_decoder::Error),
    /// Intrinsic width exceeds the display-safe maximum. Size policy, no
    /// retry; the next cycle re-fetches and re-checks independently.
    #[error("image {width}px wide exceeds the {max}px camera region")]
    TooWide { width: u16, max: u16 },
    /// Pixel format the camera should never produce (CMYK etc.)
    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),
    /// Display surface rejected a write
    #[error("display write failed: {0:?}")]
    Draw(E),
}

/// Plain error alias for callers that never touch a display
pub type DecodeError = PipelineError<core::convert::Infallible>;

/// Decode `data` and emit tiles in row-major order until the callback
/// returns [`TileFlow::Stop`] or the image is exhausted.
///
/// Zero tiles are emitted if the header fails the width policy.
pub fn decode_tiles<E, F>(data: &[u8], mut emit: F) -> Result<(), PipelineError<E>>
where
    E: core::fmt::Debug,
    F: FnMut(&Tile<'_>) -> TileFlow,
{
    let mut decoder = Decoder::new(data);
    decoder.read_info()?;
    let info = match decoder.info() {
        Some(info) => info,
        // read_info succeeded, so the header is always present
        None => return Ok(()),
    };
    check_width(&info)?;

    let pixels = decoder.decode()?;
    let width = u32::from(info.width);
    let height = u32::from(info.height);
    let mut tile_buf = [Rgb565::BLACK; (TILE_SIZE * TILE_SIZE) as usize];

    let mut ty = 0u32;
    while ty < height {
        let th = TILE_SIZE.min(height - ty);
        let mut tx = 0u32;
        while tx < width {
            let tw = TILE_SIZE.min(width - tx);
            fill_tile(
                &mut tile_buf,
                &pixels,
                info.pixel_format,
                width,
                tx,
                ty,
                tw,
                th,
            )?;
            let tile = Tile {
                x: tx as i32,
                y: ty as i32,
                width: tw,
                height: th,
                pixels: &tile_buf[..(tw * th) as usize],
            };
            if emit(&tile) == TileFlow::Stop {
                return Ok(());
            }
            tx += TILE_SIZE;
        }
        ty += TILE_SIZE;
    }
    Ok(())
}

/// Decode `data` and render it into the camera region of `target`.
///
/// This is the only place that touches the display on behalf of the
/// pipeline: it stops once tiles pass the bottom of the display and
/// relies on the draw target to right-clip overhanging tiles.
pub fn render_jpeg<D>(data: &[u8], target: &mut D) -> Result<(), PipelineError<D::Error>>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: core::fmt::Debug,
{
    let mut draw_error = None;
    decode_tiles(data, |tile| {
        if tile.y >= DISPLAY_HEIGHT as i32 {
            return TileFlow::Stop;
        }
        let area = Rectangle::new(
            Point::new(tile.x, tile.y),
            Size::new(tile.width, tile.height),
        );
        match target.fill_contiguous(&area, tile.pixels.iter().copied()) {
            Ok(()) => TileFlow::Continue,
            Err(e) => {
                draw_error = Some(e);
                TileFlow::Stop
            }
        }
    })?;
    match draw_error {
        Some(e) => Err(PipelineError::Draw(e)),
        None => Ok(()),
    }
}

/// Reject images wider than the camera region before any pixel decode
fn check_width<E: core::fmt::Debug>(info: &ImageInfo) -> Result<(), PipelineError<E>> {
    if info.width > MAX_IMAGE_WIDTH {
        return Err(PipelineError::TooWide {
            width: info.width,
            max: MAX_IMAGE_WIDTH,
        });
    }
    Ok(())
}

/// Convert one tile's worth of decoded pixels to Rgb565
#[allow(clippy::too_many_arguments)]
fn fill_tile<E: core::fmt::Debug>(
    out: &mut [Rgb565],
    pixels: &[u8],
    format: PixelFormat,
    image_width: u32,
    tx: u32,
    ty: u32,
    tw: u32,
    th: u32,
) -> Result<(), PipelineError<E>> {
    for row in 0..th {
        for col in 0..tw {
            let idx = ((ty + row) * image_width + tx + col) as usize;
            let color = match format {
                PixelFormat::RGB24 => {
                    let p = &pixels[idx * 3..idx * 3 + 3];
                    rgb565(p[0], p[1], p[2])
                }
                PixelFormat::L8 => {
                    let l = pixels[idx];
                    rgb565(l, l, l)
                }
                other => return Err(PipelineError::UnsupportedFormat(other)),
            };
            out[(row * tw + col) as usize] = color;
        }
    }
    Ok(())
}

fn rgb565(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::codecs::jpeg::JpegEncoder;
    use image::ExtendedColorType;

    /// Encode a flat-color RGB image to JPEG in memory
    fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![128u8; (width * height * 3) as usize];
        let mut out = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut out, 90);
        encoder
            .encode(&pixels, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn small_image_emits_full_tile_grid() {
        let data = test_jpeg(64, 48);
        let mut tiles = Vec::new();
        decode_tiles::<core::convert::Infallible, _>(&data, |t| {
            tiles.push((t.x, t.y, t.width, t.height));
            TileFlow::Continue
        })
        .unwrap();

        // 64/16 x 48/16 grid
        assert_eq!(tiles.len(), 4 * 3);
        assert_eq!(tiles[0], (0, 0, 16, 16));
        assert_eq!(*tiles.last().unwrap(), (48, 32, 16, 16));
        // Row-major order: y never decreases
        assert!(tiles.windows(2).all(|w| w[1].1 >= w[0].1));
    }

    #[test]
    fn edge_tiles_are_trimmed_to_image_bounds() {
        let data = test_jpeg(40, 20);
        let mut tiles = Vec::new();
        decode_tiles::<core::convert::Infallible, _>(&data, |t| {
            tiles.push((t.x, t.y, t.width, t.height));
            TileFlow::Continue
        })
        .unwrap();

        // Columns 16,16,8; rows 16,4
        assert!(tiles.contains(&(32, 0, 8, 16)));
        assert!(tiles.contains(&(0, 16, 16, 4)));
        assert!(tiles.contains(&(32, 16, 8, 4)));
    }

    #[test]
    fn stop_halts_decoding_immediately() {
        let data = test_jpeg(64, 64);
        let mut count = 0;
        decode_tiles::<core::convert::Infallible, _>(&data, |_| {
            count += 1;
            if count == 3 {
                TileFlow::Stop
            } else {
                TileFlow::Continue
            }
        })
        .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn too_wide_image_emits_zero_tiles() {
        let data = test_jpeg(401, 32);
        let mut count = 0;
        let err = decode_tiles::<core::convert::Infallible, _>(&data, |_| {
            count += 1;
            TileFlow::Continue
        })
        .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::TooWide { width: 401, max: 400 }
        ));
        assert_eq!(count, 0);
    }

    #[test]
    fn width_at_limit_is_accepted() {
        let data = test_jpeg(400, 16);
        let mut count = 0;
        decode_tiles::<core::convert::Infallible, _>(&data, |_| {
            count += 1;
            TileFlow::Continue
        })
        .unwrap();
        assert_eq!(count, 25);
    }

    /// Draw target that records fill areas instead of pixels
    struct RecordingTarget {
        areas: Vec<Rectangle>,
    }

    impl OriginDimensions for RecordingTarget {
        fn size(&self) -> Size {
            Size::new(crate::surface::DISPLAY_WIDTH, DISPLAY_HEIGHT)
        }
    }

    impl DrawTarget for RecordingTarget {
        type Color = Rgb565;
        type Error = core::convert::Infallible;

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = embedded_graphics::Pixel<Rgb565>>,
        {
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, _colors: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Rgb565>,
        {
            self.areas.push(*area);
            Ok(())
        }
    }

    #[test]
    fn render_stops_at_the_bottom_of_the_display() {
        // 336 rows is 21 tile rows; the last one starts at y = 320
        let data = test_jpeg(64, 336);
        let mut target = RecordingTarget { areas: Vec::new() };

        render_jpeg(&data, &mut target).unwrap();

        // 4 columns x 20 rows land; the row past the bottom edge never draws
        assert_eq!(target.areas.len(), 4 * 20);
        assert!(target
            .areas
            .iter()
            .all(|a| a.top_left.y < DISPLAY_HEIGHT as i32));
    }

    #[test]
    fn garbage_data_is_a_decode_error() {
        let err = decode_tiles::<core::convert::Infallible, _>(&[0u8; 64], |_| TileFlow::Continue)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Jpeg(_)));
    }

    #[test]
    fn flat_color_survives_the_round_trip_roughly() {
        let data = test_jpeg(32, 32);
        let mut seen = None;
        decode_tiles::<core::convert::Infallible, _>(&data, |t| {
            seen = Some(t.pixels[0]);
            TileFlow::Stop
        })
        .unwrap();

        // 128,128,128 encodes near mid-gray; allow jpeg quantization slack
        let c = seen.unwrap();
        assert!((i32::from(c.r()) - 16).abs() <= 2, "r = {}", c.r());
        assert!((i32::from(c.g()) - 32).abs() <= 4, "g = {}", c.g());
        assert!((i32::from(c.b()) - 16).abs() <= 2, "b = {}", c.b());
    }
}
