//! Display surface partitioning
//!
//! The TFT is a single 480x320 Rgb565 grid split by a fixed vertical
//! boundary into a camera region (left) and a telemetry panel (right).
//! Both renderers draw through a clipped view of their own region, so
//! neither can repaint pixels owned by the other.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Display width in pixels (landscape)
pub const DISPLAY_WIDTH: u32 = 480;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 320;

/// First column of the telemetry panel. Columns left of this belong to
/// the camera image.
pub const PANEL_SPLIT_X: i32 = 401;

/// Maximum intrinsic image width the camera region will accept
pub const MAX_IMAGE_WIDTH: u16 = 400;

/// Camera image region: columns 0..PANEL_SPLIT_X
pub fn camera_region() -> Rectangle {
    Rectangle::new(
        Point::zero(),
        Size::new(PANEL_SPLIT_X as u32, DISPLAY_HEIGHT),
    )
}

/// Telemetry panel region: columns PANEL_SPLIT_X..DISPLAY_WIDTH
pub fn panel_region() -> Rectangle {
    Rectangle::new(
        Point::new(PANEL_SPLIT_X, 0),
        Size::new(DISPLAY_WIDTH - PANEL_SPLIT_X as u32, DISPLAY_HEIGHT),
    )
}
