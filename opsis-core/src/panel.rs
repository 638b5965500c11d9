//! Telemetry side-panel renderer
//!
//! Redraws the right-hand region of the display after every inbound
//! broker message: clears the panel to black, then stacks five fixed
//! blocks top to bottom - Nozzle, Bed, Chamber, Progress, State. Each
//! block is a small cyan caption over a larger green-yellow value.
//!
//! All drawing goes through a view clipped to the panel region, so this
//! renderer can never repaint camera pixels.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::surface::{panel_region, PANEL_SPLIT_X};
use crate::telemetry::TelemetryState;

/// Caption color (TFT cyan)
const LABEL_COLOR: Rgb565 = Rgb565::CYAN;

/// Value color (TFT green-yellow, 0xB7E0)
const VALUE_COLOR: Rgb565 = Rgb565::new(22, 63, 0);

/// Chamber has no data source on this printer; the block keeps its layout
/// slot with a fixed placeholder.
const CHAMBER_PLACEHOLDER: &str = "00.0C";

/// Caption line height
const LABEL_HEIGHT: i32 = 10;

/// Value line height plus block gap
const VALUE_HEIGHT: i32 = 22;

/// Formatted on-screen value
pub type ValueText = heapless::String<36>;

/// Temperatures render with one decimal and a unit suffix
pub fn temp_text(celsius: f64) -> ValueText {
    let mut s = ValueText::new();
    let _ = write!(s, "{celsius:.1}C");
    s
}

/// Progress renders integer-truncated with a percent suffix
pub fn progress_text(percent: f64) -> ValueText {
    let mut s = ValueText::new();
    let _ = write!(s, "{}%", percent as i64);
    s
}

/// Redraw the whole telemetry panel from `state`.
///
/// Called once per inbound message, even when the message matched no
/// known topic; the panel then simply shows the prior values again.
pub fn draw_panel<D>(state: &TelemetryState, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let region = panel_region();
    let mut view = target.clipped(&region);
    view.fill_solid(&region, Rgb565::BLACK)?;

    let label_style = MonoTextStyle::new(&FONT_6X10, LABEL_COLOR);
    let value_style = MonoTextStyle::new(&FONT_10X20, VALUE_COLOR);
    let x = PANEL_SPLIT_X;
    let mut y = 0;

    let mut block = |view: &mut embedded_graphics::draw_target::Clipped<'_, D>,
                     label: &str,
                     value: &str|
     -> Result<(), D::Error> {
        Text::with_baseline(label, Point::new(x, y), label_style, Baseline::Top)
            .draw(&mut *view)?;
        y += LABEL_HEIGHT;
        Text::with_baseline(value, Point::new(x, y), value_style, Baseline::Top)
            .draw(&mut *view)?;
        y += VALUE_HEIGHT;
        Ok(())
    };

    block(&mut view, "Nozzle", &temp_text(state.tool_temp))?;
    block(&mut view, "Bed", &temp_text(state.bed_temp))?;
    block(&mut view, "Chamber", CHAMBER_PLACEHOLDER)?;
    block(&mut view, "Progress", &progress_text(state.progress))?;
    block(&mut view, "State", state.state.as_str())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use crate::telemetry::{TelemetryState, TopicSet};
    use crate::testutil::Framebuffer;

    #[test]
    fn value_formatting_matches_the_panel_contract() {
        assert_eq!(temp_text(215.34).as_str(), "215.3C");
        assert_eq!(temp_text(0.0).as_str(), "0.0C");
        assert_eq!(progress_text(42.5).as_str(), "42%");
        assert_eq!(progress_text(99.9).as_str(), "99%");
        assert_eq!(progress_text(100.0).as_str(), "100%");
    }

    #[test]
    fn panel_draw_stays_right_of_the_split() {
        let mut fb = Framebuffer::new();
        fb.fill_all(Rgb565::RED); // sentinel in the camera region

        let state = TelemetryState::default();
        draw_panel(&state, &mut fb).unwrap();

        // Camera region untouched
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..PANEL_SPLIT_X as u32 {
                assert_eq!(fb.get(x, y), Rgb565::RED, "camera pixel ({x},{y}) repainted");
            }
        }
        // Panel background cleared
        assert_eq!(fb.get(PANEL_SPLIT_X as u32 + 1, DISPLAY_HEIGHT - 1), Rgb565::BLACK);
    }

    #[test]
    fn panel_draw_paints_captions_and_values() {
        let mut fb = Framebuffer::new();
        let mut state = TelemetryState::default();
        let topics = TopicSet {
            nozzle: "n".into(),
            bed: "b".into(),
            progress: "p".into(),
            state: "s".into(),
        };
        state.apply(&topics, "n", b"215.0");
        state.apply(&topics, "p", b"42.5");

        draw_panel(&state, &mut fb).unwrap();

        assert!(fb.count(LABEL_COLOR) > 0, "no caption pixels drawn");
        assert!(fb.count(VALUE_COLOR) > 0, "no value pixels drawn");
        // Everything non-background sits in the panel region
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if x < PANEL_SPLIT_X as u32 {
                    assert_eq!(fb.get(x, y), Rgb565::BLACK);
                }
            }
        }
    }

    #[test]
    fn redraw_after_ignored_message_shows_prior_values() {
        let mut fb_before = Framebuffer::new();
        let mut fb_after = Framebuffer::new();
        let topics = TopicSet {
            nozzle: "n".into(),
            bed: "b".into(),
            progress: "p".into(),
            state: "s".into(),
        };
        let mut state = TelemetryState::default();
        state.apply(&topics, "b", b"60.0");

        draw_panel(&state, &mut fb_before).unwrap();
        assert_eq!(state.apply(&topics, "unknown/topic", b"1"), None);
        draw_panel(&state, &mut fb_after).unwrap();

        assert_eq!(fb_before, fb_after);
    }
}
