//! Cat animation with the overall air quality caption.
//!
//! Each frame redraws the whole panel: a boxy cat with its tail flicking up
//! on odd frames and down on even ones, and "Air quality: <LEVEL>" on the
//! bottom row.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::Point;
use embedded_hal::delay::DelayNs;

use crate::config::MonitorConfig;
use crate::display::Display;
use crate::metrics::OverallQuality;
use crate::pages::constants::{CAPTION_COLUMN, CAPTION_ROW};

const CAPTION: &str = "Air quality: ";

const ON: BinaryColor = BinaryColor::On;

const BODY: (Point, Point) = (Point::new(44, 16), Point::new(84, 44));

const EARS: [(Point, Point); 4] = [
    (Point::new(48, 16), Point::new(52, 8)),
    (Point::new(52, 8), Point::new(56, 16)),
    (Point::new(72, 16), Point::new(76, 8)),
    (Point::new(76, 8), Point::new(80, 16)),
];

const EYES: [(Point, Point); 2] = [
    (Point::new(56, 24), Point::new(58, 26)),
    (Point::new(70, 24), Point::new(72, 26)),
];

const MOUTH: [Point; 3] = [Point::new(64, 28), Point::new(63, 29), Point::new(65, 29)];

const WHISKERS: [(Point, Point); 2] = [
    (Point::new(52, 28), Point::new(60, 28)),
    (Point::new(68, 28), Point::new(76, 28)),
];

const PAW_X: [i32; 4] = [54, 60, 68, 74];
const PAW_TOP: i32 = 44;
const PAW_BOTTOM: i32 = 48;

/// Tail base at the body's right edge.
const TAIL_BASE: Point = Point::new(84, 34);
const TAIL_TIP_UP: Point = Point::new(94, 22);
const TAIL_TIP_DOWN: Point = Point::new(94, 46);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatAnimation {
    frames: u8,
    frame_ms: u32,
}

impl CatAnimation {
    pub fn new(frames: u8, frame_ms: u32) -> Self {
        Self {
            frames: frames.max(1),
            frame_ms,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.animation_frames, config.animation_frame_ms)
    }

    pub fn frames(&self) -> u8 {
        self.frames
    }

    /// Play every frame, flushing each and waiting `frame_ms` after it.
    pub fn play<D, T>(
        &self,
        display: &mut D,
        delay: &mut T,
        overall: OverallQuality,
    ) -> Result<(), D::Error>
    where
        D: Display,
        T: DelayNs,
    {
        for frame in 0..self.frames {
            draw_frame(display, frame, overall)?;
            display.flush()?;
            delay.delay_ms(self.frame_ms);
        }
        Ok(())
    }
}

impl Default for CatAnimation {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

/// Draw one frame onto a cleared panel. Does not flush.
pub fn draw_frame<D: Display>(
    display: &mut D,
    frame: u8,
    overall: OverallQuality,
) -> Result<(), D::Error> {
    display.clear()?;

    display.draw_rect(BODY.0, BODY.1, ON)?;
    for (start, end) in EARS {
        display.draw_line(start, end, ON)?;
    }
    for (top_left, bottom_right) in EYES {
        display.fill_rect(top_left, bottom_right, ON)?;
    }
    for point in MOUTH {
        display.draw_pixel(point, ON)?;
    }
    for (start, end) in WHISKERS {
        display.draw_line(start, end, ON)?;
    }
    for x in PAW_X {
        display.draw_line(Point::new(x, PAW_TOP), Point::new(x, PAW_BOTTOM), ON)?;
    }

    let tip = if frame & 1 == 1 {
        TAIL_TIP_UP
    } else {
        TAIL_TIP_DOWN
    };
    display.draw_line(TAIL_BASE, tip, ON)?;
    display.draw_line(tip, Point::new(tip.x, TAIL_BASE.y), ON)?;

    display.move_cursor(CAPTION_COLUMN, CAPTION_ROW)?;
    display.write_text(CAPTION)?;
    display.write_text(overall.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimDelay, TextGridDisplay};

    #[test]
    fn frame_draws_cat_and_caption() {
        let mut display = TextGridDisplay::new();

        draw_frame(&mut display, 0, OverallQuality::Normal).unwrap();

        assert_eq!(display.clears(), 1);
        assert_eq!(display.rects(), 1);
        assert_eq!(display.fills(), 2);
        assert_eq!(display.pixels(), 3);
        // ears, whiskers, paws, tail
        assert_eq!(display.lines().len(), 4 + 2 + 4 + 2);
        assert_eq!(display.row_text(7), "  Air quality: NORMAL");
    }

    #[test]
    fn tail_alternates_between_frames() {
        let mut display = TextGridDisplay::new();

        draw_frame(&mut display, 1, OverallQuality::Good).unwrap();
        assert!(display.lines().contains(&(TAIL_BASE, TAIL_TIP_UP)));
        assert!(!display.lines().contains(&(TAIL_BASE, TAIL_TIP_DOWN)));

        draw_frame(&mut display, 2, OverallQuality::Good).unwrap();
        assert!(display.lines().contains(&(TAIL_BASE, TAIL_TIP_DOWN)));
        assert!(!display.lines().contains(&(TAIL_BASE, TAIL_TIP_UP)));
    }

    #[test]
    fn play_runs_three_seconds_by_default() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        let mut display = TextGridDisplay::new();

        CatAnimation::default()
            .play(&mut display, &mut delay, OverallQuality::Bad)
            .unwrap();

        assert_eq!(display.clears(), 6);
        assert_eq!(display.flushes(), 6);
        assert_eq!(clock.now_ms(), 3000);
        assert_eq!(display.row_text(7), "  Air quality: BAD");
    }
}
