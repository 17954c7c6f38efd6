//! Character-cell display interface used by the screens.
//!
//! Screens address the panel as a grid of 6x8 character cells for text and
//! as raw pixel coordinates for primitives. Drawing may be buffered: nothing
//! is guaranteed to reach the panel until [`Display::flush`].

use core::fmt::Debug;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::Point;

pub const DISPLAY_WIDTH_PX: u32 = 128;
pub const DISPLAY_HEIGHT_PX: u32 = 64;

pub const CELL_WIDTH_PX: u32 = 6;
pub const CELL_HEIGHT_PX: u32 = 8;

/// Character columns that fit fully on the panel.
pub const COLUMNS: u8 = (DISPLAY_WIDTH_PX / CELL_WIDTH_PX) as u8;
/// Character rows on the panel.
pub const ROWS: u8 = (DISPLAY_HEIGHT_PX / CELL_HEIGHT_PX) as u8;

pub trait Display {
    type Error: Debug;

    /// Blank the whole panel.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Place the text cursor at a character cell.
    fn move_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;

    /// Write text at the cursor, advancing it one cell per character.
    ///
    /// Text running past the right edge is clipped, not wrapped.
    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        for ch in text.chars() {
            self.write_char(ch)?;
        }
        Ok(())
    }

    fn write_char(&mut self, ch: char) -> Result<(), Self::Error>;

    fn draw_line(&mut self, start: Point, end: Point, color: BinaryColor)
    -> Result<(), Self::Error>;

    /// Outline the rectangle with the given inclusive corners.
    fn draw_rect(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: BinaryColor,
    ) -> Result<(), Self::Error>;

    /// Fill the rectangle with the given inclusive corners.
    fn fill_rect(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: BinaryColor,
    ) -> Result<(), Self::Error>;

    fn draw_pixel(&mut self, point: Point, color: BinaryColor) -> Result<(), Self::Error>;

    /// Push everything drawn so far to the panel.
    fn flush(&mut self) -> Result<(), Self::Error>;
}
