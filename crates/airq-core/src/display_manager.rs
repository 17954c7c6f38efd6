//! Buffered [`Display`] implementation for any embedded-graphics panel.
//!
//! Screens draw into a [`FrameBuffer`] in RAM; [`Display::flush`] pushes the
//! changed region to the panel. Text uses the 5x8 ASCII font, whose glyph plus
//! one column of spacing fills a 6x8 cell. The background is opaque, so
//! writing over a cell replaces whatever was there.

use core::convert::Infallible;

use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder, ascii::FONT_5X8};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::display::{CELL_HEIGHT_PX, CELL_WIDTH_PX, Display};
use crate::framebuffer::{FlushStyle, FrameBuffer};

const TEXT_STYLE: MonoTextStyle<'static, BinaryColor> = MonoTextStyleBuilder::new()
    .font(&FONT_5X8)
    .text_color(BinaryColor::On)
    .background_color(BinaryColor::Off)
    .build();

/// Drawing into RAM cannot fail.
fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Rectangle spanning two inclusive corners, in either order.
fn corners_to_rect(a: Point, b: Point) -> Rectangle {
    Rectangle::with_corners(a, b)
}

pub struct DisplayManager<T>
where
    T: DrawTarget,
{
    framebuffer: FrameBuffer,
    target: T,
    style: FlushStyle<T::Color>,
    /// Cursor in character cells.
    cursor: (u8, u8),
}

impl<T> DisplayManager<T>
where
    T: DrawTarget,
{
    pub fn new(target: T, style: FlushStyle<T::Color>) -> Self {
        Self {
            framebuffer: FrameBuffer::new(),
            target,
            style,
            cursor: (0, 0),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn cursor(&self) -> (u8, u8) {
        self.cursor
    }

    fn cursor_point(&self) -> Point {
        Point::new(
            self.cursor.0 as i32 * CELL_WIDTH_PX as i32,
            self.cursor.1 as i32 * CELL_HEIGHT_PX as i32,
        )
    }
}

impl<T> Display for DisplayManager<T>
where
    T: DrawTarget,
    T::Error: core::fmt::Debug,
{
    type Error = T::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        infallible(self.framebuffer.clear(BinaryColor::Off));
        self.cursor = (0, 0);
        Ok(())
    }

    fn move_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        self.cursor = (col, row);
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        infallible(
            Text::with_baseline(text, self.cursor_point(), TEXT_STYLE, Baseline::Top)
                .draw(&mut self.framebuffer),
        );
        let cells = u8::try_from(text.chars().count()).unwrap_or(u8::MAX);
        self.cursor.0 = self.cursor.0.saturating_add(cells);
        Ok(())
    }

    fn write_char(&mut self, ch: char) -> Result<(), Self::Error> {
        let mut buf = [0u8; 4];
        self.write_text(ch.encode_utf8(&mut buf))
    }

    fn draw_line(
        &mut self,
        start: Point,
        end: Point,
        color: BinaryColor,
    ) -> Result<(), Self::Error> {
        infallible(
            Line::new(start, end)
                .into_styled(PrimitiveStyle::with_stroke(color, 1))
                .draw(&mut self.framebuffer),
        );
        Ok(())
    }

    fn draw_rect(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: BinaryColor,
    ) -> Result<(), Self::Error> {
        infallible(
            corners_to_rect(top_left, bottom_right)
                .into_styled(PrimitiveStyle::with_stroke(color, 1))
                .draw(&mut self.framebuffer),
        );
        Ok(())
    }

    fn fill_rect(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: BinaryColor,
    ) -> Result<(), Self::Error> {
        infallible(
            self.framebuffer
                .fill_solid(&corners_to_rect(top_left, bottom_right), color),
        );
        Ok(())
    }

    fn draw_pixel(&mut self, point: Point, color: BinaryColor) -> Result<(), Self::Error> {
        infallible(Pixel(point, color).draw(&mut self.framebuffer));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.framebuffer.flush(&mut self.target, &self.style)
    }
}
