//! Monochrome framebuffer with per-pixel change detection.
//!
//! All screen drawing targets this RAM buffer instead of the panel. After a
//! screen is drawn, only the rectangular region containing changed pixels is
//! pushed to the hardware display in a single `fill_contiguous` call.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// One bit per pixel, row-major (128 x 64 / 8 = 1024 bytes).
const BUFFER_BYTES: usize = WIDTH * HEIGHT / 8;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Expand the dirty region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Create a new dirty rect covering a single pixel.
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }
}

/// Colors and placement used when pushing the buffer to a panel.
///
/// Each buffer pixel becomes a `scale` x `scale` block at `origin`, painted
/// `on` or `off`.
#[derive(Debug, Clone, Copy)]
pub struct FlushStyle<C> {
    pub on: C,
    pub off: C,
    pub origin: Point,
    pub scale: u32,
}

impl<C: PixelColor> FlushStyle<C> {
    pub const fn new(on: C, off: C) -> Self {
        Self {
            on,
            off,
            origin: Point::zero(),
            scale: 1,
        }
    }

    pub const fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Set the block size per pixel. Zero is treated as one.
    pub const fn with_scale(mut self, scale: u32) -> Self {
        self.scale = if scale == 0 { 1 } else { scale };
        self
    }
}

/// 128x64 1-bit framebuffer implementing `DrawTarget<Color = BinaryColor>`.
pub struct FrameBuffer {
    bits: [u8; BUFFER_BYTES],
    dirty: Option<DirtyRect>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// A blank buffer. The first flush repaints the whole panel.
    pub const fn new() -> Self {
        Self {
            bits: [0; BUFFER_BYTES],
            dirty: Some(DirtyRect {
                min_x: 0,
                min_y: 0,
                max_x: WIDTH - 1,
                max_y: HEIGHT - 1,
            }),
        }
    }

    #[inline]
    fn index(x: usize, y: usize) -> (usize, u8) {
        let bit = y * WIDTH + x;
        (bit / 8, 1 << (bit % 8))
    }

    /// Read back a pixel. Out-of-bounds points read as off.
    pub fn pixel(&self, point: Point) -> BinaryColor {
        if point.x < 0 || point.y < 0 || point.x as usize >= WIDTH || point.y as usize >= HEIGHT {
            return BinaryColor::Off;
        }
        let (byte, mask) = Self::index(point.x as usize, point.y as usize);
        if self.bits[byte] & mask != 0 {
            BinaryColor::On
        } else {
            BinaryColor::Off
        }
    }

    /// Whether anything changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (byte, mask) = Self::index(x, y);
        let was_on = self.bits[byte] & mask != 0;
        if was_on != color.is_on() {
            self.bits[byte] ^= mask;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Flush the dirty region to a hardware display, then reset the dirty state.
    ///
    /// Only the bounding rectangle of changed pixels is sent, scaled and
    /// placed by `style`. If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D, style: &FlushStyle<D::Color>) -> Result<(), D::Error>
    where
        D: DrawTarget,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let scale = style.scale.max(1) as usize;
        let width = rect.max_x - rect.min_x + 1;
        let height = rect.max_y - rect.min_y + 1;

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            width, height, rect.min_x, rect.min_y
        );

        let area = Rectangle::new(
            style.origin + Point::new((rect.min_x * scale) as i32, (rect.min_y * scale) as i32),
            Size::new((width * scale) as u32, (height * scale) as u32),
        );

        let (on, off) = (style.on, style.off);
        let bits = &self.bits;
        let pixel_iter = (rect.min_y * scale..=rect.max_y * scale + scale - 1).flat_map(move |sy| {
            (rect.min_x * scale..=rect.max_x * scale + scale - 1).map(move |sx| {
                let (byte, mask) = Self::index(sx / scale, sy / scale);
                if bits[byte] & mask != 0 { on } else { off }
            })
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
