//! Monochrome framebuffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// Packed 1-bit-per-pixel display, 64 columns by 32 rows, row-major.
///
/// The most significant bit of each byte is the leftmost pixel.
pub struct Display {
    buffer: Box<[u8; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            buffer: Box::new([0; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Display {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..]
    }

    /// Check whether the pixel at the given coordinate is illuminated.
    ///
    /// Coordinates wrap around the edges of the display.
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let i = (x % DISPLAY_WIDTH) + (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH;
        (self.buffer[i / 8] >> (7 - i % 8)) & 1 == 1
    }

    /// XOR a byte into the buffer, returning the bits that were switched off.
    #[inline(always)]
    fn xor_byte(&mut self, index: usize, bits: u8) -> u8 {
        let old = self.buffer[index];
        self.buffer[index] = old ^ bits;
        old & bits
    }

    /// XOR one 8-pixel sprite row onto the display.
    ///
    /// The row is placed at column `x % 64` of row `y % 32`. When the column
    /// isn't byte aligned, the sprite straddles two display bytes, and the
    /// second byte wraps around to the left edge of the same row.
    ///
    /// Returns `true` if any previously set pixel was erased.
    pub fn draw_row(&mut self, x: u8, y: u8, sprite: u8) -> bool {
        let row = (y as usize % DISPLAY_HEIGHT) * DISPLAY_WIDTH;
        let col = x as usize % DISPLAY_WIDTH;
        let shift = col % 8;

        let first = (col + row) / 8;
        let second = ((col + 7) % DISPLAY_WIDTH + row) / 8;

        // With an aligned column the second half is empty, and the index
        // falls on the first byte again which leaves it untouched.
        let high = sprite >> shift;
        let low = ((sprite as u16) << (8 - shift)) as u8;

        let erased = self.xor_byte(first, high) | self.xor_byte(second, low);
        erased != 0
    }

    /// Draw a sprite of `rows.len()` rows, starting at the given coordinate.
    ///
    /// Returns `true` if any row collided.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        rows.iter().enumerate().fold(false, |collision, (r, sprite)| {
            let y = (y as usize + r) as u8;
            self.draw_row(x, y, *sprite) | collision
        })
    }

    /// Export the framebuffer as one colour value per pixel.
    ///
    /// The target slice must hold at least `64 * 32` values.
    pub fn write_pixels(&self, pixels: &mut [u32], on: u32) {
        for (i, pixel) in pixels.iter_mut().take(DISPLAY_PIXEL_COUNT).enumerate() {
            let bit = (self.buffer[i / 8] >> (7 - i % 8)) & 1;
            *pixel = if bit == 1 { on } else { PIXEL_OFF };
        }
    }

    pub fn to_pixels(&self, on: u32) -> Vec<u32> {
        let mut pixels = vec![PIXEL_OFF; DISPLAY_PIXEL_COUNT];
        self.write_pixels(&mut pixels, on);
        pixels
    }

    /// Render the display as text, `#` for set pixels and `.` for clear.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.is_set(x, y) {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}
