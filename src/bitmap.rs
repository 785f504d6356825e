// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitmapError {
    #[error("Expected {expected} pixels for bitmap, got {actual}")]
    PixelCount { expected: usize, actual: usize },
}

/// In-memory bitmap of packed `0xAARRGGBB` pixels, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgbBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl ArgbBitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, BitmapError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(BitmapError::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u32) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: u32) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.pixels[index] = pixel;
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }

    /// Re-packs the pixels as `R, G, B, A` bytes with the bottom row first,
    /// which is the row order GL expects for a bottom-left origin.
    pub fn to_rgba_bottom_up(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.pixels.len() * 4); // 4 = RGBA
        for row in self.pixels.chunks(self.width.max(1) as usize).rev() {
            for &pixel in row {
                buffer.push(((pixel >> 16) & 0xFF) as u8);
                buffer.push(((pixel >> 8) & 0xFF) as u8);
                buffer.push((pixel & 0xFF) as u8);
                buffer.push(((pixel >> 24) & 0xFF) as u8);
            }
        }
        buffer
    }
}

impl From<&RgbaImage> for ArgbBitmap {
    fn from(image: &RgbaImage) -> Self {
        ArgbBitmap::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
        })
    }
}
