use image::{GrayImage, Luma, RgbaImage};

use crate::error::{ensure_area, Result};

/// A strict black-and-white raster.
///
/// Pixels are stored row-major; `true` is white (background), `false` is
/// black (a printed dot). Dimensions never change once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoRaster {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl MonoRaster {
    /// Build a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> bool,
    {
        ensure_area(width, height)?;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Ok(Self { width, height, pixels })
    }

    /// A raster of a single tone.
    pub fn filled(width: u32, height: u32, white: bool) -> Result<Self> {
        Self::from_fn(width, height, |_, _| white)
    }

    /// Binarize an already monochrome picture: red above 128 is white.
    pub fn from_rgba(img: &RgbaImage) -> Result<Self> {
        Self::from_fn(img.width(), img.height(), |x, y| img.get_pixel(x, y)[0] > 128)
    }

    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<bool>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `true` when the pixel is white. Panics when out of bounds, like
    /// `ImageBuffer::get_pixel`.
    #[inline]
    pub fn is_white(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    /// Number of black pixels.
    pub fn ink_count(&self) -> usize {
        self.pixels.iter().filter(|white| !**white).count()
    }

    /// Flip the tone of every pixel.
    pub fn inverted(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|white| !white).collect(),
        }
    }

    /// Flip left-to-right.
    pub fn mirrored(&self) -> Self {
        let pixels = self
            .pixels
            .chunks_exact(self.width as usize)
            .flat_map(|row| row.iter().rev().copied())
            .collect();
        Self {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// 0/255 grey image for previews.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.is_white(x, y) { 255 } else { 0 }])
        })
    }
}
