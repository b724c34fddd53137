//! Error-diffusion dithering with fixed integer kernels.
//!
//! The working buffer holds integer grey levels. Each pixel is cut at the
//! threshold to 0 or 255, and `error * weight / divisor` (truncated toward
//! zero) is added to every neighbour the kernel names. Shares that fall
//! outside the raster are dropped.

use image::RgbaImage;
use log::debug;

use crate::color::gray_level;
use crate::error::{ensure_area, Result};
use crate::raster::MonoRaster;

/// One neighbour of the current pixel and its share of the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tap {
    pub dx: i32,
    pub dy: i32,
    pub weight: i32,
}

const fn tap(dx: i32, dy: i32, weight: i32) -> Tap {
    Tap { dx, dy, weight }
}

/// A diffusion kernel: neighbour taps sharing `weight / divisor` of the error.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub name: &'static str,
    pub divisor: i32,
    pub taps: &'static [Tap],
}

impl Kernel {
    pub fn weight_sum(&self) -> i32 {
        self.taps.iter().map(|t| t.weight).sum()
    }
}

pub const FLOYD_STEINBERG: Kernel = Kernel {
    name: "Floyd-Steinberg",
    divisor: 16,
    taps: &[tap(1, 0, 7), tap(-1, 1, 3), tap(0, 1, 5), tap(1, 1, 1)],
};

/// Six neighbours at 1/8 each; a quarter of the error is discarded.
pub const ATKINSON: Kernel = Kernel {
    name: "Atkinson",
    divisor: 8,
    taps: &[
        tap(1, 0, 1),
        tap(2, 0, 1),
        tap(-1, 1, 1),
        tap(0, 1, 1),
        tap(1, 1, 1),
        tap(0, 2, 1),
    ],
};

pub const JARVIS: Kernel = Kernel {
    name: "Jarvis-Judice-Ninke",
    divisor: 48,
    taps: &[
        tap(1, 0, 7),
        tap(2, 0, 5),
        tap(-2, 1, 3),
        tap(-1, 1, 5),
        tap(0, 1, 7),
        tap(1, 1, 5),
        tap(2, 1, 3),
        tap(-2, 2, 1),
        tap(-1, 2, 3),
        tap(0, 2, 5),
        tap(1, 2, 3),
        tap(2, 2, 1),
    ],
};

pub const STUCKI: Kernel = Kernel {
    name: "Stucki",
    divisor: 42,
    taps: &[
        tap(1, 0, 8),
        tap(2, 0, 4),
        tap(-2, 1, 2),
        tap(-1, 1, 4),
        tap(0, 1, 8),
        tap(1, 1, 4),
        tap(2, 1, 2),
        tap(-2, 2, 1),
        tap(-1, 2, 2),
        tap(0, 2, 4),
        tap(1, 2, 2),
        tap(2, 2, 1),
    ],
};

/// Burkes as the printer app ships it: the lower row is 1-2-4-2-1, so only
/// 24/32 of the error is passed on.
pub const BURKES: Kernel = Kernel {
    name: "Burkes",
    divisor: 32,
    taps: &[
        tap(1, 0, 8),
        tap(2, 0, 4),
        tap(-2, 1, 1),
        tap(-1, 1, 2),
        tap(0, 1, 4),
        tap(1, 1, 2),
        tap(2, 1, 1),
    ],
};

pub const SIERRA: Kernel = Kernel {
    name: "Sierra",
    divisor: 32,
    taps: &[
        tap(1, 0, 5),
        tap(2, 0, 3),
        tap(-2, 1, 2),
        tap(-1, 1, 4),
        tap(0, 1, 5),
        tap(1, 1, 4),
        tap(2, 1, 2),
        tap(-1, 2, 2),
        tap(0, 2, 3),
        tap(1, 2, 2),
    ],
};

pub const SIERRA_LITE: Kernel = Kernel {
    name: "Sierra Lite",
    divisor: 4,
    taps: &[tap(1, 0, 2), tap(-1, 1, 1), tap(0, 1, 1)],
};

/// Dither `img` with `kernel`.
///
/// `invert` only flips the written tone; the error is always computed
/// against the un-inverted decision.
pub fn error_diffusion(
    img: &RgbaImage,
    kernel: &Kernel,
    threshold: u8,
    invert: bool,
) -> Result<MonoRaster> {
    let (width, height) = img.dimensions();
    ensure_area(width, height)?;
    debug!(
        "{} dithering {}x{} threshold {}",
        kernel.name, width, height, threshold
    );

    let mut levels: Vec<i32> = img.pixels().map(gray_level).collect();
    let decisions = diffuse(
        &mut levels,
        width as usize,
        height as usize,
        kernel,
        threshold as i32,
    );
    let pixels = decisions.into_iter().map(|white| white ^ invert).collect();
    Ok(MonoRaster::from_pixels(width, height, pixels))
}

/// Quantize `levels` in row-major order, spreading error as it goes.
/// Returns `true` for every pixel cut to white.
fn diffuse(
    levels: &mut [i32],
    width: usize,
    height: usize,
    kernel: &Kernel,
    threshold: i32,
) -> Vec<bool> {
    let mut decisions = Vec::with_capacity(levels.len());
    for y in 0..height {
        for x in 0..width {
            let old = levels[y * width + x];
            let new = if old < threshold { 0 } else { 255 };
            decisions.push(new == 255);

            let error = old - new;
            if error == 0 {
                continue;
            }
            for t in kernel.taps {
                let nx = x as i64 + t.dx as i64;
                let ny = y + t.dy as usize;
                if nx < 0 || nx >= width as i64 || ny >= height {
                    continue;
                }
                levels[ny * width + nx as usize] += error * t.weight / kernel.divisor;
            }
        }
    }
    decisions
}
