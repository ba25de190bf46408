// Copyright (c) 2026 rezky_nightky

//! Stack blur: a linear-time box-blur approximation that replaces the
//! per-pixel division with a multiply and a shift.

use crate::error::{RainError, Result};
use crate::raster::Raster;

pub const MAX_BLUR_RADIUS: u32 = 254;

#[rustfmt::skip]
const MUL_TABLE: [u32; 255] = [
    512, 512, 456, 512, 328, 456, 335, 512, 405, 328, 271, 456, 388, 335, 292, 512,
    454, 405, 364, 328, 298, 271, 496, 456, 420, 388, 360, 335, 312, 292, 273, 512,
    482, 454, 428, 405, 383, 364, 345, 328, 312, 298, 284, 271, 259, 496, 475, 456,
    437, 420, 404, 388, 374, 360, 347, 335, 323, 312, 302, 292, 282, 273, 265, 512,
    497, 482, 468, 454, 441, 428, 417, 405, 394, 383, 373, 364, 354, 345, 337, 328,
    320, 312, 305, 298, 291, 284, 278, 271, 265, 259, 507, 496, 485, 475, 465, 456,
    446, 437, 428, 420, 412, 404, 396, 388, 381, 374, 367, 360, 354, 347, 341, 335,
    329, 323, 318, 312, 307, 302, 297, 292, 287, 282, 278, 273, 269, 265, 261, 512,
    505, 497, 489, 482, 475, 468, 461, 454, 447, 441, 435, 428, 422, 417, 411, 405,
    399, 394, 389, 383, 378, 373, 368, 364, 359, 354, 350, 345, 341, 337, 332, 328,
    324, 320, 316, 312, 309, 305, 301, 298, 294, 291, 287, 284, 281, 278, 274, 271,
    268, 265, 262, 259, 257, 507, 501, 496, 491, 485, 480, 475, 470, 465, 460, 456,
    451, 446, 442, 437, 433, 428, 424, 420, 416, 412, 408, 404, 400, 396, 392, 388,
    385, 381, 377, 374, 370, 367, 363, 360, 357, 354, 350, 347, 344, 341, 338, 335,
    332, 329, 326, 323, 320, 318, 315, 312, 310, 307, 304, 302, 299, 297, 294, 292,
    289, 287, 285, 282, 280, 278, 275, 273, 271, 269, 267, 265, 263, 261, 259,
];

// (first radius, shift) breakpoints; a radius uses the last entry not above it.
const SHG_BREAKS: [(u32, u32); 15] = [
    (0, 9),
    (1, 11),
    (2, 12),
    (3, 13),
    (5, 14),
    (7, 15),
    (11, 16),
    (15, 17),
    (22, 18),
    (31, 19),
    (45, 20),
    (63, 21),
    (90, 22),
    (127, 23),
    (181, 24),
];

/// A blur radius known to be inside the lookup tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlurRadius(u32);

impl BlurRadius {
    pub fn new(radius: u32) -> Result<Self> {
        if radius > MAX_BLUR_RADIUS {
            return Err(RainError::InvalidBlurRadius(radius));
        }
        Ok(Self(radius))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn multiplier(self) -> u64 {
        MUL_TABLE[self.0 as usize] as u64
    }

    fn shift(self) -> u32 {
        let idx = SHG_BREAKS.partition_point(|&(first, _)| first <= self.0);
        SHG_BREAKS[idx.saturating_sub(1)].1
    }
}

impl TryFrom<u32> for BlurRadius {
    type Error = RainError;

    fn try_from(radius: u32) -> Result<Self> {
        Self::new(radius)
    }
}

/// Blur the RGB channels of `raster` in place; alpha is left alone.
///
/// Rows are blurred first, then columns over the row-blurred data. Samples
/// past either end of a line clamp to the edge pixel.
pub fn blur(raster: &mut Raster, radius: BlurRadius) {
    if radius.get() < 1 || raster.width() == 0 || raster.height() == 0 {
        return;
    }

    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let mut ring = vec![[0u32; 3]; 2 * radius.get() as usize + 1];
    let pixels = raster.pixels_mut();

    for y in 0..height {
        blur_line(pixels, y * width, 1, width, radius, &mut ring);
    }
    for x in 0..width {
        blur_line(pixels, x, width, height, radius, &mut ring);
    }
}

/// One scanline of `len` pixels starting at pixel `start`, `stride` pixels apart.
fn blur_line(
    pixels: &mut [u8],
    start: usize,
    stride: usize,
    len: usize,
    radius: BlurRadius,
    ring: &mut [[u32; 3]],
) {
    let r = radius.get() as usize;
    let rp1 = r as u32 + 1;
    let sum_factor = rp1 * (rp1 + 1) / 2;
    let mul = radius.multiplier();
    let shg = radius.shift();
    let div = ring.len();
    let last = len - 1;

    let at = |i: usize| (start + i * stride) * 4;
    let read = |pixels: &[u8], i: usize| -> [u32; 3] {
        let o = at(i);
        [pixels[o] as u32, pixels[o + 1] as u32, pixels[o + 2] as u32]
    };

    let mut sum = [0u32; 3];
    let mut in_sum = [0u32; 3];
    let mut out_sum = [0u32; 3];

    let edge = read(&*pixels, 0);
    for c in 0..3 {
        out_sum[c] = rp1 * edge[c];
        sum[c] = sum_factor * edge[c];
    }
    for slot in ring.iter_mut().take(r + 1) {
        *slot = edge;
    }
    for i in 1..=r {
        let p = read(&*pixels, i.min(last));
        let weight = rp1 - i as u32;
        ring[r + i] = p;
        for c in 0..3 {
            sum[c] += p[c] * weight;
            in_sum[c] += p[c];
        }
    }

    let mut stack_in = 0usize;
    let mut stack_out = r + 1;
    for i in 0..len {
        let o = at(i);
        for c in 0..3 {
            let v = (sum[c] as u64 * mul) >> shg;
            pixels[o + c] = v.min(255) as u8;
        }

        for c in 0..3 {
            sum[c] -= out_sum[c];
            out_sum[c] -= ring[stack_in][c];
        }

        let p = read(&*pixels, (i + r + 1).min(last));
        ring[stack_in] = p;
        for c in 0..3 {
            in_sum[c] += p[c];
            sum[c] += in_sum[c];
        }
        stack_in = (stack_in + 1) % div;

        let leaving = ring[stack_out];
        for c in 0..3 {
            out_sum[c] += leaving[c];
            in_sum[c] -= leaving[c];
        }
        stack_out = (stack_out + 1) % div;
    }
}
