// Copyright (c) 2026 rezky_nightky

//! Procedural backdrop: a dusk sky over a skyline with lit windows.

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use rainpane::{Raster, Rgba};

const SKY_TOP: (u8, u8, u8) = (18, 24, 58);
const SKY_HORIZON: (u8, u8, u8) = (236, 132, 84);
const BUILDING: Rgba = Rgba::rgb(22, 20, 32);
const WINDOW: Rgba = Rgba::rgb(255, 214, 120);

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

pub fn backdrop(width: u32, height: u32, rng: &mut impl Rng) -> Raster {
    let mut img = Raster::new(width, height);
    if width == 0 || height == 0 {
        return img;
    }

    for y in 0..height {
        let t = y as f32 / height.max(2).saturating_sub(1) as f32;
        let c = Rgba::rgb(
            lerp(SKY_TOP.0, SKY_HORIZON.0, t),
            lerp(SKY_TOP.1, SKY_HORIZON.1, t),
            lerp(SKY_TOP.2, SKY_HORIZON.2, t),
        );
        for x in 0..width {
            img.put(x, y, c);
        }
    }

    let min_w = (width / 24).max(2);
    let Ok(widths) = Uniform::new_inclusive(min_w, min_w * 3) else {
        return img;
    };
    let Ok(heights) = Uniform::new_inclusive(height / 5, (height * 3 / 5).max(height / 5)) else {
        return img;
    };

    let mut x = 0;
    while x < width {
        let w = widths.sample(rng);
        let h = heights.sample(rng);
        let top = height.saturating_sub(h);
        for by in top..height {
            for bx in x..(x + w).min(width) {
                let window = (bx - x) % 3 == 1 && (by - top) % 3 == 1;
                let lit = window && rng.random_bool(0.35);
                img.put(bx, by, if lit { WINDOW } else { BUILDING });
            }
        }
        x += w + rng.random_range(0..=min_w);
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn backdrop_fills_requested_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let img = backdrop(80, 48, &mut rng);
        assert_eq!((img.width(), img.height()), (80, 48));
        assert!(img.pixels().chunks_exact(4).all(|p| p[3] == 255));
        // Sky at the top, skyline at the bottom.
        assert_ne!(img.get(0, 0), img.get(0, 47));
    }

    #[test]
    fn tiny_and_empty_sizes_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(backdrop(0, 0, &mut rng).width(), 0);
        let one = backdrop(1, 1, &mut rng);
        assert_eq!((one.width(), one.height()), (1, 1));
    }
}
