// Copyright (c) 2026 rezky_nightky

//! Drop reflections sampled from a down-scaled copy of the background.

use crate::drop::Raindrop;
use crate::options::{RainOptions, ReflectionMode};
use crate::raster::{Canvas, Raster, Rect, Rgba};
use crate::shape::Shape;

const DEST_INFLATE: f32 = 1.1;

#[derive(Clone, Debug)]
pub struct ReflectionSampler {
    map: Raster,
    scaledown: f32,
    map_width: f32,
    map_height: f32,
    mode: ReflectionMode,
    fill: Rgba,
}

/// Smaller of the two, ignoring a non-positive one; never returns a value <= 0.
fn positive_min(a: f32, b: f32) -> f32 {
    let v = match (a < b, a <= 0.0, b <= 0.0) {
        (true, true, _) => b,
        (true, false, _) => a,
        (false, _, true) => a,
        (false, _, false) => b,
    };
    if v > 0.0 {
        v
    } else {
        1.0
    }
}

impl ReflectionSampler {
    /// `sharp` and `blurred` must already be at surface size.
    pub fn new(sharp: &Raster, blurred: &Raster, opts: &RainOptions) -> Self {
        let f = opts.reflection_scaledown_factor;
        let source = match opts.reflection {
            ReflectionMode::BlurredMiniature => blurred,
            _ => sharp,
        };
        let map = if opts.reflection == ReflectionMode::Fill {
            Raster::new(1, 1)
        } else {
            let w = ((source.width() as f32 / f).floor() as u32).max(1);
            let h = ((source.height() as f32 / f).floor() as u32).max(1);
            source.resized_nearest(w, h)
        };
        Self {
            map,
            scaledown: f,
            map_width: opts.reflection_map_width,
            map_height: opts.reflection_map_height,
            mode: opts.reflection,
            fill: opts.fill_color,
        }
    }

    pub fn map(&self) -> &Raster {
        &self.map
    }

    pub fn mode(&self) -> ReflectionMode {
        self.mode
    }

    /// Source rectangle in the miniature and destination rectangle on the surface.
    pub fn sample(&self, drop: &Raindrop) -> (Rect, Rect) {
        let f = self.scaledown;
        let sx = ((drop.x - self.map_width) / f).max(0.0);
        let sy = ((drop.y - self.map_height) / f).max(0.0);
        let sw = positive_min(2.0 * self.map_width / f, self.map.width() as f32 - sx);
        let sh = positive_min(2.0 * self.map_height / f, self.map.height() as f32 - sy);

        let side = 2.0 * DEST_INFLATE * drop.r;
        let dx = (drop.x - DEST_INFLATE * drop.r).max(0.0);
        let dy = (drop.y - DEST_INFLATE * drop.r).max(0.0);
        (Rect::new(sx, sy, sw, sh), Rect::new(dx, dy, side, side))
    }

    pub fn paint(&self, canvas: &mut impl Canvas, clip: &Shape, drop: &Raindrop) {
        match self.mode {
            ReflectionMode::Fill => canvas.fill_clipped(clip, self.fill),
            ReflectionMode::Miniature | ReflectionMode::BlurredMiniature => {
                let (src, dst) = self.sample(drop);
                canvas.draw_clipped(clip, &self.map, src, dst);
            }
        }
    }
}
