// Copyright (c) 2026 rezky_nightky

//! Owned RGBA8 pixel buffers and the drawing surface the simulation paints on.

use crate::error::{RainError, Result};
use crate::shape::Shape;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        Rect::new(x, y, (r - x).max(0.0), (b - y).max(0.0))
    }

    /// Pixel columns/rows touched by this rect, clamped to `width x height`.
    /// Returns `(x0, y0, x1, y1)` with exclusive upper bounds.
    pub fn pixel_span(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if !(self.w > 0.0 && self.h > 0.0) {
            return None;
        }
        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let x1 = self.right().ceil().min(width as f32);
        let y1 = self.bottom().ceil().min(height as f32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let len = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(len * 4);
        for _ in 0..len {
            pixels.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RainError::RasterSize {
                width,
                height,
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

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        self.offset(x, y).map(|i| {
            let p = &self.pixels[i..i + 4];
            Rgba::new(p[0], p[1], p[2], p[3])
        })
    }

    pub fn put(&mut self, x: u32, y: u32, c: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i..i + 4].copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    pub fn fill(&mut self, c: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    /// Nearest pixel to a continuous coordinate, clamped to the raster edge.
    pub fn sample_nearest(&self, x: f32, y: f32) -> Rgba {
        if self.width == 0 || self.height == 0 {
            return Rgba::TRANSPARENT;
        }
        let sx = (x.floor().max(0.0) as u32).min(self.width - 1);
        let sy = (y.floor().max(0.0) as u32).min(self.height - 1);
        self.get(sx, sy).unwrap_or_default()
    }

    /// Nearest-neighbour resample to a new size.
    pub fn resized_nearest(&self, width: u32, height: u32) -> Raster {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = Raster::new(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        let sx = self.width as f32 / width.max(1) as f32;
        let sy = self.height as f32 / height.max(1) as f32;
        for y in 0..height {
            for x in 0..width {
                let c = self.sample_nearest((x as f32 + 0.5) * sx, (y as f32 + 0.5) * sy);
                out.put(x, y, c);
            }
        }
        out
    }

    /// Source-over composite of `top`, with its alpha scaled by `opacity`.
    pub fn composite(&mut self, top: &Raster, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        let w = self.width.min(top.width);
        let h = self.height.min(top.height);
        for y in 0..h {
            for x in 0..w {
                let (Some(t), Some(b)) = (top.get(x, y), self.get(x, y)) else {
                    continue;
                };
                let ta = t.a as f32 / 255.0 * opacity;
                if ta <= 0.0 {
                    continue;
                }
                let ba = b.a as f32 / 255.0;
                let oa = ta + ba * (1.0 - ta);
                let mix = |tc: u8, bc: u8| -> u8 {
                    let v = (tc as f32 * ta + bc as f32 * ba * (1.0 - ta)) / oa;
                    v.round().clamp(0.0, 255.0) as u8
                };
                self.put(
                    x,
                    y,
                    Rgba::new(
                        mix(t.r, b.r),
                        mix(t.g, b.g),
                        mix(t.b, b.b),
                        (oa * 255.0).round() as u8,
                    ),
                );
            }
        }
    }
}

/// Drawing surface handed to the simulation each step.
///
/// The host owns the surface; the simulation only issues these intents.
pub trait Canvas {
    fn size(&self) -> (u32, u32);

    /// Reset the covered pixels to fully transparent.
    fn clear_rect(&mut self, rect: Rect);

    /// Paint `src` of `source` scaled onto `dst`, restricted to `clip`.
    fn draw_clipped(&mut self, clip: &Shape, source: &Raster, src: Rect, dst: Rect);

    fn fill_clipped(&mut self, clip: &Shape, color: Rgba);

    /// Copy `rect` unscaled from `source` at the same position.
    fn copy_region(&mut self, source: &Raster, rect: Rect);
}

impl Canvas for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = rect.pixel_span(self.width, self.height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, Rgba::TRANSPARENT);
            }
        }
    }

    fn draw_clipped(&mut self, clip: &Shape, source: &Raster, src: Rect, dst: Rect) {
        if !(dst.w > 0.0 && dst.h > 0.0) {
            return;
        }
        let area = dst.intersect(&clip.bounds());
        let Some((x0, y0, x1, y1)) = area.pixel_span(self.width, self.height) else {
            return;
        };
        for y in y0..y1 {
            let cy = y as f32 + 0.5;
            for x in x0..x1 {
                let cx = x as f32 + 0.5;
                if !clip.contains(cx, cy) {
                    continue;
                }
                let u = (cx - dst.x) / dst.w;
                let v = (cy - dst.y) / dst.h;
                let c = source.sample_nearest(src.x + u * src.w, src.y + v * src.h);
                self.put(x, y, c);
            }
        }
    }

    fn fill_clipped(&mut self, clip: &Shape, color: Rgba) {
        let Some((x0, y0, x1, y1)) = clip.bounds().pixel_span(self.width, self.height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                if clip.contains(x as f32 + 0.5, y as f32 + 0.5) {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn copy_region(&mut self, source: &Raster, rect: Rect) {
        let Some((x0, y0, x1, y1)) = rect.pixel_span(self.width, self.height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(c) = source.get(x, y) {
                    self.put(x, y, c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_wrong_length() {
        let err = Raster::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, RainError::RasterSize { expected: 16, .. }));
    }

    #[test]
    fn clear_rect_clamps_to_bounds() {
        let mut r = Raster::filled(4, 4, Rgba::rgb(9, 9, 9));
        r.clear_rect(Rect::new(-2.0, -2.0, 3.5, 3.5));
        assert_eq!(r.get(0, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(r.get(1, 1), Some(Rgba::TRANSPARENT));
        assert_eq!(r.get(2, 2), Some(Rgba::rgb(9, 9, 9)));
    }

    #[test]
    fn draw_clipped_only_touches_pixels_inside_clip() {
        let source = Raster::filled(2, 2, Rgba::rgb(200, 10, 10));
        let mut canvas = Raster::new(20, 20);
        let clip = Shape::circle(10.0, 10.0, 3.0);
        canvas.draw_clipped(
            &clip,
            &source,
            Rect::new(0.0, 0.0, 2.0, 2.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
        );
        assert_eq!(canvas.get(10, 10), Some(Rgba::rgb(200, 10, 10)));
        assert_eq!(canvas.get(5, 5), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn composite_respects_opacity() {
        let mut bottom = Raster::filled(1, 1, Rgba::rgb(0, 0, 0));
        let top = Raster::filled(1, 1, Rgba::rgb(200, 200, 200));
        bottom.composite(&top, 0.5);
        assert_eq!(bottom.get(0, 0), Some(Rgba::rgb(100, 100, 100)));
    }

    #[test]
    fn resized_nearest_keeps_solid_colour() {
        let r = Raster::filled(10, 6, Rgba::rgb(1, 2, 3));
        let small = r.resized_nearest(3, 2);
        assert_eq!((small.width(), small.height()), (3, 2));
        assert!(small.pixels().chunks_exact(4).all(|p| p == [1, 2, 3, 255]));
    }
}
