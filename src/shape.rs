// Copyright (c) 2026 rezky_nightky

//! Drop silhouettes used as clip regions when painting reflections.

use crate::raster::Rect;

const CURVE_SEGMENTS: usize = 12;

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle { cx: f32, cy: f32, r: f32 },
    Teardrop(Teardrop),
}

impl Shape {
    pub fn circle(cx: f32, cy: f32, r: f32) -> Self {
        Shape::Circle { cx, cy, r }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Circle { cx, cy, r } => Rect::new(cx - r, cy - r, 2.0 * r, 2.0 * r),
            Shape::Teardrop(t) => t.bounds,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Shape::Circle { cx, cy, r } => {
                let dx = x - cx;
                let dy = y - cy;
                dx * dx + dy * dy <= r * r
            }
            Shape::Teardrop(t) => t.contains(x, y),
        }
    }
}

/// Closed outline made of two cubic curves meeting at the drop's waist.
///
/// The upper curve bulges to `2r` above the centre, the lower one stretches
/// by `yr` below it, so faster drops read as longer streaks.
#[derive(Clone, Debug, PartialEq)]
pub struct Teardrop {
    outline: Vec<[f32; 2]>,
    bounds: Rect,
}

impl Teardrop {
    pub fn new(cx: f32, cy: f32, r: f32, yr: f32) -> Self {
        let left = [cx - r / yr, cy];
        let right = [cx + r / yr, cy];

        let mut outline = Vec::with_capacity(2 * CURVE_SEGMENTS + 1);
        outline.push(left);
        flatten_cubic(
            &mut outline,
            left,
            [cx - r, cy - r * 2.0],
            [cx + r, cy - r * 2.0],
            right,
        );
        flatten_cubic(
            &mut outline,
            right,
            [cx + r, cy + yr * r],
            [cx - r, cy + yr * r],
            left,
        );

        let bounds = outline_bounds(&outline);
        Self { outline, bounds }
    }

    pub fn outline(&self) -> &[[f32; 2]] {
        &self.outline
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        if x < self.bounds.x
            || y < self.bounds.y
            || x > self.bounds.right()
            || y > self.bounds.bottom()
        {
            return false;
        }

        // even-odd crossing test
        let mut inside = false;
        let n = self.outline.len();
        let mut j = n - 1;
        for i in 0..n {
            let [xi, yi] = self.outline[i];
            let [xj, yj] = self.outline[j];
            if (yi > y) != (yj > y) {
                let cross = xj + (y - yj) * (xi - xj) / (yi - yj);
                if x < cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

fn flatten_cubic(out: &mut Vec<[f32; 2]>, p0: [f32; 2], p1: [f32; 2], p2: [f32; 2], p3: [f32; 2]) {
    for step in 1..=CURVE_SEGMENTS {
        let t = step as f32 / CURVE_SEGMENTS as f32;
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        out.push([
            a * p0[0] + b * p1[0] + c * p2[0] + d * p3[0],
            a * p0[1] + b * p1[1] + c * p2[1] + d * p3[1],
        ]);
    }
}

fn outline_bounds(points: &[[f32; 2]]) -> Rect {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for &[x, y] in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}
