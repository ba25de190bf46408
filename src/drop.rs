// Copyright (c) 2026 rezky_nightky

use crate::raster::Rect;
use crate::shape::{Shape, Teardrop};

/// Rendered silhouettes are slightly smaller than the nominal radius; the
/// nominal value is what merges grow.
const SILHOUETTE_SCALE: f32 = 0.95;
const SMALL_DROP_RADIUS: f32 = 3.0;
const STREAK_SPEED: f32 = 2.0;
const RESTING_SCALE: f32 = 0.9;
const MERGE_GROWTH: f32 = 1.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DropId(pub(crate) u64);

impl DropId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Raindrop {
    pub x: f32,
    pub y: f32,
    pub r: f32,

    /// `None` until gravity first moves the drop.
    pub velocity: Option<Velocity>,
    pub seed: Option<i32>,
    pub skipping: bool,
    pub slowing: bool,

    /// Drop absorbed this frame; only consumed by the next draw.
    pub colliding: Option<DropId>,
    pub collided: bool,
    pub terminate: bool,

    pub trail_y: Option<f32>,
}

impl Raindrop {
    pub fn new(x: f32, y: f32, r: f32) -> Self {
        Self {
            x,
            y,
            r,
            velocity: None,
            seed: None,
            skipping: false,
            slowing: false,
            colliding: None,
            collided: false,
            terminate: false,
            trail_y: None,
        }
    }

    pub fn yspeed(&self) -> f32 {
        self.velocity.map(|v| v.y).unwrap_or(0.0)
    }

    /// Area the drop may have painted, with the extra pixel of slack the
    /// renderer needs for anti-aliased edges.
    pub fn footprint(&self) -> Rect {
        Rect::new(
            self.x - self.r - 1.0,
            self.y - self.r - 2.0,
            2.0 * self.r + 2.0,
            2.0 * self.r + 2.0,
        )
    }

    /// Drops only leave through the bottom or the sides.
    pub fn is_outside(&self, width: f32, height: f32) -> bool {
        self.y - self.r > height || self.x - self.r > width || self.x + self.r < 0.0
    }

    pub fn overlaps(&self, other: &Raindrop) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt() < self.r + other.r
    }

    /// Absorb `higher`: grow past the larger of the two radii and slide onto
    /// its column.
    pub fn absorb(&mut self, higher_id: DropId, higher: &Raindrop) {
        self.r = MERGE_GROWTH * self.r.max(higher.r);
        self.x += higher.x - self.x;
        self.colliding = Some(higher_id);
        self.collided = true;
    }

    pub fn silhouette(&self) -> Shape {
        let r = SILHOUETTE_SCALE * self.r;
        let yspeed = self.yspeed();
        if r < SMALL_DROP_RADIUS {
            Shape::circle(self.x, self.y, r)
        } else if self.colliding.is_some() || yspeed > STREAK_SPEED {
            let yr = 1.0 + 0.1 * yspeed;
            Shape::Teardrop(Teardrop::new(self.x, self.y, r, yr))
        } else {
            Shape::circle(self.x, self.y, r * RESTING_SCALE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silhouette_leaves_nominal_radius_alone() {
        let mut d = Raindrop::new(50.0, 50.0, 6.0);
        d.velocity = Some(Velocity { x: 0.0, y: 3.0 });
        let before = d.clone();
        let _ = d.silhouette();
        assert_eq!(d, before);
    }

    #[test]
    fn silhouette_picks_shape_by_size_and_speed() {
        let small = Raindrop::new(0.0, 0.0, 2.0);
        assert!(matches!(small.silhouette(), Shape::Circle { r, .. } if (r - 1.9).abs() < 1e-5));

        let mut resting = Raindrop::new(0.0, 0.0, 10.0);
        resting.velocity = Some(Velocity { x: 0.0, y: 0.5 });
        assert!(
            matches!(resting.silhouette(), Shape::Circle { r, .. } if (r - 8.55).abs() < 1e-4)
        );

        let mut falling = resting.clone();
        falling.velocity = Some(Velocity { x: 0.0, y: 2.5 });
        assert!(matches!(falling.silhouette(), Shape::Teardrop(_)));

        let mut merged = resting.clone();
        merged.colliding = Some(DropId(7));
        assert!(matches!(merged.silhouette(), Shape::Teardrop(_)));
    }

    #[test]
    fn out_of_bounds_only_past_bottom_or_sides() {
        let h = 100.0;
        let w = 200.0;
        assert!(!Raindrop::new(10.0, -8.0, 3.0).is_outside(w, h));
        assert!(Raindrop::new(10.0, 104.0, 3.0).is_outside(w, h));
        assert!(Raindrop::new(204.0, 50.0, 3.0).is_outside(w, h));
        assert!(Raindrop::new(-4.0, 50.0, 3.0).is_outside(w, h));
        assert!(!Raindrop::new(-2.0, 50.0, 3.0).is_outside(w, h));
    }

    #[test]
    fn absorb_grows_and_moves_onto_higher_drop() {
        let mut lower = Raindrop::new(10.0, 40.0, 5.0);
        let higher = Raindrop::new(12.0, 35.0, 3.0);
        lower.absorb(DropId(2), &higher);
        assert!((lower.r - 5.005).abs() < 1e-5);
        assert_eq!(lower.x, 12.0);
        assert_eq!(lower.colliding, Some(DropId(2)));
        assert!(lower.collided);
    }
}
