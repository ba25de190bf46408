// Copyright (c) 2026 rezky_nightky

use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use crate::blur::BlurRadius;
use crate::error::{RainError, Result};
use crate::raster::Rgba;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GravityMode {
    /// Seeded skip/slow/accelerate phases; bigger drops speed up faster.
    #[default]
    NonLinear,
    /// Constant floor velocity.
    Linear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrailMode {
    #[default]
    None,
    /// Leave small static drops behind a falling one.
    Drops,
    /// Wipe a thin strip of sharp background just above the drop.
    Smudge,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReflectionMode {
    /// Miniature of the sharp background.
    #[default]
    Miniature,
    /// Miniature of the blurred background.
    BlurredMiniature,
    /// Solid `fill_color`, no sampling.
    Fill,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RainOptions {
    pub opacity: f32,
    pub blur_radius: u32,
    pub gravity_enabled: bool,
    pub gravity_mode: GravityMode,
    pub collisions_enabled: bool,
    /// Drops at or below this radius are drawn once and never move.
    pub gravity_threshold: f32,
    /// Radians; `PI / 2` falls straight down.
    pub gravity_angle: f32,
    pub gravity_angle_variance: f32,
    pub reflection_scaledown_factor: f32,
    pub reflection_map_width: f32,
    pub reflection_map_height: f32,
    pub fps: f32,
    pub trail: TrailMode,
    pub reflection: ReflectionMode,
    pub fill_color: Rgba,
    pub spawn_interval: Duration,
}

impl Default for RainOptions {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blur_radius: 10,
            gravity_enabled: true,
            gravity_mode: GravityMode::NonLinear,
            collisions_enabled: true,
            gravity_threshold: 3.0,
            gravity_angle: FRAC_PI_2,
            gravity_angle_variance: 0.0,
            reflection_scaledown_factor: 5.0,
            reflection_map_width: 50.0,
            reflection_map_height: 50.0,
            fps: 30.0,
            trail: TrailMode::None,
            reflection: ReflectionMode::Miniature,
            fill_color: Rgba::rgb(0x8e, 0xd6, 0xff),
            spawn_interval: Duration::ZERO,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> RainError {
    RainError::InvalidOption {
        name,
        reason: reason.into(),
    }
}

fn require_range(name: &'static str, v: f32, min: f32, max: f32) -> Result<()> {
    if !v.is_finite() {
        return Err(invalid(name, format!("{v} is not a finite number")));
    }
    if v < min || v > max {
        return Err(invalid(name, format!("{v} (min {min} max {max})")));
    }
    Ok(())
}

fn require_positive(name: &'static str, v: f32) -> Result<()> {
    if !(v.is_finite() && v > 0.0) {
        return Err(invalid(name, format!("{v} (must be > 0)")));
    }
    Ok(())
}

impl RainOptions {
    pub fn validate(&self) -> Result<BlurRadius> {
        require_range("opacity", self.opacity, 0.0, 1.0)?;
        let radius = BlurRadius::new(self.blur_radius)?;
        require_range("gravity_threshold", self.gravity_threshold, 0.0, f32::MAX)?;
        if !self.gravity_angle.is_finite() {
            return Err(invalid("gravity_angle", "must be a finite number"));
        }
        require_range(
            "gravity_angle_variance",
            self.gravity_angle_variance,
            0.0,
            1.0,
        )?;
        require_positive(
            "reflection_scaledown_factor",
            self.reflection_scaledown_factor,
        )?;
        require_positive("reflection_map_width", self.reflection_map_width)?;
        require_positive("reflection_map_height", self.reflection_map_height)?;
        require_positive("fps", self.fps)?;
        Ok(radius)
    }

    /// Velocity a drop starts with and snaps back to while skipping.
    pub fn floor_velocity(&self) -> (f32, f32) {
        let y = self.fps * 0.001 / 25.0;
        let x = (FRAC_PI_2 - self.gravity_angle) * self.fps * 0.001 / 50.0;
        (x, y)
    }
}

/// Most drops a single preset spawns in one tick.
pub const MAX_DROPS_PER_TICK: usize = 4096;

/// Spawn rule: radius range plus either a per-tick count or a per-tick chance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preset {
    pub min_radius: f32,
    pub radius_variance: f32,
    /// `> 1`: drops per tick, rounded up and capped at
    /// [`MAX_DROPS_PER_TICK`]; `(0, 1]`: probability of one drop per tick.
    pub rate: f32,
    /// `None` never runs out.
    pub remaining: Option<u32>,
}

impl Preset {
    pub fn new(min_radius: f32, radius_variance: f32, rate: f32) -> Self {
        Self {
            min_radius,
            radius_variance,
            rate,
            remaining: None,
        }
    }

    pub fn limited(mut self, spawns: u32) -> Self {
        self.remaining = Some(spawns);
        self
    }

    pub fn max_radius(&self) -> f32 {
        self.min_radius + self.radius_variance
    }

    /// Fixed number of drops per tick, or `None` for a probabilistic preset.
    pub fn count(&self) -> Option<usize> {
        if self.rate > 1.0 {
            Some((self.rate.ceil() as usize).min(MAX_DROPS_PER_TICK))
        } else {
            None
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        let bad = |reason: String| RainError::InvalidPreset { index, reason };
        if !(self.min_radius.is_finite() && self.min_radius > 0.0) {
            return Err(bad(format!("min radius {} must be > 0", self.min_radius)));
        }
        if !(self.radius_variance.is_finite() && self.radius_variance >= 0.0) {
            return Err(bad(format!(
                "radius variance {} must be >= 0",
                self.radius_variance
            )));
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(bad(format!("rate {} must be > 0", self.rate)));
        }
        Ok(())
    }
}
