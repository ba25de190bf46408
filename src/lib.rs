// Copyright (c) 2026 rezky_nightky

//! Raindrops sliding down a pane of glass over a blurred background.
//!
//! [`Simulator`] is the engine: configure it with a surface size, options and
//! a background, load spawn presets, then call [`Simulator::step`] once per
//! frame with a [`Canvas`] to paint on.

pub mod blur;
pub mod collision;
pub mod drop;
pub mod error;
pub mod options;
pub mod raster;
pub mod reflection;
pub mod shape;
pub mod simulator;

pub use blur::{blur, BlurRadius, MAX_BLUR_RADIUS};
pub use collision::CollisionIndex;
pub use drop::{DropId, Raindrop, Velocity};
pub use error::{RainError, Result};
pub use options::{
    GravityMode, Preset, RainOptions, ReflectionMode, TrailMode, MAX_DROPS_PER_TICK,
};
pub use raster::{Canvas, Raster, Rect, Rgba};
pub use reflection::ReflectionSampler;
pub use shape::{Shape, Teardrop};
pub use simulator::{Simulator, StepStats};
