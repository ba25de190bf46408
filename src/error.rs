// Copyright (c) 2026 rezky_nightky

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RainError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RainError {
    #[error("blur radius {0} is out of range (max 254)")]
    InvalidBlurRadius(u32),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("preset {index} is invalid: {reason}")]
    InvalidPreset { index: usize, reason: String },

    #[error("at least one preset is required")]
    NoPresets,

    #[error("unusable surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    #[error("raster buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    RasterSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("simulation has not been configured")]
    NotConfigured,

    #[error("no presets have been loaded")]
    PresetsNotLoaded,
}
