// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::str::FromStr;

use clap::Parser;
use rainpane::{Preset, ReflectionMode, Rgba, TrailMode};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  rainpane --fps 30 --blur 10 --opacity 1 --threshold 3 --angle 90 --scaledown 5 --map-size 50,50 --spawn-ms 100 --preset 1,2,400,1 --preset 3,3,0.88 --preset 5,5,0.9 --preset 6,2,1";

/// Presets used when none are given: one sprinkle of static droplets, then
/// a steady mix of mid-sized falling drops.
pub const DEFAULT_PRESETS: [&str; 4] = ["1,2,400,1", "3,3,0.88", "5,5,0.9", "6,2,1"];

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_usage(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if let Some(rest) = line.strip_prefix("  rainpane") {
            out.push_str("  \x1b[1;34mrainpane\x1b[0m");
            out.push_str(rest);
        } else if line.ends_with(':') && line == line.to_ascii_uppercase() {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else {
            out.push_str(line);
        }
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_usage(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailArg {
    #[value(name = "none")]
    None,
    #[value(name = "drops")]
    Drops,
    #[value(name = "smudge")]
    Smudge,
}

impl From<TrailArg> for TrailMode {
    fn from(v: TrailArg) -> Self {
        match v {
            TrailArg::None => TrailMode::None,
            TrailArg::Drops => TrailMode::Drops,
            TrailArg::Smudge => TrailMode::Smudge,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionArg {
    #[value(name = "miniature")]
    Miniature,
    #[value(name = "blurred")]
    Blurred,
    #[value(name = "fill")]
    Fill,
}

impl From<ReflectionArg> for ReflectionMode {
    fn from(v: ReflectionArg) -> Self {
        match v {
            ReflectionArg::Miniature => ReflectionMode::Miniature,
            ReflectionArg::Blurred => ReflectionMode::BlurredMiniature,
            ReflectionArg::Fill => ReflectionMode::Fill,
        }
    }
}

/// `MIN,VAR,RATE[,COUNT]`; COUNT limits how many times the preset spawns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresetArg(pub Preset);

impl FromStr for PresetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err("expected: MIN,VAR,RATE[,COUNT]".to_string());
        }
        let num = |i: usize, what: &str| -> Result<f32, String> {
            parts[i]
                .parse::<f32>()
                .map_err(|_| format!("invalid {what} value: {}", parts[i]))
        };
        let preset = Preset::new(num(0, "min")?, num(1, "variance")?, num(2, "rate")?);
        let preset = match parts.get(3) {
            Some(count) => {
                let n: u32 = count
                    .parse()
                    .map_err(|_| format!("invalid count value: {count}"))?;
                preset.limited(n)
            }
            None => preset,
        };
        Ok(Self(preset))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapSize {
    pub width: f32,
    pub height: f32,
}

impl FromStr for MapSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| "expected: WIDTH,HEIGHT".to_string())?;
        let width: f32 = a
            .trim()
            .parse()
            .map_err(|_| "invalid width value".to_string())?;
        let height: f32 = b
            .trim()
            .parse()
            .map_err(|_| "invalid height value".to_string())?;
        if !(width > 0.0 && height > 0.0) {
            return Err("width and height must be > 0".to_string());
        }
        Ok(Self { width, height })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexColor(pub Rgba);

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err("expected: RRGGBB".to_string());
        }
        let v = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex colour: {s}"))?;
        Ok(Self(Rgba::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)))
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "rainpane", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed for the random source (default: from the OS)"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 30.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS, also drives the gravity constants (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "spawn-ms",
        default_value_t = 100,
        help_heading = "PERFORMANCE",
        help = "Minimum time between spawn rounds in ms (0 = every frame)"
    )]
    pub spawn_ms: u64,

    #[arg(
        short = 'p',
        long = "preset",
        help_heading = "RAIN",
        help = "Spawn preset MIN,VAR,RATE[,COUNT] (repeatable; RATE>1 is a count per round, <=1 a chance)"
    )]
    pub preset: Vec<PresetArg>,

    #[arg(
        long = "trail",
        default_value_t = TrailArg::None,
        value_enum,
        help_heading = "RAIN",
        help = "Trail left behind falling drops"
    )]
    pub trail: TrailArg,

    #[arg(
        long = "threshold",
        default_value_t = 3.0,
        help_heading = "GRAVITY",
        help = "Drops at or below this radius never move (min 0 max 1000)"
    )]
    pub threshold: f32,

    #[arg(
        long = "angle",
        default_value_t = 90.0,
        help_heading = "GRAVITY",
        help = "Direction of fall in degrees, 90 is straight down (min 0 max 180)"
    )]
    pub angle: f32,

    #[arg(
        long = "angle-variance",
        default_value_t = 0.0,
        help_heading = "GRAVITY",
        help = "Random sideways wobble (min 0 max 1)"
    )]
    pub angle_variance: f32,

    #[arg(long = "no-gravity", help_heading = "GRAVITY", help = "Keep every drop still")]
    pub no_gravity: bool,

    #[arg(
        long = "linear-gravity",
        help_heading = "GRAVITY",
        help = "Fall at a constant speed instead of stop-and-go"
    )]
    pub linear_gravity: bool,

    #[arg(
        long = "no-collisions",
        help_heading = "GRAVITY",
        help = "Let drops pass through each other"
    )]
    pub no_collisions: bool,

    #[arg(
        short = 'b',
        long = "blur",
        default_value_t = 10,
        help_heading = "GLASS",
        help = "Background blur radius (min 0 max 254)"
    )]
    pub blur: u32,

    #[arg(
        long = "opacity",
        default_value_t = 1.0,
        help_heading = "GLASS",
        help = "Opacity of the drop layer (min 0 max 1)"
    )]
    pub opacity: f32,

    #[arg(
        long = "reflection",
        default_value_t = ReflectionArg::Miniature,
        value_enum,
        help_heading = "REFLECTION",
        help = "What drops reflect"
    )]
    pub reflection: ReflectionArg,

    #[arg(
        long = "scaledown",
        default_value_t = 5.0,
        help_heading = "REFLECTION",
        help = "Reflection miniature scale-down factor (min 0.1 max 100)"
    )]
    pub scaledown: f32,

    #[arg(
        long = "map-size",
        default_value = "50,50",
        help_heading = "REFLECTION",
        help = "Area around a drop it reflects: WIDTH,HEIGHT in pixels"
    )]
    pub map_size: MapSize,

    #[arg(
        long = "fill-color",
        default_value = "8ED6FF",
        help_heading = "REFLECTION",
        help = "Colour used with --reflection fill (RRGGBB)"
    )]
    pub fill_color: HexColor,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit (TERM=...256color), else 16-color"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

impl Args {
    /// Presets from the command line, or the defaults when none were given.
    pub fn presets(&self) -> Vec<Preset> {
        if !self.preset.is_empty() {
            return self.preset.iter().map(|p| p.0).collect();
        }
        DEFAULT_PRESETS
            .iter()
            .filter_map(|s| s.parse::<PresetArg>().ok())
            .map(|p| p.0)
            .collect()
    }
}
