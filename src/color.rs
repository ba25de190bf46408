// Copyright (c) 2026 rezky_nightky

use std::env;

use crossterm::style::Color;
use rainpane::Rgba;

use crate::cell::Cell;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }

    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(ColorMode::Mono),
            16 => Some(ColorMode::Color16),
            8 | 256 => Some(ColorMode::Color256),
            24 | 32 => Some(ColorMode::TrueColor),
            _ => None,
        }
    }

    pub fn detect() -> Self {
        let colorterm = env::var("COLORTERM")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return ColorMode::TrueColor;
        }
        let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
        if term == "dumb" {
            return ColorMode::Mono;
        }
        if term.contains("256color") {
            return ColorMode::Color256;
        }
        ColorMode::Color16
    }
}

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

/// Closest xterm-256 index, picking between the 6x6x6 cube and the grey ramp.
pub fn rgb_to_ansi256(c: Rgba) -> u8 {
    const CUBE: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let level = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (level(c.r), level(c.g), level(c.b));
    let rgb = (c.r, c.g, c.b);

    let cube = (CUBE[r6 as usize], CUBE[g6 as usize], CUBE[b6 as usize]);
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((c.r as u16 + c.g as u16 + c.b as u16) / 3) as u8;
    let (grey_idx, grey) = match avg {
        0..=7 => (16, 0),
        239..=255 => (231, 255),
        _ => {
            let step = (avg - 8) / 10;
            (232 + step, 8 + 10 * step)
        }
    };

    if dist2(rgb, (grey, grey, grey)) < dist2(rgb, cube) {
        grey_idx
    } else {
        cube_idx
    }
}

pub fn rgb_to_color16(c: Rgba) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];
    let rgb = (c.r, c.g, c.b);
    TABLE
        .iter()
        .min_by_key(|(_, t)| dist2(rgb, *t))
        .map(|(color, _)| *color)
        .unwrap_or(Color::White)
}

fn to_color(c: Rgba, mode: ColorMode) -> Color {
    match mode {
        ColorMode::TrueColor => Color::Rgb {
            r: c.r,
            g: c.g,
            b: c.b,
        },
        ColorMode::Color256 => Color::AnsiValue(rgb_to_ansi256(c)),
        ColorMode::Color16 | ColorMode::Mono => rgb_to_color16(c),
    }
}

fn luma(c: Rgba) -> u8 {
    ((c.r as u32 * 299 + c.g as u32 * 587 + c.b as u32 * 114) / 1000) as u8
}

/// One terminal cell covering two vertically stacked pixels.
pub fn half_block(top: Rgba, bottom: Rgba, mode: ColorMode) -> Cell {
    if mode == ColorMode::Mono {
        const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
        let l = (luma(top) as usize + luma(bottom) as usize) / 2;
        return Cell {
            ch: SHADES[l * (SHADES.len() - 1) / 255],
            fg: None,
            bg: None,
        };
    }
    Cell {
        ch: '▀',
        fg: Some(to_color(top, mode)),
        bg: Some(to_color(bottom, mode)),
    }
}
