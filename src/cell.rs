// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// A terminal cell. In colour modes `fg` paints the upper pixel of a
/// half block and `bg` the lower one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        fg: None,
        bg: None,
    };
}
