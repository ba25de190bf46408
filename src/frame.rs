// Copyright (c) 2026 rezky_nightky

use rainpane::{Raster, Rgba};

use crate::cell::Cell;
use crate::color::{half_block, ColorMode};

/// Terminal-sized cell grid with change tracking, so only cells that differ
/// from the previous frame are sent to the terminal.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    /// Pixel size of the raster this frame presents: two pixel rows per cell.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32 * 2)
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty_all = true;
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
        } else {
            for &i in &self.dirty {
                self.dirty_map[i] = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(Cell::BLANK)
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    /// Convert a `width x 2*height` raster into half-block cells.
    pub fn paint(&mut self, raster: &Raster, mode: ColorMode) {
        for y in 0..self.height {
            let py = y as u32 * 2;
            for x in 0..self.width {
                let px = x as u32;
                let top = raster.get(px, py).unwrap_or(Rgba::TRANSPARENT);
                let bottom = raster.get(px, py + 1).unwrap_or(top);
                self.set(x, y, half_block(top, bottom, mode));
            }
        }
    }
}
