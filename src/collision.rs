// Copyright (c) 2026 rezky_nightky

//! Uniform-grid spatial hash over the active drops.
//!
//! The index is the only place that knows which cell a drop lives in; drops
//! just report their current position on every update.

use std::collections::HashMap;

use crate::drop::DropId;

#[derive(Clone, Debug)]
pub struct CollisionIndex {
    cols: usize,
    rows: usize,
    cell_size: f32,
    cells: Vec<Vec<DropId>>,
    members: HashMap<DropId, (usize, usize)>,
}

impl CollisionIndex {
    pub fn new(cols: usize, rows: usize, cell_size: f32) -> Self {
        Self {
            cols,
            rows,
            cell_size,
            cells: vec![Vec::new(); cols * rows],
            members: HashMap::new(),
        }
    }

    /// Grid sized so every cell is `cell_size` wide and the surface is fully covered.
    pub fn for_surface(width: u32, height: u32, cell_size: f32) -> Self {
        let cols = (width as f32 / cell_size).ceil() as usize;
        let rows = (height as f32 / cell_size).ceil() as usize;
        Self::new(cols, rows, cell_size)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: DropId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn cell_of(&self, id: DropId) -> Option<(usize, usize)> {
        self.members.get(&id).copied()
    }

    pub fn cell_members(&self, col: usize, row: usize) -> &[DropId] {
        if col >= self.cols || row >= self.rows {
            return &[];
        }
        &self.cells[row * self.cols + col]
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.members.clear();
    }

    fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / self.cell_size).floor() as usize;
        let row = (y / self.cell_size).floor() as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some((col, row))
    }

    fn insert(&mut self, id: DropId, (col, row): (usize, usize)) {
        self.cells[row * self.cols + col].push(id);
        self.members.insert(id, (col, row));
    }

    /// Move `id` to the cell under `(x, y)` and return the drops it may be
    /// running into.
    ///
    /// The first update only registers the drop. Candidates are the other
    /// members of the drop's own cell plus the three cells of the next row
    /// down; drops in neighbouring cells of the same row or above are found
    /// when they update themselves. A position off the grid leaves the drop
    /// untracked.
    pub fn update(&mut self, id: DropId, x: f32, y: f32, force_remove: bool) -> Vec<DropId> {
        if !self.members.contains_key(&id) {
            if !force_remove {
                if let Some(cell) = self.cell_at(x, y) {
                    self.insert(id, cell);
                }
            }
            return Vec::new();
        }

        self.remove(id);
        if force_remove {
            return Vec::new();
        }
        let Some(cell) = self.cell_at(x, y) else {
            return Vec::new();
        };
        self.insert(id, cell);
        self.candidates(id, cell)
    }

    pub fn remove(&mut self, id: DropId) {
        let Some((col, row)) = self.members.remove(&id) else {
            return;
        };
        let cell = &mut self.cells[row * self.cols + col];
        if let Some(pos) = cell.iter().position(|&m| m == id) {
            cell.swap_remove(pos);
        }
    }

    fn candidates(&self, id: DropId, (col, row): (usize, usize)) -> Vec<DropId> {
        let below = row + 1;
        let mut out: Vec<DropId> = self
            .cell_members(col, row)
            .iter()
            .copied()
            .filter(|&m| m != id)
            .collect();
        for c in col.saturating_sub(1)..=col + 1 {
            out.extend(
                self.cell_members(c, below)
                    .iter()
                    .copied()
                    .filter(|&m| m != id),
            );
        }
        out
    }
}
