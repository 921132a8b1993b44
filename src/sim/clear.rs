//! Rectangular region clearing
//!
//! Placing a block seeds a search for filled rectangles that have the placed
//! block on their left edge. Every such rectangle whose border is solid gets
//! marked `Clearing`, so one placement can clear several overlapping areas.

use serde::{Deserialize, Serialize};

use super::grid::{BlockState, Grid};

/// Inclusive rectangle of grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub from_col: usize,
    pub from_row: usize,
    pub to_col: usize,
    pub to_row: usize,
}

impl Area {
    pub fn new(from_col: usize, from_row: usize, to_col: usize, to_row: usize) -> Self {
        Self {
            from_col,
            from_row,
            to_col,
            to_row,
        }
    }

    /// Every cell, column-major
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.from_col..=self.to_col)
            .flat_map(move |c| (self.from_row..=self.to_row).map(move |r| (c, r)))
    }
}

impl Grid {
    /// Place a block at (c, r) and clear every solid-bordered rectangle that
    /// grows right from it, upward and downward.
    ///
    /// Returns the areas that were cleared, in the order they were found.
    pub fn place(&mut self, c: usize, r: usize) -> Vec<Area> {
        self.set(c, r, BlockState::Placed);

        // top of the run in this column
        let mut tr = r;
        while tr > 0 && !self.is_empty_at(c, tr - 1) {
            tr -= 1;
        }

        // right end of the run in this row
        let mut sc = c;
        while sc + 1 < self.cols() && !self.is_empty_at(sc + 1, r) {
            sc += 1;
        }

        // bottom of the run in this column
        let mut br = r;
        while br + 1 < self.rows() && !self.is_empty_at(c, br + 1) {
            br += 1;
        }

        let mut cleared = Vec::new();
        for cc in c + 1..=sc {
            // areas above the placed block
            for cr in (tr..r).rev() {
                let area = Area::new(c, cr, cc, r);
                if self.can_clear_area(&area) {
                    self.clear_area(&area);
                    cleared.push(area);
                }
            }
            // areas below the placed block
            for cr in (r + 1..=br).rev() {
                let area = Area::new(c, r, cc, cr);
                if self.can_clear_area(&area) {
                    self.clear_area(&area);
                    cleared.push(area);
                }
            }
        }

        if !cleared.is_empty() {
            log::debug!("place ({c}, {r}) cleared {} area(s)", cleared.len());
        }
        cleared
    }

    /// True when all four border edges of the area are occupied.
    ///
    /// The interior is not inspected. Areas that are inverted or reach past
    /// the grid are never clearable.
    pub fn can_clear_area(&self, area: &Area) -> bool {
        let Area {
            from_col,
            from_row,
            to_col,
            to_row,
        } = *area;

        if from_col > to_col || from_row > to_row || to_col >= self.cols() || to_row >= self.rows()
        {
            return false;
        }

        let row_solid = |r: usize| (from_col..=to_col).all(|c| !self.is_empty_at(c, r));
        let col_solid = |c: usize| (from_row..=to_row).all(|r| !self.is_empty_at(c, r));

        row_solid(from_row) && row_solid(to_row) && col_solid(from_col) && col_solid(to_col)
    }

    /// Mark every cell of the area, interior included, as `Clearing`
    pub fn clear_area(&mut self, area: &Area) {
        for (c, r) in area.cells() {
            self.set(c, r, BlockState::Clearing);
        }
    }
}
