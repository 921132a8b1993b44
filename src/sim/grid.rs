//! Block grid
//!
//! A fixed `cols × rows` matrix of block states, stored column-major so a
//! column scan is a contiguous slice. Out-of-range `get`/`set` are
//! precondition violations and panic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// State of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockState {
    #[default]
    Empty,
    /// Seed of a clear search (a freshly placed impact block)
    Placed,
    /// Marked for timed removal
    Clearing,
    /// Generated block of the given colour
    Filled(u8),
}

impl BlockState {
    /// Numeric tag of the fill base; colours are offsets from it
    pub const FILL_BASE: u8 = 3;
    /// Number of block colours, so every state dumps as a single digit
    pub const COLORS: u8 = 10 - Self::FILL_BASE;

    #[inline]
    pub fn is_empty(self) -> bool {
        self == BlockState::Empty
    }

    /// Numeric tag used by the text dump, always 0..=9. Colours past the
    /// last one share its digit.
    pub fn digit(self) -> u32 {
        match self {
            BlockState::Empty => 0,
            BlockState::Placed => 1,
            BlockState::Clearing => 2,
            BlockState::Filled(color) => {
                Self::FILL_BASE as u32 + color.min(Self::COLORS - 1) as u32
            }
        }
    }

    /// Inverse of [`BlockState::digit`]; anything past 9 is empty
    pub fn from_digit(d: u32) -> Self {
        match d {
            1 => BlockState::Placed,
            2 => BlockState::Clearing,
            n @ 3..=9 => BlockState::Filled((n - Self::FILL_BASE as u32) as u8),
            _ => BlockState::Empty,
        }
    }
}

/// A rectangular stencil stamped onto the grid, rows of 0/1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub name: &'static str,
    pub rows: &'static [&'static [u8]],
}

impl Piece {
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Occupied cells as (column, row) offsets
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(pr, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(pc, _)| (pc, pr))
        })
    }
}

/// Stock pieces used by map generation
pub const PIECES: [Piece; 9] = [
    Piece {
        name: "wedge",
        rows: &[&[0, 1], &[1, 1], &[1, 1], &[0, 1]],
    },
    Piece {
        name: "notch",
        rows: &[&[1, 1, 1], &[0, 1, 1], &[1, 1, 1]],
    },
    Piece {
        name: "hook_up",
        rows: &[&[1, 1, 1], &[0, 1, 1], &[0, 1, 1]],
    },
    Piece {
        name: "hook_down",
        rows: &[&[0, 1, 1], &[0, 1, 1], &[1, 1, 1]],
    },
    Piece {
        name: "step_up",
        rows: &[&[0, 1], &[1, 1]],
    },
    Piece {
        name: "step_down",
        rows: &[&[1, 1], &[0, 1]],
    },
    Piece {
        name: "bracket",
        rows: &[&[1, 1], &[0, 1], &[0, 1], &[1, 1]],
    },
    Piece {
        name: "ramp_down",
        rows: &[&[1, 1, 1, 1], &[0, 1, 1, 1], &[0, 0, 1, 1], &[0, 0, 0, 1]],
    },
    Piece {
        name: "ramp_up",
        rows: &[&[0, 0, 0, 1], &[0, 0, 1, 1], &[0, 1, 1, 1], &[1, 1, 1, 1]],
    },
];

/// The block-state matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<BlockState>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![BlockState::Empty; cols * rows],
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn in_bounds(&self, c: i64, r: i64) -> bool {
        c >= 0 && r >= 0 && (c as usize) < self.cols && (r as usize) < self.rows
    }

    #[inline]
    fn index(&self, c: usize, r: usize) -> usize {
        assert!(
            c < self.cols && r < self.rows,
            "cell ({c}, {r}) outside {}x{} grid",
            self.cols,
            self.rows
        );
        c * self.rows + r
    }

    #[inline]
    pub fn get(&self, c: usize, r: usize) -> BlockState {
        self.cells[self.index(c, r)]
    }

    #[inline]
    pub fn is_empty_at(&self, c: usize, r: usize) -> bool {
        self.get(c, r).is_empty()
    }

    /// Set the state of one cell
    #[inline]
    pub fn set(&mut self, c: usize, r: usize, state: BlockState) {
        let i = self.index(c, r);
        self.cells[i] = state;
    }

    /// Stamp a piece with its top-left corner at (col, row).
    ///
    /// Overlapping pieces overwrite each other. Stencil cells that fall
    /// outside the grid are dropped and colours are clamped to the last one.
    pub fn add(&mut self, col: usize, row: usize, piece: &Piece, color: u8) {
        let color = color.min(BlockState::COLORS - 1);
        for (pc, pr) in piece.cells() {
            let (c, r) = (col + pc, row + pr);
            if c < self.cols && r < self.rows {
                self.set(c, r, BlockState::Filled(color));
            }
        }
    }

    /// Number of occupied cells
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|s| !s.is_empty()).count()
    }

    /// All cells in column-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, BlockState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, s)| (i / self.rows, i % self.rows, *s))
    }
}

impl fmt::Display for Grid {
    /// Row-major dump: one digit per cell, space for empty, newline per row
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                match self.get(c, r) {
                    BlockState::Empty => f.write_str(" ")?,
                    state => write!(f, "{}", state.digit())?,
                }
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = std::convert::Infallible;

    /// Parse a dump produced by `Display`. The widest line sets the column
    /// count; anything that is not a digit is empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().collect();
        let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::new(cols, lines.len());
        for (r, line) in lines.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let state = ch
                    .to_digit(10)
                    .map(BlockState::from_digit)
                    .unwrap_or(BlockState::Empty);
                grid.set(c, r, state);
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
pub(crate) fn grid(s: &str) -> Grid {
    match s.parse() {
        Ok(g) => g,
        Err(e) => match e {},
    }
}
