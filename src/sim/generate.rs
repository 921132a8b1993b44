//! Procedural map generation
//!
//! Walks the run left to right in uneven strides, dropping a small cluster
//! of random pieces at each stop. Pieces overlap freely; that is what gives
//! the field its density.

use rand::Rng;

use super::grid::{BlockState, Grid, PIECES};

/// Column where the first cluster is dropped
pub const LEAD_IN_COLUMNS: usize = 6;
/// Columns/rows kept free at the far end and the bottom
pub const TAIL_MARGIN: usize = 8;
/// Top rows never used as a piece origin
pub const TOP_MARGIN: usize = 4;
/// Pieces per cluster
pub const MIN_PIECES: usize = 2;
pub const MAX_PIECES: usize = 6;
/// How far back from the stride column a piece may start
pub const COLUMN_JITTER: usize = 6;
/// Stride between clusters: base plus random extra
pub const STRIDE_BASE: usize = 15;
pub const STRIDE_JITTER: usize = 5;
/// Number of block colours
pub const BLOCK_COLORS: u8 = 4;
const _: () = assert!(BLOCK_COLORS <= BlockState::COLORS);

/// Fill the grid with random pieces. Returns the number of pieces stamped.
pub fn generate<R: Rng>(grid: &mut Grid, rng: &mut R) -> usize {
    let limit_r = grid.rows().saturating_sub(TAIL_MARGIN).max(1);
    let limit_c = grid.cols().saturating_sub(TAIL_MARGIN);

    let mut stamped = 0;
    let mut cc = LEAD_IN_COLUMNS;
    while cc < limit_c {
        let num = rng.random_range(MIN_PIECES..=MAX_PIECES);
        for _ in 0..num {
            // random shift back from the stride column
            let c = cc - rng.random_range(0..COLUMN_JITTER);
            let piece = &PIECES[rng.random_range(0..PIECES.len())];
            let r = TOP_MARGIN + rng.random_range(0..limit_r);
            let color = rng.random_range(0..BLOCK_COLORS);
            grid.add(c, r, piece, color);
            stamped += 1;
        }

        cc += STRIDE_BASE + rng.random_range(0..STRIDE_JITTER);
    }

    log::info!(
        "Generated {}x{} map: {} pieces, {} blocks",
        grid.cols(),
        grid.rows(),
        stamped,
        grid.occupied()
    );
    stamped
}
