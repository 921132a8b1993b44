//! Score keeping
//!
//! Points arrive as block counts. Awards and penalties are queued and the
//! shown total catches up at a fixed rate, so the counter ticks rather than
//! jumps.

use serde::{Deserialize, Serialize};

use super::events::{EventQueue, GameEvent};
use crate::consts::{POINTS_LOST_PER_BLOCK, POINTS_PER_BLOCK, POINTS_TO_ADD_PER_SEC};

/// Points for clearing `blocks` at once.
///
/// Every four blocks in one clear multiply the base award.
pub fn award(blocks: i64) -> i64 {
    let base = blocks * POINTS_PER_BLOCK;
    let extra = blocks / 4;
    if extra > 0 { base * extra } else { base }
}

/// Points lost for `blocks` blocks knocked off by a body
pub fn penalty(blocks: i64) -> i64 {
    blocks.abs() * POINTS_LOST_PER_BLOCK
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreSystem {
    total: i64,
    to_add: i64,
    to_sub: i64,
    end: bool,
}

impl ScoreSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed total
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Net points not yet shown
    pub fn pending(&self) -> i64 {
        self.to_add - self.to_sub
    }

    pub fn is_ended(&self) -> bool {
        self.end
    }

    pub fn on_event(&mut self, events: &mut EventQueue, event: &GameEvent) {
        if self.end {
            return;
        }
        match *event {
            GameEvent::Points { total, .. } if total > 0 => {
                self.to_add += award(total as i64);
            }
            GameEvent::Points { total, .. } => {
                self.to_sub += penalty(total as i64);
            }
            GameEvent::LevelEnd => {
                self.end = true;
                self.total += self.to_add - self.to_sub;
                self.to_add = 0;
                self.to_sub = 0;
                log::info!("Final score: {}", self.total);
                events.signal(GameEvent::FinalScore { total: self.total });
            }
            _ => {}
        }
    }

    /// Move queued points into the shown total
    pub fn display_system(&mut self, dt: f32) {
        if self.end {
            return;
        }
        let step = POINTS_TO_ADD_PER_SEC * dt;
        if self.to_add > 0 {
            let adding = (step.min(self.to_add as f32) as i64).max(1);
            self.total += adding;
            self.to_add -= adding;
        }
        if self.to_sub > 0 {
            let subtracting = (step.min(self.to_sub as f32) as i64).max(1);
            self.total -= subtracting;
            self.to_sub -= subtracting;
        }
    }
}
