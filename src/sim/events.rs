//! Game events and the per-level signal queue
//!
//! Events raised during a tick are delivered before the tick returns.
//! Delayed events wait in a separate list until their timer runs out.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::world::EntityId;
use crate::audio::SoundCue;

/// A block as seen by collision and scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockRef {
    pub col: usize,
    pub row: usize,
    /// Last known world position of the block sprite
    pub pos: Vec2,
}

/// Everything systems tell each other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Vehicle moved: centre, mesh joint and gun muzzle
    PositionChanged { pos: Vec2, joint: Vec2, gun: Vec2 },
    /// Fire button released
    Fire,
    ProjectileHitBlock(BlockRef),
    VehicleHitBlock(BlockRef),
    MeshHitBlock(BlockRef),
    /// Points in blocks (negative for penalties) at a world position
    Points { total: i32, at: Vec2 },
    PlaySound(SoundCue),
    /// Restore a hit body's colour
    RemoveTint(EntityId),
    /// Mesh reached production
    LevelEnd,
    FinalScore { total: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Delayed {
    event: GameEvent,
    remaining: f32,
}

/// Immediate and delayed event queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    ready: VecDeque<GameEvent>,
    delayed: Vec<Delayed>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for delivery this tick
    pub fn signal(&mut self, event: GameEvent) {
        self.ready.push_back(event);
    }

    /// Queue an event for delivery after `secs` seconds
    pub fn delay(&mut self, event: GameEvent, secs: f32) {
        self.delayed.push(Delayed {
            event,
            remaining: secs,
        });
    }

    /// Count delayed timers down; expired events become ready in the
    /// order they were scheduled
    pub fn advance(&mut self, dt: f32) {
        let mut i = 0;
        while i < self.delayed.len() {
            self.delayed[i].remaining -= dt;
            if self.delayed[i].remaining <= 0.0 {
                let d = self.delayed.remove(i);
                self.ready.push_back(d.event);
            } else {
                i += 1;
            }
        }
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.ready.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    pub fn pending_delayed(&self) -> usize {
        self.delayed.len()
    }
}
