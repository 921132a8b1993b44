//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID, grids column-major)
//! - No rendering or platform dependencies

pub mod clear;
pub mod collision;
pub mod events;
pub mod generate;
pub mod grid;
pub mod level;
pub mod map;
pub mod score;
pub mod tick;
pub mod world;

pub use clear::Area;
pub use collision::{AabbOverlap, Overlap, aabb_overlap, resolve_collisions};
pub use events::{BlockRef, EventQueue, GameEvent};
pub use generate::generate;
pub use grid::{BlockState, Grid, PIECES, Piece};
pub use level::Level;
pub use map::{MapConfig, MapSystem, SpriteIndex, TargetLock};
pub use score::ScoreSystem;
pub use tick::{TickInput, tick};
pub use world::{BlockTag, Color, Constrain, Entity, EntityId, EntityKind, Movement, Tint, World};
