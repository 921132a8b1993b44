//! Entity store and movement
//!
//! Every entity is one struct with optional capability fields, kept in a
//! `Vec` sorted by id so iteration order is stable across runs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable entity handle
pub type EntityId = u32;

/// What an entity is, for iteration and collision filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Block,
    Projectile,
    Vehicle,
    Mesh,
    Production,
    ScrollMarker,
    TargetMark,
    TargetLine,
    FloatText,
}

/// RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(230, 41, 55);
    pub const SKY_BLUE: Color = Color::rgb(102, 191, 255);
    pub const GOPHER: Color = Color::rgb(106, 215, 229);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Presentation colour state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tint {
    Solid(Color),
    /// Blink between two colours every `time` seconds
    Alternate { from: Color, to: Color, time: f32 },
}

/// Velocity in world units per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Movement {
    pub amount: Vec2,
}

/// Clamp box applied after each movement step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constrain {
    pub min: Vec2,
    pub max: Vec2,
}

/// Link from a block entity back to its grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockTag {
    pub col: usize,
    pub row: usize,
    /// Seconds left before a clearing block is removed
    pub clear_on: Option<f32>,
    /// Countdown text entity
    pub text: Option<EntityId>,
}

impl BlockTag {
    pub fn new(col: usize, row: usize) -> Self {
        Self {
            col,
            row,
            clear_on: None,
            text: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// On-screen sprite size, used by overlap tests
    pub footprint: Option<Vec2>,
    pub movement: Option<Movement>,
    pub constrain: Option<Constrain>,
    pub tint: Option<Tint>,
    pub block: Option<BlockTag>,
    /// Text content (countdown labels)
    pub text: Option<String>,
    /// End point for line entities
    pub line_to: Option<Vec2>,
}

impl Entity {
    fn new(id: EntityId, kind: EntityKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            footprint: None,
            movement: None,
            constrain: None,
            tint: None,
            block: None,
            text: None,
            line_to: None,
        }
    }
}

/// All live entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an entity and hand it back for further setup
    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2) -> &mut Entity {
        let id = self.next_id;
        self.next_id += 1;
        // ids only grow, so pushing keeps the vec sorted
        self.entities.push(Entity::new(id, kind, pos));
        let last = self.entities.len() - 1;
        &mut self.entities[last]
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.position(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.position(id).map(|i| &mut self.entities[i])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    /// Remove an entity, returning it if it was alive
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.position(id).map(|i| self.entities.remove(i))
    }

    pub fn pos(&self, id: EntityId) -> Option<Vec2> {
        self.get(id).map(|e| e.pos)
    }

    pub fn set_pos(&mut self, id: EntityId, pos: Vec2) {
        if let Some(e) = self.get_mut(id) {
            e.pos = pos;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Entities of one kind, in id order
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Ids of one kind, collected so the caller may mutate the world
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.of_kind(kind).map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Advance everything that moves: `pos += amount * dt`, then clamp
    pub fn step_movement(&mut self, dt: f32) {
        for e in &mut self.entities {
            if let Some(mov) = e.movement {
                e.pos += mov.amount * dt;
                if let Some(c) = e.constrain {
                    e.pos = e.pos.clamp(c.min, c.max);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_get_remove() {
        let mut world = World::new();
        let a = world.spawn(EntityKind::Block, Vec2::ZERO).id;
        let b = world.spawn(EntityKind::Projectile, Vec2::ONE).id;
        assert!(b > a);
        assert_eq!(world.len(), 2);

        assert_eq!(world.remove(a).map(|e| e.kind), Some(EntityKind::Block));
        assert!(world.remove(a).is_none());
        assert!(!world.contains(a));
        assert_eq!(world.pos(b), Some(Vec2::ONE));

        // ids are never reused
        let c = world.spawn(EntityKind::Block, Vec2::ZERO).id;
        assert!(c > b);
    }

    #[test]
    fn test_movement_and_constrain() {
        let mut world = World::new();
        let free = {
            let e = world.spawn(EntityKind::Block, Vec2::new(100.0, 0.0));
            e.movement = Some(Movement {
                amount: Vec2::new(-25.0, 0.0),
            });
            e.id
        };
        let clamped = {
            let e = world.spawn(EntityKind::Projectile, Vec2::new(0.0, 10.0));
            e.movement = Some(Movement {
                amount: Vec2::new(600.0, 6000.0),
            });
            e.constrain = Some(Constrain {
                min: Vec2::new(0.0, 10.0),
                max: Vec2::new(1000.0, 50.0),
            });
            e.id
        };
        let still = world.spawn(EntityKind::ScrollMarker, Vec2::ONE).id;

        world.step_movement(0.5);

        assert_eq!(world.pos(free), Some(Vec2::new(87.5, 0.0)));
        assert_eq!(world.pos(clamped), Some(Vec2::new(300.0, 50.0)));
        assert_eq!(world.pos(still), Some(Vec2::ONE));
    }

    #[test]
    fn test_of_kind_keeps_id_order() {
        let mut world = World::new();
        for i in 0..5 {
            let kind = if i % 2 == 0 {
                EntityKind::Block
            } else {
                EntityKind::Projectile
            };
            world.spawn(kind, Vec2::ZERO);
        }
        let ids = world.ids_of_kind(EntityKind::Block);
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
