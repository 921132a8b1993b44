//! Collision detection between projectiles, bodies and blocks
//!
//! Stateless: re-run every tick against the current world. Overlap itself is
//! delegated to an [`Overlap`] implementation so hosts with real sprite
//! masks can plug theirs in.

use glam::Vec2;

use super::events::{BlockRef, EventQueue, GameEvent};
use super::world::{Color, Entity, EntityId, EntityKind, Tint, World};
use crate::audio::SoundCue;
use crate::consts::TINT_TIME;
use crate::error::{Error, Result};

/// Sprite overlap predicate. Positions are sprite centres.
pub trait Overlap {
    fn sprites_overlap(&self, a_size: Vec2, a_pos: Vec2, b_size: Vec2, b_pos: Vec2) -> bool;
}

/// Axis-aligned box test on the sprite footprints
#[derive(Debug, Clone, Copy, Default)]
pub struct AabbOverlap;

impl Overlap for AabbOverlap {
    fn sprites_overlap(&self, a_size: Vec2, a_pos: Vec2, b_size: Vec2, b_pos: Vec2) -> bool {
        aabb_overlap(a_size, a_pos, b_size, b_pos)
    }
}

/// Check whether two centre-anchored boxes overlap (touching edges do not)
#[inline]
pub fn aabb_overlap(a_size: Vec2, a_pos: Vec2, b_size: Vec2, b_pos: Vec2) -> bool {
    let d = (a_pos - b_pos).abs();
    let reach = (a_size + b_size) * 0.5;
    d.x < reach.x && d.y < reach.y
}

fn footprint(e: &Entity) -> Result<Vec2> {
    e.footprint.ok_or(Error::MissingFootprint(e.id))
}

fn block_ref(e: &Entity) -> Option<BlockRef> {
    e.block.map(|tag| BlockRef {
        col: tag.col,
        row: tag.row,
        pos: e.pos,
    })
}

/// Run every collision check for this tick, raising hit events.
///
/// - A projectile stops at the first block it overlaps (block id order) and
///   is removed.
/// - The vehicle and the mesh each take at most one block per tick; that
///   block is removed on the spot.
pub fn resolve_collisions(
    world: &mut World,
    overlap: &dyn Overlap,
    events: &mut EventQueue,
) -> Result<()> {
    let blocks = world.ids_of_kind(EntityKind::Block);

    for bullet_id in world.ids_of_kind(EntityKind::Projectile) {
        if let Some(hit) = first_overlap(world, overlap, bullet_id, &blocks)? {
            log::debug!("projectile {bullet_id} hit block ({}, {})", hit.col, hit.row);
            events.signal(GameEvent::ProjectileHitBlock(hit));
            world.remove(bullet_id);
        }
    }

    for kind in [EntityKind::Vehicle, EntityKind::Mesh] {
        for body_id in world.ids_of_kind(kind) {
            let Some((block_id, hit)) = first_overlap_id(world, overlap, body_id, &blocks)? else {
                continue;
            };

            remove_block(world, block_id);
            tint_entity(world, events, body_id);
            events.signal(GameEvent::PlaySound(SoundCue::Hit));
            events.signal(match kind {
                EntityKind::Vehicle => GameEvent::VehicleHitBlock(hit),
                _ => GameEvent::MeshHitBlock(hit),
            });
            log::debug!("{kind:?} hit block ({}, {})", hit.col, hit.row);
        }
    }

    Ok(())
}

fn first_overlap(
    world: &World,
    overlap: &dyn Overlap,
    subject: EntityId,
    blocks: &[EntityId],
) -> Result<Option<BlockRef>> {
    Ok(first_overlap_id(world, overlap, subject, blocks)?.map(|(_, hit)| hit))
}

fn first_overlap_id(
    world: &World,
    overlap: &dyn Overlap,
    subject: EntityId,
    blocks: &[EntityId],
) -> Result<Option<(EntityId, BlockRef)>> {
    let Some(subject) = world.get(subject) else {
        return Ok(None);
    };
    let subject_size = footprint(subject)?;

    for &block_id in blocks {
        // earlier hits this tick may have removed it
        let Some(block) = world.get(block_id) else {
            continue;
        };
        let Some(hit) = block_ref(block) else {
            continue;
        };
        if overlap.sprites_overlap(subject_size, subject.pos, footprint(block)?, block.pos) {
            return Ok(Some((block_id, hit)));
        }
    }
    Ok(None)
}

/// Remove a block entity together with its countdown text
fn remove_block(world: &mut World, block_id: EntityId) {
    if let Some(block) = world.remove(block_id) {
        if let Some(text) = block.block.and_then(|tag| tag.text) {
            world.remove(text);
        }
    }
}

/// Flash a hit body and schedule the colour to come back
fn tint_entity(world: &mut World, events: &mut EventQueue, id: EntityId) {
    let Some(e) = world.get_mut(id) else {
        return;
    };
    if matches!(e.tint, Some(Tint::Alternate { .. })) {
        return;
    }
    e.tint = Some(Tint::Alternate {
        from: Color::WHITE,
        to: Color::RED,
        time: 0.15,
    });
    events.delay(GameEvent::RemoveTint(id), TINT_TIME);
}

/// Handle a delayed tint removal
pub fn remove_tint(world: &mut World, id: EntityId) {
    if let Some(e) = world.get_mut(id) {
        e.tint = Some(Tint::Solid(Color::WHITE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::BlockTag;

    fn block(world: &mut World, col: usize, row: usize, pos: Vec2) -> EntityId {
        let e = world.spawn(EntityKind::Block, pos);
        e.footprint = Some(Vec2::splat(32.0));
        e.block = Some(BlockTag::new(col, row));
        e.id
    }

    fn body(world: &mut World, kind: EntityKind, pos: Vec2) -> EntityId {
        let e = world.spawn(kind, pos);
        e.footprint = Some(Vec2::splat(32.0));
        e.id
    }

    fn drain(events: &mut EventQueue) -> Vec<GameEvent> {
        std::iter::from_fn(|| events.pop()).collect()
    }

    #[test]
    fn test_aabb_overlap() {
        let size = Vec2::splat(10.0);
        assert!(aabb_overlap(size, Vec2::ZERO, size, Vec2::new(9.0, 9.0)));
        assert!(!aabb_overlap(size, Vec2::ZERO, size, Vec2::new(10.0, 0.0)));
        assert!(!aabb_overlap(size, Vec2::ZERO, size, Vec2::new(0.0, 25.0)));
    }

    #[test]
    fn test_projectile_hits_first_block_in_order() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        // both overlap the projectile; the older block wins even though it is farther
        block(&mut world, 5, 1, Vec2::new(20.0, 0.0));
        block(&mut world, 4, 1, Vec2::new(10.0, 0.0));
        let bullet = body(&mut world, EntityKind::Projectile, Vec2::ZERO);

        resolve_collisions(&mut world, &AabbOverlap, &mut events).unwrap();

        assert!(!world.contains(bullet));
        assert_eq!(world.ids_of_kind(EntityKind::Block).len(), 2);
        let got = drain(&mut events);
        assert_eq!(
            got,
            vec![GameEvent::ProjectileHitBlock(BlockRef {
                col: 5,
                row: 1,
                pos: Vec2::new(20.0, 0.0)
            })]
        );
    }

    #[test]
    fn test_projectile_miss_stays() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        block(&mut world, 0, 0, Vec2::new(500.0, 0.0));
        let bullet = body(&mut world, EntityKind::Projectile, Vec2::ZERO);

        resolve_collisions(&mut world, &AabbOverlap, &mut events).unwrap();
        assert!(world.contains(bullet));
        assert!(events.is_empty());
    }

    #[test]
    fn test_vehicle_removes_single_block_per_tick() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        let first = block(&mut world, 3, 3, Vec2::new(5.0, 0.0));
        let second = block(&mut world, 3, 4, Vec2::new(-5.0, 0.0));
        let text = world.spawn(EntityKind::FloatText, Vec2::ZERO).id;
        if let Some(tag) = world.get_mut(first).and_then(|e| e.block.as_mut()) {
            tag.text = Some(text);
        }
        let vehicle = body(&mut world, EntityKind::Vehicle, Vec2::ZERO);

        resolve_collisions(&mut world, &AabbOverlap, &mut events).unwrap();

        assert!(!world.contains(first));
        assert!(!world.contains(text));
        assert!(world.contains(second));
        let got = drain(&mut events);
        assert!(got.contains(&GameEvent::VehicleHitBlock(BlockRef {
            col: 3,
            row: 3,
            pos: Vec2::new(5.0, 0.0)
        })));
        assert!(got.contains(&GameEvent::PlaySound(SoundCue::Hit)));
        assert!(matches!(
            world.get(vehicle).and_then(|e| e.tint),
            Some(Tint::Alternate { .. })
        ));
        assert_eq!(events.pending_delayed(), 1);

        // next tick takes the other one, but the tint is not rescheduled
        resolve_collisions(&mut world, &AabbOverlap, &mut events).unwrap();
        assert!(!world.contains(second));
        assert_eq!(events.pending_delayed(), 1);
    }

    #[test]
    fn test_mesh_hit_event() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        block(&mut world, 1, 2, Vec2::ZERO);
        body(&mut world, EntityKind::Mesh, Vec2::ZERO);

        resolve_collisions(&mut world, &AabbOverlap, &mut events).unwrap();
        let got = drain(&mut events);
        assert!(matches!(got.last(), Some(GameEvent::MeshHitBlock(b)) if b.col == 1 && b.row == 2));
    }

    #[test]
    fn test_missing_footprint_is_an_error() {
        let mut world = World::new();
        let mut events = EventQueue::new();
        block(&mut world, 0, 0, Vec2::ZERO);
        let bare = world.spawn(EntityKind::Projectile, Vec2::ZERO).id;

        let err = resolve_collisions(&mut world, &AabbOverlap, &mut events).unwrap_err();
        assert!(matches!(err, Error::MissingFootprint(id) if id == bare));
    }

    #[test]
    fn test_remove_tint_restores_white() {
        let mut world = World::new();
        let id = body(&mut world, EntityKind::Vehicle, Vec2::ZERO);
        world.get_mut(id).unwrap().tint = Some(Tint::Alternate {
            from: Color::WHITE,
            to: Color::RED,
            time: 0.15,
        });
        remove_tint(&mut world, id);
        assert_eq!(world.get(id).unwrap().tint, Some(Tint::Solid(Color::WHITE)));
    }
}
