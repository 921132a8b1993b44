//! Map system
//!
//! Owns the block grid and the parallel sprite index, and keeps them in step
//! with the block entities in the world: it spawns one sprite per occupied
//! cell, aims the gun, fires, reacts to hits and removes cleared blocks once
//! their countdown runs out.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{BlockRef, EventQueue, GameEvent};
use super::generate::generate;
use super::grid::{BlockState, Grid};
use super::world::{
    BlockTag, Color, Constrain, Entity, EntityId, EntityKind, Movement, Tint, World,
};
use crate::Viewport;
use crate::assets::Assets;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::error::Result;

/// Grid dimensions, derived from settings at stage start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    pub cols: usize,
    pub rows: usize,
}

/// Entity handle per grid cell, same layout as the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteIndex {
    rows: usize,
    slots: Vec<Option<EntityId>>,
}

impl SpriteIndex {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            rows,
            slots: vec![None; cols * rows],
        }
    }

    #[inline]
    pub fn get(&self, c: usize, r: usize) -> Option<EntityId> {
        self.slots[c * self.rows + r]
    }

    #[inline]
    pub fn set(&mut self, c: usize, r: usize, id: Option<EntityId>) {
        self.slots[c * self.rows + r] = id;
    }

    #[inline]
    pub fn take(&mut self, c: usize, r: usize) -> Option<EntityId> {
        self.slots[c * self.rows + r].take()
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Block under the crosshair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLock {
    pub col: usize,
    pub row: usize,
    /// Where the impact block would land (one cell left of the target)
    pub pos: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSystem {
    grid: Grid,
    sprites: SpriteIndex,
    viewport: Viewport,
    /// On-screen block size
    footprint: Vec2,
    mark_footprint: Vec2,
    bullet_footprint: Vec2,
    /// World X of column 0 at load time
    origin_x: f32,
    scroll_marker: EntityId,
    target: EntityId,
    line: EntityId,
    production: EntityId,
    gun: Vec2,
    lock: Option<TargetLock>,
    end: bool,
}

impl MapSystem {
    /// Generate a random map and spawn its sprites
    pub fn load<R: Rng>(
        config: MapConfig,
        viewport: Viewport,
        assets: &dyn Assets,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Self> {
        let mut grid = Grid::new(config.cols, config.rows);
        generate(&mut grid, rng);
        Self::from_grid(grid, viewport, assets, world)
    }

    /// Spawn sprites for an existing grid
    pub fn from_grid(
        grid: Grid,
        viewport: Viewport,
        assets: &dyn Assets,
        world: &mut World,
    ) -> Result<Self> {
        let scale = viewport.scale;
        let footprint = assets.sprite_size(BLOCK_SPRITE)? * BLOCK_SCALE * scale;
        let mark_footprint = assets.sprite_size(MARK_SPRITE)? * BLOCK_SCALE * scale;
        let bullet_footprint = assets.sprite_size(BULLET_SPRITE)? * BULLET_SCALE * scale;
        let production_size = assets.sprite_size(PRODUCTION_SPRITE)? * BLOCK_SCALE * scale;

        let origin_x = viewport.play_width() * MAP_ORIGIN_FACTOR;
        let sprites = SpriteIndex::new(grid.cols(), grid.rows());

        let mut map = Self {
            grid,
            sprites,
            viewport,
            footprint,
            mark_footprint,
            bullet_footprint,
            origin_x,
            scroll_marker: 0,
            target: 0,
            line: 0,
            production: 0,
            gun: Vec2::ZERO,
            lock: None,
            end: false,
        };
        map.add_sprites(world, production_size);
        Ok(map)
    }

    fn add_sprites(&mut self, world: &mut World, production_size: Vec2) {
        // the marker has no sprite, it only tracks the scroll
        self.scroll_marker = self.add_entity(world, EntityKind::ScrollMarker, 0, 0, self.origin_x).id;

        let target = world.spawn(EntityKind::TargetMark, Vec2::splat(TARGET_HIDDEN));
        target.footprint = Some(self.mark_footprint);
        target.tint = Some(Tint::Alternate {
            from: Color::RED,
            to: Color::RED.alpha(180),
            time: 0.25,
        });
        self.target = target.id;

        let line = world.spawn(EntityKind::TargetLine, Vec2::ZERO);
        line.tint = Some(Tint::Solid(Color::RED.alpha(127)));
        line.line_to = Some(Vec2::ZERO);
        self.line = line.id;

        for c in 0..self.grid.cols() {
            for r in 0..self.grid.rows() {
                if self.grid.is_empty_at(c, r) {
                    continue;
                }
                let footprint = self.footprint;
                let ent = self.add_entity(world, EntityKind::Block, c, r, self.origin_x);
                ent.footprint = Some(footprint);
                ent.tint = Some(Tint::Alternate {
                    from: Color::GOPHER,
                    to: Color::SKY_BLUE,
                    time: 0.25,
                });
                ent.block = Some(BlockTag::new(c, r));
                let id = ent.id;
                self.sprites.set(c, r, Some(id));
            }
        }

        // production waits just past the last column, mid height
        let prod_col = self.grid.cols();
        let prod_row = self.grid.rows() / 2;
        let prod = self.add_entity(world, EntityKind::Production, prod_col, prod_row, self.origin_x);
        prod.pos.x += (production_size.x - self.footprint.x) / 2.0;
        prod.footprint = Some(production_size);
        self.production = prod.id;

        log::info!(
            "Map sprites: {} blocks, footprint {:?}",
            self.sprites.count(),
            self.footprint
        );
    }

    /// Spawn a scrolling entity centred on (col, row), column 0 at `offset_x`
    fn add_entity<'w>(
        &self,
        world: &'w mut World,
        kind: EntityKind,
        col: usize,
        row: usize,
        offset_x: f32,
    ) -> &'w mut Entity {
        let pos = Vec2::new(
            col as f32 * self.footprint.x + self.footprint.x / 2.0 + offset_x,
            row as f32 * self.footprint.y + self.footprint.y / 2.0,
        );
        let ent = world.spawn(kind, pos);
        ent.movement = Some(Movement {
            amount: Vec2::new(-BLOCK_SPEED * self.viewport.scale, 0.0),
        });
        ent
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn sprites(&self) -> &SpriteIndex {
        &self.sprites
    }

    pub fn sprite_at(&self, c: usize, r: usize) -> Option<EntityId> {
        self.sprites.get(c, r)
    }

    pub fn footprint(&self) -> Vec2 {
        self.footprint
    }

    pub fn lock(&self) -> Option<TargetLock> {
        self.lock
    }

    pub fn gun(&self) -> Vec2 {
        self.gun
    }

    pub fn scroll_marker(&self) -> EntityId {
        self.scroll_marker
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn line(&self) -> EntityId {
        self.line
    }

    pub fn production(&self) -> EntityId {
        self.production
    }

    pub fn is_ended(&self) -> bool {
        self.end
    }

    /// Current world position of the centre of a cell
    pub fn cell_pos(&self, world: &World, c: usize, r: usize) -> Vec2 {
        let marker = world.pos(self.scroll_marker).unwrap_or_default();
        marker + Vec2::new(c as f32 * self.footprint.x, r as f32 * self.footprint.y)
    }

    /// Grid cell under a world position (may be outside the grid)
    pub fn world_to_cell(&self, world: &World, p: Vec2) -> (i64, i64) {
        let marker = world.pos(self.scroll_marker).unwrap_or_default();
        let local = p - (marker - self.footprint / 2.0);
        (
            (local.x / self.footprint.x).floor() as i64,
            (local.y / self.footprint.y).floor() as i64,
        )
    }

    /// Lock onto the nearest block ahead of the gun.
    ///
    /// Candidates are blocks whose centre is within half a block of the gun
    /// vertically, beyond the minimum forward gap and still on screen. The
    /// smallest forward distance wins; ties keep the first one found in
    /// column-major order.
    pub fn target_system(&mut self, world: &mut World) {
        let gun = self.gun;
        let min_x = gun.x + TARGET_GAP_X * self.viewport.scale;
        let max_x = self.viewport.play_width();
        let tolerance = self.footprint.y / 2.0;

        // columns behind the gun can never qualify
        let (gun_col, _) = self.world_to_cell(world, gun);
        let start_col = gun_col.clamp(0, self.grid.cols() as i64) as usize;

        let mut best: Option<(f32, TargetLock, Vec2)> = None;
        if !self.end {
            for c in start_col..self.grid.cols() {
                if self.cell_pos(world, c, 0).x >= max_x {
                    break;
                }
                for r in 0..self.grid.rows() {
                    if self.grid.is_empty_at(c, r) {
                        continue;
                    }
                    let Some(pos) = self.sprites.get(c, r).and_then(|id| world.pos(id)) else {
                        continue;
                    };
                    if (pos.y - gun.y).abs() > tolerance || pos.x <= min_x || pos.x >= max_x {
                        continue;
                    }
                    let dx = pos.x - gun.x;
                    if best.as_ref().is_none_or(|(best_dx, _, _)| dx < *best_dx) {
                        let lock = TargetLock {
                            col: c,
                            row: r,
                            pos: Vec2::new(pos.x - self.footprint.x, pos.y),
                        };
                        best = Some((dx, lock, pos));
                    }
                }
            }
        }

        let line_to = match best {
            Some((_, lock, _)) => {
                world.set_pos(self.target, lock.pos);
                self.lock = Some(lock);
                Vec2::new(lock.pos.x - self.footprint.x / 2.0, lock.pos.y)
            }
            None => {
                world.set_pos(self.target, Vec2::splat(TARGET_HIDDEN));
                self.lock = None;
                Vec2::new(max_x, gun.y)
            }
        };

        if let Some(line) = world.get_mut(self.line) {
            line.pos = gun;
            line.line_to = Some(line_to);
        }
    }

    /// Fire at the locked target. Returns the projectile, if one was spawned.
    pub fn fire(&mut self, world: &mut World, events: &mut EventQueue) -> Option<EntityId> {
        if self.end {
            return None;
        }
        let lock = self.lock?;

        let scale = self.viewport.scale;
        let dy = lock.pos.y - self.gun.y;
        let dir = if dy > 0.0 {
            1.0
        } else if dy < 0.0 {
            -1.0
        } else {
            0.0
        };
        let vel_y = dir * BULLET_SPEED * 10.0;
        let min_y = self.gun.y.min(lock.pos.y);
        let max_y = self.gun.y.max(lock.pos.y);

        let bullet = world.spawn(EntityKind::Projectile, self.gun);
        bullet.footprint = Some(self.bullet_footprint);
        bullet.movement = Some(Movement {
            amount: Vec2::new(BULLET_SPEED * scale, vel_y * scale),
        });
        bullet.constrain = Some(Constrain {
            min: Vec2::new(0.0, min_y),
            max: Vec2::new(self.viewport.play_width(), max_y),
        });
        bullet.tint = Some(Tint::Solid(Color::RED.alpha(180)));
        let id = bullet.id;

        events.signal(GameEvent::PlaySound(SoundCue::Shot));
        log::debug!("fired {id} at ({}, {})", lock.col, lock.row);
        Some(id)
    }

    /// Drop projectiles that left the play area
    pub fn bullet_system(&mut self, world: &mut World) {
        let width = self.viewport.play_width();
        let gone: Vec<EntityId> = world
            .of_kind(EntityKind::Projectile)
            .filter(|e| e.pos.x >= width)
            .map(|e| e.id)
            .collect();
        for id in gone {
            world.remove(id);
        }
    }

    /// Event listener
    pub fn on_event(&mut self, world: &mut World, events: &mut EventQueue, event: &GameEvent) {
        match event {
            GameEvent::PositionChanged { gun, .. } => self.gun = *gun,
            GameEvent::LevelEnd => self.end = true,
            _ if self.end => {}
            GameEvent::Fire => {
                self.fire(world, events);
            }
            GameEvent::ProjectileHitBlock(block) => self.impact(world, block),
            GameEvent::VehicleHitBlock(block) => {
                self.zero_cell(world, block);
                events.signal(GameEvent::Points {
                    total: VEHICLE_HIT_BLOCKS,
                    at: block.pos,
                });
            }
            GameEvent::MeshHitBlock(block) => {
                self.zero_cell(world, block);
                events.signal(GameEvent::Points {
                    total: MESH_HIT_BLOCKS,
                    at: block.pos,
                });
            }
            _ => {}
        }
    }

    /// A projectile hit a block: drop an impact block in the cell to its left
    /// and run the clear search from there
    fn impact(&mut self, world: &mut World, hit: &BlockRef) {
        // impacts on the first two columns have nowhere to land
        if hit.col < 2 {
            return;
        }
        let (c, r) = (hit.col - 1, hit.row);

        if let Some(old) = self.sprites.take(c, r) {
            remove_with_text(world, old);
        }

        let pos = self.cell_pos(world, c, r);
        let ent = world.spawn(EntityKind::Block, pos);
        ent.footprint = Some(self.footprint);
        ent.movement = Some(Movement {
            amount: Vec2::new(-BLOCK_SPEED * self.viewport.scale, 0.0),
        });
        ent.tint = Some(Tint::Solid(Color::RED));
        ent.block = Some(BlockTag::new(c, r));
        let id = ent.id;
        self.sprites.set(c, r, Some(id));

        for area in self.grid.place(c, r) {
            for (ac, ar) in area.cells() {
                self.begin_clearing(world, ac, ar);
            }
        }
    }

    /// Start the removal countdown on a freshly cleared cell. Cells already
    /// counting down keep their timer.
    fn begin_clearing(&mut self, world: &mut World, c: usize, r: usize) {
        let Some(id) = self.sprites.get(c, r) else {
            return;
        };
        let Some(ent) = world.get_mut(id) else {
            return;
        };
        let Some(tag) = ent.block.as_mut() else {
            return;
        };
        if tag.clear_on.is_some() {
            return;
        }
        tag.clear_on = Some(CLEAR_TIME);
        let has_text = tag.text.is_some();
        ent.tint = Some(Tint::Alternate {
            from: Color::RED,
            to: Color::SKY_BLUE,
            time: 0.25,
        });
        let pos = ent.pos;

        if has_text {
            return;
        }
        let text = world.spawn(EntityKind::FloatText, pos);
        text.movement = Some(Movement {
            amount: Vec2::new(-BLOCK_SPEED * self.viewport.scale, 0.0),
        });
        text.text = Some(countdown_label(CLEAR_TIME));
        text.tint = Some(Tint::Solid(Color::WHITE));
        let text_id = text.id;
        if let Some(tag) = world.get_mut(id).and_then(|e| e.block.as_mut()) {
            tag.text = Some(text_id);
        }
    }

    /// A body ran into a block: the cell is gone right away
    fn zero_cell(&mut self, world: &mut World, block: &BlockRef) {
        let (c, r) = (block.col, block.row);
        if c >= self.grid.cols() || r >= self.grid.rows() {
            return;
        }
        self.grid.set(c, r, BlockState::Empty);
        // the collided sprite is already gone; anything still indexed here
        // would be orphaned
        if let Some(id) = self.sprites.take(c, r) {
            remove_with_text(world, id);
        }
    }

    /// Count down clearing blocks and remove the expired ones. Everything
    /// removed in one tick is reported as a single points event at the
    /// centroid of the removed blocks.
    pub fn clear_system(&mut self, world: &mut World, events: &mut EventQueue, dt: f32) {
        if self.end {
            return;
        }

        let mut removed: Vec<Vec2> = Vec::new();
        let mut labels: Vec<(EntityId, String)> = Vec::new();

        for c in 0..self.grid.cols() {
            for r in 0..self.grid.rows() {
                if self.grid.get(c, r) != BlockState::Clearing {
                    continue;
                }
                let ent = match self.sprites.get(c, r) {
                    Some(id) => world.get_mut(id),
                    None => None,
                };
                let Some(ent) = ent else {
                    // nothing to show for it
                    self.grid.set(c, r, BlockState::Empty);
                    self.sprites.set(c, r, None);
                    continue;
                };
                let pos = ent.pos;
                let id = ent.id;
                let Some(tag) = ent.block.as_mut() else {
                    continue;
                };

                let remaining = tag.clear_on.unwrap_or(CLEAR_TIME) - dt;
                if remaining > 0.0 {
                    tag.clear_on = Some(remaining);
                    if let Some(text) = tag.text {
                        labels.push((text, countdown_label(remaining)));
                    }
                } else {
                    remove_with_text(world, id);
                    self.grid.set(c, r, BlockState::Empty);
                    self.sprites.set(c, r, None);
                    removed.push(pos);
                }
            }
        }

        for (id, label) in labels {
            if let Some(text) = world.get_mut(id) {
                text.text = Some(label);
            }
        }

        if !removed.is_empty() {
            let centroid = removed.iter().copied().sum::<Vec2>() / removed.len() as f32;
            log::debug!("cleared {} blocks around {:?}", removed.len(), centroid);
            events.signal(GameEvent::Points {
                total: removed.len() as i32,
                at: centroid,
            });
            events.signal(GameEvent::PlaySound(SoundCue::Pop));
        }
    }
}

/// Countdown text: whole seconds left, rounded up
fn countdown_label(remaining: f32) -> String {
    format!("{}", remaining.ceil() as i32)
}

fn remove_with_text(world: &mut World, id: EntityId) {
    if let Some(ent) = world.remove(id) {
        if let Some(text) = ent.block.and_then(|tag| tag.text) {
            world.remove(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::grid::grid;
    use super::*;
    use crate::SpriteSheet;

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 600.0,
            scale: 1.0,
        }
    }

    /// Map with 32x32 blocks whose column 0 starts at x = 850
    fn map_from(text: &str) -> (MapSystem, World) {
        let mut world = World::new();
        let map = MapSystem::from_grid(grid(text), viewport(), &SpriteSheet::builtin(), &mut world)
            .unwrap();
        (map, world)
    }

    fn drain(events: &mut EventQueue) -> Vec<GameEvent> {
        std::iter::from_fn(|| events.pop()).collect()
    }

    #[test]
    fn test_sprite_per_occupied_cell() {
        let (map, world) = map_from(concat!(" 3 \n", "33 \n"));
        assert_eq!(world.of_kind(EntityKind::Block).count(), 3);
        for (c, r, state) in map.grid().iter() {
            assert_eq!(map.sprite_at(c, r).is_some(), !state.is_empty());
        }
        let id = map.sprite_at(1, 0).unwrap();
        let ent = world.get(id).unwrap();
        assert_eq!(ent.pos, Vec2::new(850.0 + 32.0 + 16.0, 16.0));
        assert_eq!(ent.block.map(|t| (t.col, t.row)), Some((1, 0)));
    }

    #[test]
    fn test_missing_sprite_fails_load() {
        let mut world = World::new();
        let err = MapSystem::from_grid(Grid::new(2, 2), viewport(), &SpriteSheet::new(), &mut world)
            .unwrap_err();
        assert!(matches!(err, crate::Error::MissingSprite(_)));
    }

    #[test]
    fn test_world_to_cell_follows_scroll() {
        let (map, mut world) = map_from("333\n333\n");
        let p = world.pos(map.sprite_at(2, 1).unwrap()).unwrap();
        assert_eq!(map.world_to_cell(&world, p), (2, 1));

        for _ in 0..10 {
            world.step_movement(0.5);
        }
        let p = world.pos(map.sprite_at(2, 1).unwrap()).unwrap();
        assert_eq!(map.world_to_cell(&world, p), (2, 1));
        assert_eq!(map.cell_pos(&world, 2, 1), p);
    }

    #[test]
    fn test_target_prefers_smallest_forward_distance() {
        // blocks in rows 0 and 1 of columns 1 and 4; gun between the rows
        let (mut map, mut world) = map_from(concat!("    3 \n", " 3    \n"));
        map.gun = Vec2::new(600.0, 32.0);

        map.target_system(&mut world);

        let lock = map.lock().unwrap();
        assert_eq!((lock.col, lock.row), (1, 1));
        let block = world.pos(map.sprite_at(1, 1).unwrap()).unwrap();
        assert_eq!(lock.pos, Vec2::new(block.x - 32.0, block.y));
        assert_eq!(world.pos(map.target()), Some(lock.pos));
        let line = world.get(map.line()).unwrap();
        assert_eq!(line.pos, map.gun());
        assert_eq!(line.line_to, Some(Vec2::new(lock.pos.x - 16.0, lock.pos.y)));
    }

    #[test]
    fn test_target_tie_keeps_first_in_column_order() {
        // same column, rows 0 and 1 are both half a block from the gun
        let (mut map, mut world) = map_from("  3\n  3\n");
        map.gun = Vec2::new(100.0, 32.0);

        map.target_system(&mut world);

        let lock = map.lock().unwrap();
        assert_eq!((lock.col, lock.row), (2, 0));
        let block = world.pos(map.sprite_at(2, 0).unwrap()).unwrap();
        assert_eq!(lock.pos, Vec2::new(block.x - 32.0, block.y));
    }

    #[test]
    fn test_target_ignores_blocks_too_close_or_off_screen() {
        let (mut map, mut world) = map_from("33\n");
        // column 0 centre is 866: within the 100px gap
        map.gun = Vec2::new(800.0, 16.0);
        map.target_system(&mut world);
        assert!(map.lock().is_none());
        assert_eq!(world.pos(map.target()), Some(Vec2::splat(TARGET_HIDDEN)));
        let line = world.get(map.line()).unwrap();
        assert_eq!(line.line_to, Some(Vec2::new(1000.0, 16.0)));

        // out of vertical reach
        map.gun = Vec2::new(700.0, 100.0);
        map.target_system(&mut world);
        assert!(map.lock().is_none());

        map.gun = Vec2::new(700.0, 16.0);
        map.target_system(&mut world);
        assert_eq!(map.lock().map(|l| l.col), Some(0));
    }

    #[test]
    fn test_fire_needs_a_lock() {
        let (mut map, mut world) = map_from("  3\n");
        let mut events = EventQueue::new();
        map.gun = Vec2::new(100.0, 16.0);
        assert!(map.fire(&mut world, &mut events).is_none());
        assert!(events.is_empty());

        map.target_system(&mut world);
        let id = map.fire(&mut world, &mut events).unwrap();
        let bullet = world.get(id).unwrap();
        assert_eq!(bullet.pos, map.gun());
        assert_eq!(bullet.movement.unwrap().amount, Vec2::new(BULLET_SPEED, 0.0));
        assert_eq!(drain(&mut events), vec![GameEvent::PlaySound(SoundCue::Shot)]);
    }

    #[test]
    fn test_bullet_aligns_vertically_without_overshoot() {
        let (mut map, mut world) = map_from("  3\n");
        let mut events = EventQueue::new();
        map.gun = Vec2::new(100.0, 30.0);
        map.target_system(&mut world);
        let target_y = map.lock().unwrap().pos.y;
        assert_eq!(target_y, 16.0);

        let id = map.fire(&mut world, &mut events).unwrap();
        let bullet = world.get(id).unwrap();
        assert_eq!(bullet.movement.unwrap().amount.y, -BULLET_SPEED * 10.0);

        world.step_movement(0.1);
        let pos = world.pos(id).unwrap();
        assert_eq!(pos.y, target_y);
        assert!((pos.x - 160.0).abs() < 1e-3);
    }

    #[test]
    fn test_bullets_leave_at_play_width() {
        let (mut map, mut world) = map_from("3\n");
        let far = world.spawn(EntityKind::Projectile, Vec2::new(1000.0, 0.0)).id;
        let near = world.spawn(EntityKind::Projectile, Vec2::new(999.0, 0.0)).id;
        map.bullet_system(&mut world);
        assert!(!world.contains(far));
        assert!(world.contains(near));
    }

    #[test]
    fn test_projectile_hit_places_and_clears() {
        let (mut map, mut world) = map_from(concat!(
            "      \n",
            "   33 \n",
            "    3 \n",
            "   33 \n",
            "      \n",
        ));
        let mut events = EventQueue::new();
        let hit = BlockRef {
            col: 4,
            row: 2,
            pos: Vec2::ZERO,
        };
        map.on_event(&mut world, &mut events, &GameEvent::ProjectileHitBlock(hit));

        assert_eq!(
            map.grid().to_string(),
            concat!(
                "      \n",
                "   22 \n",
                "   22 \n",
                "   22 \n",
                "      \n",
            )
        );
        let impact = world.get(map.sprite_at(3, 2).unwrap()).unwrap();
        assert_eq!(impact.pos, map.cell_pos(&world, 3, 2));

        // every clearing cell counts down with a label
        for (c, r, state) in map.grid().iter() {
            if state != BlockState::Clearing {
                continue;
            }
            let tag = world.get(map.sprite_at(c, r).unwrap()).unwrap().block.unwrap();
            assert_eq!(tag.clear_on, Some(CLEAR_TIME));
            let text = world.get(tag.text.unwrap()).unwrap();
            assert_eq!(text.text.as_deref(), Some("5"));
        }
        assert_eq!(world.of_kind(EntityKind::FloatText).count(), 6);
    }

    #[test]
    fn test_projectile_hit_near_left_edge_is_ignored() {
        let (mut map, mut world) = map_from(" 3\n");
        let mut events = EventQueue::new();
        let before = map.grid().clone();
        let hit = BlockRef {
            col: 1,
            row: 0,
            pos: Vec2::ZERO,
        };
        map.on_event(&mut world, &mut events, &GameEvent::ProjectileHitBlock(hit));
        assert_eq!(map.grid(), &before);
    }

    #[test]
    fn test_body_hits_zero_cell_with_penalty() {
        let (mut map, mut world) = map_from("33\n");
        let mut events = EventQueue::new();
        let vehicle_hit = BlockRef {
            col: 0,
            row: 0,
            pos: Vec2::new(1.0, 2.0),
        };
        let mesh_hit = BlockRef {
            col: 1,
            row: 0,
            pos: Vec2::new(3.0, 4.0),
        };
        map.on_event(&mut world, &mut events, &GameEvent::VehicleHitBlock(vehicle_hit));
        map.on_event(&mut world, &mut events, &GameEvent::MeshHitBlock(mesh_hit));

        assert_eq!(map.grid().occupied(), 0);
        assert_eq!(map.sprites().count(), 0);
        assert_eq!(world.of_kind(EntityKind::Block).count(), 0);
        assert_eq!(
            drain(&mut events),
            vec![
                GameEvent::Points {
                    total: VEHICLE_HIT_BLOCKS,
                    at: Vec2::new(1.0, 2.0)
                },
                GameEvent::Points {
                    total: MESH_HIT_BLOCKS,
                    at: Vec2::new(3.0, 4.0)
                },
            ]
        );
    }

    #[test]
    fn test_decay_sweep_removes_after_timer() {
        let (mut map, mut world) = map_from(" 3 \n");
        let mut events = EventQueue::new();
        map.grid.set(1, 0, BlockState::Clearing);
        let id = map.sprite_at(1, 0).unwrap();
        let pos = world.pos(id).unwrap();
        world.get_mut(id).unwrap().block.as_mut().unwrap().clear_on = Some(5.0);

        map.clear_system(&mut world, &mut events, 2.0);
        map.clear_system(&mut world, &mut events, 2.0);
        assert!(world.contains(id));
        assert!(events.is_empty());

        map.clear_system(&mut world, &mut events, 2.0);
        assert!(!world.contains(id));
        assert_eq!(map.grid().get(1, 0), BlockState::Empty);
        assert_eq!(map.sprite_at(1, 0), None);
        assert_eq!(
            drain(&mut events),
            vec![
                GameEvent::Points { total: 1, at: pos },
                GameEvent::PlaySound(SoundCue::Pop),
            ]
        );
    }

    #[test]
    fn test_decay_reports_centroid_once() {
        let (mut map, mut world) = map_from(concat!(
            "      \n",
            "   33 \n",
            "    3 \n",
            "   33 \n",
            "      \n",
        ));
        let mut events = EventQueue::new();
        let hit = BlockRef {
            col: 4,
            row: 2,
            pos: Vec2::ZERO,
        };
        map.on_event(&mut world, &mut events, &GameEvent::ProjectileHitBlock(hit));

        map.clear_system(&mut world, &mut events, 4.5);
        let label = world
            .of_kind(EntityKind::FloatText)
            .next()
            .and_then(|t| t.text.clone());
        assert_eq!(label.as_deref(), Some("1"));
        assert!(events.is_empty());

        map.clear_system(&mut world, &mut events, 1.0);
        assert_eq!(map.grid().occupied(), 0);
        assert_eq!(world.of_kind(EntityKind::FloatText).count(), 0);
        let got = drain(&mut events);
        assert_eq!(got.len(), 2);
        let GameEvent::Points { total, at } = got[0] else {
            panic!("expected points, got {:?}", got[0]);
        };
        assert_eq!(total, 6);
        // centre of the 2x3 block at columns 3-4, rows 1-3
        assert_eq!(at, map.cell_pos(&world, 3, 2) + Vec2::new(16.0, 0.0));
    }

    #[test]
    fn test_level_end_stops_processing() {
        let (mut map, mut world) = map_from("  3\n");
        let mut events = EventQueue::new();
        map.gun = Vec2::new(100.0, 16.0);
        map.target_system(&mut world);
        map.on_event(&mut world, &mut events, &GameEvent::LevelEnd);
        assert!(map.is_ended());

        map.on_event(&mut world, &mut events, &GameEvent::Fire);
        assert_eq!(world.of_kind(EntityKind::Projectile).count(), 0);

        map.target_system(&mut world);
        assert!(map.lock().is_none());
    }
}
