//! Level state
//!
//! Everything one stage needs: the entity world, the map, the score, the
//! event queue and the two bodies the player steers. Built once at stage
//! start from a seed, so two levels with the same seed and the same inputs
//! play out identically.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{AabbOverlap, Overlap, remove_tint};
use super::events::{EventQueue, GameEvent};
use super::grid::Grid;
use super::map::MapSystem;
use super::score::ScoreSystem;
use super::world::{Color, Constrain, EntityId, EntityKind, Movement, Tint, World};
use crate::Viewport;
use crate::assets::Assets;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::error::Result;
use crate::settings::Settings;

pub struct Level {
    /// Map seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub world: World,
    pub map: MapSystem,
    pub score: ScoreSystem,
    pub events: EventQueue,
    pub(crate) overlap: Box<dyn Overlap>,
    pub(crate) viewport: Viewport,
    vehicle: EntityId,
    mesh: EntityId,
    /// Unscaled vehicle sprite size, for the joint offset
    plane_sprite: Vec2,
    last_vehicle_pos: Option<Vec2>,
    /// Latest vehicle centre, chased by the mesh
    plane_pos: Vec2,
    prod_distance: Option<f32>,
    reached: bool,
    ended: bool,
    final_score: Option<i64>,
    volume: f32,
    /// Events delivered during the last tick
    pub(crate) outbox: Vec<GameEvent>,
}

impl Level {
    /// Generate a level from settings and a seed
    pub fn new(settings: &Settings, viewport: Viewport, assets: &dyn Assets, seed: u64) -> Result<Self> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::new();
        let map = MapSystem::load(settings.map_config(), viewport, assets, &mut world, &mut rng)?;
        log::info!(
            "Level ready: seed {seed}, {} cloud, {} blocks",
            settings.cloud.as_str(),
            map.grid().occupied()
        );
        let mut level = Self::assemble(seed, world, map, viewport, assets)?;
        level.volume = settings.volume();
        Ok(level)
    }

    /// Build a level around a prepared grid
    pub fn from_grid(grid: Grid, viewport: Viewport, assets: &dyn Assets) -> Result<Self> {
        let mut world = World::new();
        let map = MapSystem::from_grid(grid, viewport, assets, &mut world)?;
        Self::assemble(0, world, map, viewport, assets)
    }

    fn assemble(
        seed: u64,
        mut world: World,
        map: MapSystem,
        viewport: Viewport,
        assets: &dyn Assets,
    ) -> Result<Self> {
        let scale = viewport.scale;
        let plane_sprite = assets.sprite_size(PLANE_SPRITE)?;
        let mesh_sprite = assets.sprite_size(MESH_SPRITE)?;
        let plane_size = plane_sprite * PLANE_SCALE * scale;
        let mesh_size = mesh_sprite * MESH_SCALE * scale;
        let mid_y = viewport.play_height() / 2.0;

        let vehicle = world.spawn(
            EntityKind::Vehicle,
            Vec2::new(plane_size.x / 2.0 + PLANE_X * scale, mid_y),
        );
        vehicle.footprint = Some(plane_size);
        vehicle.movement = Some(Movement::default());
        vehicle.constrain = Some(vertical_band(viewport, plane_size));
        vehicle.tint = Some(Tint::Solid(Color::WHITE));
        let vehicle_id = vehicle.id;
        let plane_pos = vehicle.pos;

        let mesh = world.spawn(
            EntityKind::Mesh,
            Vec2::new(mesh_size.x / 2.0 + MESH_X * scale, mid_y),
        );
        mesh.footprint = Some(mesh_size);
        mesh.movement = Some(Movement::default());
        mesh.constrain = Some(vertical_band(viewport, mesh_size));
        mesh.tint = Some(Tint::Solid(Color::WHITE));
        let mesh_id = mesh.id;

        Ok(Self {
            seed,
            time_ticks: 0,
            world,
            map,
            score: ScoreSystem::new(),
            events: EventQueue::new(),
            overlap: Box::new(AabbOverlap),
            viewport,
            vehicle: vehicle_id,
            mesh: mesh_id,
            plane_sprite,
            last_vehicle_pos: None,
            plane_pos,
            prod_distance: None,
            reached: false,
            ended: false,
            final_score: None,
            volume: 1.0,
            outbox: Vec::new(),
        })
    }

    /// Swap the overlap test (e.g. for pixel-mask collision)
    pub fn with_overlap(mut self, overlap: Box<dyn Overlap>) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn vehicle(&self) -> EntityId {
        self.vehicle
    }

    pub fn mesh(&self) -> EntityId {
        self.mesh
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn final_score(&self) -> Option<i64> {
        self.final_score
    }

    /// Events delivered during the last tick, in delivery order
    pub fn last_events(&self) -> &[GameEvent] {
        &self.outbox
    }

    /// Sounds requested during the last tick, with the volume to play them at
    pub fn sound_requests(&self) -> impl Iterator<Item = (SoundCue, f32)> + '_ {
        self.outbox.iter().filter_map(|e| match e {
            GameEvent::PlaySound(cue) => Some((*cue, self.volume)),
            _ => None,
        })
    }

    /// How far the mesh has travelled towards production, 0 to 1
    pub fn progress(&self) -> f32 {
        match (self.prod_distance, self.production_gap()) {
            (Some(total), Some(gap)) if total > 0.0 => (1.0 - gap / total).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    fn production_gap(&self) -> Option<f32> {
        let prod = self.world.pos(self.map.production())?;
        let mesh = self.world.pos(self.mesh)?;
        Some(prod.x - mesh.x)
    }

    /// Apply the player's vertical stick, -1 (up) to 1 (down)
    pub(crate) fn steer(&mut self, stick: f32) {
        if self.ended {
            return;
        }
        let speed = PLANE_SPEED * self.viewport.scale * stick.clamp(-1.0, 1.0);
        if let Some(mov) = self.world.get_mut(self.vehicle).and_then(|e| e.movement.as_mut()) {
            mov.amount = Vec2::new(0.0, speed);
        }
    }

    /// Tell everyone where the vehicle, its joint and its gun are now
    pub(crate) fn notify_position(&mut self) {
        let Some(pos) = self.world.pos(self.vehicle) else {
            return;
        };
        if self.last_vehicle_pos == Some(pos) {
            return;
        }
        self.last_vehicle_pos = Some(pos);

        let k = PLANE_SCALE * self.viewport.scale;
        let joint = Vec2::new(
            pos.x - (self.plane_sprite.x / 2.0 - JOINT_SHIFT_X) * k,
            pos.y - JOINT_SHIFT_Y * k,
        );
        let gun = pos + Vec2::new(GUN_SHIFT_X, GUN_SHIFT_Y) * k;
        self.events.signal(GameEvent::PositionChanged { pos, joint, gun });
    }

    /// Steer the mesh towards the vehicle's height
    pub(crate) fn follow_mesh(&mut self, dt: f32) {
        if self.ended {
            return;
        }
        let target_y = self.plane_pos.y;
        let scale = self.viewport.scale;
        let Some(mesh) = self.world.get_mut(self.mesh) else {
            return;
        };
        let diff = target_y - mesh.pos.y;
        let speed = (diff * MESH_SPEED * scale * dt).clamp(-TOP_MESH_SPEED, TOP_MESH_SPEED);
        if let Some(mov) = mesh.movement.as_mut() {
            mov.amount.y = speed;
        }
    }

    /// End the level once the mesh has passed production
    pub(crate) fn reach_production(&mut self) {
        if self.reached {
            return;
        }
        let Some(gap) = self.production_gap() else {
            return;
        };
        self.prod_distance.get_or_insert(gap);
        if gap < 0.0 {
            self.reached = true;
            log::info!("Mesh reached production after {} ticks", self.time_ticks);
            self.events.signal(GameEvent::LevelEnd);
        }
    }

    /// Deliver queued events to every listener until the queue is empty
    pub(crate) fn dispatch(&mut self) {
        while let Some(event) = self.events.pop() {
            self.map.on_event(&mut self.world, &mut self.events, &event);
            self.score.on_event(&mut self.events, &event);
            self.on_event(&event);
            self.outbox.push(event);
        }
    }

    fn on_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::PositionChanged { pos, .. } if !self.ended => self.plane_pos = pos,
            GameEvent::RemoveTint(id) => remove_tint(&mut self.world, id),
            GameEvent::LevelEnd => {
                self.ended = true;
                // the mesh drifts off with the scroll, the vehicle stops
                if let Some(mesh) = self.world.get_mut(self.mesh) {
                    mesh.movement = Some(Movement {
                        amount: Vec2::new(-BLOCK_SPEED * self.viewport.scale, 0.0),
                    });
                    mesh.constrain = None;
                }
                if let Some(mov) = self.world.get_mut(self.vehicle).and_then(|e| e.movement.as_mut()) {
                    mov.amount = Vec2::ZERO;
                }
                self.events.signal(GameEvent::PlaySound(SoundCue::Win));
            }
            GameEvent::FinalScore { total } => self.final_score = Some(total),
            _ => {}
        }
    }
}

/// Keep a body of `size` fully on screen vertically
fn vertical_band(viewport: Viewport, size: Vec2) -> Constrain {
    Constrain {
        min: Vec2::new(0.0, size.y / 2.0),
        max: Vec2::new(viewport.play_width(), viewport.play_height() - size.y / 2.0),
    }
}
