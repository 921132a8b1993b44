//! Fixed timestep simulation tick
//!
//! Runs every system of a level once, in a fixed order, and delivers the
//! events they raise before returning.

use super::collision::resolve_collisions;
use super::events::GameEvent;
use super::level::Level;
use crate::error::Result;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Vertical stick, -1 (up) to 1 (down); 0 holds position
    pub steer: f32,
    /// Fire at the current target
    pub fire: bool,
}

/// Advance the level by one fixed timestep
pub fn tick(level: &mut Level, input: &TickInput, dt: f32) -> Result<()> {
    level.outbox.clear();
    level.time_ticks += 1;

    // delayed events whose time has come
    level.events.advance(dt);

    level.steer(input.steer);
    level.world.step_movement(dt);
    level.notify_position();
    level.follow_mesh(dt);
    level.dispatch();

    // aim with the fresh gun position before taking the shot
    level.map.target_system(&mut level.world);
    if input.fire {
        level.events.signal(GameEvent::Fire);
    }
    level.dispatch();

    level.map.bullet_system(&mut level.world);
    resolve_collisions(&mut level.world, level.overlap.as_ref(), &mut level.events)?;
    level.dispatch();

    level.map.clear_system(&mut level.world, &mut level.events, dt);
    level.score.display_system(dt);
    level.reach_production();
    level.dispatch();

    Ok(())
}
