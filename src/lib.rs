//! mesh2prod - A side-scrolling block-clearing arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, region clearing, collisions, scoring)
//! - `assets`: Sprite sheet size lookup
//! - `audio`: Sound cue requests emitted by the simulation
//! - `settings`: Run length and other tunables read at stage start

pub mod assets;
pub mod audio;
pub mod error;
pub mod settings;
pub mod sim;

pub use assets::{Assets, SpriteSheet};
pub use error::{Error, Result};
pub use settings::{CloudSize, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Design resolution the game layout is expressed in
    pub const DESIGN_WIDTH: f32 = 1920.0;
    pub const DESIGN_HEIGHT: f32 = 1080.0;

    /// Sprite names looked up in the sprite sheet
    pub const BLOCK_SPRITE: &str = "block.png";
    pub const MARK_SPRITE: &str = "mark.png";
    pub const BULLET_SPRITE: &str = "bullet_1.png";
    pub const PLANE_SPRITE: &str = "gopher_plane_1.png";
    pub const MESH_SPRITE: &str = "box1.png";
    pub const PRODUCTION_SPRITE: &str = "production.png";

    /// Block scroll speed (pixels/s, leftward)
    pub const BLOCK_SPEED: f32 = 25.0;
    /// Block sprite scale
    pub const BLOCK_SCALE: f32 = 0.5;
    /// Map starts this fraction of the play width to the right
    pub const MAP_ORIGIN_FACTOR: f32 = 0.85;

    /// Minimum forward gap between gun and a target
    pub const TARGET_GAP_X: f32 = 100.0;
    /// Where the target marker hides when nothing is locked
    pub const TARGET_HIDDEN: f32 = -1000.0;

    /// Bullet horizontal speed; vertical uses ten times this
    pub const BULLET_SPEED: f32 = 600.0;
    pub const BULLET_SCALE: f32 = 0.25;

    /// Seconds a cleared block lingers before it is removed
    pub const CLEAR_TIME: f32 = 5.0;

    /// Penalty (in blocks) for bodies hitting a block
    pub const VEHICLE_HIT_BLOCKS: i32 = -1;
    pub const MESH_HIT_BLOCKS: i32 = -2;

    /// Seconds a hit body stays tinted
    pub const TINT_TIME: f32 = 1.5;

    /// Vehicle/mesh sprite scale
    pub const PLANE_SCALE: f32 = 0.5;
    pub const MESH_SCALE: f32 = 0.5;
    /// Vehicle X position (from the left edge)
    pub const PLANE_X: f32 = 400.0;
    /// Vehicle vertical speed at full stick
    pub const PLANE_SPEED: f32 = 320.0;
    /// Gun offset from vehicle centre (before scale)
    pub const GUN_SHIFT_X: f32 = 70.0;
    pub const GUN_SHIFT_Y: f32 = 50.0;
    /// Joint offset from vehicle centre (before scale)
    pub const JOINT_SHIFT_X: f32 = 20.0;
    pub const JOINT_SHIFT_Y: f32 = 5.0;

    /// Mesh X position (from the left edge)
    pub const MESH_X: f32 = 10.0;
    /// Mesh chase gain and speed cap
    pub const MESH_SPEED: f32 = 200.0;
    pub const TOP_MESH_SPEED: f32 = 250.0;

    /// Scoring
    pub const POINTS_PER_BLOCK: i64 = 5;
    pub const POINTS_LOST_PER_BLOCK: i64 = 20;
    pub const POINTS_TO_ADD_PER_SEC: f32 = 100.0;
}

/// Play area in world space: design resolution times the game scale
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: consts::DESIGN_WIDTH,
            height: consts::DESIGN_HEIGHT,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Visible play width in world units
    #[inline]
    pub fn play_width(&self) -> f32 {
        self.width * self.scale
    }

    /// Visible play height in world units
    #[inline]
    pub fn play_height(&self) -> f32 {
        self.height * self.scale
    }
}
