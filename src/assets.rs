//! Sprite sheet lookup
//!
//! The simulation never draws anything, but it lays entities out by sprite
//! size, so stage load needs the sizes of a handful of named sprites.

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};

/// Source of sprite sizes (unscaled, in design pixels)
pub trait Assets {
    fn sprite_size(&self, name: &str) -> Result<Vec2>;
}

/// Sprite name -> size table, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub sprites: BTreeMap<String, Vec2>,
}

impl SpriteSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet with the sizes of the stock game art
    pub fn builtin() -> Self {
        let mut sheet = Self::new();
        sheet.insert(BLOCK_SPRITE, Vec2::new(64.0, 64.0));
        sheet.insert(MARK_SPRITE, Vec2::new(64.0, 64.0));
        sheet.insert(BULLET_SPRITE, Vec2::new(64.0, 32.0));
        sheet.insert(PLANE_SPRITE, Vec2::new(330.0, 210.0));
        sheet.insert(MESH_SPRITE, Vec2::new(260.0, 400.0));
        sheet.insert(PRODUCTION_SPRITE, Vec2::new(256.0, 512.0));
        sheet
    }

    pub fn insert(&mut self, name: &str, size: Vec2) {
        self.sprites.insert(name.to_string(), size);
    }

    /// Load a sheet description from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let sheet: SpriteSheet = serde_json::from_str(&json)?;
        log::info!(
            "Loaded sprite sheet {} ({} sprites)",
            path.as_ref().display(),
            sheet.sprites.len()
        );
        Ok(sheet)
    }
}

impl Assets for SpriteSheet {
    fn sprite_size(&self, name: &str) -> Result<Vec2> {
        self.sprites
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingSprite(name.to_string()))
    }
}
