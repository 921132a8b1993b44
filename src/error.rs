//! Error types for level loading and per-tick processing

use thiserror::Error;

use crate::sim::EntityId;

#[derive(Debug, Error)]
pub enum Error {
    /// Sprite sheet has no entry for a sprite the level needs
    #[error("sprite not found in sheet: {0}")]
    MissingSprite(String),
    /// An entity taking part in a collision test has no footprint
    #[error("entity {0} has no sprite footprint")]
    MissingFootprint(EntityId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
