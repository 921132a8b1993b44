//! Game settings and preferences
//!
//! Read once at stage start. The simulation only sees the plain numbers
//! derived from here (see [`Settings::map_config`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::MapConfig;

/// Default number of grid rows
pub const DEFAULT_ROWS: usize = 34;

/// Run length presets ("how big is the cloud")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CloudSize {
    #[default]
    Local,
    Startup,
    Corp,
    Public,
}

impl CloudSize {
    pub const ALL: [CloudSize; 4] = [
        CloudSize::Local,
        CloudSize::Startup,
        CloudSize::Corp,
        CloudSize::Public,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CloudSize::Local => "local",
            CloudSize::Startup => "startup",
            CloudSize::Corp => "corp",
            CloudSize::Public => "public",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(CloudSize::Local),
            "startup" => Some(CloudSize::Startup),
            "corp" | "corporate" => Some(CloudSize::Corp),
            "public" => Some(CloudSize::Public),
            _ => None,
        }
    }

    /// Map length in grid columns
    pub fn columns(&self) -> usize {
        match self {
            CloudSize::Local => 50,
            CloudSize::Startup => 150,
            CloudSize::Corp => 300,
            CloudSize::Public => 450,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run length preset
    pub cloud: CloudSize,
    /// Grid rows
    pub rows: usize,
    /// Master volume (0.0 - 1.0), attached to sound cues
    pub master_volume: f32,
    /// Fixed map seed (None = random per run)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cloud: CloudSize::Local,
            rows: DEFAULT_ROWS,
            master_volume: 1.0,
            seed: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is unusable
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "Using default settings ({}: {})",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Effective master volume
    pub fn volume(&self) -> f32 {
        self.master_volume.clamp(0.0, 1.0)
    }

    /// Grid dimensions for the map system
    pub fn map_config(&self) -> MapConfig {
        MapConfig {
            cols: self.cloud.columns(),
            rows: self.rows,
        }
    }
}
