//! Sound cue requests
//!
//! The simulation only asks for sounds; playback belongs to the host.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Cleared blocks removed
    Pop,
    /// Vehicle or mesh ran into a block
    Hit,
    /// Projectile fired
    Shot,
    /// Mesh delivered to production
    Win,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Pop => "pop",
            SoundCue::Hit => "hit",
            SoundCue::Shot => "shot",
            SoundCue::Win => "win",
        }
    }

    /// Resource path the host should play
    pub fn file(&self) -> &'static str {
        match self {
            SoundCue::Pop => "resources/audio/pop.wav",
            SoundCue::Hit => "resources/audio/hit.wav",
            SoundCue::Shot => "resources/audio/shot.wav",
            SoundCue::Win => "resources/audio/win.wav",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_files_match_names() {
        for cue in [SoundCue::Pop, SoundCue::Hit, SoundCue::Shot, SoundCue::Win] {
            assert!(cue.file().ends_with(&format!("{}.wav", cue.as_str())));
        }
    }
}
