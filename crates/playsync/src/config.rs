use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::time::{DEFAULT_MAX_FRAME, FrameIndex, FrameRate};

/// How the state machine treats seeks that land inside a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Seeks only update the segment index and pause. Playback resumes when
    /// the cursor next reaches a segment start.
    #[default]
    Strict,
    /// Seeks into a segment resume from the matching source offset, and
    /// segments that never played are stepped over at their end frame.
    Lenient,
}

/// Per-session settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub frame_rate: FrameRate,
    /// Upper bound for user seek input.
    pub max_frame: FrameIndex,
    pub mode: SyncMode,
    /// Stops the session after this many ticks.
    pub tick_limit: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::DEFAULT,
            max_frame: DEFAULT_MAX_FRAME,
            mode: SyncMode::Strict,
            tick_limit: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|source| EngineError::ConfigSerialization { path: None, source })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| EngineError::ConfigSerialization {
            path: Some(path.to_path_buf()),
            source,
        })
    }
}
