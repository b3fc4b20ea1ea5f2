use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Project frame counter at the configured project rate.
pub type FrameIndex = u64;

/// Upper bound of the user seek range when no other bound is configured.
pub const DEFAULT_MAX_FRAME: FrameIndex = 50_000;

/// Project frame rate in frames per second.
///
/// Independent of the native frame rate of the source stream.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    /// Default project rate.
    pub const DEFAULT: Self = Self(60.0);

    /// Creates a validated frame rate.
    ///
    /// The rate must be finite, positive and high enough for one frame period
    /// to fit in a [`Duration`].
    ///
    /// # Example
    /// ```
    /// use playsync::FrameRate;
    ///
    /// let rate = FrameRate::new(30.0).expect("valid");
    /// assert_eq!(rate.fps(), 30.0);
    /// assert!(FrameRate::new(0.0).is_err());
    /// ```
    pub fn new(fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 || Duration::try_from_secs_f64(1.0 / fps).is_err() {
            return Err(EngineError::InvalidFrameRate { fps });
        }
        Ok(Self(fps))
    }

    pub fn fps(self) -> f64 {
        self.0
    }

    /// Nominal distance between two ticks.
    pub fn frame_period(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }

    /// Whole seconds of project time elapsed at `frame`.
    pub fn whole_seconds(self, frame: FrameIndex) -> u64 {
        (frame as f64 / self.0).floor() as u64
    }

    /// Converts a project frame count into wall time at this rate, or `None`
    /// when the result does not fit in a [`Duration`].
    pub fn frames_to_duration(self, frames: FrameIndex) -> Option<Duration> {
        Duration::try_from_secs_f64(frames as f64 / self.0).ok()
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FrameRate> for f64 {
    fn from(value: FrameRate) -> Self {
        value.0
    }
}

/// Clamps raw user seek input into `[0, max_frame]`.
pub fn clamp_seek_frame(raw: i64, max_frame: FrameIndex) -> FrameIndex {
    if raw <= 0 {
        return 0;
    }
    (raw as u64).min(max_frame)
}
