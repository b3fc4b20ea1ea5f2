use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::source::PlayRejection;
use crate::time::FrameIndex;

/// Result type used by the playsync crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reason a timeline was rejected at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineDefect {
    InvertedRange {
        start: FrameIndex,
        end: FrameIndex,
    },
    OutOfOrder {
        previous_start: FrameIndex,
        start: FrameIndex,
    },
    InvalidSourceStart {
        seconds: f64,
    },
}

impl Display for TimelineDefect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvertedRange { start, end } => {
                write!(f, "start frame {start} is after end frame {end}")
            }
            Self::OutOfOrder {
                previous_start,
                start,
            } => write!(
                f,
                "start frame {start} precedes previous segment start {previous_start}"
            ),
            Self::InvalidSourceStart { seconds } => {
                write!(f, "source start must be finite and non-negative, got {seconds}")
            }
        }
    }
}

/// Errors produced by timeline construction, session setup and playback.
#[derive(Debug)]
pub enum EngineError {
    MalformedTimeline {
        index: usize,
        defect: TimelineDefect,
    },
    InvalidFrameRate {
        fps: f64,
    },
    PlaybackRejected {
        frame: FrameIndex,
        segment: usize,
        rejection: PlayRejection,
    },
    NoActiveSurface,
    SessionClosed,
    TimelineIo {
        path: PathBuf,
        source: std::io::Error,
    },
    TimelineSerialization {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigSerialization {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedTimeline { index, defect } => {
                write!(f, "malformed timeline at segment {index}: {defect}")
            }
            Self::InvalidFrameRate { fps } => write!(f, "invalid frame rate: {fps}"),
            Self::PlaybackRejected {
                frame,
                segment,
                rejection,
            } => write!(
                f,
                "playback rejected for segment {segment} at frame {frame}: {rejection}"
            ),
            Self::NoActiveSurface => write!(f, "presentation widget is not attached"),
            Self::SessionClosed => write!(f, "playback session is closed"),
            Self::TimelineIo { path, source } => {
                write!(f, "failed to read timeline: {} ({source})", path.display())
            }
            Self::TimelineSerialization { path, source } => match path {
                Some(path) => write!(f, "invalid timeline file {} ({source})", path.display()),
                None => write!(f, "invalid timeline input ({source})"),
            },
            Self::ConfigIo { path, source } => {
                write!(f, "failed to read session config: {} ({source})", path.display())
            }
            Self::ConfigSerialization { path, source } => match path {
                Some(path) => write!(f, "invalid session config {} ({source})", path.display()),
                None => write!(f, "invalid session config ({source})"),
            },
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PlaybackRejected { rejection, .. } => Some(rejection),
            Self::TimelineIo { source, .. } => Some(source),
            Self::TimelineSerialization { source, .. } => Some(source),
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigSerialization { source, .. } => Some(source),
            _ => None,
        }
    }
}
