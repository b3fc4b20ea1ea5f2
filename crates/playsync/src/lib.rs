//! Frame-clocked playback synchronization for segment timelines.
//!
//! A [`Session`] ticks a project frame counter at a fixed rate and drives an
//! external presentation widget through the segments of a [`Timeline`],
//! painting the widget's current picture onto a rendering surface while a
//! segment plays.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod picture;
pub mod playback;
pub mod presenter;
pub mod source;
pub mod time;
pub mod timeline;

pub use api::{
    Command, EngineErrorEvent, EngineErrorKind, Event, EventReceiver, Session, SessionHandle,
    SessionSnapshot,
};
pub use clock::FrameClock;
pub use config::{SessionConfig, SyncMode};
pub use error::{EngineError, Result, TimelineDefect};
pub use picture::{Picture, PixelFormat};
pub use playback::{Liveness, PlaybackCursor, PlaybackState, PlaybackStateMachine};
pub use presenter::{PresentOutcome, Presenter, RenderSurface};
pub use source::{PlayRejection, PresentationWidget, SourceController, StreamHandle};
pub use time::{DEFAULT_MAX_FRAME, FrameIndex, FrameRate, clamp_seek_frame};
pub use timeline::{Segment, SegmentRecord, SegmentSlot, Timeline};
