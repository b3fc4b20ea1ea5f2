use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::picture::Picture;

/// Opaque reference to the source stream loaded into the widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamHandle(String);

impl StreamHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StreamHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why the presentation widget refused to start playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    /// Playback was blocked by policy, e.g. autoplay restrictions.
    Blocked,
    /// The widget could not decode the source.
    Decode(String),
    /// The source was detached before playback could start.
    SourceUnavailable,
}

impl Display for PlayRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocked => write!(f, "playback blocked"),
            Self::Decode(reason) => write!(f, "decode failed: {reason}"),
            Self::SourceUnavailable => write!(f, "source unavailable"),
        }
    }
}

impl std::error::Error for PlayRejection {}

/// Widget that decodes the source stream and exposes the current picture.
///
/// The engine never reads the widget's own playback clock; it only issues
/// transport commands and samples the current picture.
pub trait PresentationWidget {
    /// Loads a new source stream.
    fn set_source(&mut self, source: &StreamHandle);

    /// Returns true once the loaded source can accept transport commands.
    fn is_source_ready(&self) -> bool;

    /// Repositions the source stream.
    fn seek_to(&mut self, offset: Duration);

    /// Starts advancing the source stream. Resolves once playback actually
    /// started or was refused.
    fn play(&mut self) -> impl Future<Output = Result<(), PlayRejection>> + Send;

    fn pause(&mut self);

    /// Most recently decoded picture, if any.
    fn current_picture(&self) -> Option<Picture>;
}

/// Command adapter between the state machine and the presentation widget.
#[derive(Debug)]
pub struct SourceController<W> {
    widget: W,
    source: StreamHandle,
}

impl<W> SourceController<W>
where
    W: PresentationWidget,
{
    /// Wraps `widget` and loads `source` into it.
    pub fn attach(mut widget: W, source: StreamHandle) -> Self {
        debug!(source = %source, "attaching presentation widget");
        widget.set_source(&source);
        Self { widget, source }
    }

    pub fn source(&self) -> &StreamHandle {
        &self.source
    }

    pub fn is_ready(&self) -> bool {
        self.widget.is_source_ready()
    }

    pub fn seek(&mut self, offset: Duration) {
        debug!(offset_secs = offset.as_secs_f64(), "source seek");
        self.widget.seek_to(offset);
    }

    pub async fn play(&mut self) -> Result<(), PlayRejection> {
        debug!("source play");
        let result = self.widget.play().await;
        if let Err(rejection) = &result {
            debug!(%rejection, "source play refused");
        }
        result
    }

    pub fn pause(&mut self) {
        debug!("source pause");
        self.widget.pause();
    }

    pub fn current_picture(&self) -> Option<Picture> {
        self.widget.current_picture()
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Releases the widget back to the caller.
    pub fn detach(self) -> W {
        debug!(source = %self.source, "detaching presentation widget");
        self.widget
    }
}
