use std::sync::Arc;
use std::time::Duration;

use playsync::{
    Picture, PixelFormat, PlayRejection, PresentationWidget, RenderSurface, StreamHandle,
};
use tokio::time::Instant;
use tracing::{debug, trace};

const PICTURE_WIDTH: u32 = 4;
const PICTURE_HEIGHT: u32 = 4;

/// In-process stand-in for a decoding widget.
///
/// Keeps its own source position and synthesizes a flat RGBA picture whose
/// shade follows that position.
#[derive(Debug, Default)]
pub struct SimulatedWidget {
    source: Option<StreamHandle>,
    position: Duration,
    playing_since: Option<Instant>,
    block_next_play: bool,
}

impl SimulatedWidget {
    pub fn new(block_first_play: bool) -> Self {
        Self {
            block_next_play: block_first_play,
            ..Self::default()
        }
    }

    fn source_time(&self) -> Duration {
        match self.playing_since {
            Some(since) => self.position + since.elapsed(),
            None => self.position,
        }
    }
}

impl PresentationWidget for SimulatedWidget {
    fn set_source(&mut self, source: &StreamHandle) {
        self.source = Some(source.clone());
        self.position = Duration::ZERO;
        self.playing_since = None;
    }

    fn is_source_ready(&self) -> bool {
        self.source.is_some()
    }

    fn seek_to(&mut self, offset: Duration) {
        self.position = offset;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    async fn play(&mut self) -> Result<(), PlayRejection> {
        if self.source.is_none() {
            return Err(PlayRejection::SourceUnavailable);
        }
        if self.block_next_play {
            self.block_next_play = false;
            return Err(PlayRejection::Blocked);
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.position = self.source_time();
        self.playing_since = None;
    }

    fn current_picture(&self) -> Option<Picture> {
        self.source.as_ref()?;
        let source_time = self.source_time();
        let shade = (source_time.as_millis() % 256) as u8;
        let len = (PICTURE_WIDTH * PICTURE_HEIGHT * 4) as usize;
        Some(Picture {
            width: PICTURE_WIDTH,
            height: PICTURE_HEIGHT,
            format: PixelFormat::Rgba8,
            bytes: Arc::from(vec![shade; len]),
            source_time,
        })
    }
}

/// Surface that records each drawn picture in the log.
#[derive(Debug, Default)]
pub struct LogSurface {
    draws: u64,
}

impl LogSurface {
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RenderSurface for LogSurface {
    fn draw(&mut self, picture: &Picture) {
        self.draws += 1;
        trace!(
            draw = self.draws,
            width = picture.width,
            height = picture.height,
            source_secs = picture.source_time.as_secs_f64(),
            "picture drawn"
        );
        if self.draws == 1 {
            debug!("first picture drawn");
        }
    }
}
