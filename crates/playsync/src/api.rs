use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::clock::FrameClock;
use crate::config::SessionConfig;
use crate::error::{EngineError, Result};
use crate::playback::{Liveness, PlaybackState, PlaybackStateMachine};
use crate::presenter::RenderSurface;
use crate::source::{PresentationWidget, StreamHandle};
use crate::time::{FrameIndex, FrameRate};
use crate::timeline::{SegmentSlot, Timeline};

/// Commands accepted by a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Moves the playhead. Out-of-range frames clamp to the seek range.
    Seek { frame: i64 },
    /// Changes the project rate for ticks scheduled from now on.
    SetRate { rate: FrameRate },
    Stop,
}

/// Events emitted by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SegmentStarted {
        frame: FrameIndex,
        segment: usize,
        source_offset: Duration,
    },
    SegmentEnded {
        frame: FrameIndex,
        segment: usize,
    },
    /// A segment reached its end frame without having played.
    SegmentSkipped {
        frame: FrameIndex,
        segment: usize,
    },
    TimelineExhausted {
        frame: FrameIndex,
    },
    Seeked {
        frame: FrameIndex,
        slot: SegmentSlot,
    },
    RateChanged {
        rate: FrameRate,
    },
    Stopped {
        frame: FrameIndex,
        ticks: u64,
    },
    Error(EngineErrorEvent),
}

/// Classification of user-facing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    PlaybackRejected,
    NoActiveSurface,
    MalformedTimeline,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::PlaybackRejected { .. } => Self::PlaybackRejected,
            EngineError::NoActiveSurface => Self::NoActiveSurface,
            EngineError::MalformedTimeline { .. } => Self::MalformedTimeline,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Point-in-time view of a session for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSnapshot {
    pub frame: FrameIndex,
    /// Whole seconds of project time at `frame`.
    pub seconds: u64,
    pub slot: SegmentSlot,
    pub playing: bool,
    pub state: PlaybackState,
    pub rate: FrameRate,
    pub presented: u64,
    pub ticks: u64,
}

/// Receiver for session events.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Cloneable entry point for user input into a running session.
///
/// Requests are queued and applied by the session loop between ticks, so the
/// cursor keeps a single writer.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    liveness: Liveness,
}

impl SessionHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| EngineError::SessionClosed)
    }

    pub fn seek(&self, frame: i64) -> Result<()> {
        self.send(Command::Seek { frame })
    }

    pub fn set_rate(&self, fps: f64) -> Result<()> {
        let rate = FrameRate::new(fps)?;
        self.send(Command::SetRate { rate })
    }

    /// Ends the session. Work already in flight finishes without touching
    /// the cursor.
    pub fn stop(&self) {
        self.liveness.end();
        let _ = self.command_tx.send(Command::Stop);
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// One playback session: frame clock plus state machine, driven on a single
/// task.
#[derive(Debug)]
pub struct Session<W, S> {
    machine: PlaybackStateMachine<W, S>,
    clock: FrameClock,
    tick_limit: Option<u64>,
    ticks: u64,
    liveness: Liveness,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<Event>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<W, S> Session<W, S>
where
    W: PresentationWidget,
    S: RenderSurface,
{
    /// Creates a session over a validated timeline.
    ///
    /// # Example
    /// ```ignore
    /// use std::sync::Arc;
    /// use playsync::{Session, SessionConfig, StreamHandle, Timeline};
    ///
    /// let timeline = Arc::new(Timeline::from_json_str(r#"[
    ///     { "sourceStart": 10, "timelineRange": [300, 500] }
    /// ]"#)?);
    /// let (mut session, handle, mut events) = Session::new(timeline, SessionConfig::default());
    /// session.attach_widget(widget, StreamHandle::new("blob:clip"));
    /// session.attach_surface(surface);
    /// tokio::spawn(session.run());
    /// handle.seek(300)?;
    /// ```
    pub fn new(
        timeline: Arc<Timeline>,
        config: SessionConfig,
    ) -> (Self, SessionHandle, EventReceiver) {
        let liveness = Liveness::new();
        let machine = PlaybackStateMachine::new(timeline, &config, liveness.clone());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial_snapshot(config.frame_rate));

        let session = Self {
            machine,
            clock: FrameClock::new(config.frame_rate),
            tick_limit: config.tick_limit,
            ticks: 0,
            liveness: liveness.clone(),
            command_rx,
            event_tx,
            snapshot_tx,
        };
        session.publish_snapshot();

        let handle = SessionHandle {
            command_tx,
            snapshot_rx,
            liveness,
        };
        (session, handle, event_rx)
    }

    pub fn attach_widget(&mut self, widget: W, source: StreamHandle) -> Option<W> {
        self.machine.attach_widget(widget, source)
    }

    pub fn detach_widget(&mut self) -> Option<W> {
        self.machine.detach_widget()
    }

    pub fn attach_surface(&mut self, surface: S) -> Option<S> {
        self.machine.attach_surface(surface)
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.machine.detach_surface()
    }

    pub fn machine(&self) -> &PlaybackStateMachine<W, S> {
        &self.machine
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let cursor = self.machine.cursor();
        let rate = self.clock.rate();
        SessionSnapshot {
            frame: cursor.frame(),
            seconds: rate.whole_seconds(cursor.frame()),
            slot: cursor.slot(),
            playing: cursor.is_playing(),
            state: self.machine.state(),
            rate,
            presented: self.machine.presented(),
            ticks: self.ticks,
        }
    }

    /// Runs the tick loop until stopped or the tick limit is reached.
    ///
    /// Each tick is scheduled only after the previous tick, including any
    /// awaited `play()`, has completed. Commands are applied while waiting
    /// for the next deadline.
    pub async fn run(mut self) -> SessionSnapshot {
        self.clock.start();
        info!(
            fps = self.clock.rate().fps(),
            segment_count = self.machine.timeline().len(),
            mode = ?self.machine.mode(),
            "playback session started"
        );

        let mut commands_open = true;
        'session: while self.clock.is_running() && !self.tick_limit_reached() {
            let deadline = self.clock.next_deadline(Instant::now());
            let mut sleep = std::pin::pin!(tokio::time::sleep_until(deadline));

            loop {
                tokio::select! {
                    biased;
                    command = self.command_rx.recv(), if commands_open => match command {
                        Some(command) => {
                            if self.apply(command) == Flow::Stop {
                                break 'session;
                            }
                        }
                        None => {
                            debug!("all session handles dropped");
                            commands_open = false;
                        }
                    },
                    () = sleep.as_mut() => break,
                }
            }

            if !self.liveness.is_alive() {
                break;
            }
            self.clock.mark_tick(deadline);
            let events = self.machine.tick().await;
            self.ticks += 1;
            self.forward(events);
            if !self.liveness.is_alive() {
                break;
            }
            self.publish_snapshot();
        }

        self.clock.stop();
        self.liveness.end();
        let snapshot = self.snapshot();
        info!(frame = snapshot.frame, ticks = snapshot.ticks, "playback session stopped");
        self.forward(vec![Event::Stopped {
            frame: snapshot.frame,
            ticks: snapshot.ticks,
        }]);
        self.snapshot_tx.send_replace(snapshot);
        snapshot
    }

    fn apply(&mut self, command: Command) -> Flow {
        match command {
            Command::Seek { frame } => {
                let events = self.machine.seek(frame);
                self.forward(events);
                self.publish_snapshot();
                Flow::Continue
            }
            Command::SetRate { rate } => {
                self.clock.set_rate(rate);
                self.machine.set_rate(rate);
                self.forward(vec![Event::RateChanged { rate }]);
                self.publish_snapshot();
                Flow::Continue
            }
            Command::Stop => {
                self.liveness.end();
                Flow::Stop
            }
        }
    }

    fn tick_limit_reached(&self) -> bool {
        self.tick_limit.is_some_and(|limit| self.ticks >= limit)
    }

    fn forward(&self, events: Vec<Event>) {
        for event in events {
            let _ = self.event_tx.send(event);
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }
}

fn initial_snapshot(rate: FrameRate) -> SessionSnapshot {
    SessionSnapshot {
        frame: 0,
        seconds: 0,
        slot: SegmentSlot::End,
        playing: false,
        state: PlaybackState::Idle,
        rate,
        presented: 0,
        ticks: 0,
    }
}
