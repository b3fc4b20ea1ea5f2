mod args;
mod simulated;

use std::process::ExitCode;
use std::sync::Arc;

use args::{CliArgs, CliError, ScriptedSeek};
use playsync::{
    Event, EventReceiver, FrameRate, Session, SessionConfig, SessionHandle, SessionSnapshot,
    StreamHandle, Timeline,
};
use simulated::{LogSurface, SimulatedWidget};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    match run(std::env::args().skip(1)).await {
        Ok(snapshot) => {
            info!(
                frame = snapshot.frame,
                seconds = snapshot.seconds,
                ticks = snapshot.ticks,
                presented = snapshot.presented,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(%error, "playsync failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run(raw_args: impl IntoIterator<Item = String>) -> Result<SessionSnapshot, CliError> {
    let args = CliArgs::parse(raw_args)?;
    let timeline = Arc::new(Timeline::load(&args.timeline)?);
    let config = session_config(&args, &timeline)?;
    info!(
        timeline = %args.timeline.display(),
        segments = timeline.len(),
        fps = config.frame_rate.fps(),
        mode = ?config.mode,
        tick_limit = ?config.tick_limit,
        "loaded timeline"
    );

    let (mut session, handle, events) = Session::new(timeline, config);
    session.attach_widget(
        SimulatedWidget::new(args.block_first_play),
        StreamHandle::new(args.source.clone()),
    );
    session.attach_surface(LogSurface::default());

    let (snapshot, (), ()) = tokio::join!(
        session.run(),
        play_seek_script(handle, args.seeks.clone()),
        log_events(events),
    );
    Ok(snapshot)
}

/// Merges file config with command line overrides.
///
/// Without an explicit tick limit the session runs one second past the last
/// segment end.
fn session_config(args: &CliArgs, timeline: &Timeline) -> Result<SessionConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.frame_rate = FrameRate::new(fps)?;
    }
    if let Some(max_frame) = args.max_frame {
        config.max_frame = max_frame;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if args.frames.is_some() {
        config.tick_limit = args.frames;
    }
    if config.tick_limit.is_none() {
        let last_end = timeline.segments().last().map_or(0, |segment| segment.end_frame());
        let tail = config.frame_rate.fps().ceil() as u64;
        config.tick_limit = Some(last_end.saturating_add(tail));
    }
    Ok(config)
}

async fn play_seek_script(handle: SessionHandle, seeks: Vec<ScriptedSeek>) {
    let mut snapshots = handle.subscribe();
    let mut pending = seeks.into_iter().peekable();

    while let Some(next) = pending.peek().copied() {
        if snapshots.borrow_and_update().ticks >= next.at_tick {
            info!(frame = next.frame, at_tick = next.at_tick, "scripted seek");
            if handle.seek(next.frame).is_err() {
                warn!(frame = next.frame, "session closed before scripted seek");
                return;
            }
            pending.next();
            continue;
        }
        if snapshots.changed().await.is_err() {
            return;
        }
    }
}

async fn log_events(mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            Event::SegmentStarted {
                frame,
                segment,
                source_offset,
            } => info!(
                frame,
                segment,
                source_secs = source_offset.as_secs_f64(),
                "segment started"
            ),
            Event::SegmentEnded { frame, segment } => info!(frame, segment, "segment ended"),
            Event::SegmentSkipped { frame, segment } => warn!(frame, segment, "segment skipped"),
            Event::TimelineExhausted { frame } => info!(frame, "timeline exhausted"),
            Event::Seeked { frame, slot } => info!(frame, %slot, "seeked"),
            Event::RateChanged { rate } => info!(fps = rate.fps(), "rate changed"),
            Event::Stopped { frame, ticks } => info!(frame, ticks, "session stopped"),
            Event::Error(error) => {
                warn!(kind = ?error.kind, message = %error.message, "engine error");
            }
        }
    }
}
