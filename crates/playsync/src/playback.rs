use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{EngineErrorEvent, Event};
use crate::config::{SessionConfig, SyncMode};
use crate::error::EngineError;
use crate::presenter::{PresentOutcome, Presenter, RenderSurface};
use crate::source::{PresentationWidget, SourceController, StreamHandle};
use crate::time::{FrameIndex, FrameRate, clamp_seek_frame};
use crate::timeline::{SegmentSlot, Timeline};

/// Transport state of the source stream as seen by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// No segment reached yet, or the timeline is exhausted.
    #[default]
    Idle,
    /// Source repositioned, waiting for playback to start.
    Seeking,
    Playing,
    /// Suspended by a segment end, a seek or a refused play.
    Paused,
}

/// Playback position owned by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    frame: FrameIndex,
    slot: SegmentSlot,
    playing: bool,
}

impl PlaybackCursor {
    fn at_session_start(timeline: &Timeline) -> Self {
        Self {
            frame: 0,
            slot: if timeline.is_empty() {
                SegmentSlot::End
            } else {
                SegmentSlot::Segment(0)
            },
            playing: false,
        }
    }

    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    pub fn slot(&self) -> SegmentSlot {
        self.slot
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Shared flag telling in-flight work whether its session is still alive.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn end(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-tick driver of the source stream against the timeline.
///
/// Single owner of the [`PlaybackCursor`]: only [`tick`](Self::tick) and
/// [`seek`](Self::seek) mutate it.
#[derive(Debug)]
pub struct PlaybackStateMachine<W, S> {
    timeline: Arc<Timeline>,
    rate: FrameRate,
    max_frame: FrameIndex,
    mode: SyncMode,
    cursor: PlaybackCursor,
    state: PlaybackState,
    source: Option<SourceController<W>>,
    presenter: Presenter<S>,
    liveness: Liveness,
    resume_pending: bool,
    inactive_reported: bool,
}

impl<W, S> PlaybackStateMachine<W, S>
where
    W: PresentationWidget,
    S: RenderSurface,
{
    pub fn new(timeline: Arc<Timeline>, config: &SessionConfig, liveness: Liveness) -> Self {
        Self {
            cursor: PlaybackCursor::at_session_start(&timeline),
            timeline,
            rate: config.frame_rate,
            max_frame: config.max_frame,
            mode: config.mode,
            state: PlaybackState::Idle,
            source: None,
            presenter: Presenter::default(),
            liveness,
            resume_pending: false,
            inactive_reported: false,
        }
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn presented(&self) -> u64 {
        self.presenter.presented()
    }

    pub fn source(&self) -> Option<&SourceController<W>> {
        self.source.as_ref()
    }

    pub fn presenter(&self) -> &Presenter<S> {
        &self.presenter
    }

    /// Updates the rate used to map frames onto source offsets.
    pub fn set_rate(&mut self, rate: FrameRate) {
        self.rate = rate;
    }

    /// Attaches a presentation widget and loads `source` into it.
    ///
    /// Returns the previously attached widget, if any.
    pub fn attach_widget(&mut self, widget: W, source: StreamHandle) -> Option<W> {
        let previous = self.detach_widget();
        self.source = Some(SourceController::attach(widget, source));
        previous
    }

    /// Detaches the presentation widget. Playback is considered stopped.
    pub fn detach_widget(&mut self) -> Option<W> {
        let controller = self.source.take()?;
        if self.cursor.playing {
            self.cursor.playing = false;
            self.set_state(PlaybackState::Paused);
        }
        Some(controller.detach())
    }

    pub fn attach_surface(&mut self, surface: S) -> Option<S> {
        self.presenter.attach(surface)
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.presenter.detach()
    }

    /// Runs one clock tick: segment transitions, presentation, frame advance.
    ///
    /// Without a ready presentation widget the tick does nothing, not even
    /// advance the frame counter.
    pub async fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        let widget_ready = self.source.as_ref().is_some_and(SourceController::is_ready);
        if !widget_ready {
            if !self.inactive_reported {
                debug!(
                    frame = self.cursor.frame,
                    reason = %EngineError::NoActiveSurface,
                    "tick skipped"
                );
                self.inactive_reported = true;
            }
            return events;
        }
        self.inactive_reported = false;

        let frame = self.cursor.frame;
        if let Some(index) = self.cursor.slot.index() {
            let segment = self.timeline.segments()[index];

            if !self.cursor.playing {
                let offset = if frame == segment.start_frame() {
                    Some(segment.source_start())
                } else if self.resume_pending && segment.contains(frame) {
                    let offset = self
                        .rate
                        .frames_to_duration(frame - segment.start_frame())
                        .and_then(|into_segment| segment.source_start().checked_add(into_segment));
                    if offset.is_none() {
                        warn!(frame, segment = index, "resume offset out of range");
                    }
                    offset
                } else {
                    None
                };

                if let Some(offset) = offset {
                    self.start_segment(index, offset, &mut events).await;
                    if !self.liveness.is_alive() {
                        debug!(frame, segment = index, "session ended while play was pending");
                        return events;
                    }
                }
            }

            if frame == segment.end_frame() {
                if self.cursor.playing {
                    self.end_segment(index, &mut events);
                } else if self.mode == SyncMode::Lenient {
                    info!(frame, segment = index, "segment skipped");
                    events.push(Event::SegmentSkipped {
                        frame,
                        segment: index,
                    });
                    self.advance_past(index, &mut events);
                }
            }
        }
        self.resume_pending = false;

        if self.cursor.playing {
            let picture = self
                .source
                .as_ref()
                .and_then(SourceController::current_picture);
            if self.presenter.present(picture) == PresentOutcome::NoSurface {
                debug!(frame, "present skipped: no rendering surface");
            }
        }

        self.cursor.frame = frame.saturating_add(1);
        events
    }

    /// Moves the cursor to `raw_frame`, clamped into the seek range.
    ///
    /// A seek always suspends playback. In strict mode the source is not
    /// repositioned; playback resumes only when the cursor reaches the start
    /// of the resolved segment.
    pub fn seek(&mut self, raw_frame: i64) -> Vec<Event> {
        let frame = clamp_seek_frame(raw_frame, self.max_frame);
        let slot = self.timeline.lookup(frame);

        self.cursor.frame = frame;
        self.cursor.slot = slot;
        self.cursor.playing = false;
        if let Some(source) = self.source.as_mut() {
            source.pause();
        }

        self.resume_pending = self.mode == SyncMode::Lenient
            && self
                .timeline
                .get(slot)
                .is_some_and(|segment| segment.contains(frame) && frame > segment.start_frame());

        self.set_state(if slot.is_end() {
            PlaybackState::Idle
        } else {
            PlaybackState::Paused
        });

        info!(frame, slot = %slot, resume = self.resume_pending, "seek applied");
        vec![Event::Seeked { frame, slot }]
    }

    async fn start_segment(&mut self, index: usize, offset: Duration, events: &mut Vec<Event>) {
        let frame = self.cursor.frame;
        self.set_state(PlaybackState::Seeking);

        let result = {
            let Some(source) = self.source.as_mut() else {
                return;
            };
            source.seek(offset);
            source.play().await
        };

        if !self.liveness.is_alive() {
            return;
        }

        match result {
            Ok(()) => {
                self.cursor.playing = true;
                self.set_state(PlaybackState::Playing);
                info!(
                    frame,
                    segment = index,
                    source_offset_secs = offset.as_secs_f64(),
                    "segment playback started"
                );
                events.push(Event::SegmentStarted {
                    frame,
                    segment: index,
                    source_offset: offset,
                });
            }
            Err(rejection) => {
                self.cursor.playing = false;
                self.set_state(PlaybackState::Paused);
                let error = EngineError::PlaybackRejected {
                    frame,
                    segment: index,
                    rejection,
                };
                warn!(%error, "playback rejected");
                events.push(Event::Error(EngineErrorEvent::from_error(&error)));
            }
        }
    }

    fn end_segment(&mut self, index: usize, events: &mut Vec<Event>) {
        let frame = self.cursor.frame;
        if let Some(source) = self.source.as_mut() {
            source.pause();
        }
        self.cursor.playing = false;
        self.set_state(PlaybackState::Paused);

        info!(frame, segment = index, "segment playback ended");
        events.push(Event::SegmentEnded {
            frame,
            segment: index,
        });
        self.advance_past(index, events);
    }

    fn advance_past(&mut self, index: usize, events: &mut Vec<Event>) {
        self.cursor.slot = self.timeline.next_slot(index);
        if self.cursor.slot.is_end() {
            info!(frame = self.cursor.frame, "timeline exhausted");
            events.push(Event::TimelineExhausted {
                frame: self.cursor.frame,
            });
        }
    }

    fn set_state(&mut self, next: PlaybackState) {
        if self.state != next {
            debug!(
                frame = self.cursor.frame,
                from = ?self.state,
                to = ?next,
                "playback state changed"
            );
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{Liveness, PlaybackState, PlaybackStateMachine};
    use crate::api::{EngineErrorKind, Event};
    use crate::config::{SessionConfig, SyncMode};
    use crate::picture::{Picture, PixelFormat};
    use crate::presenter::RenderSurface;
    use crate::source::{PlayRejection, PresentationWidget, StreamHandle};
    use crate::time::FrameRate;
    use crate::timeline::{SegmentRecord, SegmentSlot, Timeline};

    #[tokio::test]
    async fn frame_counter_advances_once_per_tick() {
        let (mut machine, _calls) = machine_with(&[(10.0, 300, 500)], SyncMode::Strict);

        for _ in 0..120 {
            machine.tick().await;
        }

        assert_eq!(machine.cursor().frame(), 120);
    }

    #[tokio::test]
    async fn ticks_without_ready_widget_are_no_ops() {
        let timeline = timeline(&[(0.0, 0, 10)]);
        let mut machine: PlaybackStateMachine<MockWidget, RecordingSurface> =
            PlaybackStateMachine::new(timeline, &SessionConfig::default(), Liveness::new());

        let events = machine.tick().await;
        assert!(events.is_empty());
        assert_eq!(machine.cursor().frame(), 0);

        let widget = MockWidget {
            ready: false,
            ..MockWidget::default()
        };
        machine.attach_widget(widget, StreamHandle::new("blob:clip"));
        machine.tick().await;
        assert_eq!(machine.cursor().frame(), 0);
    }

    #[tokio::test]
    async fn single_frame_segment_plays_and_pauses_exactly_once() {
        let (mut machine, calls) = machine_with(&[(4.0, 100, 100)], SyncMode::Strict);

        let mut events = Vec::new();
        for _ in 0..250 {
            events.extend(machine.tick().await);
        }

        assert_eq!(
            calls.snapshot(),
            vec![
                Call::Seek(Duration::from_secs(4)),
                Call::Play,
                Call::Pause
            ]
        );
        assert_eq!(machine.cursor().slot(), SegmentSlot::End);
        assert!(!machine.cursor().is_playing());
        assert!(events.contains(&Event::SegmentStarted {
            frame: 100,
            segment: 0,
            source_offset: Duration::from_secs(4),
        }));
        assert!(events.contains(&Event::SegmentEnded {
            frame: 100,
            segment: 0
        }));
        assert!(events.contains(&Event::TimelineExhausted { frame: 100 }));
    }

    #[tokio::test]
    async fn adjacent_segments_never_overlap_transport_commands() {
        let (mut machine, calls) =
            machine_with(&[(1.0, 2, 5), (7.0, 6, 8), (9.0, 9, 9)], SyncMode::Strict);

        for _ in 0..20 {
            machine.tick().await;
        }

        assert_eq!(
            calls.snapshot(),
            vec![
                Call::Seek(Duration::from_secs(1)),
                Call::Play,
                Call::Pause,
                Call::Seek(Duration::from_secs(7)),
                Call::Play,
                Call::Pause,
                Call::Seek(Duration::from_secs(9)),
                Call::Play,
                Call::Pause,
            ]
        );
    }

    #[tokio::test]
    async fn terminal_state_issues_no_further_commands() {
        let (mut machine, calls) = machine_with(&[(0.0, 0, 3)], SyncMode::Strict);

        for _ in 0..5 {
            machine.tick().await;
        }
        assert_eq!(machine.cursor().slot(), SegmentSlot::End);
        let issued = calls.snapshot().len();

        for _ in 0..1_000 {
            let events = machine.tick().await;
            assert!(events.is_empty());
        }

        assert_eq!(calls.snapshot().len(), issued);
        assert!(!machine.cursor().is_playing());
        assert_eq!(machine.cursor().frame(), 1_005);
    }

    #[tokio::test]
    async fn presents_only_while_segment_is_playing() {
        let (mut machine, _calls) = machine_with(&[(0.0, 2, 5)], SyncMode::Strict);
        machine.attach_surface(RecordingSurface::default());

        for _ in 0..10 {
            machine.tick().await;
        }

        // Frames 2, 3 and 4; the end frame pauses before presenting.
        assert_eq!(machine.presented(), 3);
        let surface = machine.presenter().surface().expect("surface attached");
        assert_eq!(surface.draws, 3);
    }

    #[tokio::test]
    async fn seek_always_pauses_and_suspends_playback() {
        let (mut machine, calls) = machine_with(&[(10.0, 300, 500)], SyncMode::Strict);
        for _ in 0..=305 {
            machine.tick().await;
        }
        assert!(machine.cursor().is_playing());

        let events = machine.seek(50);

        assert_eq!(
            events,
            vec![Event::Seeked {
                frame: 50,
                slot: SegmentSlot::Segment(0)
            }]
        );
        assert!(!machine.cursor().is_playing());
        assert_eq!(machine.state(), PlaybackState::Paused);
        assert_eq!(calls.snapshot().last(), Some(&Call::Pause));

        machine.seek(60);
        assert_eq!(calls.snapshot().last(), Some(&Call::Pause));
        assert_eq!(
            calls.snapshot().iter().filter(|call| **call == Call::Pause).count(),
            2
        );
    }

    #[tokio::test]
    async fn seek_to_segment_start_resumes_on_next_tick() {
        let (mut machine, calls) =
            machine_with(&[(10.0, 300, 500), (100.0, 600, 699)], SyncMode::Strict);

        machine.seek(600);
        assert_eq!(machine.cursor().slot(), SegmentSlot::Segment(1));
        machine.tick().await;

        assert_eq!(
            calls.snapshot(),
            vec![
                Call::Pause,
                Call::Seek(Duration::from_secs(100)),
                Call::Play
            ]
        );
        assert!(machine.cursor().is_playing());
    }

    #[tokio::test]
    async fn strict_mid_segment_seek_neither_repositions_nor_resumes() {
        let (mut machine, calls) =
            machine_with(&[(10.0, 300, 500), (100.0, 600, 699)], SyncMode::Strict);

        machine.seek(400);
        for _ in 0..400 {
            machine.tick().await;
        }

        assert_eq!(calls.snapshot(), vec![Call::Pause]);
        assert_eq!(machine.cursor().slot(), SegmentSlot::Segment(0));
        assert_eq!(machine.cursor().frame(), 800);
    }

    #[tokio::test]
    async fn lenient_mid_segment_seek_resumes_at_matching_source_offset() {
        let (mut machine, calls) =
            machine_with(&[(10.0, 300, 500), (100.0, 600, 699)], SyncMode::Lenient);

        machine.seek(420);
        let events = machine.tick().await;

        let expected = Duration::from_secs(10)
            + FrameRate::DEFAULT
                .frames_to_duration(120)
                .expect("offset fits");
        assert_eq!(
            calls.snapshot(),
            vec![Call::Pause, Call::Seek(expected), Call::Play]
        );
        assert_eq!(
            events,
            vec![Event::SegmentStarted {
                frame: 420,
                segment: 0,
                source_offset: expected,
            }]
        );

        machine.tick().await;
        assert_eq!(calls.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn lenient_resume_with_unrepresentable_offset_stays_paused() {
        // 2^64 - 2048 seconds fits in a Duration; adding 2500 s does not.
        let timeline = timeline(&[(18_446_744_073_709_549_568.0, 0, 200_000)]);
        let config = SessionConfig {
            mode: SyncMode::Lenient,
            max_frame: 1_000_000,
            ..SessionConfig::default()
        };
        let mut machine: PlaybackStateMachine<MockWidget, RecordingSurface> =
            PlaybackStateMachine::new(timeline, &config, Liveness::new());
        let widget = MockWidget::default();
        let calls = widget.log.clone();
        machine.attach_widget(widget, StreamHandle::new("blob:clip"));

        machine.seek(150_000);
        let events = machine.tick().await;

        assert!(events.is_empty());
        assert_eq!(calls.snapshot(), vec![Call::Pause]);
        assert!(!machine.cursor().is_playing());
        assert_eq!(machine.cursor().frame(), 150_001);
    }

    #[tokio::test]
    async fn seek_input_clamps_and_past_last_segment_resolves_to_end() {
        let (mut machine, _calls) = machine_with(&[(0.0, 10, 20)], SyncMode::Strict);

        machine.seek(-40);
        assert_eq!(machine.cursor().frame(), 0);
        assert_eq!(machine.cursor().slot(), SegmentSlot::Segment(0));

        machine.seek(i64::MAX);
        assert_eq!(machine.cursor().frame(), 50_000);
        assert_eq!(machine.cursor().slot(), SegmentSlot::End);
        assert_eq!(machine.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn rejected_play_is_reported_once_and_not_retried() {
        let (mut machine, calls) = machine_with(&[(0.0, 5, 8), (2.0, 10, 12)], SyncMode::Strict);
        calls.reject_next(PlayRejection::Blocked);

        let mut errors = Vec::new();
        for _ in 0..30 {
            for event in machine.tick().await {
                if let Event::Error(error) = event {
                    errors.push(error);
                }
            }
        }

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, EngineErrorKind::PlaybackRejected);
        assert!(errors[0].message.contains("playback blocked"));
        assert!(!machine.cursor().is_playing());
        assert_eq!(
            calls.snapshot(),
            vec![Call::Seek(Duration::ZERO), Call::Play]
        );
        assert_eq!(machine.cursor().slot(), SegmentSlot::Segment(0));
    }

    #[tokio::test]
    async fn lenient_mode_steps_over_rejected_segment() {
        let (mut machine, calls) = machine_with(&[(0.0, 5, 8), (2.0, 10, 12)], SyncMode::Lenient);
        calls.reject_next(PlayRejection::Decode("corrupt header".to_owned()));

        let mut events = Vec::new();
        for _ in 0..30 {
            events.extend(machine.tick().await);
        }

        assert!(events.contains(&Event::SegmentSkipped {
            frame: 8,
            segment: 0
        }));
        assert_eq!(
            calls.snapshot(),
            vec![
                Call::Seek(Duration::ZERO),
                Call::Play,
                Call::Seek(Duration::from_secs(2)),
                Call::Play,
                Call::Pause,
            ]
        );
        assert_eq!(machine.cursor().slot(), SegmentSlot::End);
    }

    #[tokio::test]
    async fn play_completing_after_session_end_leaves_cursor_untouched() {
        let liveness = Liveness::new();
        let timeline = timeline(&[(0.0, 0, 10)]);
        let mut machine: PlaybackStateMachine<MockWidget, RecordingSurface> =
            PlaybackStateMachine::new(timeline, &SessionConfig::default(), liveness.clone());
        let widget = MockWidget {
            end_on_play: Some(liveness),
            ..MockWidget::default()
        };
        machine.attach_widget(widget, StreamHandle::new("blob:clip"));

        let events = machine.tick().await;

        assert!(events.is_empty());
        assert!(!machine.cursor().is_playing());
        assert_eq!(machine.cursor().frame(), 0);
    }

    #[tokio::test]
    async fn detaching_widget_stops_playback_and_pauses_ticks() {
        let (mut machine, _calls) = machine_with(&[(0.0, 0, 10)], SyncMode::Strict);
        machine.tick().await;
        assert!(machine.cursor().is_playing());

        let widget = machine.detach_widget();
        assert!(widget.is_some());
        assert!(!machine.cursor().is_playing());

        machine.tick().await;
        assert_eq!(machine.cursor().frame(), 1);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Seek(Duration),
        Play,
        Pause,
    }

    #[derive(Debug, Clone, Default)]
    struct CallLog {
        calls: Arc<Mutex<Vec<Call>>>,
        rejections: Arc<Mutex<VecDeque<PlayRejection>>>,
    }

    impl CallLog {
        fn push(&self, call: Call) {
            self.calls.lock().expect("lock calls").push(call);
        }

        fn snapshot(&self) -> Vec<Call> {
            self.calls.lock().expect("lock calls").clone()
        }

        fn reject_next(&self, rejection: PlayRejection) {
            self.rejections
                .lock()
                .expect("lock rejections")
                .push_back(rejection);
        }
    }

    #[derive(Debug)]
    struct MockWidget {
        log: CallLog,
        ready: bool,
        end_on_play: Option<Liveness>,
    }

    impl Default for MockWidget {
        fn default() -> Self {
            Self {
                log: CallLog::default(),
                ready: true,
                end_on_play: None,
            }
        }
    }

    impl PresentationWidget for MockWidget {
        fn set_source(&mut self, _source: &StreamHandle) {}

        fn is_source_ready(&self) -> bool {
            self.ready
        }

        fn seek_to(&mut self, offset: Duration) {
            self.log.push(Call::Seek(offset));
        }

        async fn play(&mut self) -> Result<(), PlayRejection> {
            self.log.push(Call::Play);
            tokio::task::yield_now().await;
            if let Some(liveness) = &self.end_on_play {
                liveness.end();
            }
            let rejection = self
                .log
                .rejections
                .lock()
                .expect("lock rejections")
                .pop_front();
            rejection.map_or(Ok(()), Err)
        }

        fn pause(&mut self) {
            self.log.push(Call::Pause);
        }

        fn current_picture(&self) -> Option<Picture> {
            Some(Picture {
                width: 1,
                height: 1,
                format: PixelFormat::Rgba8,
                bytes: Arc::from(vec![0_u8; 4]),
                source_time: Duration::ZERO,
            })
        }
    }

    #[derive(Debug, Default)]
    struct RecordingSurface {
        draws: usize,
    }

    impl RenderSurface for RecordingSurface {
        fn draw(&mut self, _picture: &Picture) {
            self.draws += 1;
        }
    }

    fn timeline(segments: &[(f64, u64, u64)]) -> Arc<Timeline> {
        let records: Vec<SegmentRecord> = segments
            .iter()
            .map(|&(source_start, start, end)| SegmentRecord {
                source_start,
                timeline_range: [start, end],
            })
            .collect();
        Arc::new(Timeline::from_records(&records).expect("valid timeline"))
    }

    fn machine_with(
        segments: &[(f64, u64, u64)],
        mode: SyncMode,
    ) -> (PlaybackStateMachine<MockWidget, RecordingSurface>, CallLog) {
        let config = SessionConfig {
            mode,
            ..SessionConfig::default()
        };
        let mut machine = PlaybackStateMachine::new(timeline(segments), &config, Liveness::new());
        let widget = MockWidget::default();
        let log = widget.log.clone();
        machine.attach_widget(widget, StreamHandle::new("blob:clip"));
        (machine, log)
    }
}
