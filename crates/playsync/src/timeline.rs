use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result, TimelineDefect};
use crate::time::FrameIndex;

/// One timeline entry as supplied by the authoring side.
///
/// `timeline_range` is an inclusive `[start, end]` frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    pub source_start: f64,
    pub timeline_range: [FrameIndex; 2],
}

/// A project frame range mapped onto an offset into the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    source_start: Duration,
    start_frame: FrameIndex,
    end_frame: FrameIndex,
}

impl Segment {
    /// Offset into the source stream where this segment begins.
    pub fn source_start(&self) -> Duration {
        self.source_start
    }

    /// First project frame of the segment.
    pub fn start_frame(&self) -> FrameIndex {
        self.start_frame
    }

    /// Last project frame of the segment, inclusive.
    pub fn end_frame(&self) -> FrameIndex {
        self.end_frame
    }

    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.start_frame <= frame && frame <= self.end_frame
    }

    fn from_record(record: &SegmentRecord) -> std::result::Result<Self, TimelineDefect> {
        let seconds = record.source_start;
        if seconds < 0.0 {
            return Err(TimelineDefect::InvalidSourceStart { seconds });
        }
        let source_start = Duration::try_from_secs_f64(seconds)
            .map_err(|_| TimelineDefect::InvalidSourceStart { seconds })?;
        let [start, end] = record.timeline_range;
        if start > end {
            return Err(TimelineDefect::InvertedRange { start, end });
        }

        Ok(Self {
            source_start,
            start_frame: start,
            end_frame: end,
        })
    }
}

/// Position of the playback cursor relative to the segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentSlot {
    Segment(usize),
    /// Past the last segment.
    End,
}

impl SegmentSlot {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Segment(index) => Some(index),
            Self::End => None,
        }
    }

    pub fn is_end(self) -> bool {
        self == Self::End
    }
}

impl Display for SegmentSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Segment(index) => write!(f, "segment {index}"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Validated, ordered segment table. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    /// Builds a timeline from authoring records.
    ///
    /// Rejects inverted ranges, negative source offsets and segments whose
    /// start frame precedes the previous segment's start.
    ///
    /// # Example
    /// ```
    /// use playsync::timeline::{SegmentRecord, SegmentSlot, Timeline};
    ///
    /// let timeline = Timeline::from_records(&[
    ///     SegmentRecord { source_start: 10.0, timeline_range: [300, 500] },
    ///     SegmentRecord { source_start: 100.0, timeline_range: [600, 699] },
    /// ])
    /// .expect("valid timeline");
    ///
    /// assert_eq!(timeline.lookup(550), SegmentSlot::Segment(1));
    /// assert_eq!(timeline.lookup(700), SegmentSlot::End);
    /// ```
    pub fn from_records(records: &[SegmentRecord]) -> Result<Self> {
        let mut segments = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let segment = Segment::from_record(record).map_err(|defect| {
                warn!(index, %defect, "timeline rejected");
                EngineError::MalformedTimeline { index, defect }
            })?;

            let previous_start = segments.last().map_or(0, |prev: &Segment| prev.start_frame);
            if segment.start_frame < previous_start {
                let defect = TimelineDefect::OutOfOrder {
                    previous_start,
                    start: segment.start_frame,
                };
                warn!(index, %defect, "timeline rejected");
                return Err(EngineError::MalformedTimeline { index, defect });
            }

            segments.push(segment);
        }

        debug!(segment_count = segments.len(), "timeline accepted");
        Ok(Self { segments })
    }

    /// Parses a JSON array of segment records.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<SegmentRecord> = serde_json::from_str(json)
            .map_err(|source| EngineError::TimelineSerialization { path: None, source })?;
        Self::from_records(&records)
    }

    /// Reads and validates a JSON timeline file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::TimelineIo {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<SegmentRecord> =
            serde_json::from_str(&json).map_err(|source| EngineError::TimelineSerialization {
                path: Some(path.to_path_buf()),
                source,
            })?;
        Self::from_records(&records)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, slot: SegmentSlot) -> Option<&Segment> {
        slot.index().and_then(|index| self.segments.get(index))
    }

    /// Slot following `index`, or `End` past the last segment.
    pub fn next_slot(&self, index: usize) -> SegmentSlot {
        let next = index + 1;
        if next < self.segments.len() {
            SegmentSlot::Segment(next)
        } else {
            SegmentSlot::End
        }
    }

    /// Resolves the segment that owns `frame`.
    ///
    /// Returns the first segment whose end frame is at or after `frame`, even
    /// when that segment has not started yet. Seeks rely on this to land in a
    /// segment context ahead of playback reaching it.
    pub fn lookup(&self, frame: FrameIndex) -> SegmentSlot {
        self.segments
            .iter()
            .position(|segment| segment.end_frame >= frame)
            .map_or(SegmentSlot::End, SegmentSlot::Segment)
    }
}
