//! Gapless sequential playback scheduling.
//!
//! The pipeline owns the playback schedule: every enqueued segment starts no
//! earlier than the previous segment's computed end, so agent speech plays
//! back-to-back on a single output stream with no overlap and no reordering.
//! A barge-in interrupt halts everything and resets the schedule to the clock
//! origin so the next reply starts immediately.

use super::sink::AudioSink;
use crate::error::{Result, SessionError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source for the playback schedule, measured from the output clock's
/// origin. Injected so scheduling is deterministic under test.
pub trait PlaybackClock: Send {
    fn now(&self) -> Duration;
}

/// Wall-clock playback time since construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A decoded chunk of agent speech ready for playback.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Mono PCM16 samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

pub struct PlaybackPipeline {
    clock: Box<dyn PlaybackClock>,
    sink: Box<dyn AudioSink>,
    /// Earliest offset the next segment may start at.
    next_start: Duration,
    /// Scheduled-but-unfinished sources: (source id, scheduled end).
    active: Vec<(u64, Duration)>,
    next_source_id: u64,
    closed: bool,
}

impl PlaybackPipeline {
    pub fn new(clock: Box<dyn PlaybackClock>, sink: Box<dyn AudioSink>) -> Self {
        Self {
            clock,
            sink,
            next_start: Duration::ZERO,
            active: Vec::new(),
            next_source_id: 0,
            closed: false,
        }
    }

    /// Schedule a segment for gapless sequential playback.
    ///
    /// Returns the scheduled start offset. The start is
    /// `max(now, previous scheduled end)`, so segments never overlap and are
    /// never reordered. Zero-length segments are no-ops.
    pub fn enqueue(&mut self, segment: AudioSegment) -> Result<Duration> {
        if self.closed {
            return Err(SessionError::PipelineClosed);
        }

        let now = self.clock.now();
        self.reap(now);

        let start = now.max(self.next_start);
        if segment.samples.is_empty() {
            return Ok(start);
        }

        let end = start + segment.duration();
        let id = self.next_source_id;
        self.next_source_id += 1;

        self.sink
            .play(id, segment.samples, segment.sample_rate, start)?;
        self.active.push((id, end));
        self.next_start = end;

        Ok(start)
    }

    /// Barge-in: the candidate started speaking over the agent.
    ///
    /// Halts every active source, clears the set, and resets the schedule to
    /// the clock origin so the agent's next reply starts immediately instead
    /// of queueing behind cancelled audio.
    pub fn interrupt(&mut self) {
        if self.closed {
            return;
        }
        debug!("Playback interrupted ({} active sources)", self.active.len());
        self.sink.stop_all();
        self.active.clear();
        self.next_start = Duration::ZERO;
    }

    /// Number of scheduled sources that have not yet finished playing.
    /// Naturally completed sources leave the set on their own.
    pub fn active_sources(&mut self) -> usize {
        let now = self.clock.now();
        self.reap(now);
        self.active.len()
    }

    /// The offset the next enqueued segment would start at or after.
    pub fn next_start(&self) -> Duration {
        self.next_start
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Let the remaining schedule play out, then release the sink.
    pub async fn drain_and_close(&mut self) {
        if self.closed {
            return;
        }
        let now = self.clock.now();
        if self.next_start > now {
            tokio::time::sleep(self.next_start - now).await;
        }
        self.shutdown();
    }

    /// Immediate teardown: stop everything and release the sink.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.sink.stop_all();
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.sink.close();
        self.active.clear();
        self.closed = true;
    }

    fn reap(&mut self, now: Duration) {
        self.active.retain(|&(_, end)| end > now);
    }
}
