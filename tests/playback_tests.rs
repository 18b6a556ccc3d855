// Tests for the gapless playback schedule and barge-in interruption
//
// The clock and sink are test doubles, so scheduling decisions are
// deterministic: the clock only moves when a test advances it, and the sink
// records what it was asked to play.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use viva::audio::playback::{AudioSegment, PlaybackClock, PlaybackPipeline};
use viva::audio::sink::AudioSink;
use viva::error::SessionError;

#[derive(Clone, Default)]
struct ManualClock(Arc<Mutex<Duration>>);

impl ManualClock {
    fn set(&self, at: Duration) {
        *self.0.lock().unwrap() = at;
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> Duration {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct SinkLog {
    /// (source_id, sample count, scheduled start)
    played: Vec<(u64, usize, Duration)>,
    stop_all_calls: usize,
    closed: bool,
}

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<SinkLog>>);

impl AudioSink for RecordingSink {
    fn play(
        &mut self,
        source_id: u64,
        samples: Vec<i16>,
        _sample_rate: u32,
        start: Duration,
    ) -> viva::error::Result<()> {
        self.0
            .lock()
            .unwrap()
            .played
            .push((source_id, samples.len(), start));
        Ok(())
    }

    fn stop_all(&mut self) {
        self.0.lock().unwrap().stop_all_calls += 1;
    }

    fn close(&mut self) {
        self.0.lock().unwrap().closed = true;
    }
}

const RATE: u32 = 24000;

fn segment(duration_secs: f64) -> AudioSegment {
    let samples = vec![0i16; (duration_secs * RATE as f64) as usize];
    AudioSegment::new(samples, RATE)
}

fn pipeline() -> (PlaybackPipeline, ManualClock, RecordingSink) {
    let clock = ManualClock::default();
    let sink = RecordingSink::default();
    let pipeline = PlaybackPipeline::new(Box::new(clock.clone()), Box::new(sink.clone()));
    (pipeline, clock, sink)
}

#[tokio::test]
async fn test_segments_are_scheduled_back_to_back() {
    let (mut pipeline, _clock, _sink) = pipeline();

    let first = pipeline.enqueue(segment(1.0)).unwrap();
    let second = pipeline.enqueue(segment(0.5)).unwrap();
    let third = pipeline.enqueue(segment(0.25)).unwrap();

    // Each start is exactly the previous computed end: no overlap, no gap
    assert_eq!(first, Duration::ZERO);
    assert_eq!(second, Duration::from_secs_f64(1.0));
    assert_eq!(third, Duration::from_secs_f64(1.5));
    assert_eq!(pipeline.next_start(), Duration::from_secs_f64(1.75));
}

#[tokio::test]
async fn test_one_second_then_half_second() {
    // Two segments enqueued back-to-back: the second starts at 1.0s
    let (mut pipeline, _clock, _sink) = pipeline();

    pipeline.enqueue(segment(1.0)).unwrap();
    let start = pipeline.enqueue(segment(0.5)).unwrap();

    assert_eq!(start, Duration::from_secs(1));
}

#[tokio::test]
async fn test_enqueue_after_idle_gap_starts_now() {
    let (mut pipeline, clock, _sink) = pipeline();

    pipeline.enqueue(segment(0.5)).unwrap();

    // The schedule ran dry; a segment arriving later starts at the current
    // clock time, not at the stale previous end
    clock.set(Duration::from_secs(2));
    let start = pipeline.enqueue(segment(0.5)).unwrap();

    assert_eq!(start, Duration::from_secs(2));
}

#[tokio::test]
async fn test_interrupt_clears_active_sources_and_resets_schedule() {
    let (mut pipeline, _clock, sink) = pipeline();

    pipeline.enqueue(segment(1.0)).unwrap();
    pipeline.enqueue(segment(1.0)).unwrap();
    assert_eq!(pipeline.active_sources(), 2);

    pipeline.interrupt();

    assert_eq!(pipeline.active_sources(), 0);
    assert_eq!(pipeline.next_start(), Duration::ZERO);
    assert_eq!(sink.0.lock().unwrap().stop_all_calls, 1);

    // The next segment starts at the clock origin, not after cancelled audio
    let start = pipeline.enqueue(segment(0.5)).unwrap();
    assert_eq!(start, Duration::ZERO);
}

#[tokio::test]
async fn test_segment_after_interrupt_starts_immediately() {
    let (mut pipeline, clock, _sink) = pipeline();

    pipeline.enqueue(segment(5.0)).unwrap();
    clock.set(Duration::from_millis(300));
    pipeline.interrupt();

    // 4.7s of cancelled audio no longer delays the reply
    let start = pipeline.enqueue(segment(1.0)).unwrap();
    assert_eq!(start, Duration::from_millis(300));
}

#[tokio::test]
async fn test_finished_sources_leave_the_active_set() {
    let (mut pipeline, clock, sink) = pipeline();

    pipeline.enqueue(segment(1.0)).unwrap();
    assert_eq!(pipeline.active_sources(), 1);

    clock.set(Duration::from_millis(1100));
    assert_eq!(pipeline.active_sources(), 0);

    // Natural completion involves no forced stop
    assert_eq!(sink.0.lock().unwrap().stop_all_calls, 0);
}

#[tokio::test]
async fn test_zero_length_segment_is_a_noop() {
    let (mut pipeline, _clock, sink) = pipeline();

    pipeline.enqueue(segment(1.0)).unwrap();
    let next_before = pipeline.next_start();

    pipeline.enqueue(AudioSegment::new(Vec::new(), RATE)).unwrap();

    assert_eq!(pipeline.next_start(), next_before);
    assert_eq!(pipeline.active_sources(), 1);
    assert_eq!(sink.0.lock().unwrap().played.len(), 1);
}

#[tokio::test]
async fn test_enqueue_after_drain_and_close_fails() {
    let (mut pipeline, clock, sink) = pipeline();

    pipeline.enqueue(segment(0.5)).unwrap();
    clock.set(Duration::from_secs(1));
    pipeline.drain_and_close().await;

    assert!(sink.0.lock().unwrap().closed);
    assert!(matches!(
        pipeline.enqueue(segment(0.5)),
        Err(SessionError::PipelineClosed)
    ));
}

#[tokio::test]
async fn test_close_halts_active_sources() {
    let (mut pipeline, _clock, sink) = pipeline();

    pipeline.enqueue(segment(3.0)).unwrap();
    pipeline.close();

    let log = sink.0.lock().unwrap();
    assert_eq!(log.stop_all_calls, 1);
    assert!(log.closed);
    drop(log);

    // Interrupt after close is a no-op
    pipeline.interrupt();
    assert_eq!(sink.0.lock().unwrap().stop_all_calls, 1);
}
