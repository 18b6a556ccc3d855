pub mod capture;
pub mod microphone;
pub mod pcm;
pub mod playback;
pub mod sink;

pub use capture::{CaptureBackend, CaptureBackendFactory, CaptureBlock, CaptureConfig};
pub use playback::{AudioSegment, MonotonicClock, PlaybackClock, PlaybackPipeline};
pub use sink::{AudioSink, SpeakerSink};
