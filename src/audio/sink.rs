//! Speaker output sink.
//!
//! The production sink mixes scheduled sources into a single CPAL output
//! stream on a dedicated thread (CPAL streams are not `Send`). Offsets are
//! measured on the stream's own sample clock, which starts at zero when the
//! sink opens; `PlaybackPipeline` schedules against the same clock.

use super::playback::PlaybackClock;
use crate::error::{Result, SessionError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Where scheduled segments go to become audible.
pub trait AudioSink: Send {
    /// Begin playing `samples` at offset `start` on the output clock.
    fn play(&mut self, source_id: u64, samples: Vec<i16>, sample_rate: u32, start: Duration)
        -> Result<()>;

    /// Immediately halt every source started through this sink.
    fn stop_all(&mut self);

    /// Release the output device. Idempotent.
    fn close(&mut self);
}

/// One scheduled source in the mix.
struct Voice {
    /// Start offset in device samples.
    start: u64,
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Voice {
    /// Length of this voice in device samples.
    fn device_len(&self, device_rate: u32) -> u64 {
        self.samples.len() as u64 * device_rate as u64 / self.sample_rate as u64
    }
}

struct MixState {
    /// Device samples emitted since the stream opened.
    position: u64,
    device_rate: u32,
    voices: Vec<Voice>,
}

impl MixState {
    /// Fill one mono output buffer and advance the clock.
    fn fill(&mut self, out: &mut [f32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            let pos = self.position + i as u64;
            let mut acc = 0i32;
            for voice in &self.voices {
                if pos < voice.start {
                    continue;
                }
                // Nearest-sample rate conversion from the source rate to the
                // device rate.
                let idx =
                    ((pos - voice.start) * voice.sample_rate as u64 / self.device_rate as u64)
                        as usize;
                if let Some(&s) = voice.samples.get(idx) {
                    acc += s as i32;
                }
            }
            *slot = (acc.clamp(i16::MIN as i32, i16::MAX as i32) as f32) / 32768.0;
        }
        self.position += out.len() as u64;
        let position = self.position;
        let device_rate = self.device_rate;
        self.voices
            .retain(|v| v.start + v.device_len(device_rate) > position);
    }
}

/// CPAL-backed speaker sink.
pub struct SpeakerSink {
    state: Arc<Mutex<MixState>>,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    device_rate: u32,
}

impl SpeakerSink {
    /// Open the default output device.
    pub async fn open() -> Result<Self> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("viva-speaker".to_string())
            .spawn(move || run_output(ready_tx, stop_rx))
            .map_err(|e| SessionError::device(format!("failed to spawn output thread: {e}")))?;

        let (state, device_rate) = match ready_rx.await {
            Ok(Ok(ready)) => ready,
            Ok(Err(message)) => {
                let _ = thread.join();
                return Err(SessionError::DeviceUnavailable { message });
            }
            Err(_) => {
                return Err(SessionError::device("output thread exited during setup"));
            }
        };

        info!("Speaker sink opened at {} Hz", device_rate);

        Ok(Self {
            state,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            device_rate,
        })
    }

    /// Clock on this sink's output stream, for the playback schedule.
    pub fn clock(&self) -> Box<dyn PlaybackClock> {
        Box::new(SinkClock {
            state: Arc::clone(&self.state),
        })
    }
}

impl AudioSink for SpeakerSink {
    fn play(
        &mut self,
        source_id: u64,
        samples: Vec<i16>,
        sample_rate: u32,
        start: Duration,
    ) -> Result<()> {
        if self.stop_tx.is_none() {
            return Err(SessionError::PipelineClosed);
        }
        let start_sample = (start.as_secs_f64() * self.device_rate as f64).round() as u64;
        debug!(
            "Scheduling source {} at {:.3}s ({} samples @ {} Hz)",
            source_id,
            start.as_secs_f64(),
            samples.len(),
            sample_rate
        );
        let mut state = self.state.lock().expect("mix state poisoned");
        state.voices.push(Voice {
            start: start_sample,
            samples,
            sample_rate,
        });
        Ok(())
    }

    fn stop_all(&mut self) {
        let mut state = self.state.lock().expect("mix state poisoned");
        if !state.voices.is_empty() {
            debug!("Stopping {} playing sources", state.voices.len());
        }
        state.voices.clear();
    }

    fn close(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("Output thread did not shut down cleanly");
            }
        }
        self.state.lock().expect("mix state poisoned").voices.clear();
    }
}

impl Drop for SpeakerSink {
    fn drop(&mut self) {
        self.close();
    }
}

struct SinkClock {
    state: Arc<Mutex<MixState>>,
}

impl PlaybackClock for SinkClock {
    fn now(&self) -> Duration {
        let state = self.state.lock().expect("mix state poisoned");
        Duration::from_secs_f64(state.position as f64 / state.device_rate as f64)
    }
}

type ReadyPayload = (Arc<Mutex<MixState>>, u32);

/// Thread body: open the output stream and run it until stopped.
fn run_output(
    ready_tx: oneshot::Sender<std::result::Result<ReadyPayload, String>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err("no output device available".to_string()));
            return;
        }
    };
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported = match device.default_output_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("no usable output config on {device_name}: {e}")));
            return;
        }
    };
    if supported.sample_format() != SampleFormat::F32 {
        let _ = ready_tx.send(Err(format!(
            "unsupported output sample format {:?} on {device_name}",
            supported.sample_format()
        )));
        return;
    }

    let channels = supported.channels() as usize;
    let device_rate = supported.sample_rate().0;
    let state = Arc::new(Mutex::new(MixState {
        position: 0,
        device_rate,
        voices: Vec::new(),
    }));

    let cb_state = Arc::clone(&state);
    let mut mono = Vec::new();
    let stream = device.build_output_stream(
        &supported.config(),
        move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let frames = out.len() / channels.max(1);
            mono.resize(frames, 0.0);
            cb_state.lock().expect("mix state poisoned").fill(&mut mono);
            for (frame, &sample) in out.chunks_mut(channels.max(1)).zip(mono.iter()) {
                frame.fill(sample);
            }
        },
        |e| warn!("Output stream error: {}", e),
        None,
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to build output stream: {e}")));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("failed to start output stream: {e}")));
        return;
    }

    info!("Playing to output device: {}", device_name);
    let _ = ready_tx.send(Ok((state, device_rate)));

    let _ = stop_rx.recv();
    drop(stream);
    debug!("Output thread exiting");
}
