//! Microphone capture backend using CPAL.
//!
//! CPAL streams are not `Send`, so the stream lives on a dedicated thread for
//! the lifetime of the capture; the backend talks to it through channels.

use super::capture::{CaptureBackend, CaptureBlock, CaptureConfig};
use crate::error::{Result, SessionError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Blocks buffered towards the session before capture starts dropping.
const BLOCK_CHANNEL_CAPACITY: usize = 32;

pub struct MicrophoneBackend {
    config: CaptureConfig,
    capturing: bool,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            capturing: false,
            stop_tx: None,
            thread: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureBlock>> {
        if self.capturing {
            return Err(SessionError::device("microphone already capturing"));
        }

        let (block_tx, block_rx) = mpsc::channel(BLOCK_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let config = self.config.clone();
        let thread = std::thread::Builder::new()
            .name("viva-mic".to_string())
            .spawn(move || run_capture(config, block_tx, ready_tx, stop_rx))
            .map_err(|e| SessionError::device(format!("failed to spawn capture thread: {e}")))?;

        // The stream must be built on the thread that owns it; wait for the
        // outcome of device acquisition there.
        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                let _ = thread.join();
                return Err(SessionError::DeviceUnavailable { message });
            }
            Err(_) => {
                return Err(SessionError::device("capture thread exited during setup"));
            }
        }

        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);
        self.capturing = true;

        info!("Microphone capture started");

        Ok(block_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let joined = tokio::task::spawn_blocking(move || thread.join()).await;
            if joined.is_err() {
                debug!("Capture thread did not shut down cleanly");
            }
        }

        self.capturing = false;
        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "CPAL microphone"
    }
}

/// Thread body: acquire the device, run the stream until stopped.
fn run_capture(
    config: CaptureConfig,
    block_tx: mpsc::Sender<CaptureBlock>,
    ready_tx: oneshot::Sender<std::result::Result<(), String>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err(
                "no input device available (microphone missing or permission denied)".to_string(),
            ));
            return;
        }
    };
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let stream = match build_input_stream(&device, &config, block_tx) {
        Ok(s) => s,
        Err(message) => {
            let _ = ready_tx.send(Err(format!("{device_name}: {message}")));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("failed to start input stream: {e}")));
        return;
    }

    info!("Capturing from input device: {}", device_name);
    let _ = ready_tx.send(Ok(()));

    // Park until the backend asks us to stop (or is dropped).
    let _ = stop_rx.recv();
    drop(stream);
    debug!("Capture thread exiting");
}

fn build_input_stream(
    device: &cpal::Device,
    config: &CaptureConfig,
    block_tx: mpsc::Sender<CaptureBlock>,
) -> std::result::Result<cpal::Stream, String> {
    let err_fn = |e| warn!("Input stream error: {}", e);

    // Prefer asking the device for the target rate directly; most hosts
    // resample. Fall back to the default config plus decimation.
    let exact = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    {
        let mut assembler =
            BlockAssembler::new(config.block_samples, config.sample_rate, 1, 1, block_tx.clone());
        match device.build_input_stream(
            &exact,
            move |data: &[f32], _: &cpal::InputCallbackInfo| assembler.push(data),
            err_fn,
            None,
        ) {
            Ok(stream) => return Ok(stream),
            Err(e) => debug!(
                "Device rejected {} Hz mono ({}); falling back to default config",
                config.sample_rate, e
            ),
        }
    }

    let supported = device
        .default_input_config()
        .map_err(|e| format!("no usable input config: {e}"))?;
    let channels = supported.channels() as usize;
    let device_rate = supported.sample_rate().0;
    let decimation = (device_rate / config.sample_rate).max(1) as usize;
    let effective_rate = device_rate / decimation as u32;
    if effective_rate != config.sample_rate {
        warn!(
            "Capturing at {} Hz (decimated from {} Hz device rate); target was {} Hz",
            effective_rate, device_rate, config.sample_rate
        );
    }

    let stream_config: cpal::StreamConfig = supported.config();
    let mut assembler = BlockAssembler::new(
        config.block_samples,
        effective_rate,
        channels,
        decimation,
        block_tx,
    );

    match supported.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| assembler.push(data),
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                assembler.push(&floats);
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                let floats: Vec<f32> =
                    data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0).collect();
                assembler.push(&floats);
            },
            err_fn,
            None,
        ),
        other => return Err(format!("unsupported sample format {other:?}")),
    }
    .map_err(|e| format!("failed to build input stream: {e}"))
}

/// Folds device frames to mono, decimates, and forwards fixed-size blocks.
struct BlockAssembler {
    pending: Vec<f32>,
    block_samples: usize,
    sample_rate: u32,
    channels: usize,
    decimation: usize,
    skip: usize,
    forwarded_samples: u64,
    block_tx: mpsc::Sender<CaptureBlock>,
}

impl BlockAssembler {
    fn new(
        block_samples: usize,
        sample_rate: u32,
        channels: usize,
        decimation: usize,
        block_tx: mpsc::Sender<CaptureBlock>,
    ) -> Self {
        Self {
            pending: Vec::with_capacity(block_samples),
            block_samples,
            sample_rate,
            channels,
            decimation,
            skip: 0,
            forwarded_samples: 0,
            block_tx,
        }
    }

    fn push(&mut self, data: &[f32]) {
        for frame in data.chunks(self.channels.max(1)) {
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            self.skip = self.decimation - 1;
            let mono = frame.iter().copied().sum::<f32>() / frame.len() as f32;
            self.pending.push(mono);
        }

        while self.pending.len() >= self.block_samples {
            let samples: Vec<f32> = self.pending.drain(..self.block_samples).collect();
            let timestamp_ms = self.forwarded_samples * 1000 / self.sample_rate as u64;
            self.forwarded_samples += samples.len() as u64;
            let block = CaptureBlock {
                samples,
                sample_rate: self.sample_rate,
                timestamp_ms,
            };
            // Never block the audio callback; drop when the session lags.
            if self.block_tx.try_send(block).is_err() {
                warn!("Capture block dropped (session not keeping up)");
            }
        }
    }
}
