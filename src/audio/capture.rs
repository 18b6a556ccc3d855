use crate::error::Result;
use tokio::sync::mpsc;

/// One block of captured microphone audio.
///
/// Samples are mono floats in [-1.0, 1.0] at the capture rate; the block is
/// transient and not retained after quantization and transmission.
#[derive(Debug, Clone)]
pub struct CaptureBlock {
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

impl CaptureBlock {
    /// Duration of this block in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}

/// Configuration for a capture backend
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (device audio is decimated if needed)
    pub sample_rate: u32,
    /// Samples per forwarded block
    pub block_samples: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // what the interview agent expects
            block_samples: 4096,
        }
    }
}

/// Microphone capture backend trait
///
/// Implementations deliver fixed-size mono float blocks over a bounded
/// channel. When the receiver falls behind, backends drop blocks with a
/// warning rather than buffer without bound.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive capture blocks. Fails
    /// with `DeviceUnavailable` when the device cannot be acquired.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureBlock>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    /// Create the default microphone backend for this platform.
    pub fn create(config: CaptureConfig) -> Result<Box<dyn CaptureBackend>> {
        let backend = super::microphone::MicrophoneBackend::new(config);
        Ok(Box::new(backend))
    }
}
