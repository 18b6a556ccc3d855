use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub nats: NatsConfig,
    pub audio: AudioConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Microphone capture rate the agent expects
    pub capture_sample_rate: u32,
    /// Samples per forwarded capture block
    pub capture_block_samples: usize,
    /// Rate of agent speech segments
    pub playback_sample_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    /// Voice profile for synthesized agent speech
    pub voice: String,
    /// Seconds to wait for a session open acknowledgement
    pub open_timeout_secs: u64,
    /// Seconds to wait for a non-streaming completion reply
    pub completion_timeout_secs: u64,
    /// Milliseconds of grace after a soft stop for trailing transcripts
    pub grace_period_ms: u64,
}

impl AgentConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
