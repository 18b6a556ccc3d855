//! NATS transport adapter for the interview agent.
//!
//! Frames are fire-and-forget JSON publishes with base64 PCM payloads; agent
//! events arrive on a per-session subject; the open handshake and the
//! non-streaming completion path use request/reply.

use super::messages::{
    AgentEventMessage, AudioFrameMessage, CompletionReply, CompletionRequest,
    CompletionTurnMessage, SessionOpenAck, SessionOpenRequest,
};
use super::service::{
    close_channel, AgentEvent, AgentSession, CompletionAgent, CompletionTurn, OutboundFrame,
    RealtimeAgent, SessionOpenOptions,
};
use crate::audio::pcm;
use crate::error::{Result, SessionError};
use base64::Engine;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const OPEN_SUBJECT: &str = "interview.session.open";
const COMPLETION_SUBJECT: &str = "interview.completion";

/// Outbound frames buffered towards NATS before the capture side starts
/// dropping (backpressure boundary).
const FRAME_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 64;

fn audio_subject(session_id: &str) -> String {
    format!("interview.audio.{session_id}")
}

fn events_subject(session_id: &str) -> String {
    format!("interview.events.{session_id}")
}

pub struct NatsAgent {
    client: async_nats::Client,
    open_timeout: Duration,
    completion_timeout: Duration,
}

impl NatsAgent {
    /// Connect to the NATS server backing the interview agent.
    pub async fn connect(
        url: &str,
        open_timeout: Duration,
        completion_timeout: Duration,
    ) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .map_err(|e| SessionError::connection(format!("failed to connect to NATS at {url}: {e}")))?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            open_timeout,
            completion_timeout,
        })
    }
}

#[async_trait::async_trait]
impl RealtimeAgent for NatsAgent {
    async fn open(&self, opts: SessionOpenOptions) -> Result<AgentSession> {
        let request = SessionOpenRequest {
            session_id: opts.session_id.clone(),
            system_instruction: opts.system_instruction,
            output_modality: opts.output_modality.as_str().to_string(),
            voice: opts.voice,
            input_sample_rate: opts.input_sample_rate,
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|e| SessionError::connection(format!("failed to encode open request: {e}")))?;

        let ack_msg = tokio::time::timeout(
            self.open_timeout,
            self.client.request(OPEN_SUBJECT, payload.into()),
        )
        .await
        .map_err(|_| {
            SessionError::connection(format!(
                "no acknowledgement from interview agent within {:?}",
                self.open_timeout
            ))
        })?
        .map_err(|e| SessionError::connection(format!("session open request failed: {e}")))?;

        let ack: SessionOpenAck = serde_json::from_slice(&ack_msg.payload)
            .map_err(|e| SessionError::connection(format!("malformed open acknowledgement: {e}")))?;
        if !ack.accepted {
            return Err(SessionError::connection(format!(
                "agent rejected session: {}",
                ack.reason.unwrap_or_else(|| "no reason given".to_string())
            )));
        }

        let subscriber = self
            .client
            .subscribe(events_subject(&opts.session_id))
            .await
            .map_err(|e| SessionError::connection(format!("failed to subscribe to agent events: {e}")))?;

        info!("Interview session {} opened", opts.session_id);

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (close, close_rx) = close_channel();

        tokio::spawn(pump_frames(
            self.client.clone(),
            opts.session_id.clone(),
            frame_rx,
            close_rx.clone(),
        ));
        tokio::spawn(pump_events(subscriber, event_tx, close_rx));

        Ok(AgentSession {
            frames: frame_tx,
            events: event_rx,
            close,
        })
    }
}

#[async_trait::async_trait]
impl CompletionAgent for NatsAgent {
    async fn complete(
        &self,
        system_instruction: &str,
        turns: &[CompletionTurn],
    ) -> Result<String> {
        let request = CompletionRequest {
            system_instruction: system_instruction.to_string(),
            turns: turns
                .iter()
                .map(|t| CompletionTurnMessage {
                    speaker: t.speaker,
                    text: t.text.clone(),
                })
                .collect(),
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|e| SessionError::request(format!("failed to encode completion request: {e}")))?;

        let reply_msg = tokio::time::timeout(
            self.completion_timeout,
            self.client.request(COMPLETION_SUBJECT, payload.into()),
        )
        .await
        .map_err(|_| {
            SessionError::request(format!(
                "no completion reply within {:?}",
                self.completion_timeout
            ))
        })?
        .map_err(|e| SessionError::request(format!("completion request failed: {e}")))?;

        let reply: CompletionReply = serde_json::from_slice(&reply_msg.payload)
            .map_err(|e| SessionError::request(format!("malformed completion reply: {e}")))?;

        if let Some(error) = reply.error {
            return Err(SessionError::request(error));
        }
        reply
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SessionError::request("agent returned an empty reply"))
    }
}

/// Publish outbound frames until the session closes, then mark the end of
/// candidate audio with a final empty frame.
async fn pump_frames(
    client: async_nats::Client,
    session_id: String,
    mut frame_rx: mpsc::Receiver<OutboundFrame>,
    mut close_rx: watch::Receiver<bool>,
) {
    let subject = audio_subject(&session_id);
    let mut sequence: u32 = 0;
    let mut sample_rate = 16000;

    debug!("Frame pump started for {}", session_id);

    loop {
        tokio::select! {
            changed = close_rx.changed() => {
                if changed.is_err() || *close_rx.borrow() {
                    break;
                }
            }
            maybe = frame_rx.recv() => {
                let Some(frame) = maybe else { break };
                sample_rate = frame.sample_rate;
                let message = AudioFrameMessage {
                    session_id: session_id.clone(),
                    sequence,
                    pcm: base64::engine::general_purpose::STANDARD
                        .encode(pcm::encode_pcm16(&frame.samples)),
                    sample_rate: frame.sample_rate,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                    final_frame: false,
                };
                sequence += 1;
                match serde_json::to_vec(&message) {
                    Ok(payload) => {
                        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                            error!("Failed to publish audio frame: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to encode audio frame: {}", e),
                }
            }
        }
    }

    // Final frame marks the end of candidate audio.
    let final_message = AudioFrameMessage {
        session_id: session_id.clone(),
        sequence,
        pcm: String::new(),
        sample_rate,
        timestamp: chrono::Utc::now().to_rfc3339(),
        final_frame: true,
    };
    match serde_json::to_vec(&final_message) {
        Ok(payload) => {
            if let Err(e) = client.publish(subject, payload.into()).await {
                error!("Failed to send final frame: {}", e);
            }
        }
        Err(e) => error!("Failed to encode final frame: {}", e),
    }

    debug!("Frame pump stopped for {}", session_id);
}

/// Decode agent event messages and forward them in arrival order.
async fn pump_events(
    mut subscriber: async_nats::Subscriber,
    event_tx: mpsc::Sender<AgentEvent>,
    mut close_rx: watch::Receiver<bool>,
) {
    debug!("Event pump started");

    loop {
        tokio::select! {
            changed = close_rx.changed() => {
                if changed.is_err() || *close_rx.borrow() {
                    break;
                }
            }
            maybe = subscriber.next() => {
                let Some(msg) = maybe else {
                    let _ = event_tx.send(AgentEvent::Closed).await;
                    break;
                };
                let parsed = match serde_json::from_slice::<AgentEventMessage>(&msg.payload) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Failed to parse agent event: {}", e);
                        continue;
                    }
                };
                let event = match decode_event(parsed) {
                    Some(e) => e,
                    None => continue,
                };
                let terminal = matches!(event, AgentEvent::Closed | AgentEvent::Error { .. });
                if event_tx.send(event).await.is_err() || terminal {
                    break;
                }
            }
        }
    }

    let _ = subscriber.unsubscribe().await;
    debug!("Event pump stopped");
}

fn decode_event(message: AgentEventMessage) -> Option<AgentEvent> {
    let event = match message {
        AgentEventMessage::UserTranscript { text } => AgentEvent::PartialUserTranscript { text },
        AgentEventMessage::AgentTranscript { text } => AgentEvent::PartialAgentTranscript { text },
        AgentEventMessage::AudioChunk { pcm, sample_rate } => {
            let bytes = match base64::engine::general_purpose::STANDARD.decode(&pcm) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Dropping audio chunk with invalid base64: {}", e);
                    return None;
                }
            };
            AgentEvent::AudioChunk {
                samples: pcm::decode_pcm16(&bytes),
                sample_rate,
            }
        }
        AgentEventMessage::TurnComplete => AgentEvent::TurnComplete,
        AgentEventMessage::Interrupted => AgentEvent::Interrupted,
        AgentEventMessage::Error { reason } => AgentEvent::Error { reason },
        AgentEventMessage::Closed => AgentEvent::Closed,
    };
    Some(event)
}
