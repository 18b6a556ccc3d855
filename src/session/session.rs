use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::agent::{
    AgentEvent, CloseHandle, OutboundFrame, OutputModality, RealtimeAgent, SessionOpenOptions,
};
use crate::audio::{pcm, AudioSegment, CaptureBackend, PlaybackPipeline};
use crate::error::{Result, SessionError};
use crate::transcript::{TranscriptAssembler, TranscriptLog};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of one interview session, owned solely by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    Listening,
    Stopping,
    Closed,
}

/// An interview session that manages microphone capture, the streaming agent
/// connection, transcript assembly and agent speech playback.
///
/// One controller per interview: constructed when the candidate enters the
/// room, closed exactly once on every exit path (normal stop, transport
/// error, or teardown). There is no automatic reconnection; after `Closed`
/// a fresh session must be created.
pub struct InterviewSession {
    /// Session configuration
    config: SessionConfig,

    /// Streaming side of the remote interview agent
    agent: Arc<dyn RealtimeAgent>,

    /// Shared conversation log (also written by the text turn path)
    log: TranscriptLog,

    /// Lifecycle state; the controller is the only writer
    state: watch::Sender<SessionState>,

    /// Live microphone level (0..1) for UI feedback
    volume: watch::Sender<f32>,

    /// Uncommitted user transcript for live interim display
    interim: watch::Sender<String>,

    /// Soft-stop signal: detaches the capture pipeline immediately
    detach: watch::Sender<bool>,

    /// Hard-stop signal for the event consumer task
    shutdown: watch::Sender<bool>,

    /// Close handle for the open agent connection
    agent_close: Mutex<Option<CloseHandle>>,

    /// Running capture / event tasks, awaited during close
    tasks: Mutex<Vec<JoinHandle<()>>>,

    /// When the session was created
    started_at: chrono::DateTime<Utc>,

    /// Frames forwarded to the agent
    frames_sent: Arc<AtomicUsize>,

    /// Frames dropped because the transport was not ready
    frames_dropped: Arc<AtomicUsize>,

    /// Terminal transport error, if one ended the session
    last_error: Arc<Mutex<Option<String>>>,
}

impl InterviewSession {
    pub fn new(config: SessionConfig, agent: Arc<dyn RealtimeAgent>, log: TranscriptLog) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (volume, _) = watch::channel(0.0);
        let (interim, _) = watch::channel(String::new());
        let (detach, _) = watch::channel(false);
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            agent,
            log,
            state,
            volume,
            interim,
            detach,
            shutdown,
            agent_close: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            started_at: Utc::now(),
            frames_sent: Arc::new(AtomicUsize::new(0)),
            frames_dropped: Arc::new(AtomicUsize::new(0)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Open the streaming session and start both pipelines.
    ///
    /// Fails with `Connection` when the agent does not acknowledge within the
    /// configured open timeout, and with `DeviceUnavailable` when the
    /// microphone cannot be acquired; both leave the session `Closed`.
    pub async fn start(
        &self,
        mut capture: Box<dyn CaptureBackend>,
        playback: PlaybackPipeline,
    ) -> Result<()> {
        let mut transitioned = false;
        self.state.send_if_modified(|s| {
            if *s == SessionState::Idle {
                *s = SessionState::Connecting;
                transitioned = true;
                true
            } else {
                false
            }
        });
        if !transitioned {
            warn!("Session {} already started", self.config.session_id);
            return Ok(());
        }

        info!("Opening interview session: {}", self.config.session_id);

        let opts = SessionOpenOptions {
            session_id: self.config.session_id.clone(),
            system_instruction: self.config.position.interviewer_instruction(),
            output_modality: OutputModality::Audio,
            voice: self.config.voice.clone(),
            input_sample_rate: self.config.capture.sample_rate,
        };

        let opened = tokio::time::timeout(self.config.open_timeout, self.agent.open(opts)).await;
        let agent_session = match opened {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                self.fail(&e).await;
                return Err(e);
            }
            Err(_) => {
                let e = SessionError::connection(format!(
                    "no session acknowledgement within {:?}",
                    self.config.open_timeout
                ));
                self.fail(&e).await;
                return Err(e);
            }
        };
        let (frames, events, agent_close) = agent_session.split();

        let block_rx = match capture.start().await {
            Ok(rx) => rx,
            Err(e) => {
                agent_close.close();
                self.fail(&e).await;
                return Err(e);
            }
        };
        *self.agent_close.lock().await = Some(agent_close);

        let _ = self.state.send(SessionState::Listening);
        info!("Interview session {} is listening", self.config.session_id);

        // Capture task: quantize blocks, report levels, forward frames FIFO.
        // Frames are dropped with a warning when the transport lags.
        let volume = self.volume.clone();
        let frames_sent = Arc::clone(&self.frames_sent);
        let frames_dropped = Arc::clone(&self.frames_dropped);
        let mut detach_rx = self.detach.subscribe();
        let capture_task = tokio::spawn(async move {
            debug!("Capture task started");
            let mut block_rx = block_rx;
            loop {
                tokio::select! {
                    changed = detach_rx.changed() => {
                        if changed.is_err() || *detach_rx.borrow() {
                            break;
                        }
                    }
                    maybe = block_rx.recv() => {
                        let Some(block) = maybe else { break };
                        let _ = volume.send(pcm::rms_level(&block.samples));
                        let frame = OutboundFrame {
                            samples: pcm::quantize(&block.samples),
                            sample_rate: block.sample_rate,
                        };
                        use tokio::sync::mpsc::error::TrySendError;
                        match frames.try_send(frame) {
                            Ok(()) => {
                                frames_sent.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(TrySendError::Full(_)) => {
                                frames_dropped.fetch_add(1, Ordering::Relaxed);
                                warn!("Dropping capture frame: transport not ready");
                            }
                            Err(TrySendError::Closed(_)) => break,
                        }
                    }
                }
            }
            let _ = volume.send(0.0);
            // Teardown is best-effort; the device may already be gone.
            if let Err(e) = capture.stop().await {
                debug!("Capture backend stop: {}", e);
            }
            debug!("Capture task stopped");
        });

        // Event task: the single consumer of agent events, and the single
        // writer of the assembler and the playback pipeline.
        let log = self.log.clone();
        let interim = self.interim.clone();
        let state = self.state.clone();
        let detach = self.detach.clone();
        let last_error = Arc::clone(&self.last_error);
        let mut shutdown_rx = self.shutdown.subscribe();
        let session_id = self.config.session_id.clone();
        let event_task = tokio::spawn(async move {
            debug!("Event task started");
            let mut events = events;
            let mut playback = playback;
            let mut assembler = TranscriptAssembler::new();
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    maybe = events.recv() => {
                        let Some(event) = maybe else {
                            debug!("Agent event stream ended");
                            break;
                        };
                        match event {
                            AgentEvent::PartialUserTranscript { text } => {
                                assembler.push_user(&text);
                                let _ = interim.send(assembler.user_preview().to_string());
                            }
                            AgentEvent::PartialAgentTranscript { text } => {
                                assembler.push_agent(&text);
                            }
                            AgentEvent::AudioChunk { samples, sample_rate } => {
                                let segment = AudioSegment::new(samples, sample_rate);
                                if let Err(e) = playback.enqueue(segment) {
                                    warn!("Dropping agent audio: {}", e);
                                }
                            }
                            AgentEvent::TurnComplete => {
                                let appended = assembler.commit(&log).await;
                                if appended > 0 {
                                    debug!("Turn committed ({} messages)", appended);
                                }
                                let _ = interim.send(String::new());
                            }
                            AgentEvent::Interrupted => {
                                playback.interrupt();
                            }
                            AgentEvent::Error { reason } => {
                                error!("Agent error on session {}: {}", session_id, reason);
                                *last_error.lock().await = Some(reason);
                                break;
                            }
                            AgentEvent::Closed => {
                                debug!("Agent closed session {}", session_id);
                                break;
                            }
                        }
                    }
                }
            }
            // Terminal: halt playback, detach capture, mark closed. No
            // further events are processed past this point.
            playback.close();
            let _ = detach.send(true);
            let _ = interim.send(String::new());
            let _ = state.send(SessionState::Closed);
            debug!("Event task stopped");
        });

        let mut tasks = self.tasks.lock().await;
        tasks.push(capture_task);
        tasks.push(event_task);

        Ok(())
    }

    /// Soft stop: detach the microphone now, then give in-flight partial
    /// transcripts and the final turn-complete a bounded grace window before
    /// closing. The wait ends early if the session closes first.
    pub async fn stop(&self) {
        let current = *self.state.borrow();
        if matches!(current, SessionState::Idle | SessionState::Closed) {
            self.close().await;
            return;
        }

        info!("Stopping interview session: {}", self.config.session_id);

        self.state.send_if_modified(|s| {
            if matches!(*s, SessionState::Connecting | SessionState::Listening) {
                *s = SessionState::Stopping;
                true
            } else {
                false
            }
        });
        let _ = self.detach.send(true);

        let mut state_rx = self.state.subscribe();
        let _ = tokio::time::timeout(
            self.config.grace_period,
            state_rx.wait_for(|s| *s == SessionState::Closed),
        )
        .await;

        self.close().await;
    }

    /// Hard stop: immediate teardown of capture, playback and the transport.
    /// Idempotent; resources are released exactly once.
    pub async fn close(&self) {
        let _ = self.detach.send(true);
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.agent_close.lock().await.take() {
            handle.close();
        }

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Session task panicked: {}", e);
            }
        }
        drop(tasks);

        self.state.send_if_modified(|s| {
            if *s != SessionState::Closed {
                *s = SessionState::Closed;
                true
            } else {
                false
            }
        });
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Observe lifecycle transitions.
    pub fn state_watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Live microphone level for UI feedback.
    pub fn volume_watch(&self) -> watch::Receiver<f32> {
        self.volume.subscribe()
    }

    /// Live uncommitted user transcript.
    pub fn interim_watch(&self) -> watch::Receiver<String> {
        self.interim.subscribe()
    }

    pub fn log(&self) -> &TranscriptLog {
        &self.log
    }

    /// The transport error that ended the session, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        SessionStats {
            state: self.state(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            messages_count: self.log.len().await,
        }
    }

    /// Record a failure that ended the session before it was listening.
    async fn fail(&self, error: &SessionError) {
        *self.last_error.lock().await = Some(error.to_string());
        let _ = self.state.send(SessionState::Closed);
    }
}
