//! The session controller event loop
//!
//! One cooperative task owns the whole session: it receives commands from the
//! UI side, keeps backend requests in flight without blocking input, drives
//! the capture state machine and reacts to playback changes. All mutation of
//! the session store happens on this task, so observers always see updates in
//! a single, consistent order.

use crate::backend::{ChatBackend, ChatReply, VoiceClip};
use crate::capture::{CaptureManager, CaptureToggle, MicrophoneDevice};
use crate::config::SahayakConfig;
use crate::lang::{Language, VOICE_MESSAGE_PLACEHOLDER};
use crate::messages::{Message, SessionStore};
use crate::playback::{PlaybackOrchestrator, PlaybackUpdate, RemoteAudioPlayer, SpeechSynthesizer};
use crate::{Result, SahayakError};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Commands the UI side sends to the controller
#[derive(Debug, Clone)]
pub enum ControllerCommand {
    /// Open (or reopen) the session: fresh history with a greeting
    Open,
    /// Close the session surface: playback and capture are torn down, the
    /// history survives until the next `Open`
    Close,
    /// Replace the pending input text
    SetInput(String),
    /// Flip the read-aloud toggle
    SetReadAloud(bool),
    /// Submit the pending input as a user turn
    SubmitText,
    /// Start recording, or stop and submit if already recording
    ToggleRecording,
    /// Stop the loop entirely
    Shutdown,
}

/// Notifications the controller emits for the UI side
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The session was (re)opened with a fresh greeting
    SessionReset,
    MessageAppended(Message),
    RecordingStarted,
    RecordingStopped,
    /// Microphone access was denied; carries the user-facing notice
    PermissionDenied(String),
    PlaybackStarted,
    PlaybackStopped,
    Shutdown,
}

/// Cloneable handle for driving a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    command_tx: mpsc::Sender<ControllerCommand>,
    store: SessionStore,
}

impl ControllerHandle {
    pub async fn send(&self, command: ControllerCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| SahayakError::Channel(format!("Controller gone: {}", e)))
    }

    pub async fn open(&self) -> Result<()> {
        self.send(ControllerCommand::Open).await
    }

    pub async fn close(&self) -> Result<()> {
        self.send(ControllerCommand::Close).await
    }

    pub async fn set_input(&self, text: impl Into<String>) -> Result<()> {
        self.send(ControllerCommand::SetInput(text.into())).await
    }

    pub async fn set_read_aloud(&self, enabled: bool) -> Result<()> {
        self.send(ControllerCommand::SetReadAloud(enabled)).await
    }

    pub async fn submit_text(&self) -> Result<()> {
        self.send(ControllerCommand::SubmitText).await
    }

    pub async fn toggle_recording(&self) -> Result<()> {
        self.send(ControllerCommand::ToggleRecording).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ControllerCommand::Shutdown).await
    }

    /// Read-side view of the session
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

/// Result of one in-flight backend request
enum DispatchOutcome {
    /// Reply to a typed user turn
    Text(Result<ChatReply>),
    /// Reply to a voice-captured user turn
    Voice(Result<ChatReply>),
}

type InflightRequests = FuturesUnordered<BoxFuture<'static, DispatchOutcome>>;

pub struct ChatController {
    store: SessionStore,
    backend: Arc<dyn ChatBackend>,
    capture: CaptureManager,
    playback: PlaybackOrchestrator,
    language: Language,
    command_rx: mpsc::Receiver<ControllerCommand>,
    event_tx: mpsc::Sender<ControllerEvent>,
}

impl ChatController {
    pub fn new(
        config: &SahayakConfig,
        backend: Arc<dyn ChatBackend>,
        device: Arc<dyn MicrophoneDevice>,
        player: Arc<dyn RemoteAudioPlayer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> (Self, ControllerHandle, mpsc::Receiver<ControllerEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let store = SessionStore::new();
        let controller = Self {
            store: store.clone(),
            backend,
            capture: CaptureManager::new(device),
            playback: PlaybackOrchestrator::new(player, synthesizer),
            language: config.language,
            command_rx,
            event_tx,
        };
        let handle = ControllerHandle { command_tx, store };

        (controller, handle, event_rx)
    }

    /// Run until `Shutdown` arrives or every handle is dropped.
    pub async fn run(mut self) {
        info!("Session controller started ({})", self.language.code());
        let mut inflight: InflightRequests = FuturesUnordered::new();

        loop {
            enum Step {
                Command(Option<ControllerCommand>),
                Outcome(DispatchOutcome),
                Playback(PlaybackUpdate),
            }

            let step = tokio::select! {
                command = self.command_rx.recv() => Step::Command(command),
                Some(outcome) = inflight.next(), if !inflight.is_empty() => {
                    Step::Outcome(outcome)
                }
                update = self.playback.next_update() => Step::Playback(update),
            };

            match step {
                Step::Command(None) => break,
                Step::Command(Some(command)) => {
                    if !self.handle_command(command, &mut inflight).await {
                        break;
                    }
                }
                Step::Outcome(outcome) => self.handle_outcome(outcome).await,
                Step::Playback(update) => self.handle_playback(update).await,
            }
        }

        self.playback.stop();
        info!("Session controller stopped");
    }

    /// Returns false when the loop should stop.
    async fn handle_command(
        &mut self,
        command: ControllerCommand,
        inflight: &mut InflightRequests,
    ) -> bool {
        match command {
            ControllerCommand::Open => {
                self.teardown_audio().await;
                self.store
                    .reset(Message::assistant(self.language.greeting()));
                info!("Session opened");
                self.emit(ControllerEvent::SessionReset).await;
            }
            ControllerCommand::Close => {
                // History survives until the next Open
                self.teardown_audio().await;
                debug!("Session closed");
            }
            ControllerCommand::SetInput(text) => {
                self.store.set_pending_input(text);
            }
            ControllerCommand::SetReadAloud(enabled) => {
                self.store.set_read_aloud(enabled);
                debug!("Read-aloud {}", if enabled { "on" } else { "off" });
                if !enabled {
                    // Turning the toggle off silences whatever is sounding
                    self.playback.stop();
                    self.mark_stopped().await;
                }
            }
            ControllerCommand::SubmitText => self.submit_text(inflight).await,
            ControllerCommand::ToggleRecording => self.toggle_recording(inflight).await,
            ControllerCommand::Shutdown => {
                self.teardown_audio().await;
                self.emit(ControllerEvent::Shutdown).await;
                return false;
            }
        }
        true
    }

    async fn submit_text(&mut self, inflight: &mut InflightRequests) {
        let text = self.store.take_pending_input();
        let text = text.trim().to_string();
        if text.is_empty() {
            // Whitespace-only input is declined without any side effect
            debug!("Ignoring empty submission");
            return;
        }

        let user = Message::user(text.clone());
        self.store.append_message(user.clone());
        self.emit(ControllerEvent::MessageAppended(user)).await;

        // The toggle state at submission decides whether server TTS is asked for
        let enable_tts = self.store.read_aloud();
        let backend = Arc::clone(&self.backend);
        inflight.push(
            async move { DispatchOutcome::Text(backend.send_text(&text, enable_tts).await) }
                .boxed(),
        );
    }

    async fn toggle_recording(&mut self, inflight: &mut InflightRequests) {
        match self.capture.toggle().await {
            Ok(CaptureToggle::Started) => {
                self.store.set_recording(true);
                self.emit(ControllerEvent::RecordingStarted).await;
            }
            Ok(CaptureToggle::Finished(clip)) => {
                self.store.set_recording(false);
                self.emit(ControllerEvent::RecordingStopped).await;
                self.submit_voice(clip, inflight).await;
            }
            Err(e @ SahayakError::PermissionDenied(_)) => {
                self.store.set_recording(false);
                self.emit(ControllerEvent::PermissionDenied(e.user_message()))
                    .await;
            }
            Err(e) => {
                warn!("Recording toggle failed: {}", e);
            }
        }
    }

    async fn submit_voice(&mut self, clip: VoiceClip, inflight: &mut InflightRequests) {
        let user = Message::user(VOICE_MESSAGE_PLACEHOLDER);
        self.store.append_message(user.clone());
        self.emit(ControllerEvent::MessageAppended(user)).await;

        let backend = Arc::clone(&self.backend);
        inflight
            .push(async move { DispatchOutcome::Voice(backend.send_voice(clip).await) }.boxed());
    }

    async fn handle_outcome(&mut self, outcome: DispatchOutcome) {
        let (result, voice_origin) = match outcome {
            DispatchOutcome::Text(result) => (result, false),
            DispatchOutcome::Voice(result) => (result, true),
        };

        let message = match result {
            Ok(reply) => {
                debug!(
                    "Backend replied ({} chars, audio: {})",
                    reply.reply.len(),
                    reply.audio_url.is_some()
                );
                let mut message = if voice_origin {
                    Message::assistant_voice(&reply.reply)
                } else {
                    Message::assistant(&reply.reply)
                };
                if let Some(url) = &reply.audio_url {
                    message = message.with_audio_ref(url.clone());
                }
                message
            }
            Err(e) => {
                // A failed request becomes a fixed chat reply, never a popup.
                // Error replies are plain assistant turns, so they are not
                // auto-vocalized on behalf of the failed voice request.
                warn!("Backend request failed: {}", e);
                Message::assistant(self.language.transport_error())
            }
        };

        self.store.append_message(message.clone());
        self.emit(ControllerEvent::MessageAppended(message.clone()))
            .await;

        let resolved = message
            .audio_ref
            .as_deref()
            .map(|r| self.backend.resolve_audio_url(r));
        let read_aloud = self.store.read_aloud();
        self.playback
            .consider(
                &message,
                resolved.as_deref(),
                read_aloud,
                self.language.speech_locale(),
            )
            .await;

        // consider() may have torn down the previous handle without a
        // replacement (decision said no, or synthesis was unavailable)
        if !self.playback.is_active() {
            self.mark_stopped().await;
        }
    }

    async fn handle_playback(&mut self, update: PlaybackUpdate) {
        match update {
            PlaybackUpdate::Started => self.mark_started().await,
            PlaybackUpdate::Stopped => self.mark_stopped().await,
            PlaybackUpdate::RemoteFailed { text, locale } => {
                let recovered = self.playback.fallback(&text, &locale).await;
                if !recovered {
                    self.mark_stopped().await;
                }
            }
        }
    }

    /// Stop playback and release the capture device. Runs on close, reopen
    /// and shutdown; any clip being captured is discarded.
    async fn teardown_audio(&mut self) {
        self.playback.stop();
        self.mark_stopped().await;

        if self.capture.is_capturing() {
            if let Err(e) = self.capture.toggle().await {
                warn!("Capture teardown failed: {}", e);
            }
            debug!("Discarded in-progress capture");
        }
        self.store.set_recording(false);
    }

    async fn mark_started(&mut self) {
        if !self.store.is_playing() {
            self.store.set_playing(true);
            self.emit(ControllerEvent::PlaybackStarted).await;
        }
    }

    async fn mark_stopped(&mut self) {
        if self.store.is_playing() {
            self.store.set_playing(false);
            self.emit(ControllerEvent::PlaybackStopped).await;
        }
    }

    async fn emit(&self, event: ControllerEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }
}
