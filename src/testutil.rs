//! In-crate mock collaborators for unit tests

use crate::backend::{ChatBackend, ChatReply, VoiceClip};
use crate::capture::{MicrophoneDevice, MicrophoneStream};
use crate::playback::{
    PlaybackControl, PlaybackEvent, PlaybackStream, RemoteAudioPlayer, SpeechSynthesizer,
};
use crate::{Result, SahayakError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ---------------------------------------------------------------- backend

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Text { message: String, enable_tts: bool },
    Voice { bytes: usize, mime: String },
}

/// Scripted chat backend. Pops queued results in order; when the script is
/// empty, answers `re: <message>` / `voice reply` with no audio.
#[derive(Clone)]
pub struct MockBackend {
    script: Arc<Mutex<VecDeque<Result<ChatReply>>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn enqueue(&self, result: Result<ChatReply>) {
        self.script.lock().push_back(result);
    }

    pub fn reply(text: &str, audio_url: Option<&str>) -> ChatReply {
        ChatReply {
            reply: text.to_string(),
            audio_url: audio_url.map(str::to_string),
            detected_language: None,
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    fn next_or(&self, fallback: ChatReply) -> Result<ChatReply> {
        self.script.lock().pop_front().unwrap_or(Ok(fallback))
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send_text(&self, message: &str, enable_tts: bool) -> Result<ChatReply> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push(BackendCall::Text {
            message: message.to_string(),
            enable_tts,
        });
        self.next_or(Self::reply(&format!("re: {}", message), None))
    }

    async fn send_voice(&self, clip: VoiceClip) -> Result<ChatReply> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push(BackendCall::Voice {
            bytes: clip.data.len(),
            mime: clip.mime_type.clone(),
        });
        self.next_or(Self::reply("voice reply", None))
    }

    fn resolve_audio_url(&self, audio_url: &str) -> String {
        if audio_url.starts_with("http") {
            audio_url.to_string()
        } else {
            format!("http://backend.test{}", audio_url)
        }
    }
}

// ------------------------------------------------------------- microphone

/// Microphone that either grants with canned chunks or denies.
pub struct MockMicrophone {
    grant: bool,
    deny_reason: String,
    chunks: Vec<Vec<f32>>,
    released: Arc<AtomicBool>,
}

impl MockMicrophone {
    pub fn granting(chunks: Vec<Vec<f32>>) -> Self {
        Self {
            grant: true,
            deny_reason: String::new(),
            chunks,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn denying(reason: &str) -> Self {
        Self {
            grant: false,
            deny_reason: reason.to_string(),
            chunks: Vec::new(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MicrophoneDevice for MockMicrophone {
    async fn acquire(&self) -> Result<Box<dyn MicrophoneStream>> {
        if !self.grant {
            return Err(SahayakError::PermissionDenied(self.deny_reason.clone()));
        }
        self.released.store(false, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            chunks: self.chunks.clone().into(),
            released: Arc::clone(&self.released),
        }))
    }
}

struct MockStream {
    chunks: VecDeque<Vec<f32>>,
    released: Arc<AtomicBool>,
}

impl MicrophoneStream for MockStream {
    fn sample_rate(&self) -> u32 {
        16000
    }

    fn try_next_chunk(&mut self) -> Option<Vec<f32>> {
        self.chunks.pop_front()
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------- playback

/// Remote player that records started URLs and stop calls. In `auto_start`
/// mode every start buffers a `Started` event; tests can inject later events
/// through [`MockPlayer::emit`].
#[derive(Clone)]
pub struct MockPlayer {
    fail_to_start: bool,
    starts: Arc<Mutex<Vec<String>>>,
    stops: Arc<AtomicUsize>,
    last_events: Arc<Mutex<Option<mpsc::Sender<PlaybackEvent>>>>,
}

impl MockPlayer {
    pub fn auto_start() -> Self {
        Self {
            fail_to_start: false,
            starts: Arc::new(Mutex::new(Vec::new())),
            stops: Arc::new(AtomicUsize::new(0)),
            last_events: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing_to_start() -> Self {
        Self {
            fail_to_start: true,
            ..Self::auto_start()
        }
    }

    pub fn started_urls(&self) -> Vec<String> {
        self.starts.lock().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Inject an event into the most recently started playback
    pub async fn emit(&self, event: PlaybackEvent) {
        let sender = self.last_events.lock().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

#[async_trait]
impl RemoteAudioPlayer for MockPlayer {
    async fn start(&self, url: &str) -> Result<PlaybackStream> {
        if self.fail_to_start {
            return Err(SahayakError::Playback("mock refuses to start".into()));
        }
        self.starts.lock().push(url.to_string());

        let (event_tx, event_rx) = mpsc::channel(8);
        event_tx
            .send(PlaybackEvent::Started)
            .await
            .expect("fresh channel");
        *self.last_events.lock() = Some(event_tx.clone());

        Ok(PlaybackStream::new(
            event_rx,
            Box::new(MockControl {
                stops: Arc::clone(&self.stops),
                _keep_alive: event_tx,
            }),
        ))
    }
}

/// Synthesizer twin of [`MockPlayer`]
#[derive(Clone)]
pub struct MockSynth {
    unavailable: bool,
    spoken: Arc<Mutex<Vec<(String, String)>>>,
    stops: Arc<AtomicUsize>,
    last_events: Arc<Mutex<Option<mpsc::Sender<PlaybackEvent>>>>,
}

impl MockSynth {
    pub fn auto_start() -> Self {
        Self {
            unavailable: false,
            spoken: Arc::new(Mutex::new(Vec::new())),
            stops: Arc::new(AtomicUsize::new(0)),
            last_events: Arc::new(Mutex::new(None)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::auto_start()
        }
    }

    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub async fn emit(&self, event: PlaybackEvent) {
        let sender = self.last_events.lock().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynth {
    async fn speak(&self, text: &str, locale: &str) -> Result<PlaybackStream> {
        if self.unavailable {
            return Err(SahayakError::Playback("no speech engine".into()));
        }
        self.spoken.lock().push((text.to_string(), locale.to_string()));

        let (event_tx, event_rx) = mpsc::channel(8);
        event_tx
            .send(PlaybackEvent::Started)
            .await
            .expect("fresh channel");
        *self.last_events.lock() = Some(event_tx.clone());

        Ok(PlaybackStream::new(
            event_rx,
            Box::new(MockControl {
                stops: Arc::clone(&self.stops),
                _keep_alive: event_tx,
            }),
        ))
    }
}

struct MockControl {
    stops: Arc<AtomicUsize>,
    _keep_alive: mpsc::Sender<PlaybackEvent>,
}

impl PlaybackControl for MockControl {
    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
