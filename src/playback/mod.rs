//! Playback orchestration for assistant replies
//!
//! For every newly appended assistant message the orchestrator decides
//! whether to vocalize it and through which channel: server-rendered audio
//! when the message carries an audio reference, local speech synthesis
//! otherwise. At most one audible source exists at any instant — starting a
//! new playback unconditionally tears down the previous one — and a remote
//! playback error falls back to synthesizing the same text.

#[cfg(feature = "audio-io")]
pub mod rodio_player;
#[cfg(feature = "system-tts")]
pub mod system_tts;

#[cfg(feature = "audio-io")]
pub use rodio_player::RodioPlayer;
#[cfg(feature = "system-tts")]
pub use system_tts::SystemTtsSynthesizer;

use crate::messages::Message;
use crate::{Result, SahayakError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Which channel a live playback runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSource {
    RemoteAudio,
    LocalSynthesis,
}

/// Events a playback channel emits over its lifetime
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// Audible output began
    Started,
    /// Playback finished naturally
    Ended,
    /// The channel failed (load, decode or engine error)
    Error(String),
}

/// Stop control for one live playback
pub trait PlaybackControl: Send + Sync {
    fn stop(&mut self);
}

/// One live playback: its event stream plus the stop control
pub struct PlaybackStream {
    events: mpsc::Receiver<PlaybackEvent>,
    control: Box<dyn PlaybackControl>,
}

impl PlaybackStream {
    pub fn new(events: mpsc::Receiver<PlaybackEvent>, control: Box<dyn PlaybackControl>) -> Self {
        Self { events, control }
    }

    async fn next_event(&mut self) -> Option<PlaybackEvent> {
        self.events.recv().await
    }

    fn stop(&mut self) {
        self.control.stop();
    }
}

/// Server-rendered audio collaborator: load and play a resolved URL
#[async_trait]
pub trait RemoteAudioPlayer: Send + Sync {
    async fn start(&self, url: &str) -> Result<PlaybackStream>;
}

/// Local speech synthesis collaborator
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, locale: &str) -> Result<PlaybackStream>;
}

/// Player used when audio output is disabled (by config or build). Declines
/// every start, so remote audio falls through to the synthesizer, which in the
/// disabled pairing declines as well and playback silently does not occur.
pub struct NullRemoteAudio;

#[async_trait]
impl RemoteAudioPlayer for NullRemoteAudio {
    async fn start(&self, _url: &str) -> Result<PlaybackStream> {
        Err(SahayakError::Playback(
            "Audio output is disabled".to_string(),
        ))
    }
}

/// Synthesizer twin of [`NullRemoteAudio`]
pub struct NullSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NullSynthesizer {
    async fn speak(&self, _text: &str, _locale: &str) -> Result<PlaybackStream> {
        Err(SahayakError::Playback(
            "Audio output is disabled".to_string(),
        ))
    }
}

/// The single live playback instance. Owned exclusively by the orchestrator;
/// created when playback starts, destroyed on end, error or explicit stop.
struct ActiveAudioHandle {
    source: PlaybackSource,
    /// Message text, kept for the remote-to-synthesis fallback
    text: String,
    locale: String,
    stream: PlaybackStream,
}

/// What the controller observes from the playback side
#[derive(Debug)]
pub enum PlaybackUpdate {
    /// A channel began producing audible output
    Started,
    /// No audible output remains (natural end, stop, or unrecovered error)
    Stopped,
    /// The remote channel failed; the same text should be synthesized
    RemoteFailed { text: String, locale: String },
}

pub struct PlaybackOrchestrator {
    player: Arc<dyn RemoteAudioPlayer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    active: Option<ActiveAudioHandle>,
}

impl PlaybackOrchestrator {
    pub fn new(player: Arc<dyn RemoteAudioPlayer>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            player,
            synthesizer,
            active: None,
        }
    }

    /// Decision rule, evaluated once per newly appended assistant message
    pub fn should_play(message: &Message, read_aloud: bool) -> bool {
        message.is_assistant() && (message.is_voice_origin || read_aloud)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_source(&self) -> Option<PlaybackSource> {
        self.active.as_ref().map(|handle| handle.source)
    }

    /// React to a newly appended assistant message.
    ///
    /// `resolved_url` is the playable form of the message's audio reference,
    /// if it has one. When the decision rule says no, the current playback is
    /// left untouched.
    pub async fn consider(
        &mut self,
        message: &Message,
        resolved_url: Option<&str>,
        read_aloud: bool,
        locale: &str,
    ) {
        if !Self::should_play(message, read_aloud) {
            return;
        }

        // Exclusivity: tear down whatever is sounding before starting
        self.stop();

        if let Some(url) = resolved_url {
            match self.player.start(url).await {
                Ok(stream) => {
                    debug!("Remote playback started: {}", url);
                    self.active = Some(ActiveAudioHandle {
                        source: PlaybackSource::RemoteAudio,
                        text: message.text.clone(),
                        locale: locale.to_string(),
                        stream,
                    });
                    return;
                }
                Err(e) => {
                    // Recovered condition: fall through to synthesis
                    warn!("Remote audio failed to start, falling back to synthesis: {}", e);
                }
            }
        }

        self.start_synthesis(&message.text, locale).await;
    }

    /// Synthesize `text` after a remote failure. Returns true if a synthesis
    /// handle is now active.
    pub async fn fallback(&mut self, text: &str, locale: &str) -> bool {
        self.start_synthesis(text, locale).await;
        self.active.is_some()
    }

    async fn start_synthesis(&mut self, text: &str, locale: &str) {
        match self.synthesizer.speak(text, locale).await {
            Ok(stream) => {
                debug!("Local synthesis started ({})", locale);
                self.active = Some(ActiveAudioHandle {
                    source: PlaybackSource::LocalSynthesis,
                    text: text.to_string(),
                    locale: locale.to_string(),
                    stream,
                });
            }
            Err(e) => {
                // Synthesis unavailable: playback silently does not occur
                debug!("Speech synthesis unavailable: {}", e);
                self.active = None;
            }
        }
    }

    /// Immediately stop and destroy the active handle, if any
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.active.take() {
            debug!("Stopping {:?} playback", handle.source);
            handle.stream.stop();
        }
    }

    /// Wait for the next observable playback change. Pends forever while no
    /// handle is active, so it is safe to park in a select loop.
    ///
    /// Only the channel-event receive awaits here, keeping this cancel-safe;
    /// the remote-failure fallback is returned as an instruction instead of
    /// being performed mid-await.
    pub async fn next_update(&mut self) -> PlaybackUpdate {
        let handle = match self.active.as_mut() {
            Some(handle) => handle,
            None => return std::future::pending().await,
        };

        match handle.stream.next_event().await {
            Some(PlaybackEvent::Started) => PlaybackUpdate::Started,
            Some(PlaybackEvent::Ended) | None => {
                self.active = None;
                PlaybackUpdate::Stopped
            }
            Some(PlaybackEvent::Error(e)) => match self.active.take() {
                Some(ActiveAudioHandle {
                    source: PlaybackSource::RemoteAudio,
                    text,
                    locale,
                    ..
                }) => {
                    warn!("Remote playback error, requesting fallback: {}", e);
                    PlaybackUpdate::RemoteFailed { text, locale }
                }
                _ => {
                    debug!("Synthesis error, playback ends silently: {}", e);
                    PlaybackUpdate::Stopped
                }
            },
        }
    }
}
