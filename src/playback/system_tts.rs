//! Local speech synthesis via the OS speech engine (`tts` crate)
//!
//! The engine handle is not freely shareable across tasks, so a single worker
//! thread owns it and serves speak/stop commands over a channel, polling the
//! engine for completion. One worker serves the whole process; the
//! orchestrator's exclusivity means at most one utterance is live anyway.

use super::{PlaybackControl, PlaybackEvent, PlaybackStream, SpeechSynthesizer};
use crate::{Result, SahayakError};
use async_trait::async_trait;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum TtsCommand {
    Speak {
        text: String,
        locale: String,
        events: mpsc::Sender<PlaybackEvent>,
    },
    Stop,
}

pub struct SystemTtsSynthesizer {
    command_tx: Sender<TtsCommand>,
}

impl SystemTtsSynthesizer {
    /// Spawn the worker thread and connect to the OS speech engine.
    pub fn new() -> Result<Self> {
        let (command_tx, command_rx) = unbounded::<TtsCommand>();
        let (setup_tx, setup_rx) = std::sync::mpsc::sync_channel::<std::result::Result<(), String>>(1);

        std::thread::spawn(move || {
            let mut engine = match tts::Tts::default() {
                Ok(engine) => {
                    let _ = setup_tx.send(Ok(()));
                    engine
                }
                Err(e) => {
                    let _ = setup_tx.send(Err(e.to_string()));
                    return;
                }
            };

            info!("Speech synthesis worker ready");

            let mut pending: Option<TtsCommand> = None;
            loop {
                let command = match pending.take() {
                    Some(command) => command,
                    None => match command_rx.recv() {
                        Ok(command) => command,
                        Err(_) => break,
                    },
                };

                let (text, locale, events) = match command {
                    TtsCommand::Speak { text, locale, events } => (text, locale, events),
                    // A stop with nothing speaking is stale; ignore it
                    TtsCommand::Stop => continue,
                };

                select_voice(&mut engine, &locale);

                if let Err(e) = engine.speak(text, true) {
                    warn!("Speech synthesis failed: {}", e);
                    let _ = events.blocking_send(PlaybackEvent::Error(e.to_string()));
                    continue;
                }

                let _ = events.blocking_send(PlaybackEvent::Started);

                // Poll until the utterance completes, a stop arrives, or a
                // newer speak preempts this one
                loop {
                    match command_rx.recv_timeout(POLL_INTERVAL) {
                        Ok(TtsCommand::Stop) => {
                            let _ = engine.stop();
                            break;
                        }
                        Ok(next @ TtsCommand::Speak { .. }) => {
                            let _ = engine.stop();
                            pending = Some(next);
                            break;
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            if !engine.is_speaking().unwrap_or(false) {
                                let _ = events.blocking_send(PlaybackEvent::Ended);
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            let _ = engine.stop();
                            return;
                        }
                    }
                }
            }

            debug!("Speech synthesis worker stopped");
        });

        match setup_rx.recv() {
            Ok(Ok(())) => Ok(Self { command_tx }),
            Ok(Err(e)) => Err(SahayakError::Playback(format!(
                "Speech engine unavailable: {}",
                e
            ))),
            Err(_) => Err(SahayakError::Playback(
                "Speech synthesis worker died during setup".into(),
            )),
        }
    }
}

/// Pick the voice best matching the requested BCP-47 locale: exact tag first,
/// then primary-subtag prefix, otherwise the engine default stays.
fn select_voice(engine: &mut tts::Tts, locale: &str) {
    let voices = match engine.voices() {
        Ok(voices) => voices,
        Err(_) => return,
    };

    let primary = locale.split('-').next().unwrap_or(locale);
    let chosen = voices
        .iter()
        .find(|v| v.language().to_string().eq_ignore_ascii_case(locale))
        .or_else(|| {
            voices.iter().find(|v| {
                v.language()
                    .to_string()
                    .to_ascii_lowercase()
                    .starts_with(primary)
            })
        });

    if let Some(voice) = chosen {
        if let Err(e) = engine.set_voice(voice) {
            debug!("Could not select voice for {}: {}", locale, e);
        }
    } else {
        debug!("No voice for {}, keeping engine default", locale);
    }
}

#[async_trait]
impl SpeechSynthesizer for SystemTtsSynthesizer {
    async fn speak(&self, text: &str, locale: &str) -> Result<PlaybackStream> {
        let (event_tx, event_rx) = mpsc::channel(8);

        self.command_tx
            .send(TtsCommand::Speak {
                text: text.to_string(),
                locale: locale.to_string(),
                events: event_tx,
            })
            .map_err(|_| SahayakError::Playback("Speech synthesis worker gone".into()))?;

        Ok(PlaybackStream::new(
            event_rx,
            Box::new(TtsControl {
                command_tx: self.command_tx.clone(),
            }),
        ))
    }
}

struct TtsControl {
    command_tx: Sender<TtsCommand>,
}

impl PlaybackControl for TtsControl {
    fn stop(&mut self) {
        let _ = self.command_tx.send(TtsCommand::Stop);
    }
}
