//! Remote audio playback via reqwest + rodio
//!
//! The clip is fetched fully, then decoded and played on a dedicated thread
//! because `rodio::OutputStream` is not `Send`. The `Sink` is shared back so
//! the controller-side stop lands immediately.

use super::{PlaybackControl, PlaybackEvent, PlaybackStream, RemoteAudioPlayer};
use crate::{Result, SahayakError};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

pub struct RodioPlayer {
    client: reqwest::Client,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteAudioPlayer for RodioPlayer {
    async fn start(&self, url: &str) -> Result<PlaybackStream> {
        debug!("Fetching remote audio: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SahayakError::Playback(format!("Audio fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SahayakError::Playback(format!(
                "Audio fetch returned status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SahayakError::Playback(format!("Audio download failed: {}", e)))?
            .to_vec();

        let (event_tx, event_rx) = mpsc::channel(8);
        let (setup_tx, setup_rx) = tokio::sync::oneshot::channel::<Result<Arc<rodio::Sink>>>();

        std::thread::spawn(move || {
            let (_stream, handle) = match rodio::OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = setup_tx.send(Err(SahayakError::Playback(format!(
                        "No audio output: {}",
                        e
                    ))));
                    return;
                }
            };

            let sink = match rodio::Sink::try_new(&handle) {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    let _ = setup_tx.send(Err(SahayakError::Playback(format!(
                        "Sink creation failed: {}",
                        e
                    ))));
                    return;
                }
            };

            let source = match rodio::Decoder::new(Cursor::new(bytes)) {
                Ok(source) => source,
                Err(e) => {
                    let _ = setup_tx.send(Err(SahayakError::Playback(format!(
                        "Audio decode failed: {}",
                        e
                    ))));
                    return;
                }
            };

            sink.append(source);
            if setup_tx.send(Ok(Arc::clone(&sink))).is_err() {
                return;
            }

            let _ = event_tx.blocking_send(PlaybackEvent::Started);

            // Blocks until the sink drains, which an explicit stop also causes
            sink.sleep_until_end();
            let _ = event_tx.blocking_send(PlaybackEvent::Ended);
        });

        let sink = setup_rx
            .await
            .map_err(|_| SahayakError::Playback("Playback thread died during setup".into()))??;

        Ok(PlaybackStream::new(event_rx, Box::new(SinkControl { sink })))
    }
}

struct SinkControl {
    sink: Arc<rodio::Sink>,
}

impl PlaybackControl for SinkControl {
    fn stop(&mut self) {
        // Pauses-and-clears: no further samples reach the device
        self.sink.stop();
    }
}

impl Drop for SinkControl {
    fn drop(&mut self) {
        if !self.sink.empty() {
            error!("SinkControl dropped with audio still queued; stopping");
            self.sink.stop();
        }
    }
}
