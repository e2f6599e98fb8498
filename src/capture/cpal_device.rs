//! cpal-backed microphone device
//!
//! `cpal::Stream` is not `Send`, so each acquisition spawns a dedicated
//! thread that owns the stream and forwards mono f32 chunks over a channel.
//! Releasing the stream signals that thread to drop the stream and exit,
//! which stops the device.

use super::{MicrophoneDevice, MicrophoneStream};
use crate::{Result, SahayakError};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use tracing::{debug, error, info};

pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MicrophoneDevice for CpalMicrophone {
    async fn acquire(&self) -> Result<Box<dyn MicrophoneStream>> {
        let (setup_tx, setup_rx) = tokio::sync::oneshot::channel::<Result<u32>>();
        let (chunk_tx, chunk_rx) = bounded::<Vec<f32>>(1024);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        std::thread::spawn(move || {
            run_stream_thread(setup_tx, chunk_tx, stop_rx);
        });

        let sample_rate = setup_rx
            .await
            .map_err(|_| SahayakError::AudioDevice("Capture thread died during setup".into()))??;

        Ok(Box::new(CpalStream {
            sample_rate,
            chunk_rx,
            stop_tx,
            released: false,
        }))
    }
}

fn run_stream_thread(
    setup_tx: tokio::sync::oneshot::Sender<Result<u32>>,
    chunk_tx: Sender<Vec<f32>>,
    stop_rx: Receiver<()>,
) {
    let host = cpal::default_host();

    let device = match host.default_input_device() {
        Some(device) => device,
        None => {
            let _ = setup_tx.send(Err(SahayakError::AudioDevice(
                "No input device available".into(),
            )));
            return;
        }
    };

    info!(
        "Using input device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let config: cpal::StreamConfig = match device.default_input_config() {
        Ok(config) => config.into(),
        Err(e) => {
            let _ = setup_tx.send(Err(SahayakError::AudioDevice(format!(
                "Failed to get input config: {}",
                e
            ))));
            return;
        }
    };

    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    let err_fn = |err| {
        error!("Audio input stream error: {}", err);
    };

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Average down to mono before buffering
            let samples: Vec<f32> = if channels == 1 {
                data.to_vec()
            } else {
                data.chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                    .collect()
            };

            if let Err(e) = chunk_tx.try_send(samples) {
                debug!("Dropping audio chunk: {}", e);
            }
        },
        err_fn,
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = setup_tx.send(Err(SahayakError::AudioDevice(format!(
                "Failed to build input stream: {}",
                e
            ))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = setup_tx.send(Err(SahayakError::AudioDevice(format!(
            "Failed to start input stream: {}",
            e
        ))));
        return;
    }

    if setup_tx.send(Ok(sample_rate)).is_err() {
        return;
    }

    // Hold the stream alive until release (or the handle is dropped)
    let _ = stop_rx.recv();
    drop(stream);
    info!("Microphone stream released");
}

struct CpalStream {
    sample_rate: u32,
    chunk_rx: Receiver<Vec<f32>>,
    stop_tx: Sender<()>,
    released: bool,
}

impl MicrophoneStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn try_next_chunk(&mut self) -> Option<Vec<f32>> {
        match self.chunk_rx.try_recv() {
            Ok(chunk) => Some(chunk),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            let _ = self.stop_tx.try_send(());
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}
