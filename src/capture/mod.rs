//! Microphone capture with an explicit session state machine
//!
//! One capture session at a time: `Idle → Requesting → Capturing →
//! Finalizing → Idle`. The device is a collaborator behind
//! [`MicrophoneDevice`]; its stream delivers f32 sample chunks which are
//! buffered here and concatenated into a single WAV clip on stop. The device
//! stream is released on every exit path.

#[cfg(feature = "audio-io")]
pub mod cpal_device;

#[cfg(feature = "audio-io")]
pub use cpal_device::CpalMicrophone;

use crate::backend::VoiceClip;
use crate::{Result, SahayakError};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    /// Waiting for the device / permission grant
    Requesting,
    /// Buffering chunks from the live stream
    Capturing,
    /// Stream stopped, concatenating the buffered chunks
    Finalizing,
}

/// Microphone collaborator. Acquisition may be denied by the platform.
#[async_trait]
pub trait MicrophoneDevice: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn MicrophoneStream>>;
}

/// A live, exclusively-owned device stream.
pub trait MicrophoneStream: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// Non-blocking drain of the next buffered chunk, if any
    fn try_next_chunk(&mut self) -> Option<Vec<f32>>;

    /// Stop the device and release it (all tracks)
    fn release(&mut self);
}

/// Device used when audio input is disabled (by config or build). Every
/// acquisition is denied, which surfaces to the user as a notice.
pub struct DisabledMicrophone;

#[async_trait]
impl MicrophoneDevice for DisabledMicrophone {
    async fn acquire(&self) -> Result<Box<dyn MicrophoneStream>> {
        Err(SahayakError::PermissionDenied(
            "Audio input is disabled".to_string(),
        ))
    }
}

/// Outcome of a toggle call
#[derive(Debug)]
pub enum CaptureToggle {
    /// Capture started; chunks are now buffering
    Started,
    /// Capture stopped; the finalized clip is ready for submission
    Finished(VoiceClip),
}

pub struct CaptureManager {
    device: Arc<dyn MicrophoneDevice>,
    state: CaptureState,
    stream: Option<Box<dyn MicrophoneStream>>,
    chunks: Vec<Vec<f32>>,
}

impl CaptureManager {
    pub fn new(device: Arc<dyn MicrophoneDevice>) -> Self {
        Self {
            device,
            state: CaptureState::Idle,
            stream: None,
            chunks: Vec::new(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Toggle semantics: a start request while capturing is a stop request.
    pub async fn toggle(&mut self) -> Result<CaptureToggle> {
        match self.state {
            CaptureState::Idle => {
                self.start().await?;
                Ok(CaptureToggle::Started)
            }
            CaptureState::Capturing => {
                let clip = self.stop()?;
                Ok(CaptureToggle::Finished(clip))
            }
            // A toggle can never observe the transient states from outside;
            // they only exist inside start()/stop().
            state => Err(SahayakError::Capture(format!(
                "Capture busy in state {:?}",
                state
            ))),
        }
    }

    async fn start(&mut self) -> Result<()> {
        self.state = CaptureState::Requesting;
        debug!("Requesting microphone access");

        match self.device.acquire().await {
            Ok(stream) => {
                info!("Microphone acquired at {} Hz", stream.sample_rate());
                self.chunks.clear();
                self.stream = Some(stream);
                self.state = CaptureState::Capturing;
                Ok(())
            }
            Err(e) => {
                warn!("Microphone access denied: {}", e);
                self.state = CaptureState::Idle;
                // Any acquisition failure surfaces as a denial to the user
                match e {
                    SahayakError::PermissionDenied(_) => Err(e),
                    other => Err(SahayakError::PermissionDenied(other.to_string())),
                }
            }
        }
    }

    fn stop(&mut self) -> Result<VoiceClip> {
        self.state = CaptureState::Finalizing;

        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| SahayakError::Capture("No active stream".to_string()))?;

        // Drain whatever the stream buffered, then release the device
        while let Some(chunk) = stream.try_next_chunk() {
            self.chunks.push(chunk);
        }
        let sample_rate = stream.sample_rate();
        stream.release();
        drop(stream);

        let samples: Vec<f32> = self.chunks.concat();
        let total = samples.len();
        self.chunks.clear();

        let data = encode_wav(&samples, sample_rate)?;
        self.state = CaptureState::Idle;

        info!(
            "Capture finalized: {} samples ({:.2}s) -> {} bytes",
            total,
            total as f32 / sample_rate.max(1) as f32,
            data.len()
        );

        Ok(VoiceClip::wav(data))
    }
}

/// Encode mono f32 samples as a 16-bit PCM WAV container.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SahayakError::Capture(format!("WAV header: {}", e)))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| SahayakError::Capture(format!("WAV write: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| SahayakError::Capture(format!("WAV finalize: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockMicrophone;

    #[tokio::test]
    async fn test_toggle_starts_then_stops() {
        let device = Arc::new(MockMicrophone::granting(vec![
            vec![0.0_f32; 160],
            vec![0.5_f32; 160],
        ]));
        let mut manager = CaptureManager::new(device.clone());
        assert_eq!(manager.state(), CaptureState::Idle);

        match manager.toggle().await.unwrap() {
            CaptureToggle::Started => {}
            other => panic!("expected Started, got {:?}", other),
        }
        assert!(manager.is_capturing());

        let clip = match manager.toggle().await.unwrap() {
            CaptureToggle::Finished(clip) => clip,
            other => panic!("expected Finished, got {:?}", other),
        };
        assert_eq!(manager.state(), CaptureState::Idle);
        assert_eq!(clip.mime_type, "audio/wav");
        assert!(!clip.is_empty());
        assert!(device.released());
    }

    #[tokio::test]
    async fn test_denied_permission_returns_to_idle() {
        let device = Arc::new(MockMicrophone::denying("user refused"));
        let mut manager = CaptureManager::new(device);

        let err = manager.toggle().await.unwrap_err();
        assert!(matches!(err, SahayakError::PermissionDenied(_)));
        assert_eq!(manager.state(), CaptureState::Idle);

        // The manager stays usable after a denial
        assert!(!manager.is_capturing());
    }

    #[tokio::test]
    async fn test_stream_released_even_with_no_chunks() {
        let device = Arc::new(MockMicrophone::granting(Vec::new()));
        let mut manager = CaptureManager::new(device.clone());

        manager.toggle().await.unwrap();
        let clip = match manager.toggle().await.unwrap() {
            CaptureToggle::Finished(clip) => clip,
            other => panic!("expected Finished, got {:?}", other),
        };

        assert!(device.released());
        // WAV header only, zero samples
        assert!(!clip.data.is_empty());
    }

    #[test]
    fn test_encode_wav_header() {
        let data = encode_wav(&[0.0, 0.25, -0.25, 1.5, -1.5], 16000).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        // 5 samples at 16 bits
        let reader = hound::WavReader::new(Cursor::new(&data)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 5);
    }

    #[test]
    fn test_encode_wav_clamps_out_of_range() {
        let data = encode_wav(&[2.0, -2.0], 8000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(&data)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples[0], i16::MAX);
        assert_eq!(samples[1], -i16::MAX);
    }
}
