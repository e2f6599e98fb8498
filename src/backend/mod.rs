//! Backend chat service contract
//!
//! The AI itself (LLM, speech-to-text, server-side TTS) lives behind an HTTP
//! service; this module defines the seam the controller talks through plus
//! the wire types of that service.

pub mod http;

pub use http::HttpChatBackend;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of a text chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub enable_tts: bool,
}

/// Reply shape shared by the text and voice endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub detected_language: Option<String>,
}

/// A backend reply as seen by the controller. `audio_url` is the server's
/// opaque reference (typically a path such as `/audio/<id>`); resolution to a
/// playable URL is the backend impl's job via [`ChatBackend::resolve_audio_url`].
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub audio_url: Option<String>,
    pub detected_language: Option<String>,
}

impl From<ChatResponse> for ChatReply {
    fn from(resp: ChatResponse) -> Self {
        Self {
            reply: resp.reply,
            audio_url: resp.audio_url,
            detected_language: resp.detected_language,
        }
    }
}

/// A finalized voice recording ready for submission
#[derive(Debug, Clone)]
pub struct VoiceClip {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl VoiceClip {
    /// A WAV-container clip, the format the capture manager produces
    pub fn wav(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: "audio/wav".to_string(),
            file_name: "voice.wav".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The chat service collaborator.
///
/// Errors map to the transport taxonomy: [`crate::SahayakError::Network`] when
/// the request could not complete, [`crate::SahayakError::Server`] for a
/// non-success status or an unparseable body. Neither is retried here.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a typed message; `enable_tts` asks the server to render audio
    async fn send_text(&self, message: &str, enable_tts: bool) -> Result<ChatReply>;

    /// Submit a finalized voice clip; the server always may include audio
    async fn send_voice(&self, clip: VoiceClip) -> Result<ChatReply>;

    /// Resolve a server audio reference into a playable URL
    fn resolve_audio_url(&self, audio_url: &str) -> String {
        audio_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_wire_shape() {
        let req = ChatRequest {
            message: "When is Shahi Snan?".to_string(),
            enable_tts: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["message"], "When is Shahi Snan?");
        assert_eq!(json["enable_tts"], false);
    }

    #[test]
    fn test_chat_response_optional_fields() {
        let resp: ChatResponse = serde_json::from_str(r#"{"reply":"hello"}"#).unwrap();
        assert_eq!(resp.reply, "hello");
        assert!(resp.audio_url.is_none());
        assert!(resp.detected_language.is_none());

        let resp: ChatResponse = serde_json::from_str(
            r#"{"reply":"hello","audio_url":"/audio/1.mp3","detected_language":"hi","status":"success"}"#,
        )
        .unwrap();
        assert_eq!(resp.audio_url.as_deref(), Some("/audio/1.mp3"));
        assert_eq!(resp.detected_language.as_deref(), Some("hi"));
    }

    #[test]
    fn test_voice_clip_wav() {
        let clip = VoiceClip::wav(vec![1, 2, 3]);
        assert_eq!(clip.mime_type, "audio/wav");
        assert_eq!(clip.file_name, "voice.wav");
        assert!(!clip.is_empty());
        assert!(VoiceClip::wav(Vec::new()).is_empty());
    }
}
