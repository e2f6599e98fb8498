//! HTTP implementation of the chat backend contract

use super::{ChatBackend, ChatReply, ChatRequest, ChatResponse, VoiceClip};
use crate::config::SahayakConfig;
use crate::{Result, SahayakError};
use async_trait::async_trait;
use tracing::{debug, warn};

pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
    chat_url: String,
    voice_url: String,
}

impl HttpChatBackend {
    pub fn new(config: &SahayakConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SahayakError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let chat_url = format!("{}{}", base_url, config.chat_path);
        let voice_url = format!("{}{}", base_url, config.voice_path);

        Ok(Self {
            client,
            base_url,
            chat_url,
            voice_url,
        })
    }

    async fn parse_reply(&self, response: reqwest::Response) -> Result<ChatReply> {
        let status = response.status();
        if !status.is_success() {
            warn!("Backend returned status {}", status);
            return Err(SahayakError::Server(format!("Status {}", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SahayakError::Server(format!("Unparseable reply: {}", e)))?;

        Ok(body.into())
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send_text(&self, message: &str, enable_tts: bool) -> Result<ChatReply> {
        debug!("POST {} ({} chars, tts={})", self.chat_url, message.len(), enable_tts);

        let request = ChatRequest {
            message: message.to_string(),
            enable_tts,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SahayakError::Network(e.to_string()))?;

        self.parse_reply(response).await
    }

    async fn send_voice(&self, clip: VoiceClip) -> Result<ChatReply> {
        debug!("POST {} ({} bytes, {})", self.voice_url, clip.data.len(), clip.mime_type);

        let part = reqwest::multipart::Part::bytes(clip.data)
            .file_name(clip.file_name)
            .mime_str(&clip.mime_type)
            .map_err(|e| SahayakError::Config(format!("Invalid clip MIME type: {}", e)))?;

        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .client
            .post(&self.voice_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SahayakError::Network(e.to_string()))?;

        self.parse_reply(response).await
    }

    fn resolve_audio_url(&self, audio_url: &str) -> String {
        if audio_url.starts_with("http://") || audio_url.starts_with("https://") {
            audio_url.to_string()
        } else {
            format!("{}{}", self.base_url, audio_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HttpChatBackend {
        HttpChatBackend::new(&SahayakConfig::new("http://localhost:8000/")).unwrap()
    }

    #[test]
    fn test_endpoint_urls_trim_trailing_slash() {
        let backend = backend();
        assert_eq!(backend.chat_url, "http://localhost:8000/chat");
        assert_eq!(backend.voice_url, "http://localhost:8000/chat/voice");
    }

    #[test]
    fn test_resolve_audio_url_against_base() {
        let backend = backend();
        assert_eq!(
            backend.resolve_audio_url("/audio/1.mp3"),
            "http://localhost:8000/audio/1.mp3"
        );
    }

    #[test]
    fn test_resolve_audio_url_passes_absolute_through() {
        let backend = backend();
        assert_eq!(
            backend.resolve_audio_url("https://cdn.example/a.mp3"),
            "https://cdn.example/a.mp3"
        );
    }
}
