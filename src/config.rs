//! Configuration for the session controller
//!
//! Centralized settings for the backend collaborator and the audio seams.

use crate::lang::Language;
use std::time::Duration;

/// Configuration for the complete controller
#[derive(Clone, Debug)]
pub struct SahayakConfig {
    /// Base URL of the backend chat service, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Path of the text chat endpoint
    pub chat_path: String,

    /// Path of the voice chat endpoint
    pub voice_path: String,

    /// Timeout applied to each backend request
    pub request_timeout: Duration,

    /// Active UI language (drives greeting, error strings and speech locale)
    pub language: Language,

    /// Whether to enable microphone capture
    pub enable_audio_input: bool,

    /// Whether to enable audio playback / speech synthesis
    pub enable_audio_output: bool,
}

impl Default for SahayakConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            chat_path: "/chat".to_string(),
            voice_path: "/chat/voice".to_string(),
            request_timeout: Duration::from_secs(30),
            language: Language::En,
            enable_audio_input: true,
            enable_audio_output: true,
        }
    }
}

impl SahayakConfig {
    /// Create a configuration pointing at the given backend
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the UI language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disable microphone capture (text-only mode)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Disable audio playback (text-only mode)
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Backend base URL is required".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("Backend base URL must be http(s): {}", self.base_url));
        }
        if !self.chat_path.starts_with('/') || !self.voice_path.starts_with('/') {
            return Err("Endpoint paths must start with '/'".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("Request timeout must be non-zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SahayakConfig::default();
        assert!(config.enable_audio_input);
        assert!(config.enable_audio_output);
        assert_eq!(config.chat_path, "/chat");
        assert_eq!(config.voice_path, "/chat/voice");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SahayakConfig::new("http://assistant.example")
            .with_language(Language::Hi)
            .without_audio_input()
            .without_audio_output();

        assert_eq!(config.base_url, "http://assistant.example");
        assert_eq!(config.language, Language::Hi);
        assert!(!config.enable_audio_input);
        assert!(!config.enable_audio_output);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(SahayakConfig::new("").validate().is_err());
        assert!(SahayakConfig::new("localhost:8000").validate().is_err());

        let mut config = SahayakConfig::default();
        config.chat_path = "chat".to_string();
        assert!(config.validate().is_err());
    }
}
