pub mod backend;
pub mod capture;
pub mod config;
pub mod controller;
pub mod lang;
pub mod messages;
pub mod playback;

#[cfg(test)]
pub(crate) mod testutil;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SahayakError {
    #[error("Input rejected: {0}")]
    InputRejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SahayakError {
    /// Check if this error is recoverable without restarting the session
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Declined before any side effect; the user simply retypes
            SahayakError::InputRejected(_) => true,
            // Transport failures surface as a chat reply and may be resent
            SahayakError::Network(_) => true,
            SahayakError::Server(_) => true,
            // Requires the user to change a system setting
            SahayakError::PermissionDenied(_) => false,
            // Playback falls back to synthesis or goes silent
            SahayakError::Playback(_) => true,
            SahayakError::AudioDevice(_) => false,
            SahayakError::Capture(_) => true,
            SahayakError::Channel(_) => false,
            SahayakError::Config(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SahayakError::InputRejected(_) => {
                "Please type a message before sending.".to_string()
            }
            SahayakError::Network(_) => {
                "Could not reach the assistant. Please check your connection.".to_string()
            }
            SahayakError::Server(_) => {
                "The assistant had a problem answering. Please try again.".to_string()
            }
            SahayakError::PermissionDenied(_) => {
                "Microphone access denied. Please enable microphone permissions.".to_string()
            }
            SahayakError::Playback(_) => {
                "Audio playback failed. The response is shown as text.".to_string()
            }
            SahayakError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            SahayakError::Capture(_) => {
                "Voice recording failed. Please try again.".to_string()
            }
            SahayakError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SahayakError::Config(_) => {
                "Configuration error. Please check settings.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SahayakError>;
