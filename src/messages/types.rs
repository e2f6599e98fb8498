use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    User,
    Assistant,
}

/// One turn of the conversation. Immutable once created: the constructors are
/// the only way to set the fields, and `is_voice_origin` can only be true for
/// an assistant message built with [`Message::assistant_voice`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub origin: Origin,
    pub text: String,
    /// Opaque reference to server-hosted audio for this message, exactly as
    /// the server sent it (typically a path such as `/audio/<id>`).
    pub audio_ref: Option<String>,
    /// True only for assistant messages answering a voice-captured user turn.
    pub is_voice_origin: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            text: text.into(),
            audio_ref: None,
            is_voice_origin: false,
            timestamp: Utc::now(),
        }
    }

    /// A user turn (typed text or the voice-message placeholder)
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Origin::User, text)
    }

    /// An assistant reply to a typed user turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Origin::Assistant, text)
    }

    /// An assistant reply to a voice-captured user turn; always eligible for
    /// playback regardless of the read-aloud toggle
    pub fn assistant_voice(text: impl Into<String>) -> Self {
        let mut msg = Self::new(Origin::Assistant, text);
        msg.is_voice_origin = true;
        msg
    }

    /// Attach a resolved server audio reference
    pub fn with_audio_ref(mut self, audio_ref: impl Into<String>) -> Self {
        self.audio_ref = Some(audio_ref.into());
        self
    }

    pub fn is_assistant(&self) -> bool {
        self.origin == Origin::Assistant
    }
}
