use super::types::Message;
use parking_lot::RwLock;
use std::sync::Arc;

/// Point-in-time copy of the session for observers (UI, tests).
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub history: Vec<Message>,
    pub pending_input: String,
    pub read_aloud: bool,
    pub recording: bool,
    pub playing: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    history: Vec<Message>,
    pending_input: String,
    read_aloud: bool,
    recording: bool,
    playing: bool,
}

/// Thread-safe store for the one active session.
///
/// All updates are synchronous mutations behind a single lock; reactions to a
/// change (e.g. starting playback) happen in the controller, never here.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    /// Append a message to the history (append-only, insertion order kept)
    pub fn append_message(&self, message: Message) {
        self.state.write().history.push(message);
    }

    pub fn set_pending_input(&self, text: impl Into<String>) {
        self.state.write().pending_input = text.into();
    }

    /// Clear and return the pending input
    pub fn take_pending_input(&self) -> String {
        std::mem::take(&mut self.state.write().pending_input)
    }

    pub fn set_read_aloud(&self, enabled: bool) {
        self.state.write().read_aloud = enabled;
    }

    pub fn set_recording(&self, recording: bool) {
        self.state.write().recording = recording;
    }

    pub fn set_playing(&self, playing: bool) {
        self.state.write().playing = playing;
    }

    /// Reset to a fresh session: history becomes `[greeting]`, pending input
    /// is cleared and read-aloud returns to OFF. Transient flags are left to
    /// their owners (capture/playback teardown runs in the controller).
    pub fn reset(&self, greeting: Message) {
        let mut state = self.state.write();
        state.history.clear();
        state.history.push(greeting);
        state.pending_input.clear();
        state.read_aloud = false;
    }

    pub fn history(&self) -> Vec<Message> {
        self.state.read().history.clone()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.state.read().history.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().history.is_empty()
    }

    pub fn pending_input(&self) -> String {
        self.state.read().pending_input.clone()
    }

    pub fn read_aloud(&self) -> bool {
        self.state.read().read_aloud
    }

    pub fn is_recording(&self) -> bool {
        self.state.read().recording
    }

    pub fn is_playing(&self) -> bool {
        self.state.read().playing
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            history: state.history.clone(),
            pending_input: state.pending_input.clone(),
            read_aloud: state.read_aloud,
            recording: state.recording,
            playing: state.playing,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Origin;

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::new();
        store.append_message(Message::user("one"));
        store.append_message(Message::assistant("two"));
        store.append_message(Message::user("three"));

        let history = store.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].text, "one");
        assert_eq!(history[1].text, "two");
        assert_eq!(history[2].text, "three");
    }

    #[test]
    fn test_reset_leaves_single_greeting_and_toggle_off() {
        let store = SessionStore::new();
        store.append_message(Message::user("old"));
        store.set_read_aloud(true);
        store.set_pending_input("half-typed");

        store.reset(Message::assistant("greeting"));

        assert_eq!(store.len(), 1);
        let only = store.last_message().unwrap();
        assert_eq!(only.origin, Origin::Assistant);
        assert_eq!(only.text, "greeting");
        assert!(!store.read_aloud());
        assert!(store.pending_input().is_empty());
    }

    #[test]
    fn test_take_pending_input() {
        let store = SessionStore::new();
        store.set_pending_input("  hello ");
        assert_eq!(store.take_pending_input(), "  hello ");
        assert!(store.pending_input().is_empty());
    }

    #[test]
    fn test_flags() {
        let store = SessionStore::new();
        assert!(!store.is_recording());
        assert!(!store.is_playing());

        store.set_recording(true);
        store.set_playing(true);
        assert!(store.is_recording());
        assert!(store.is_playing());

        let snap = store.snapshot();
        assert!(snap.recording);
        assert!(snap.playing);
    }
}
