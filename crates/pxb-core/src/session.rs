use std::collections::HashMap;

use crate::error::CoreError;
use crate::ramp::Ramp;

/// Platform chat identifier.
pub type ChatId = i64;

/// Where a chat stands in the photo → ramp → action conversation.
///
/// ```text
/// Idle ──photo──▶ AwaitingRampChoice ──yes──▶ AwaitingRampInput ──text──▶ AwaitingAction
///                          └───────────no──────────────────────────────────────▲
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No photo yet.
    #[default]
    Idle,
    /// Photo received, asked whether to change the ramp.
    AwaitingRampChoice,
    /// Next text message is the new ramp.
    AwaitingRampInput,
    /// Menu shown, transforms may run.
    AwaitingAction,
}

/// Result of feeding a text message to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextOutcome {
    /// Ask the user to type a ramp.
    PromptForRamp,
    /// Show the action menu.
    ShowMenu,
    /// Text does not fit the current state.
    NotUnderstood,
}

/// Classification of free text received from a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextInput<'a> {
    /// "yes" / "да".
    Yes,
    /// "no" / "нет".
    No,
    /// "random joke".
    Joke,
    /// Anything else, untouched.
    Other(&'a str),
}

impl<'a> TextInput<'a> {
    /// Case-insensitive keyword match after trimming.
    ///
    /// # Example
    /// ```
    /// use pxb_core::session::TextInput;
    /// assert_eq!(TextInput::classify(" Yes "), TextInput::Yes);
    /// assert_eq!(TextInput::classify("НЕТ"), TextInput::No);
    /// assert_eq!(TextInput::classify("@#."), TextInput::Other("@#."));
    /// ```
    #[must_use]
    pub fn classify(text: &'a str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "yes" | "да" => Self::Yes,
            "no" | "нет" => Self::No,
            "random joke" => Self::Joke,
            _ => Self::Other(text),
        }
    }
}

/// Per-chat state record.
#[derive(Clone, Debug, Default)]
pub struct Session {
    photo: Option<String>,
    ramp: Ramp,
    state: SessionState,
}

impl Session {
    /// Fresh session in `Idle` using the given ramp.
    #[must_use]
    pub fn new(ramp: Ramp) -> Self {
        Self {
            photo: None,
            ramp,
            state: SessionState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Ramp used for this chat's ASCII renders.
    #[must_use]
    pub fn ramp(&self) -> &Ramp {
        &self.ramp
    }

    /// Remember a new photo and ask about the ramp again.
    pub fn attach_photo(&mut self, file_id: impl Into<String>) {
        self.photo = Some(file_id.into());
        self.state = SessionState::AwaitingRampChoice;
    }

    /// Advance the conversation with a text message.
    ///
    /// `default_ramp` is restored when the user declines to change it.
    ///
    /// # Errors
    /// - `CoreError::MissingSession` for a yes/no answer before any photo.
    /// - `CoreError::InvalidConfiguration` for an empty ramp; the session
    ///   keeps waiting for a ramp.
    pub fn handle_text(&mut self, text: &str, default_ramp: &Ramp) -> Result<TextOutcome, CoreError> {
        match (self.state, TextInput::classify(text)) {
            (SessionState::AwaitingRampInput, _) => {
                let ramp = Ramp::new(text);
                if ramp.is_empty() {
                    return Err(CoreError::InvalidConfiguration(
                        "the character set is empty".into(),
                    ));
                }
                self.ramp = ramp;
                self.state = SessionState::AwaitingAction;
                Ok(TextOutcome::ShowMenu)
            }
            (SessionState::Idle, TextInput::Yes | TextInput::No) => Err(CoreError::MissingSession),
            (_, TextInput::Yes) => {
                self.state = SessionState::AwaitingRampInput;
                Ok(TextOutcome::PromptForRamp)
            }
            (_, TextInput::No) => {
                self.ramp = default_ramp.clone();
                self.state = SessionState::AwaitingAction;
                Ok(TextOutcome::ShowMenu)
            }
            _ => Ok(TextOutcome::NotUnderstood),
        }
    }

    /// Check that an action can run and return the photo handle.
    ///
    /// # Errors
    /// `CoreError::MissingSession` if no photo was uploaded yet.
    pub fn begin_action(&mut self) -> Result<&str, CoreError> {
        let photo = self.photo.as_deref().ok_or(CoreError::MissingSession)?;
        // Pressing a menu button answers any pending question.
        self.state = SessionState::AwaitingAction;
        Ok(photo)
    }

    /// Drop the photo and go back to `Idle`. The ramp is kept.
    pub fn reset(&mut self) {
        self.photo = None;
        self.state = SessionState::Idle;
    }
}

/// In-memory mapping chat id → session. Lost on restart.
///
/// # Example
/// ```
/// use pxb_core::session::{SessionStore, SessionState};
/// use pxb_core::CoreError;
///
/// let mut store = SessionStore::default();
/// assert_eq!(store.get_mut(7).err(), Some(CoreError::MissingSession));
/// store.attach_photo(7, "file-1");
/// assert_eq!(store.get_mut(7).unwrap().state(), SessionState::AwaitingRampChoice);
/// ```
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<ChatId, Session>,
    default_ramp: Ramp,
}

impl SessionStore {
    /// Empty store; new sessions start with `default_ramp`.
    #[must_use]
    pub fn new(default_ramp: Ramp) -> Self {
        Self {
            sessions: HashMap::new(),
            default_ramp,
        }
    }

    /// Existing session for `chat`.
    ///
    /// # Errors
    /// `CoreError::MissingSession` if the chat never sent a photo.
    pub fn get_mut(&mut self, chat: ChatId) -> Result<&mut Session, CoreError> {
        self.sessions.get_mut(&chat).ok_or(CoreError::MissingSession)
    }

    /// Record a photo, creating the session if needed.
    pub fn attach_photo(&mut self, chat: ChatId, file_id: impl Into<String>) {
        let default_ramp = &self.default_ramp;
        self.sessions
            .entry(chat)
            .or_insert_with(|| Session::new(default_ramp.clone()))
            .attach_photo(file_id);
    }

    /// Feed a text message to the chat's session.
    ///
    /// Chats without a session behave like an `Idle` session.
    ///
    /// # Errors
    /// See [`Session::handle_text`].
    pub fn handle_text(&mut self, chat: ChatId, text: &str) -> Result<TextOutcome, CoreError> {
        match self.sessions.get_mut(&chat) {
            Some(session) => session.handle_text(text, &self.default_ramp),
            None => Session::new(self.default_ramp.clone()).handle_text(text, &self.default_ramp),
        }
    }

    /// Reset the chat to `Idle` if it has a session.
    pub fn reset(&mut self, chat: ChatId) {
        if let Some(session) = self.sessions.get_mut(&chat) {
            session.reset();
        }
    }

    /// Number of known chats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if no chat has a session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_photo(chat: ChatId) -> SessionStore {
        let mut store = SessionStore::default();
        store.attach_photo(chat, "photo-a");
        store
    }

    #[test]
    fn yes_then_ramp_then_menu() {
        let mut store = store_with_photo(1);
        assert_eq!(store.handle_text(1, "yes"), Ok(TextOutcome::PromptForRamp));
        assert_eq!(
            store.get_mut(1).unwrap().state(),
            SessionState::AwaitingRampInput
        );

        assert_eq!(store.handle_text(1, "#. "), Ok(TextOutcome::ShowMenu));
        let session = store.get_mut(1).unwrap();
        assert_eq!(session.state(), SessionState::AwaitingAction);
        assert_eq!(session.ramp(), &Ramp::new("#. "));
    }

    #[test]
    fn no_restores_default_ramp() {
        let mut store = store_with_photo(1);
        store.handle_text(1, "да").unwrap();
        store.handle_text(1, "xy").unwrap();
        store.attach_photo(1, "photo-b");
        assert_eq!(store.get_mut(1).unwrap().ramp(), &Ramp::new("xy"));

        assert_eq!(store.handle_text(1, "No"), Ok(TextOutcome::ShowMenu));
        assert_eq!(store.get_mut(1).unwrap().ramp(), &Ramp::default());
    }

    #[test]
    fn ramp_input_accepts_keywords_literally() {
        let mut store = store_with_photo(1);
        store.handle_text(1, "yes").unwrap();
        store.handle_text(1, "no").unwrap();
        assert_eq!(store.get_mut(1).unwrap().ramp(), &Ramp::new("no"));
    }

    #[test]
    fn empty_ramp_keeps_waiting() {
        let mut store = store_with_photo(1);
        store.handle_text(1, "yes").unwrap();
        let err = store.handle_text(1, "").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
        assert_eq!(
            store.get_mut(1).unwrap().state(),
            SessionState::AwaitingRampInput
        );
    }

    #[test]
    fn answers_without_photo_are_missing_session() {
        let mut store = SessionStore::default();
        assert_eq!(store.handle_text(9, "yes"), Err(CoreError::MissingSession));
        assert_eq!(store.handle_text(9, "hello"), Ok(TextOutcome::NotUnderstood));
        assert!(store.is_empty());
    }

    #[test]
    fn ramps_are_isolated_per_chat() {
        let mut store = store_with_photo(1);
        store.attach_photo(2, "photo-z");
        store.handle_text(1, "yes").unwrap();
        store.handle_text(1, "ab").unwrap();
        store.handle_text(2, "no").unwrap();

        assert_eq!(store.get_mut(1).unwrap().ramp(), &Ramp::new("ab"));
        assert_eq!(store.get_mut(2).unwrap().ramp(), &Ramp::default());
    }

    #[test]
    fn action_requires_photo() {
        let mut store = store_with_photo(1);
        assert_eq!(store.get_mut(1).unwrap().begin_action(), Ok("photo-a"));
        assert_eq!(
            store.get_mut(1).unwrap().state(),
            SessionState::AwaitingAction
        );

        store.reset(1);
        assert_eq!(
            store.get_mut(1).unwrap().begin_action(),
            Err(CoreError::MissingSession)
        );
        assert_eq!(store.handle_text(1, "no"), Err(CoreError::MissingSession));
    }
}
