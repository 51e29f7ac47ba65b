use anyhow::Result;
use pxb_core::ChatId;

/// One inbound event from the messaging platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    /// Monotonic id; the next poll starts after the highest one seen.
    pub update_id: i64,
    /// Payload.
    pub kind: UpdateKind,
}

/// What the user did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// Plain text, commands included.
    Text {
        chat: ChatId,
        message_id: i64,
        text: String,
    },
    /// Photo; `file_id` is the largest size offered.
    Photo {
        chat: ChatId,
        message_id: i64,
        file_id: String,
    },
    /// Inline button press.
    Callback {
        id: String,
        chat: ChatId,
        data: String,
    },
    /// Anything the bot ignores (stickers, edits, channel posts...).
    Ignored,
}

impl Update {
    /// Chat the update belongs to, if any.
    #[must_use]
    pub fn chat(&self) -> Option<ChatId> {
        match &self.kind {
            UpdateKind::Text { chat, .. }
            | UpdateKind::Photo { chat, .. }
            | UpdateKind::Callback { chat, .. } => Some(*chat),
            UpdateKind::Ignored => None,
        }
    }
}

/// Inline keyboard button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    /// Label.
    pub text: String,
    /// Callback data sent back on press.
    pub data: String,
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;

/// Optional parts of an outgoing text message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageOptions {
    /// Quote this message.
    pub reply_to: Option<i64>,
    /// Send with `parse_mode = MarkdownV2`.
    pub markdown: bool,
    /// Attach an inline keyboard.
    pub keyboard: Option<Keyboard>,
}

/// Client side of the messaging platform.
///
/// Implémenté par : `TelegramClient`. Les tests utilisent un transport en mémoire.
pub trait Transport {
    /// Long-poll for updates with id ≥ `offset`.
    ///
    /// # Errors
    /// Network or API failure; the caller backs off and retries.
    fn get_updates(&mut self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;

    /// Send a text message.
    ///
    /// # Errors
    /// Network or API failure.
    fn send_message(&mut self, chat: ChatId, text: &str, options: &MessageOptions) -> Result<()>;

    /// Send a JPEG photo.
    ///
    /// # Errors
    /// Network or API failure.
    fn send_photo(&mut self, chat: ChatId, jpeg: Vec<u8>) -> Result<()>;

    /// Send a WebP sticker.
    ///
    /// # Errors
    /// Network or API failure.
    fn send_sticker(&mut self, chat: ChatId, webp: Vec<u8>) -> Result<()>;

    /// Acknowledge a button press with a short toast.
    ///
    /// # Errors
    /// Network or API failure.
    fn answer_callback(&mut self, callback_id: &str, text: &str) -> Result<()>;

    /// Download a file by its platform handle.
    ///
    /// # Errors
    /// Network or API failure, or a file larger than the client accepts.
    fn download_file(&mut self, file_id: &str) -> Result<Vec<u8>>;
}
