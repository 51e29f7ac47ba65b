use anyhow::Result;
use image::DynamicImage;
use pxb_ascii::{AsciiOptions, render_ascii};
use pxb_core::session::{TextInput, TextOutcome};
use pxb_core::{Action, BotConfig, ChatId, CoreError, Ramp, SessionStore};
use pxb_source::codec::{decode, encode_jpeg, encode_webp};
use pxb_source::resize::Resizer;
use pxb_source::transform::{colorize, fit_within, invert, mirror, pixelate};

use crate::transport::{Button, Keyboard, MessageOptions, Transport, Update, UpdateKind};

const WELCOME: &str = "Send me an image, and I'll provide options for you!";
const PHOTO_RECEIVED: &str = "I got your photo! Please choose what you'd like to do with it.";
const ASK_RAMP: &str = "Do you want to change the character set? (yes/да or no/нет)";
const PROMPT_RAMP: &str = "Type the character set, densest glyph first.";
const NOT_UNDERSTOOD: &str = "I don't understand.";
const DOWNLOAD_FAILED: &str = "I couldn't fetch your photo. Please try again.";
const NOT_FUNNY: &str = "I'm not funny.";
const NO_JOKES: &str = "I'm out of jokes.";

/// Result of one action, ready to be sent.
#[derive(Debug)]
pub enum Outbound {
    /// MarkdownV2 text.
    Markdown(String),
    /// JPEG bytes.
    Photo(Vec<u8>),
    /// WebP bytes.
    Sticker(Vec<u8>),
}

/// Run `action` on downloaded photo bytes.
///
/// # Errors
/// `CoreError` for undecodable bytes or unusable parameters.
pub fn perform(
    action: Action,
    bytes: &[u8],
    ramp: &Ramp,
    config: &BotConfig,
    resizer: &mut Resizer,
) -> Result<Outbound, CoreError> {
    match action {
        Action::Ascii => {
            let art = render_ascii(bytes, ramp, &AsciiOptions::from_config(config))?;
            if art.dropped_rows() > 0 {
                log::info!(
                    "Art ASCII tronqué : {} lignes de {} sur {} envoyées",
                    art.lines().len(),
                    art.width(),
                    art.lines().len() + art.dropped_rows()
                );
            }
            Ok(Outbound::Markdown(art.to_markdown_block()))
        }
        Action::Resize => {
            let sticker = fit_within(&decode(bytes)?, config.sticker_size, resizer)?;
            Ok(Outbound::Sticker(encode_webp(&sticker)?))
        }
        Action::Pixelate => jpeg(&pixelate(&decode(bytes)?, config.pixel_size)?, config),
        Action::Invert => jpeg(&invert(&decode(bytes)?), config),
        Action::Mirror => jpeg(&mirror(&decode(bytes)?), config),
        Action::Colorrizer => {
            let gradient = colorize(&decode(bytes)?, config.colorize_dark, config.colorize_light);
            jpeg(&DynamicImage::ImageRgb8(gradient), config)
        }
    }
}

fn jpeg(img: &DynamicImage, config: &BotConfig) -> Result<Outbound, CoreError> {
    Ok(Outbound::Photo(encode_jpeg(img, config.jpeg_quality)?))
}

/// The six actions, three per row.
#[must_use]
pub fn options_keyboard() -> Keyboard {
    Action::ALL
        .chunks(3)
        .map(|row| {
            row.iter()
                .map(|a| Button {
                    text: a.label().to_string(),
                    data: a.callback_data().to_string(),
                })
                .collect()
        })
        .collect()
}

/// Routes updates to the session state machine and the transforms.
///
/// One update at a time; no error escapes [`Dispatcher::handle`].
pub struct Dispatcher<T: Transport> {
    transport: T,
    sessions: SessionStore,
    config: BotConfig,
    resizer: Resizer,
}

impl<T: Transport> Dispatcher<T> {
    /// Dispatcher with an empty session store.
    pub fn new(transport: T, config: BotConfig) -> Self {
        Self {
            transport,
            sessions: SessionStore::new(config.ramp()),
            config,
            resizer: Resizer::lanczos(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Underlying transport, mutably (polling).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Handle one update. Domain errors become a reply; transport errors are logged.
    pub fn handle(&mut self, update: Update) {
        let Some(chat) = update.chat() else {
            log::trace!("Update {} ignorée", update.update_id);
            return;
        };
        let Err(err) = self.route(update.kind) else {
            return;
        };
        match err.downcast_ref::<CoreError>() {
            Some(core) => {
                log::info!("Chat {chat} : {core}");
                let text = core.user_message();
                self.say(chat, &text, MessageOptions::default());
            }
            None => log::warn!("Chat {chat} : échec de traitement : {err:#}"),
        }
    }

    fn route(&mut self, kind: UpdateKind) -> Result<()> {
        match kind {
            UpdateKind::Text {
                chat,
                message_id,
                text,
            } => self.on_text(chat, message_id, &text),
            UpdateKind::Photo {
                chat,
                message_id,
                file_id,
            } => self.on_photo(chat, message_id, file_id),
            UpdateKind::Callback { id, chat, data } => self.on_callback(&id, chat, &data),
            UpdateKind::Ignored => Ok(()),
        }
    }

    fn on_photo(&mut self, chat: ChatId, message_id: i64, file_id: String) -> Result<()> {
        self.sessions.attach_photo(chat, file_id);
        log::debug!("Chat {chat} : photo reçue ({} sessions actives)", self.sessions.len());
        self.transport
            .send_message(chat, PHOTO_RECEIVED, &reply_to(message_id))?;
        self.transport
            .send_message(chat, ASK_RAMP, &MessageOptions::default())
    }

    fn on_text(&mut self, chat: ChatId, message_id: i64, text: &str) -> Result<()> {
        if let Some(command) = text.strip_prefix('/') {
            return self.on_command(chat, message_id, command);
        }
        if TextInput::classify(text) == TextInput::Joke {
            let joke = self.random_joke();
            return self
                .transport
                .send_message(chat, &joke, &MessageOptions::default());
        }

        match self.sessions.handle_text(chat, text)? {
            TextOutcome::PromptForRamp => {
                self.transport
                    .send_message(chat, PROMPT_RAMP, &MessageOptions::default())
            }
            TextOutcome::ShowMenu => {
                let options = MessageOptions {
                    reply_to: Some(message_id),
                    keyboard: Some(options_keyboard()),
                    ..MessageOptions::default()
                };
                self.transport.send_message(chat, PHOTO_RECEIVED, &options)
            }
            TextOutcome::NotUnderstood => {
                self.transport
                    .send_message(chat, NOT_UNDERSTOOD, &MessageOptions::default())
            }
        }
    }

    fn on_command(&mut self, chat: ChatId, message_id: i64, command: &str) -> Result<()> {
        // "/start@pixbot extra" → "start"
        let name = command
            .split_whitespace()
            .next()
            .and_then(|c| c.split('@').next())
            .unwrap_or_default();
        match name {
            "start" => {
                self.sessions.reset(chat);
                self.transport.send_message(chat, WELCOME, &reply_to(message_id))
            }
            "help" => self.transport.send_message(chat, WELCOME, &reply_to(message_id)),
            _ => self
                .transport
                .send_message(chat, NOT_UNDERSTOOD, &MessageOptions::default()),
        }
    }

    fn on_callback(&mut self, id: &str, chat: ChatId, data: &str) -> Result<()> {
        if data == "joke" {
            return self.transport.answer_callback(id, NOT_FUNNY);
        }
        let action = match data.parse::<Action>() {
            Ok(action) => action,
            Err(err) => {
                log::info!("Chat {chat} : {err}");
                return self.transport.answer_callback(id, &err.user_message());
            }
        };
        self.transport.answer_callback(id, action.progress_text())?;
        self.run_action(chat, action)
    }

    fn run_action(&mut self, chat: ChatId, action: Action) -> Result<()> {
        let session = self.sessions.get_mut(chat)?;
        let file_id = session.begin_action()?.to_string();
        let ramp = session.ramp().clone();

        let bytes = match self.transport.download_file(&file_id) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Chat {chat} : téléchargement de {file_id} échoué : {err:#}");
                return self
                    .transport
                    .send_message(chat, DOWNLOAD_FAILED, &MessageOptions::default());
            }
        };
        if bytes.len() as u64 > self.config.max_download_bytes {
            return Err(CoreError::InvalidImage(format!("{} bytes", bytes.len())).into());
        }

        log::debug!("Chat {chat} : {action} sur {} octets", bytes.len());
        match perform(action, &bytes, &ramp, &self.config, &mut self.resizer)? {
            Outbound::Markdown(text) => {
                let options = MessageOptions {
                    markdown: true,
                    ..MessageOptions::default()
                };
                self.transport.send_message(chat, &text, &options)
            }
            Outbound::Photo(jpeg) => self.transport.send_photo(chat, jpeg),
            Outbound::Sticker(webp) => self.transport.send_sticker(chat, webp),
        }
    }

    fn random_joke(&self) -> String {
        if self.config.jokes.is_empty() {
            return NO_JOKES.to_string();
        }
        self.config.jokes[fastrand::usize(..self.config.jokes.len())].clone()
    }

    fn say(&mut self, chat: ChatId, text: &str, options: MessageOptions) {
        if let Err(err) = self.transport.send_message(chat, text, &options) {
            log::warn!("Chat {chat} : réponse non envoyée : {err:#}");
        }
    }
}

fn reply_to(message_id: i64) -> MessageOptions {
    MessageOptions {
        reply_to: Some(message_id),
        ..MessageOptions::default()
    }
}
