//! Telegram Bot API client over blocking HTTP.
//!
//! Only the handful of methods the bot needs: `getUpdates`, `sendMessage`,
//! `sendPhoto`, `sendSticker`, `answerCallbackQuery`, `getFile` and the file
//! download endpoint.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use pxb_core::ChatId;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::transport::{Keyboard, MessageOptions, Transport, Update, UpdateKind};

const API_BASE: &str = "https://api.telegram.org";

/// Blocking Telegram client. The token never appears in logs.
pub struct TelegramClient {
    client: Client,
    token: String,
    max_download_bytes: u64,
}

impl TelegramClient {
    /// Build a client whose HTTP timeout outlasts the long-poll timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: &str, poll_timeout_secs: u64, max_download_bytes: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 15))
            .build()
            .context("Impossible de construire le client HTTP")?;
        Ok(Self {
            client,
            token: token.to_string(),
            max_download_bytes,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.token)
    }

    fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .with_context(|| format!("{method}: requête échouée"))?;
        parse_response(method, response)
    }

    fn upload(&self, method: &str, field: &str, chat: ChatId, part: Part) -> Result<()> {
        let form = Form::new().text("chat_id", chat.to_string()).part(field.to_string(), part);
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .with_context(|| format!("{method}: envoi échoué"))?;
        parse_response::<Value>(method, response).map(|_| ())
    }
}

fn parse_response<T: DeserializeOwned>(method: &str, response: Response) -> Result<T> {
    let envelope: ApiResponse<T> = response
        .json()
        .with_context(|| format!("{method}: réponse illisible"))?;
    envelope.into_result(method)
}

impl Transport for TelegramClient {
    fn get_updates(&mut self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let raw: Vec<RawUpdate> = self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )?;
        Ok(raw.into_iter().map(Update::from).collect())
    }

    fn send_message(&mut self, chat: ChatId, text: &str, options: &MessageOptions) -> Result<()> {
        let body = message_body(chat, text, options);
        self.call::<Value>("sendMessage", &body).map(|_| ())
    }

    fn send_photo(&mut self, chat: ChatId, jpeg: Vec<u8>) -> Result<()> {
        let part = Part::bytes(jpeg).file_name("image.jpg").mime_str("image/jpeg")?;
        self.upload("sendPhoto", "photo", chat, part)
    }

    fn send_sticker(&mut self, chat: ChatId, webp: Vec<u8>) -> Result<()> {
        let part = Part::bytes(webp).file_name("sticker.webp").mime_str("image/webp")?;
        self.upload("sendSticker", "sticker", chat, part)
    }

    fn answer_callback(&mut self, callback_id: &str, text: &str) -> Result<()> {
        self.call::<Value>(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_id, "text": text }),
        )
        .map(|_| ())
    }

    fn download_file(&mut self, file_id: &str) -> Result<Vec<u8>> {
        let file: RawFile = self.call("getFile", &json!({ "file_id": file_id }))?;
        if let Some(size) = file.file_size.filter(|&s| s > self.max_download_bytes) {
            bail!("fichier trop gros : {size} octets");
        }
        let Some(path) = file.file_path else {
            bail!("getFile: pas de file_path pour {file_id}");
        };

        let url = format!("{API_BASE}/file/bot{}/{path}", self.token);
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(Response::error_for_status)
            .context("Téléchargement échoué")?
            .bytes()
            .context("Téléchargement interrompu")?;
        log::debug!("Fichier {file_id} téléchargé ({} octets)", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// JSON body for `sendMessage`.
fn message_body(chat: ChatId, text: &str, options: &MessageOptions) -> Value {
    let mut body = json!({ "chat_id": chat, "text": text });
    if let Some(id) = options.reply_to {
        body["reply_to_message_id"] = json!(id);
    }
    if options.markdown {
        body["parse_mode"] = json!("MarkdownV2");
    }
    if let Some(keyboard) = &options.keyboard {
        body["reply_markup"] = keyboard_markup(keyboard);
    }
    body
}

fn keyboard_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.text, "callback_data": b.data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

// === Wire types ===

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => bail!(
                "{method}: {}",
                self.description.as_deref().unwrap_or("erreur API sans description")
            ),
        }
    }
}

#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
    callback_query: Option<RawCallback>,
}

#[derive(Deserialize)]
struct RawMessage {
    message_id: i64,
    chat: RawChat,
    text: Option<String>,
    photo: Option<Vec<RawPhotoSize>>,
}

#[derive(Deserialize)]
struct RawChat {
    id: ChatId,
}

#[derive(Deserialize)]
struct RawPhotoSize {
    file_id: String,
}

#[derive(Deserialize)]
struct RawCallback {
    id: String,
    data: Option<String>,
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawFile {
    file_path: Option<String>,
    file_size: Option<u64>,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let kind = if let Some(cb) = raw.callback_query {
            match (cb.data, cb.message) {
                (Some(data), Some(message)) => UpdateKind::Callback {
                    id: cb.id,
                    chat: message.chat.id,
                    data,
                },
                _ => UpdateKind::Ignored,
            }
        } else if let Some(message) = raw.message {
            message_kind(message)
        } else {
            UpdateKind::Ignored
        };
        Self {
            update_id: raw.update_id,
            kind,
        }
    }
}

fn message_kind(message: RawMessage) -> UpdateKind {
    let chat = message.chat.id;
    let message_id = message.message_id;
    // Sizes come smallest first.
    if let Some(largest) = message.photo.and_then(|mut sizes| sizes.pop()) {
        return UpdateKind::Photo {
            chat,
            message_id,
            file_id: largest.file_id,
        };
    }
    match message.text {
        Some(text) => UpdateKind::Text {
            chat,
            message_id,
            text,
        },
        None => UpdateKind::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Button;

    fn updates(json: &str) -> Vec<Update> {
        let envelope: ApiResponse<Vec<RawUpdate>> = serde_json::from_str(json).unwrap();
        envelope
            .into_result("getUpdates")
            .unwrap()
            .into_iter()
            .map(Update::from)
            .collect()
    }

    #[test]
    fn photo_update_takes_largest_size() {
        let got = updates(
            r#"{"ok":true,"result":[{"update_id":10,"message":{"message_id":5,
            "chat":{"id":42,"type":"private"},"photo":[
            {"file_id":"small","width":90,"height":60},
            {"file_id":"big","width":1280,"height":853,"file_size":99000}]}}]}"#,
        );
        assert_eq!(
            got,
            vec![Update {
                update_id: 10,
                kind: UpdateKind::Photo {
                    chat: 42,
                    message_id: 5,
                    file_id: "big".into()
                }
            }]
        );
    }

    #[test]
    fn callback_update_uses_message_chat() {
        let got = updates(
            r#"{"ok":true,"result":[{"update_id":11,"callback_query":{"id":"cb1",
            "from":{"id":7},"data":"ascii","message":{"message_id":6,"chat":{"id":42}}}}]}"#,
        );
        assert_eq!(
            got[0].kind,
            UpdateKind::Callback {
                id: "cb1".into(),
                chat: 42,
                data: "ascii".into()
            }
        );
    }

    #[test]
    fn text_and_unknown_updates() {
        let got = updates(
            r#"{"ok":true,"result":[
            {"update_id":12,"message":{"message_id":7,"chat":{"id":1},"text":"yes"}},
            {"update_id":13,"edited_message":{"message_id":7,"chat":{"id":1},"text":"no"}},
            {"update_id":14,"message":{"message_id":8,"chat":{"id":1},"sticker":{}}}]}"#,
        );
        assert_eq!(
            got[0].kind,
            UpdateKind::Text {
                chat: 1,
                message_id: 7,
                text: "yes".into()
            }
        );
        assert_eq!(got[1].kind, UpdateKind::Ignored);
        assert_eq!(got[2].kind, UpdateKind::Ignored);
    }

    #[test]
    fn api_error_carries_description() {
        let envelope: ApiResponse<Value> =
            serde_json::from_str(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
                .unwrap();
        let err = envelope.into_result("getMe").unwrap_err();
        assert_eq!(err.to_string(), "getMe: Unauthorized");
    }

    #[test]
    fn message_body_includes_markup_and_parse_mode() {
        let options = MessageOptions {
            reply_to: Some(3),
            markdown: true,
            keyboard: Some(vec![vec![Button {
                text: "Mirror".into(),
                data: "mirror".into(),
            }]]),
        };
        let body = message_body(9, "hi", &options);
        assert_eq!(body["chat_id"], 9);
        assert_eq!(body["reply_to_message_id"], 3);
        assert_eq!(body["parse_mode"], "MarkdownV2");
        assert_eq!(
            body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "mirror"
        );
    }

    #[test]
    fn plain_message_body_has_no_optional_fields() {
        let body = message_body(9, "hi", &MessageOptions::default());
        assert!(body.get("parse_mode").is_none());
        assert!(body.get("reply_markup").is_none());
    }
}
