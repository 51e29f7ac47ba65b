/// Configuration, types, and shared structures for pixbot.
///
/// This crate contains the domain error, the glyph ramp, the action set,
/// the per-chat session state machine and the TOML configuration used
/// across the pixbot workspace.

pub mod action;
pub mod config;
pub mod error;
pub mod ramp;
pub mod session;

pub use action::Action;
pub use config::BotConfig;
pub use error::CoreError;
pub use ramp::Ramp;
pub use session::{ChatId, Session, SessionState, SessionStore};
