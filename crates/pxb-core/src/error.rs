use thiserror::Error;

/// Errors originating from a single chat request.
///
/// None of these are transient: they are turned into a short reply at the
/// dispatch boundary and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The downloaded bytes could not be decoded as an image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A parameter is unusable (zero width, empty ramp, zero block size).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Callback data outside the known action set.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// An action or answer arrived before any photo for this chat.
    #[error("No photo uploaded for this chat")]
    MissingSession,
}

impl CoreError {
    /// Short text shown to the user in place of the failed result.
    ///
    /// # Example
    /// ```
    /// use pxb_core::CoreError;
    /// assert_eq!(CoreError::MissingSession.user_message(), "Send me a photo first!");
    /// ```
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidImage(_) => {
                "I couldn't read that image. Please send another photo.".to_string()
            }
            Self::InvalidConfiguration(reason) => format!("That won't work: {reason}."),
            Self::UnknownAction(_) => "I don't understand your request.".to_string(),
            Self::MissingSession => "Send me a photo first!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_carries_configuration_reason() {
        let err = CoreError::InvalidConfiguration("the character set is empty".into());
        assert_eq!(
            err.user_message(),
            "That won't work: the character set is empty."
        );
    }

    #[test]
    fn user_message_hides_decoder_details() {
        let err = CoreError::InvalidImage("jpeg: bad huffman table".into());
        assert!(!err.user_message().contains("huffman"));
    }
}
