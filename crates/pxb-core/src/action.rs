use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Transform offered in the inline menu, keyed by its callback data.
///
/// # Example
/// ```
/// use pxb_core::action::Action;
/// let action: Action = "mirror".parse().unwrap();
/// assert_eq!(action, Action::Mirror);
/// assert_eq!(action.callback_data(), "mirror");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Block pixelation.
    Pixelate,
    /// ASCII-art rendering, sent as text.
    Ascii,
    /// Color inversion.
    Invert,
    /// Horizontal flip.
    Mirror,
    /// Grayscale mapped onto a two-color gradient.
    Colorrizer,
    /// Fit into the sticker box, sent as a sticker.
    Resize,
}

impl Action {
    /// Every action, in menu order.
    pub const ALL: [Action; 6] = [
        Action::Pixelate,
        Action::Ascii,
        Action::Invert,
        Action::Mirror,
        Action::Colorrizer,
        Action::Resize,
    ];

    /// Wire identifier carried by the inline button.
    #[must_use]
    pub fn callback_data(self) -> &'static str {
        match self {
            Self::Pixelate => "pixelate",
            Self::Ascii => "ascii",
            Self::Invert => "invert",
            Self::Mirror => "mirror",
            Self::Colorrizer => "colorrizer",
            Self::Resize => "resize",
        }
    }

    /// Button label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pixelate => "Pixelate",
            Self::Ascii => "ASCII Art",
            Self::Invert => "Invert",
            Self::Mirror => "Mirror",
            Self::Colorrizer => "Colorrizer",
            Self::Resize => "Resize",
        }
    }

    /// Toast shown while the action runs.
    #[must_use]
    pub fn progress_text(self) -> &'static str {
        match self {
            Self::Pixelate => "Pixelating your image...",
            Self::Ascii => "Converting your image to ASCII art...",
            Self::Invert => "Inverting your image...",
            Self::Mirror => "Mirroring your image...",
            Self::Colorrizer => "Colorrizing your image...",
            Self::Resize => "Resizing your image...",
        }
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.callback_data() == s)
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.callback_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_parses_back_from_its_callback_data() {
        for action in Action::ALL {
            assert_eq!(action.callback_data().parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn unknown_callback_is_typed_error() {
        assert_eq!(
            "sepia".parse::<Action>(),
            Err(CoreError::UnknownAction("sepia".into()))
        );
        // Callback data is matched exactly.
        assert!("Pixelate".parse::<Action>().is_err());
    }
}
