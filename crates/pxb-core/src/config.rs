use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ramp::{DEFAULT_RAMP, Ramp};

/// Configuration complète du bot.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use pxb_core::config::BotConfig;
/// let config = BotConfig::default();
/// assert_eq!(config.ascii_width, 40);
/// assert_eq!(config.pixel_size, 20);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BotConfig {
    // === ASCII ===
    /// Largeur de l'art ASCII en caractères.
    pub ascii_width: u32,
    /// Budget de caractères par message (limite du transport).
    pub char_budget: usize,
    /// Glyph height/width compensation applied to the row count.
    pub aspect_correction: f64,
    /// Ramp donnée aux nouvelles sessions (du plus dense au plus clair).
    pub default_ramp: String,

    // === Transforms ===
    /// Pixelation block size.
    pub pixel_size: u32,
    /// Side of the sticker bounding box.
    pub sticker_size: u32,
    /// Gradient color for black in the colorizer.
    pub colorize_dark: [u8; 3],
    /// Gradient color for white in the colorizer.
    pub colorize_light: [u8; 3],
    /// JPEG quality [1, 100].
    pub jpeg_quality: u8,

    // === Polling ===
    /// Long-polling timeout passed to getUpdates, in seconds.
    pub poll_timeout_secs: u64,
    /// Plafond du backoff après une erreur réseau, en secondes.
    pub max_backoff_secs: u64,

    // === Limits ===
    /// Largest photo download accepted, in bytes.
    pub max_download_bytes: u64,

    /// Réponses à "random joke".
    pub jokes: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            ascii_width: 40,
            char_budget: 4000,
            aspect_correction: 0.55,
            default_ramp: DEFAULT_RAMP.to_string(),
            pixel_size: 20,
            sticker_size: 128,
            colorize_dark: [0, 0, 0],
            colorize_light: [255, 255, 255],
            jpeg_quality: 90,
            poll_timeout_secs: 30,
            max_backoff_secs: 30,
            max_download_bytes: 20 * 1024 * 1024,
            jokes: vec![
                "I tried to pixelate my problems. Now they're just bigger squares.".into(),
                "My ASCII self-portrait is mostly @ signs. I'm very dense.".into(),
                "Mirrors are just photos that refuse to commit.".into(),
                "Inverted my mood today. Still dark, just in a brighter way.".into(),
                "A sticker walks into a chat. It's 128 pixels of confidence.".into(),
            ],
        }
    }
}

impl BotConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.ascii_width = self.ascii_width.clamp(1, 512);
        self.char_budget = self.char_budget.clamp(64, 65_536);
        self.aspect_correction = self.aspect_correction.clamp(0.05, 4.0);
        self.pixel_size = self.pixel_size.clamp(1, 512);
        self.sticker_size = self.sticker_size.clamp(16, 512);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.poll_timeout_secs = self.poll_timeout_secs.min(60);
        self.max_backoff_secs = self.max_backoff_secs.clamp(1, 600);
        self.max_download_bytes = self.max_download_bytes.max(1024);
    }

    /// Default ramp as a [`Ramp`].
    #[must_use]
    pub fn ramp(&self) -> Ramp {
        Ramp::new(&self.default_ramp)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    ascii: Option<AsciiSection>,
    transform: Option<TransformSection>,
    polling: Option<PollingSection>,
    limits: Option<LimitsSection>,
    jokes: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct AsciiSection {
    width: Option<u32>,
    char_budget: Option<usize>,
    aspect_correction: Option<f64>,
    default_ramp: Option<String>,
}

#[derive(Deserialize)]
struct TransformSection {
    pixel_size: Option<u32>,
    sticker_size: Option<u32>,
    colorize_dark: Option<[u8; 3]>,
    colorize_light: Option<[u8; 3]>,
    jpeg_quality: Option<u8>,
}

#[derive(Deserialize)]
struct PollingSection {
    timeout_secs: Option<u64>,
    max_backoff_secs: Option<u64>,
}

#[derive(Deserialize)]
struct LimitsSection {
    max_download_bytes: Option<u64>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use pxb_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/pixbot.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<BotConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this layout.
///
/// # Example
/// ```
/// use pxb_core::config::parse_config;
/// let config = parse_config("[ascii]\nwidth = 60\n").unwrap();
/// assert_eq!(config.ascii_width, 60);
/// assert_eq!(config.char_budget, 4000);
/// ```
pub fn parse_config(content: &str) -> Result<BotConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = BotConfig::default();

    if let Some(a) = file.ascii {
        if let Some(v) = a.width {
            config.ascii_width = v;
        }
        if let Some(v) = a.char_budget {
            config.char_budget = v;
        }
        if let Some(v) = a.aspect_correction {
            config.aspect_correction = v;
        }
        match a.default_ramp {
            Some(v) if v.is_empty() => {
                log::warn!("default_ramp vide ignorée, ramp par défaut conservée");
            }
            Some(v) => config.default_ramp = v,
            None => {}
        }
    }

    if let Some(t) = file.transform {
        if let Some(v) = t.pixel_size {
            config.pixel_size = v;
        }
        if let Some(v) = t.sticker_size {
            config.sticker_size = v;
        }
        if let Some(v) = t.colorize_dark {
            config.colorize_dark = v;
        }
        if let Some(v) = t.colorize_light {
            config.colorize_light = v;
        }
        if let Some(v) = t.jpeg_quality {
            config.jpeg_quality = v;
        }
    }

    if let Some(p) = file.polling {
        if let Some(v) = p.timeout_secs {
            config.poll_timeout_secs = v;
        }
        if let Some(v) = p.max_backoff_secs {
            config.max_backoff_secs = v;
        }
    }

    if let Some(l) = file.limits {
        if let Some(v) = l.max_download_bytes {
            config.max_download_bytes = v;
        }
    }

    if let Some(v) = file.jokes {
        config.jokes = v;
    }

    config.clamp_all();
    Ok(config)
}
