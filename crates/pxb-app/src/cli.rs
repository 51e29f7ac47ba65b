use std::path::PathBuf;

use clap::Parser;
use pxb_core::BotConfig;

/// pixbot — Telegram bot for photo transforms and ASCII art.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Token de l'API Bot Telegram.
    #[arg(long, env = "TOKEN_API", hide_env_values = true)]
    pub token: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/pixbot.toml.
    #[arg(short, long, default_value = "config/pixbot.toml")]
    pub config: PathBuf,

    /// Largeur de l'art ASCII (remplace ascii.width).
    #[arg(long)]
    pub width: Option<u32>,

    /// Rendre une image locale en ASCII sur stdout, puis quitter.
    #[arg(long, value_name = "IMAGE")]
    pub render: Option<PathBuf>,

    /// Ramp utilisée avec --render (du plus dense au plus clair).
    #[arg(long, requires = "render")]
    pub ramp: Option<String>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Apply CLI overrides, then clamp again so they obey the config bounds.
    pub fn apply_overrides(&self, config: &mut BotConfig) {
        if let Some(width) = self.width {
            config.ascii_width = width;
        }
        config.clamp_all();
    }

    /// Token required to talk to the platform.
    ///
    /// # Errors
    /// Returns an error if neither `--token` nor `TOKEN_API` is set.
    pub fn token(&self) -> anyhow::Result<&str> {
        match self.token.as_deref() {
            Some(t) if !t.trim().is_empty() => Ok(t.trim()),
            _ => anyhow::bail!("Aucun token fourni. Utilisez --token ou la variable TOKEN_API."),
        }
    }
}

/// Charge un fichier `.env` (répertoire courant ou parents) dans l'environnement.
///
/// Existing variables win over the file. A missing file is not an error.
///
/// # Errors
/// Returns an error if a `.env` file exists but cannot be read or parsed.
pub fn load_env_file() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
