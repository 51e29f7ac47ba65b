use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use pxb_ascii::{AsciiOptions, render_ascii};
use pxb_core::config::{BotConfig, load_config};
use pxb_core::Ramp;

pub mod cli;
pub mod dispatch;
pub mod poll;
pub mod telegram;
pub mod transport;

fn main() -> Result<()> {
    // 1. Charger .env avant le CLI (TOKEN_API peut y être défini)
    let env_file = cli::load_env_file();

    // 2. Parser CLI
    let cli = cli::Cli::parse();

    // 3. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();
    match env_file {
        Ok(Some(path)) => log::info!("Variables chargées depuis {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("Fichier .env ignoré : {e}"),
    }

    // 4. Charger la config, puis les overrides CLI
    let mut config = resolve_config(&cli.config)?;
    cli.apply_overrides(&mut config);

    // 5. Mode hors-ligne : une image locale vers stdout
    if let Some(path) = cli.render.as_deref() {
        let ramp = cli.ramp.as_deref().map_or_else(|| config.ramp(), Ramp::new);
        return render_local(path, &ramp, &config);
    }

    // 6. Client Telegram + arrêt propre sur Ctrl-C
    let token = cli.token()?;
    let client = telegram::TelegramClient::new(
        token,
        config.poll_timeout_secs,
        config.max_download_bytes,
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::Relaxed);
        log::info!("Ctrl-C reçu, arrêt après le poll en cours...");
    })
    .context("Impossible d'installer le handler Ctrl-C")?;

    // 7. Boucle principale
    let mut dispatcher = dispatch::Dispatcher::new(client, config);
    poll::run(&mut dispatcher, &running);
    Ok(())
}

/// Load the TOML config, or fall back to defaults if the file is absent.
fn resolve_config(path: &Path) -> Result<BotConfig> {
    if path.exists() {
        load_config(path)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            path.display()
        );
        Ok(BotConfig::default())
    }
}

/// Render a local image with the bot's ASCII settings and print it.
fn render_local(path: &Path, ramp: &Ramp, config: &BotConfig) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Impossible de lire {}", path.display()))?;
    let art = render_ascii(&bytes, ramp, &AsciiOptions::from_config(config))
        .with_context(|| format!("Rendu ASCII impossible pour {}", path.display()))?;
    if art.dropped_rows() > 0 {
        log::warn!("{} lignes tronquées par le budget de caractères", art.dropped_rows());
    }
    print!("{art}");
    Ok(())
}
