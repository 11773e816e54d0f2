use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use vs_audio::extract::extract_audio;
use vs_audio::playback::PlaybackChannel;
use vs_core::config::RenderConfig;
use vs_render::terminal::{KeyPoller, TerminalSink};
use vs_source::video::VideoSource;
use vs_source::{MediaKind, classify_media};

pub mod cli;
pub mod picker;
pub mod player;
pub mod session;

use session::PlaybackSession;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli.config)?;
    cli.apply_overrides(&mut config)?;

    // 4. Choisir la source
    let input = resolve_input(cli.input.as_deref())?;

    // 5. Image fixe : une conversion, sortie standard, pas de terminal
    if classify_media(&input) == Some(MediaKind::Image) {
        let text = player::render_still(&input, &config)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")?;
        return Ok(());
    }

    play_video(&input, config)
}

/// Ouvre la vidéo, démarre l'audio puis lance la boucle dans le terminal.
fn play_video(input: &Path, config: RenderConfig) -> Result<()> {
    let source = VideoSource::open(input)?;
    let info = source.info();
    log::info!(
        "Lecture de {} ({}x{} @ {:.2} fps)",
        input.display(),
        info.width,
        info.height,
        info.fps
    );

    let audio_enabled = config.audio_enabled;
    let mut session = PlaybackSession::new(Box::new(source), config);

    let cancel = session.cancel_token();
    ctrlc::set_handler(move || cancel.cancel()).context("Installation du handler Ctrl+C")?;

    if audio_enabled {
        start_audio(input, &mut session);
    }

    // Le terminal est restauré même si la boucle échoue.
    let terminal = ratatui::init();
    let mut sink = TerminalSink::new(terminal);
    let mut poller = KeyPoller;
    let result = session.play(&mut sink, &mut poller);
    ratatui::restore();
    drop(session);

    let report = result?;
    log::info!("Session terminée : {report}");
    println!("{report}");
    Ok(())
}

/// Extraction + lecture audio. Tout échec donne une lecture muette.
fn start_audio(input: &Path, session: &mut PlaybackSession) {
    let artifact = match extract_audio(input) {
        Ok(a) => a,
        Err(e) => {
            log::warn!("Pas d'audio pour {} : {e}", input.display());
            return;
        }
    };
    match PlaybackChannel::start(&artifact, session.cancel_token(), session.clock()) {
        Ok(channel) => session.set_audio_output(Box::new(channel)),
        Err(e) => log::warn!("Audio non disponible : {e}"),
    }
    session.set_audio_artifact(artifact);
}

/// Fichier de config absent → défauts avec un avertissement.
fn resolve_config(path: &Path) -> Result<RenderConfig> {
    if path.exists() {
        vs_core::config::load_config(path)
    } else {
        log::warn!("Config introuvable : {}. Utilisation des défauts.", path.display());
        Ok(RenderConfig::default())
    }
}

/// Fichier → tel quel ; dossier ou rien → sélecteur sur stdin.
fn resolve_input(input: Option<&Path>) -> Result<PathBuf> {
    let dir = match input {
        Some(p) if p.is_dir() => p.to_path_buf(),
        Some(p) => return Ok(p.to_path_buf()),
        None => std::env::current_dir().context("Dossier courant inaccessible")?,
    };
    picker::pick_source(&dir, std::io::stdin().lock(), std::io::stdout().lock())
}
