use std::path::PathBuf;

use clap::Parser;
use vs_core::config::{RenderConfig, SyncMode};

/// vidscii : lecteur vidéo ASCII pour le terminal, audio synchronisé.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Vidéo ou image à lire. Un dossier (ou rien) ouvre le sélecteur.
    pub input: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Largeur de sortie en glyphes.
    #[arg(short, long)]
    pub width: Option<u32>,

    /// FPS plafond de l'affichage.
    #[arg(long)]
    pub fps: Option<f64>,

    /// Gain de contraste (alpha).
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Décalage de luminosité (beta), en unités d'intensité.
    #[arg(long, allow_hyphen_values = true)]
    pub brightness: Option<f32>,

    /// Inverser l'intensité (fond sombre, glyphes clairs).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Rampe de glyphes explicite, du premier au dernier niveau.
    #[arg(long)]
    pub charset: Option<String>,

    /// Preset de rampe : compact, standard, blocks.
    #[arg(long)]
    pub preset: Option<String>,

    /// Synchronisation A/V : free ou audio-locked.
    #[arg(long)]
    pub sync: Option<String>,

    /// Ne pas extraire ni jouer l'audio.
    #[arg(long, default_value_t = false)]
    pub no_audio: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    ///
    /// # Errors
    /// Returns an error for an unknown preset or sync mode, or if the
    /// resulting configuration is invalid.
    pub fn apply_overrides(&self, config: &mut RenderConfig) -> anyhow::Result<()> {
        if let Some(w) = self.width {
            config.width = w;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if let Some(alpha) = self.contrast {
            config.contrast_alpha = alpha;
        }
        if let Some(beta) = self.brightness {
            config.contrast_beta = beta;
        }
        if self.invert {
            config.invert = true;
        }
        if let Some(ref name) = self.preset {
            let Some(charset) = vs_core::charset::preset(name) else {
                anyhow::bail!("Preset inconnu : {name} (compact, standard, blocks)");
            };
            config.charset = charset.to_string();
        }
        if let Some(ref charset) = self.charset {
            config.charset.clone_from(charset);
        }
        if let Some(ref mode) = self.sync {
            config.sync_mode = mode.parse::<SyncMode>()?;
        }
        if self.no_audio {
            config.audio_enabled = false;
        }
        config.clamp_all();
        config.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vidscii").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn overrides_apply() {
        let cli = parse(&[
            "clip.mp4",
            "--width",
            "80",
            "--fps",
            "24",
            "--brightness",
            "-20",
            "--invert",
            "--preset",
            "blocks",
            "--sync",
            "audio-locked",
            "--no-audio",
        ]);
        let mut config = RenderConfig::default();
        cli.apply_overrides(&mut config).unwrap();
        assert_eq!(config.width, 80);
        assert!((config.target_fps - 24.0).abs() < f64::EPSILON);
        assert!((config.contrast_beta + 20.0).abs() < f32::EPSILON);
        assert!(config.invert);
        assert_eq!(config.charset, vs_core::charset::CHARSET_BLOCKS);
        assert_eq!(config.sync_mode, SyncMode::AudioLocked);
        assert!(!config.audio_enabled);
        assert_eq!(cli.input, Some(PathBuf::from("clip.mp4")));
    }

    #[test]
    fn invalid_overrides_rejected() {
        let mut config = RenderConfig::default();
        assert!(parse(&["--width", "0"]).apply_overrides(&mut config).is_err());
        let mut config = RenderConfig::default();
        assert!(parse(&["--charset", "@"]).apply_overrides(&mut config).is_err());
        let mut config = RenderConfig::default();
        assert!(parse(&["--sync", "later"]).apply_overrides(&mut config).is_err());
    }
}
