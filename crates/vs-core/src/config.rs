use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{CHARSET_COMPACT, GlyphRamp};
use crate::error::CoreError;

/// Largeur de sortie par défaut, en glyphes.
pub const DEFAULT_WIDTH: u32 = 100;

/// Largeur maximale acceptée.
pub const MAX_WIDTH: u32 = 1000;

/// Configuration du rendu, chargée une fois au démarrage de la session.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use vs_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.width, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    // === Géométrie ===
    /// Largeur de sortie en glyphes. La hauteur suit le ratio source.
    pub width: u32,

    // === Conversion ===
    /// Rampe de glyphes, du premier (intensité 0) au dernier (intensité 255).
    pub charset: String,
    /// Séparateur inséré entre deux glyphes d'une même ligne.
    pub separator: String,
    /// Gain du contraste linéaire : `out = alpha * in + beta`.
    pub contrast_alpha: f32,
    /// Décalage du contraste linéaire, en unités d'intensité [-255, 255].
    pub contrast_beta: f32,
    /// Inverser l'intensité après contraste (`255 - out`).
    pub invert: bool,

    // === Lecture ===
    /// FPS plafond de la boucle d'affichage.
    pub target_fps: f64,
    /// Politique de synchronisation vidéo/audio.
    pub sync_mode: SyncMode,
    /// Extraire et jouer la piste audio.
    pub audio_enabled: bool,
}

/// Video/audio synchronization policy.
///
/// # Example
/// ```
/// use vs_core::config::SyncMode;
/// let mode: SyncMode = "audio-locked".parse().unwrap();
/// assert_eq!(mode, SyncMode::AudioLocked);
/// assert_eq!(SyncMode::default(), SyncMode::Free);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", rename_all = "kebab-case")]
pub enum SyncMode {
    /// Cadence fixe uniquement. La dérive A/V n'est pas corrigée.
    #[default]
    Free,
    /// Saute ou retient des frames pour suivre l'horloge audio.
    AudioLocked,
}

impl FromStr for SyncMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "audio-locked" | "audiolocked" | "locked" => Ok(Self::AudioLocked),
            other => Err(CoreError::Config(format!("mode de synchro inconnu : {other}"))),
        }
    }
}

// TOML et CLI passent par le même parseur.
impl TryFrom<String> for SyncMode {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            charset: CHARSET_COMPACT.to_string(),
            separator: " ".to_string(),
            contrast_alpha: 2.0,
            contrast_beta: 0.0,
            invert: false,
            target_fps: 30.0,
            sync_mode: SyncMode::Free,
            audio_enabled: true,
        }
    }
}

impl RenderConfig {
    /// Clamp numeric fields to their usable ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.width = self.width.min(MAX_WIDTH);
        self.contrast_alpha = self.contrast_alpha.clamp(0.0, 10.0);
        self.contrast_beta = self.contrast_beta.clamp(-255.0, 255.0);
        if self.target_fps.is_finite() {
            self.target_fps = self.target_fps.min(240.0);
        }
    }

    /// Reject values that no clamp can repair.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for a zero width, a non-positive frame
    /// rate, or a ramp shorter than 2 glyphs.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 {
            return Err(CoreError::Config("la largeur doit être > 0".into()));
        }
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            return Err(CoreError::Config(format!(
                "le FPS cible doit être > 0 (reçu {})",
                self.target_fps
            )));
        }
        self.ramp().map(|_| ())
    }

    /// Build the glyph ramp described by `charset`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the charset holds fewer than 2 glyphs.
    pub fn ramp(&self) -> Result<GlyphRamp, CoreError> {
        GlyphRamp::new(&self.charset)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    playback: Option<PlaybackSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    width: Option<u32>,
    charset: Option<String>,
    preset: Option<String>,
    separator: Option<String>,
    contrast_alpha: Option<f32>,
    contrast_beta: Option<f32>,
    invert: Option<bool>,
}

/// Playback section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct PlaybackSection {
    target_fps: Option<f64>,
    sync_mode: Option<SyncMode>,
    audio_enabled: Option<bool>,
}

/// Parse a TOML document and merge it over the defaults.
///
/// # Errors
/// Returns an error if the document cannot be parsed, names an unknown
/// preset, or yields an invalid configuration.
///
/// # Example
/// ```
/// use vs_core::config::parse_config;
/// let config = parse_config("[render]\nwidth = 80\ninvert = true\n").unwrap();
/// assert_eq!(config.width, 80);
/// assert!(config.invert);
/// ```
pub fn parse_config(content: &str) -> Result<RenderConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = RenderConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.width {
            config.width = v;
        }
        if let Some(name) = r.preset {
            config.charset = crate::charset::preset(&name)
                .with_context(|| format!("Preset de rampe inconnu : {name}"))?
                .to_string();
        }
        if let Some(v) = r.charset {
            config.charset = v;
        }
        if let Some(v) = r.separator {
            config.separator = v;
        }
        if let Some(v) = r.contrast_alpha {
            config.contrast_alpha = v;
        }
        if let Some(v) = r.contrast_beta {
            config.contrast_beta = v;
        }
        if let Some(v) = r.invert {
            config.invert = v;
        }
    }

    if let Some(p) = file.playback {
        if let Some(v) = p.target_fps {
            config.target_fps = v;
        }
        if let Some(v) = p.sync_mode {
            config.sync_mode = v;
        }
        if let Some(v) = p.audio_enabled {
            config.audio_enabled = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use vs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide dans {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert!((config.target_fps - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.charset, CHARSET_COMPACT);
        assert_eq!(config.sync_mode, SyncMode::Free);
    }

    #[test]
    fn partial_override() {
        let config = parse_config(
            "[render]\npreset = \"blocks\"\ncontrast_alpha = 1.5\n\n[playback]\ntarget_fps = 24.0\nsync_mode = \"AudioLocked\"\n",
        )
        .unwrap();
        assert_eq!(config.charset, crate::charset::CHARSET_BLOCKS);
        assert!((config.contrast_alpha - 1.5).abs() < f32::EPSILON);
        assert!((config.target_fps - 24.0).abs() < f64::EPSILON);
        assert_eq!(config.sync_mode, SyncMode::AudioLocked);
    }

    #[test]
    fn values_are_clamped() {
        let config = parse_config("[render]\nwidth = 5000\ncontrast_beta = 900.0\n").unwrap();
        assert_eq!(config.width, MAX_WIDTH);
        assert!((config.contrast_beta - 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(parse_config("[render]\nwidth = 0\n").is_err());
        assert!(parse_config("[render]\ncharset = \"#\"\n").is_err());
        assert!(parse_config("[playback]\ntarget_fps = 0.0\n").is_err());
        assert!(parse_config("[render]\npreset = \"unknown\"\n").is_err());
    }

    #[test]
    fn sync_mode_parsing() {
        assert_eq!("FREE".parse::<SyncMode>().unwrap(), SyncMode::Free);
        assert!("sometimes".parse::<SyncMode>().is_err());
    }

    #[test]
    fn toml_accepts_cli_spellings() {
        for (raw, expected) in [
            ("audio-locked", SyncMode::AudioLocked),
            ("AudioLocked", SyncMode::AudioLocked),
            ("locked", SyncMode::AudioLocked),
            ("free", SyncMode::Free),
            ("Free", SyncMode::Free),
        ] {
            let config = parse_config(&format!("[playback]\nsync_mode = \"{raw}\"\n")).unwrap();
            assert_eq!(config.sync_mode, expected, "{raw}");
        }
        assert!(parse_config("[playback]\nsync_mode = \"sometimes\"\n").is_err());
    }

    #[test]
    fn shipped_default_matches_defaults() {
        let config = parse_config(include_str!("../../../config/default.toml")).unwrap();
        let defaults = RenderConfig::default();
        assert_eq!(config.width, defaults.width);
        assert_eq!(config.charset, defaults.charset);
        assert_eq!(config.sync_mode, SyncMode::Free);
        assert!(config.audio_enabled);
    }
}
