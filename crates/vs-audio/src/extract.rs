use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempPath;

use crate::error::AudioError;

/// Sample rate of the extracted PCM artifact.
pub const EXTRACT_SAMPLE_RATE: u32 = 44_100;

/// Taille d'un en-tête WAV canonique : un fichier de cette taille ne
/// contient aucun échantillon.
const WAV_HEADER_LEN: u64 = 44;

/// Arguments ffmpeg : piste audio → WAV PCM 16 bits stéréo.
///
/// # Example
/// ```
/// use vs_audio::extract::extraction_args;
/// let args = extraction_args("in.mp4", "/tmp/out.wav");
/// assert!(args.windows(2).any(|w| w == ["-vn", "-ac"]));
/// assert_eq!(args.last().map(String::as_str), Some("/tmp/out.wav"));
/// ```
#[must_use]
pub fn extraction_args(source: &str, dest: &str) -> Vec<String> {
    let rate = EXTRACT_SAMPLE_RATE.to_string();
    [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-i",
        source,
        "-vn",
        "-ac",
        "2",
        "-ar",
        &rate,
        "-acodec",
        "pcm_s16le",
        "-f",
        "wav",
        dest,
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

/// Extract the audio track of `source` into a temporary WAV file.
///
/// The returned [`TempPath`] deletes the file when dropped or closed; the
/// playback session owns it until teardown.
///
/// # Errors
/// Returns [`AudioError::Extraction`] if ffmpeg is missing, fails, or the
/// source has no audio stream.
///
/// # Example
/// ```no_run
/// use vs_audio::extract::extract_audio;
/// use std::path::Path;
/// let artifact = extract_audio(Path::new("clip.mp4")).unwrap();
/// println!("PCM dans {}", artifact.display());
/// ```
pub fn extract_audio(source: &Path) -> Result<TempPath, AudioError> {
    let source_str = source
        .to_str()
        .ok_or_else(|| AudioError::Extraction("chemin source non-UTF8".into()))?;

    let artifact = tempfile::Builder::new()
        .prefix("vidscii-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| AudioError::Extraction(format!("fichier temporaire : {e}")))?
        .into_temp_path();
    let dest = artifact
        .to_str()
        .ok_or_else(|| AudioError::Extraction("chemin temporaire non-UTF8".into()))?
        .to_string();

    let output = Command::new("ffmpeg")
        .args(extraction_args(source_str, &dest))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| AudioError::Extraction(format!("impossible de lancer ffmpeg : {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr.lines().last().unwrap_or("code de sortie non nul").trim();
        return Err(AudioError::Extraction(reason.to_string()));
    }

    let len = std::fs::metadata(&artifact).map_or(0, |m| m.len());
    if len <= WAV_HEADER_LEN {
        return Err(AudioError::Extraction(format!(
            "aucune piste audio dans {}",
            source.display()
        )));
    }

    log::info!(
        "Audio extrait : {} → {} ({len} bytes)",
        source.display(),
        artifact.display()
    );
    Ok(artifact)
}
