use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use vs_source::{MediaKind, classify_media};

/// Vidéos lisibles d'un dossier (non récursif), triées par nom.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn scan_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Lecture du dossier {}", dir.display()))?;
    let mut videos: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && classify_media(p) == Some(MediaKind::Video))
        .collect();
    videos.sort();
    Ok(videos)
}

/// Numéro saisi (1-based) → index, ou `None` si hors liste.
#[must_use]
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// Liste les vidéos de `dir` et lit un choix sur `input`.
///
/// Redemande tant que la saisie est invalide ; `q` ou fin d'entrée abandonne.
///
/// # Errors
/// Returns an error if the directory holds no video, the user quits, or
/// reading/writing the prompt fails.
pub fn pick_source<R: BufRead, W: Write>(dir: &Path, mut input: R, mut out: W) -> Result<PathBuf> {
    let videos = scan_videos(dir)?;
    if videos.is_empty() {
        bail!("Aucune vidéo dans {}", dir.display());
    }

    writeln!(out, "Vidéos dans {} :", dir.display())?;
    for (i, path) in videos.iter().enumerate() {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        writeln!(out, "  {}. {name}", i + 1)?;
    }

    let mut line = String::new();
    loop {
        write!(out, "Choix [1-{}, q pour quitter] : ", videos.len())?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 || line.trim().eq_ignore_ascii_case("q") {
            bail!("Aucune vidéo choisie");
        }
        if let Some(idx) = parse_choice(&line, videos.len()) {
            return Ok(videos[idx].clone());
        }
        writeln!(out, "Choix invalide : {}", line.trim())?;
    }
}
