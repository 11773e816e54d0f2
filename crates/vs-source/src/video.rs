// Ce module décode la vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout
//   - `reader_loop`       : thread dédié, lit les frames et les pousse dans un canal borné
//   - `VideoSource`       : implémentation de `MediaSource` côté boucle de rendu

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;

use vs_core::error::CoreError;
use vs_core::frame::FrameBuffer;
use vs_core::traits::MediaSource;

/// Capacité du canal lecteur → rendu (frames décodées d'avance).
const PREFETCH: usize = 3;

/// Largeur max demandée à ffmpeg. Limite la bande passante du pipe :
/// la sortie ASCII dépasse rarement quelques centaines de colonnes.
const MAX_DECODE_WIDTH: u32 = 640;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// Retourne `None` si width/height manquent ou valent zéro.
///
/// # Example
/// ```
/// use vs_source::video::parse_probe_output;
/// let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (1280, 720));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
#[must_use]
pub fn parse_probe_output(text: &str) -> Option<VideoInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(VideoInfo {
            width: w,
            height: h,
            fps,
        }),
        _ => None,
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).with_context(|| {
        format!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        )
    })?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({})",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Taille de décodage : largeur plafonnée, hauteur arrondie au plus proche.
///
/// Pas d'alignement pair : le scaler produit de l'RGBA, qui n'en a pas besoin.
///
/// # Example
/// ```
/// use vs_source::video::decode_size;
/// assert_eq!(decode_size(1920, 1080), (640, 360));
/// assert_eq!(decode_size(1920, 800), (640, 267));
/// assert_eq!(decode_size(320, 240), (320, 240));
/// ```
#[must_use]
pub fn decode_size(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_DECODE_WIDTH {
        return (width, height);
    }
    let h = (f64::from(MAX_DECODE_WIDTH) * f64::from(height) / f64::from(width)).round() as u32;
    (MAX_DECODE_WIDTH, h.max(1))
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-an` supprime l'audio (extrait séparément).
///
/// # Errors
/// Retourne une erreur si le spawn échoue.
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32) -> Result<Child> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;
    let scale_filter = format!("scale={w}:{h}:flags=bilinear");

    let child = Command::new("ffmpeg")
        .args([
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez qu'il est dans le PATH.")?;

    log::debug!("ffmpeg spawné: {w}x{h} depuis {}", path.display());
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion.
///
/// # Errors
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Boucle du thread lecteur : une frame par lecture, jusqu'à EOF ou
/// fermeture du récepteur.
fn reader_loop<R: Read>(mut stdout: R, w: u32, h: u32, frame_tx: &Sender<FrameBuffer>) {
    let frame_bytes = w as usize * h as usize * 4;
    let mut count = 0u64;
    loop {
        let mut data = vec![0u8; frame_bytes];
        match read_exact_or_eof(&mut stdout, &mut data) {
            Ok(true) => {
                let frame = FrameBuffer {
                    data,
                    width: w,
                    height: h,
                };
                if frame_tx.send(frame).is_err() {
                    log::debug!("Lecteur vidéo: récepteur fermé après {count} frames");
                    return;
                }
                count += 1;
            }
            Ok(false) => {
                log::info!("Lecteur vidéo: EOF après {count} frames");
                return;
            }
            Err(e) => {
                log::warn!("Lecteur vidéo: erreur lecture pipe: {e}");
                return;
            }
        }
    }
}

/// Flux vidéo décodé par ffmpeg, lu d'avance par un thread dédié.
///
/// # Example
/// ```no_run
/// use vs_source::video::VideoSource;
/// use vs_core::traits::MediaSource;
/// use std::path::Path;
/// let mut source = VideoSource::open(Path::new("clip.mp4")).unwrap();
/// while let Some(frame) = source.next_frame() {
///     println!("{}x{}", frame.width, frame.height);
/// }
/// source.close();
/// ```
pub struct VideoSource {
    info: VideoInfo,
    child: Option<Child>,
    frame_rx: Option<Receiver<FrameBuffer>>,
    reader: Option<thread::JoinHandle<()>>,
}

impl VideoSource {
    /// Probe the file and start decoding.
    ///
    /// # Errors
    /// Returns [`CoreError::Open`] if the file is missing, has no video
    /// stream, or ffmpeg cannot be started.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let open_err = |reason: String| CoreError::Open {
            path: path.display().to_string(),
            reason,
        };
        if !path.is_file() {
            return Err(open_err("fichier introuvable".into()));
        }

        let info = probe_video(path).map_err(|e| open_err(format!("{e:#}")))?;
        let (w, h) = decode_size(info.width, info.height);
        let mut child = spawn_ffmpeg_pipe(path, w, h).map_err(|e| open_err(format!("{e:#}")))?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(open_err("stdout ffmpeg indisponible".into()));
        };

        let (frame_tx, frame_rx) = flume::bounded(PREFETCH);
        let reader = spawn_reader(stdout, w, h, frame_tx).map_err(|e| {
            let _ = child.kill();
            let _ = child.wait();
            open_err(format!("{e:#}"))
        })?;

        Ok(Self {
            info,
            child: Some(child),
            frame_rx: Some(frame_rx),
            reader: Some(reader),
        })
    }

    /// Metadata reported by ffprobe.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }
}

fn spawn_reader(
    stdout: ChildStdout,
    w: u32,
    h: u32,
    frame_tx: Sender<FrameBuffer>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("vs-video".to_string())
        .spawn(move || reader_loop(stdout, w, h, &frame_tx))
        .context("Impossible de spawner le thread vidéo")
}

impl MediaSource for VideoSource {
    fn next_frame(&mut self) -> Option<FrameBuffer> {
        self.frame_rx.as_ref()?.recv().ok()
    }

    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(self.info.fps)
    }

    fn close(&mut self) {
        // Fermer le canal débloque un lecteur en attente sur `send`,
        // tuer ffmpeg débloque un lecteur en attente sur `read`.
        self.frame_rx = None;
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
        if let Some(handle) = self.reader.take()
            && handle.join().is_err()
        {
            log::warn!("Thread vidéo: panique pendant la lecture");
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn probe_output_parsing() {
        let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=24/1\n").unwrap();
        assert_eq!(
            info,
            VideoInfo {
                width: 640,
                height: 360,
                fps: 24.0
            }
        );
        assert!(parse_probe_output("").is_none());
        assert!(parse_probe_output("width=0\nheight=10\n").is_none());
        let fallback = parse_probe_output("width=2\nheight=2\nr_frame_rate=0/0\n").unwrap();
        assert!((fallback.fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decode_size_preserves_aspect() {
        assert_eq!(decode_size(1280, 720), (640, 360));
        assert_eq!(decode_size(3840, 1600), (640, 267));
        assert_eq!(decode_size(1920, 800), (640, 267));
        assert_eq!(decode_size(2000, 1), (640, 1));
        assert_eq!(decode_size(640, 480), (640, 480));
    }

    #[test]
    fn read_exact_reports_eof() {
        let mut buf = [0u8; 4];
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5, 6]);
        assert!(read_exact_or_eof(&mut cursor, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(!read_exact_or_eof(&mut cursor, &mut buf).unwrap());
    }

    #[test]
    fn reader_loop_drops_partial_tail() {
        let (tx, rx) = flume::unbounded();
        // Deux frames 1x1 complètes + 2 bytes orphelins.
        reader_loop(Cursor::new(vec![9u8; 10]), 1, 1, &tx);
        drop(tx);
        let frames: Vec<FrameBuffer> = rx.iter().collect();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.data == vec![9, 9, 9, 9]));
    }

    #[test]
    fn missing_file_is_open_error() {
        let result = VideoSource::open(Path::new("/nonexistent/vidscii-test.mp4"));
        assert!(matches!(result, Err(CoreError::Open { .. })));
    }
}
