/// Visual source modules for vidscii (video via ffmpeg, still images).
use std::path::Path;

pub mod image;
pub mod video;

/// Category of a media file, determined by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify a file path into a media kind based on extension.
///
/// # Example
/// ```
/// use std::path::Path;
/// use vs_source::{classify_media, MediaKind};
/// assert_eq!(classify_media(Path::new("clip.MP4")), Some(MediaKind::Video));
/// assert_eq!(classify_media(Path::new("cover.png")), Some(MediaKind::Image));
/// assert_eq!(classify_media(Path::new("notes.txt")), None);
/// ```
#[must_use]
pub fn classify_media(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "bmp" | "gif" => Some(MediaKind::Image),
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "ts" | "mpg" | "mpeg" => {
            Some(MediaKind::Video)
        }
        _ => None,
    }
}
