use thiserror::Error;

/// Errors originating from the audio module. None of them are fatal to a
/// playback session: the video keeps running muted.
#[derive(Error, Debug)]
pub enum AudioError {
    /// ffmpeg could not produce a PCM artifact from the source.
    #[error("Extraction audio impossible : {0}")]
    Extraction(String),

    /// The PCM artifact could not be decoded.
    #[error("Erreur de décodage : {0}")]
    Decode(String),

    /// No audio output device found.
    #[error("Aucun périphérique audio de sortie trouvé")]
    NoOutputDevice,

    /// Audio stream error.
    #[error("Erreur de stream audio : {0}")]
    Stream(String),
}
