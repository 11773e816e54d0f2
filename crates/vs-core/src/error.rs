use thiserror::Error;

/// Errors originating from the core pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// The media source could not be opened. Fatal to the session.
    #[error("Impossible d'ouvrir {path} : {reason}")]
    Open {
        /// Path that failed to open.
        path: String,
        /// Decoder-provided reason.
        reason: String,
    },

    /// A decoded frame is empty or malformed. The frame is skipped.
    #[error("Frame invalide : {width}×{height}, {len} bytes")]
    InvalidFrame {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Actual buffer length.
        len: usize,
    },

    /// The display sink failed. Fatal to the session.
    #[error("Erreur d'affichage : {0}")]
    Display(String),
}

impl CoreError {
    /// `true` for errors that only affect the current frame.
    #[must_use]
    pub fn is_frame_level(&self) -> bool {
        matches!(self, Self::InvalidFrame { .. })
    }
}
