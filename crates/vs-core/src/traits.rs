use crate::error::CoreError;
use crate::frame::FrameBuffer;

/// Fournit des frames décodées à la boucle de lecture.
///
/// Implémenté par : `VideoSource`, `ImageSource`. L'ouverture se fait par
/// le constructeur de chaque implémentation, qui échoue avec
/// [`CoreError::Open`].
///
/// # Example
/// ```
/// use vs_core::traits::MediaSource;
/// use vs_core::frame::FrameBuffer;
///
/// struct Empty;
/// impl MediaSource for Empty {
///     fn next_frame(&mut self) -> Option<FrameBuffer> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn frame_rate(&self) -> Option<f64> { None }
///     fn close(&mut self) {}
/// }
/// ```
pub trait MediaSource: Send {
    /// Prochaine frame, ou `None` en fin de flux.
    ///
    /// Peut bloquer le temps de décoder une frame.
    fn next_frame(&mut self) -> Option<FrameBuffer>;

    /// Dimensions natives de la source.
    fn native_size(&self) -> (u32, u32);

    /// Cadence native, si connue.
    fn frame_rate(&self) -> Option<f64>;

    /// Libère le flux. Doit être idempotent.
    fn close(&mut self);
}

/// Canal de lecture audio vu depuis la boucle de rendu.
pub trait AudioOutput: Send {
    /// Arrête la lecture. Idempotent, sans effet si déjà terminée.
    fn stop(&mut self);

    /// `true` tant que des échantillons sont joués.
    fn is_playing(&self) -> bool;
}

/// Destination d'affichage des frames texte.
pub trait DisplaySink {
    /// Efface l'écran.
    ///
    /// # Errors
    /// Returns [`CoreError::Display`] if the terminal write fails.
    fn clear_screen(&mut self) -> Result<(), CoreError>;

    /// Affiche un bloc de texte multi-lignes.
    ///
    /// # Errors
    /// Returns [`CoreError::Display`] if the terminal write fails.
    fn write_text(&mut self, block: &str) -> Result<(), CoreError>;
}

/// Source non bloquante du signal d'arrêt utilisateur.
pub trait InputPoller {
    /// `true` si la touche d'arrêt a été pressée depuis le dernier appel.
    fn poll_cancel_key(&mut self) -> bool;
}
