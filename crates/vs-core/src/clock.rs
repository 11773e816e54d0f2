use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

/// Phase de la lecture audio vue par l'horloge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    /// Aucun buffer encore joué.
    Waiting,
    /// Le périphérique consomme des échantillons.
    Running,
    /// Fin des données, arrêt ou échec. État terminal.
    Ended,
}

impl ClockState {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Running => 1,
            Self::Ended => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Waiting,
            1 => Self::Running,
            _ => Self::Ended,
        }
    }
}

/// Position de lecture audio, partagée avec la boucle de rendu.
///
/// Seul le worker audio écrit (via le callback du périphérique) ; la boucle
/// ne fait que lire [`MediaClock::audio_pos`] pour se caler en mode
/// `AudioLocked`.
///
/// # Example
/// ```
/// use vs_core::clock::{ClockState, MediaClock};
/// let clock = MediaClock::new(1000);
/// assert_eq!(clock.audio_pos(), None);
/// clock.record_frames(500);
/// assert_eq!(clock.state(), ClockState::Running);
/// assert_eq!(clock.audio_pos(), Some(0.5));
/// clock.finish();
/// assert_eq!(clock.audio_pos(), None);
/// ```
#[derive(Debug)]
pub struct MediaClock {
    /// PCM frames handed to the device so far.
    frames_played: AtomicU64,
    /// 0 tant que le flux n'est pas ouvert.
    sample_rate: AtomicU32,
    state: AtomicU8,
}

impl Default for MediaClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MediaClock {
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames_played: AtomicU64::new(0),
            sample_rate: AtomicU32::new(sample_rate),
            state: AtomicU8::new(ClockState::Waiting.to_raw()),
        }
    }

    /// Fixé par le worker une fois le format audio connu.
    pub fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::Relaxed);
    }

    /// Publie le nombre total de frames jouées. Le premier appel fait passer
    /// l'horloge de `Waiting` à `Running` ; sans effet sur l'état après `Ended`.
    pub fn record_frames(&self, frames: u64) {
        self.frames_played.store(frames, Ordering::Relaxed);
        let _ = self.state.compare_exchange(
            ClockState::Waiting.to_raw(),
            ClockState::Running.to_raw(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Passe en `Ended`, quel que soit l'état courant.
    pub fn finish(&self) {
        self.state.store(ClockState::Ended.to_raw(), Ordering::Release);
    }

    #[must_use]
    pub fn state(&self) -> ClockState {
        ClockState::from_raw(self.state.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.state() == ClockState::Ended
    }

    #[must_use]
    pub fn frames_played(&self) -> u64 {
        self.frames_played.load(Ordering::Relaxed)
    }

    /// Position audio en secondes, uniquement si l'horloge peut servir de
    /// référence (en cours, sample rate connu).
    #[must_use]
    pub fn audio_pos(&self) -> Option<f64> {
        let rate = self.sample_rate.load(Ordering::Relaxed);
        if rate == 0 || !self.is_running() {
            return None;
        }
        Some(self.frames_played() as f64 / f64::from(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_one_way() {
        let clock = MediaClock::new(48_000);
        assert_eq!(clock.state(), ClockState::Waiting);
        clock.record_frames(48_000);
        assert!(clock.is_running());
        assert!((clock.audio_pos().unwrap() - 1.0).abs() < 1e-9);

        clock.finish();
        clock.record_frames(96_000);
        assert!(clock.is_ended());
        assert_eq!(clock.frames_played(), 96_000);
        assert_eq!(clock.audio_pos(), None);
    }

    #[test]
    fn unknown_rate_gives_no_position() {
        let clock = MediaClock::default();
        clock.record_frames(1000);
        assert_eq!(clock.audio_pos(), None);
        clock.set_sample_rate(1000);
        assert_eq!(clock.audio_pos(), Some(1.0));
    }

    #[test]
    fn finish_before_start() {
        let clock = MediaClock::new(8000);
        clock.finish();
        clock.record_frames(10);
        assert_eq!(clock.state(), ClockState::Ended);
    }
}
