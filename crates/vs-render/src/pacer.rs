use std::thread;
use std::time::{Duration, Instant};

/// Nombre max de frames sautées par itération en mode `AudioLocked`.
pub const MAX_SKIP_PER_TICK: u32 = 5;

/// Granularité du sommeil : l'annulation est observée au moins à ce rythme.
pub const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Cadence fixe de la boucle d'affichage.
///
/// Chaque itération dort `max(0, période - travail)` plutôt qu'une durée
/// fixe, pour que la latence de rendu ne s'accumule pas.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use vs_render::pacer::FramePacer;
/// let pacer = FramePacer::new(25.0);
/// assert_eq!(pacer.period(), Duration::from_millis(40));
/// assert_eq!(pacer.remaining_after(Duration::from_millis(15)), Duration::from_millis(25));
/// assert_eq!(pacer.remaining_after(Duration::from_millis(90)), Duration::ZERO);
/// ```
#[derive(Debug)]
pub struct FramePacer {
    period: Duration,
    tick_start: Instant,
}

impl FramePacer {
    /// `fps_limit` must be finite and > 0 (checked by config validation);
    /// anything else falls back to 30.
    #[must_use]
    pub fn new(fps_limit: f64) -> Self {
        let fps = if fps_limit.is_finite() && fps_limit > 0.0 {
            fps_limit
        } else {
            30.0
        };
        Self {
            period: Duration::from_secs_f64(1.0 / fps),
            tick_start: Instant::now(),
        }
    }

    /// Target duration of one iteration.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Marque le début d'une itération.
    pub fn begin_tick(&mut self) {
        self.tick_start = Instant::now();
    }

    /// Budget restant pour un travail de durée `elapsed`.
    #[must_use]
    pub fn remaining_after(&self, elapsed: Duration) -> Duration {
        self.period.saturating_sub(elapsed)
    }

    /// Budget restant dans l'itération courante.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining_after(self.tick_start.elapsed())
    }

    /// Dort le budget restant plus `extra`, par tranches de [`SLEEP_SLICE`].
    ///
    /// Retourne `true` dès que `cancelled` répond `true`.
    pub fn wait(&self, extra: Duration, mut cancelled: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + self.remaining() + extra;
        loop {
            if cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Correction décidée pour une itération en mode `AudioLocked`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SyncAction {
    /// Afficher la frame suivante normalement.
    Show,
    /// Vidéo en retard : tirer et jeter `n` frames avant d'afficher.
    Skip(u32),
    /// Vidéo en avance : attendre en plus du budget normal.
    Hold(Duration),
}

/// Compare la position vidéo à l'horloge audio.
///
/// Une frame source de tolérance dans les deux sens ; le saut est plafonné à
/// [`MAX_SKIP_PER_TICK`], l'attente à une période de la boucle.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use vs_render::pacer::{sync_action, SyncAction};
/// let period = Duration::from_millis(40);
/// assert_eq!(sync_action(1.0, 1.01, 25.0, period), SyncAction::Show);
/// assert_eq!(sync_action(1.0, 1.3, 25.0, period), SyncAction::Skip(5));
/// ```
#[must_use]
pub fn sync_action(video_pts: f64, audio_pos: f64, source_fps: f64, period: Duration) -> SyncAction {
    if !(source_fps.is_finite() && source_fps > 0.0) {
        return SyncAction::Show;
    }
    let frame_secs = 1.0 / source_fps;
    let lag = audio_pos - video_pts;
    if lag > frame_secs {
        let behind = (lag / frame_secs).floor() as u32;
        SyncAction::Skip(behind.min(MAX_SKIP_PER_TICK))
    } else if lag < -frame_secs {
        SyncAction::Hold(Duration::from_secs_f64(-lag).min(period))
    } else {
        SyncAction::Show
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_from_fps() {
        assert_eq!(FramePacer::new(30.0).period(), Duration::from_secs_f64(1.0 / 30.0));
        assert_eq!(FramePacer::new(0.0).period(), Duration::from_secs_f64(1.0 / 30.0));
        assert_eq!(FramePacer::new(f64::NAN).period(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn wait_returns_early_on_cancel() {
        let mut pacer = FramePacer::new(1.0);
        pacer.begin_tick();
        let start = Instant::now();
        let mut polls = 0;
        let cancelled = pacer.wait(Duration::ZERO, || {
            polls += 1;
            polls > 2
        });
        assert!(cancelled);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn wait_sleeps_remaining_budget() {
        let mut pacer = FramePacer::new(50.0);
        pacer.begin_tick();
        let start = Instant::now();
        assert!(!pacer.wait(Duration::ZERO, || false));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn sync_decisions() {
        let period = Duration::from_millis(33);
        // 2.5 frames de retard à 25 fps → 2 sauts.
        assert_eq!(sync_action(1.0, 1.1, 25.0, period), SyncAction::Skip(2));
        // Avance de 20 ms à 100 fps → attente de 20 ms.
        match sync_action(1.02, 1.0, 100.0, period) {
            SyncAction::Hold(d) => assert!((d.as_secs_f64() - 0.02).abs() < 1e-6),
            other => panic!("attendu Hold, reçu {other:?}"),
        }
        // Grosse avance plafonnée à une période.
        assert_eq!(sync_action(5.0, 1.0, 25.0, period), SyncAction::Hold(period));
        assert_eq!(sync_action(1.0, 1.0, 0.0, period), SyncAction::Show);
    }
}
