use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Compteur FPS par fenêtre glissante, plus totaux de session.
///
/// # Example
/// ```
/// use vs_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(30);
/// counter.tick();
/// assert_eq!(counter.frames(), 1);
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières N frames.
    timestamps: VecDeque<Instant>,
    /// Taille de la fenêtre (nombre de frames à moyenner).
    window: usize,
    /// FPS glissant, mis à jour à chaque tick.
    fps: f64,
    /// Frames comptées depuis la création.
    frames: u64,
    started: Instant,
}

impl FpsCounter {
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window: window.max(2),
            fps: 0.0,
            frames: 0,
            started: Instant::now(),
        }
    }

    /// Appeler une fois par frame affichée.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.frames += 1;
        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let Some(&first) = self.timestamps.front()
            && self.timestamps.len() >= 2
        {
            let secs = now.duration_since(first).as_secs_f64();
            if secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Total frames ticked.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time since the counter was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// FPS moyen depuis la création.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_bounded() {
        let mut counter = FpsCounter::new(3);
        for _ in 0..10 {
            counter.tick();
        }
        assert_eq!(counter.frames(), 10);
        assert!(counter.timestamps.len() <= 3);
    }

    #[test]
    fn fresh_counter_reports_zero() {
        let counter = FpsCounter::new(10);
        assert!(counter.fps().abs() < f64::EPSILON);
        assert_eq!(counter.frames(), 0);
    }
}
