use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use vs_ascii::{FrameTransformer, render};
use vs_core::cancel::CancelToken;
use vs_core::charset::GlyphRamp;
use vs_core::clock::MediaClock;
use vs_core::config::{RenderConfig, SyncMode};
use vs_core::error::CoreError;
use vs_core::frame::{FrameBuffer, RenderedFrame};
use vs_core::traits::{DisplaySink, InputPoller, MediaSource};
use vs_render::fps::FpsCounter;
use vs_render::pacer::{FramePacer, SyncAction, sync_action};
use vs_source::image::ImageSource;

/// Raison de fin de la boucle de lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// La source n'a plus de frames.
    Exhausted,
    /// Arrêt demandé (touche, Ctrl+C, jeton levé ailleurs).
    Cancelled,
}

/// Bilan de fin de session.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackReport {
    pub termination: Termination,
    pub frames_shown: u64,
    pub frames_skipped: u64,
    pub invalid_frames: u64,
    pub average_fps: f64,
}

impl std::fmt::Display for PlaybackReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self.termination {
            Termination::Exhausted => "fin du flux",
            Termination::Cancelled => "arrêt utilisateur",
        };
        write!(
            f,
            "{reason} : {} frames affichées, {} sautées, {} invalides, {:.1} fps",
            self.frames_shown, self.frames_skipped, self.invalid_frames, self.average_fps
        )
    }
}

/// Transformation puis rendu d'une frame, avec la rampe fixée pour la session.
pub struct FramePipeline {
    transformer: FrameTransformer,
    ramp: GlyphRamp,
    separator: String,
}

impl FramePipeline {
    /// # Errors
    /// Returns [`CoreError::Config`] if the width or the ramp is invalid.
    pub fn new(config: &RenderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            transformer: FrameTransformer::new(config)?,
            ramp: config.ramp()?,
            separator: config.separator.clone(),
        })
    }

    /// Cale la hauteur de la grille sur la taille native de la source.
    pub fn set_source_size(&mut self, (width, height): (u32, u32)) {
        self.transformer.set_source_size(width, height);
    }

    /// # Errors
    /// Returns [`CoreError::InvalidFrame`] for an empty or malformed frame.
    pub fn process(&mut self, frame: &FrameBuffer) -> Result<RenderedFrame, CoreError> {
        let grid = self.transformer.transform(frame)?;
        Ok(render(&grid, &self.ramp, &self.separator))
    }
}

/// Paramètres de cadence et de synchronisation d'une boucle.
pub struct LoopContext<'a> {
    pub cancel: &'a CancelToken,
    pub clock: &'a MediaClock,
    pub target_fps: f64,
    pub sync_mode: SyncMode,
}

/// Boucle de lecture à cadence fixe.
///
/// Chaque itération : annulation ? → (correction A/V) → frame suivante →
/// transformation + rendu → affichage → attente du reste de la période.
/// Les frames invalides sont comptées et sautées ; une erreur d'affichage
/// interrompt la boucle.
///
/// # Errors
/// Returns the first [`CoreError`] that is not frame-level.
pub fn run_loop(
    source: &mut dyn MediaSource,
    pipeline: &mut FramePipeline,
    sink: &mut dyn DisplaySink,
    poller: &mut dyn InputPoller,
    ctx: &LoopContext<'_>,
) -> Result<PlaybackReport, CoreError> {
    let mut pacer = FramePacer::new(ctx.target_fps);
    let mut fps = FpsCounter::new(30);
    let source_fps = source.frame_rate().unwrap_or(ctx.target_fps);
    let mut pulled: u64 = 0;
    let mut skipped: u64 = 0;
    let mut invalid: u64 = 0;

    sink.clear_screen()?;

    let termination = 'frames: loop {
        pacer.begin_tick();
        if poll_cancel(poller, ctx.cancel) {
            break Termination::Cancelled;
        }

        let mut extra = Duration::ZERO;
        if ctx.sync_mode == SyncMode::AudioLocked
            && let Some(audio_pos) = ctx.clock.audio_pos()
        {
            let video_pts = pulled as f64 / source_fps;
            match sync_action(video_pts, audio_pos, source_fps, pacer.period()) {
                SyncAction::Show => {}
                SyncAction::Skip(n) => {
                    for _ in 0..n {
                        if source.next_frame().is_none() {
                            break 'frames Termination::Exhausted;
                        }
                        pulled += 1;
                        skipped += 1;
                    }
                    log::trace!("Vidéo en retard, {n} frames sautées");
                }
                SyncAction::Hold(d) => extra = d,
            }
        }

        let Some(frame) = source.next_frame() else {
            break Termination::Exhausted;
        };
        pulled += 1;

        match pipeline.process(&frame) {
            Ok(rendered) => {
                sink.write_text(&rendered.to_string())?;
                fps.tick();
            }
            Err(e) if e.is_frame_level() => {
                invalid += 1;
                log::debug!("Frame {pulled} ignorée : {e}");
            }
            Err(e) => return Err(e),
        }

        if pacer.wait(extra, || poll_cancel(poller, ctx.cancel)) {
            break Termination::Cancelled;
        }
    };

    Ok(PlaybackReport {
        termination,
        frames_shown: fps.frames(),
        frames_skipped: skipped,
        invalid_frames: invalid,
        average_fps: fps.average_fps(),
    })
}

/// Une touche d'arrêt lève le jeton ; le jeton fait foi.
fn poll_cancel(poller: &mut dyn InputPoller, cancel: &CancelToken) -> bool {
    if poller.poll_cancel_key() {
        cancel.cancel();
    }
    cancel.is_cancelled()
}

/// Mode image : une seule conversion, texte renvoyé pour stdout.
///
/// # Errors
/// Returns an error if the image cannot be opened or the config is invalid.
pub fn render_still(path: &Path, config: &RenderConfig) -> Result<RenderedFrame> {
    let mut source = ImageSource::open(path)?;
    let frame = source
        .next_frame()
        .with_context(|| format!("Image vide : {}", path.display()))?;
    source.close();
    let mut pipeline = FramePipeline::new(config)?;
    pipeline
        .process(&frame)
        .with_context(|| format!("Conversion de {}", path.display()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source scriptée ; compte les tirages et les fermetures.
    pub struct ScriptedSource {
        pub frames: VecDeque<FrameBuffer>,
        /// Taille annoncée ; celle des frames par défaut.
        pub native: (u32, u32),
        pub pulls: Arc<AtomicUsize>,
        pub closes: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        pub fn uniform(count: usize, value: u8) -> Self {
            let mut frame = FrameBuffer::new(8, 4);
            for px in frame.data.chunks_exact_mut(4) {
                px.copy_from_slice(&[value, value, value, 255]);
            }
            Self {
                frames: std::iter::repeat_n(frame, count).collect(),
                native: (8, 4),
                pulls: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl MediaSource for ScriptedSource {
        fn next_frame(&mut self) -> Option<FrameBuffer> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            self.frames.pop_front()
        }

        fn native_size(&self) -> (u32, u32) {
            self.native
        }

        fn frame_rate(&self) -> Option<f64> {
            Some(500.0)
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub blocks: Vec<String>,
        pub clears: usize,
        pub fail_writes: bool,
    }

    impl DisplaySink for RecordingSink {
        fn clear_screen(&mut self) -> Result<(), CoreError> {
            self.clears += 1;
            Ok(())
        }

        fn write_text(&mut self, block: &str) -> Result<(), CoreError> {
            if self.fail_writes {
                return Err(CoreError::Display("terminal fermé".into()));
            }
            self.blocks.push(block.to_string());
            Ok(())
        }
    }

    /// Presse la touche d'arrêt au `n`-ième sondage (jamais si `None`).
    pub struct CountdownPoller {
        pub remaining: Option<usize>,
    }

    impl InputPoller for CountdownPoller {
        fn poll_cancel_key(&mut self) -> bool {
            match self.remaining.as_mut() {
                Some(0) => true,
                Some(n) => {
                    *n -= 1;
                    false
                }
                None => false,
            }
        }
    }

    pub fn fast_config() -> RenderConfig {
        RenderConfig {
            width: 4,
            target_fps: 500.0,
            ..RenderConfig::default()
        }
    }
}
