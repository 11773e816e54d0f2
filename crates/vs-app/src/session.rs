use std::sync::Arc;

use tempfile::TempPath;
use vs_core::cancel::CancelToken;
use vs_core::clock::MediaClock;
use vs_core::config::RenderConfig;
use vs_core::error::CoreError;
use vs_core::traits::{AudioOutput, DisplaySink, InputPoller, MediaSource};

use crate::player::{FramePipeline, LoopContext, PlaybackReport, run_loop};

/// Une lecture : flux vidéo, canal audio optionnel, artefact audio temporaire.
///
/// La session possède toutes les ressources et les libère exactement une
/// fois, dans l'ordre audio → source → fichier temporaire, quelle que soit
/// la sortie de la boucle (fin, annulation, erreur, drop).
pub struct PlaybackSession {
    source: Option<Box<dyn MediaSource>>,
    audio: Option<Box<dyn AudioOutput>>,
    audio_artifact: Option<TempPath>,
    cancel: CancelToken,
    clock: Arc<MediaClock>,
    config: RenderConfig,
}

impl PlaybackSession {
    #[must_use]
    pub fn new(source: Box<dyn MediaSource>, config: RenderConfig) -> Self {
        Self {
            source: Some(source),
            audio: None,
            audio_artifact: None,
            cancel: CancelToken::new(),
            clock: Arc::new(MediaClock::new(0)),
            config,
        }
    }

    /// Jeton partagé avec le worker audio et le handler Ctrl+C.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Horloge alimentée par le worker audio.
    #[must_use]
    pub fn clock(&self) -> Arc<MediaClock> {
        Arc::clone(&self.clock)
    }

    /// Le fichier est supprimé au teardown.
    pub fn set_audio_artifact(&mut self, artifact: TempPath) {
        self.audio_artifact = Some(artifact);
    }

    pub fn set_audio_output(&mut self, audio: Box<dyn AudioOutput>) {
        self.audio = Some(audio);
    }

    /// Lance la boucle puis libère les ressources, y compris sur erreur.
    ///
    /// # Errors
    /// Returns the session-level error that aborted the loop. Teardown has
    /// already run when this returns.
    pub fn play(
        &mut self,
        sink: &mut dyn DisplaySink,
        poller: &mut dyn InputPoller,
    ) -> Result<PlaybackReport, CoreError> {
        let result = self.run(sink, poller);
        self.teardown();
        result
    }

    fn run(
        &mut self,
        sink: &mut dyn DisplaySink,
        poller: &mut dyn InputPoller,
    ) -> Result<PlaybackReport, CoreError> {
        let mut pipeline = FramePipeline::new(&self.config)?;
        let Some(source) = self.source.as_deref_mut() else {
            return Err(CoreError::Config("session déjà terminée".into()));
        };
        pipeline.set_source_size(source.native_size());
        let ctx = LoopContext {
            cancel: &self.cancel,
            clock: &self.clock,
            target_fps: self.config.target_fps,
            sync_mode: self.config.sync_mode,
        };
        run_loop(source, &mut pipeline, sink, poller, &ctx)
    }

    /// Libère audio, source puis artefact. Idempotent.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        if let Some(mut audio) = self.audio.take() {
            if audio.is_playing() {
                log::debug!("Arrêt de l'audio en cours de lecture");
            }
            audio.stop();
        }
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        if let Some(artifact) = self.audio_artifact.take() {
            let path = artifact.to_path_buf();
            match artifact.close() {
                Ok(()) => log::debug!("Artefact audio supprimé : {}", path.display()),
                Err(e) => log::warn!("Suppression de {} impossible : {e}", path.display()),
            }
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
