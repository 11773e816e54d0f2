use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use flume::{Receiver, SendTimeoutError, Sender, TryRecvError};
use vs_core::cancel::CancelToken;
use vs_core::clock::MediaClock;
use vs_core::traits::AudioOutput;

use crate::decode::AudioStream;
use crate::error::AudioError;

/// Période de sondage du jeton d'annulation par le worker.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Canaux de sortie demandés au périphérique.
const OUTPUT_CHANNELS: usize = 2;

/// Paquets décodés d'avance entre le worker et le callback.
const QUEUE_CHUNKS: usize = 32;

/// Copies decoded PCM chunks into device buffers, frame by frame.
///
/// Mono sources are duplicated on every output channel; extra source
/// channels beyond the output count are dropped. An empty queue yields
/// silence (underrun); once the sender is gone and the last chunk is
/// consumed, the feeder reports the end.
struct PcmFeeder {
    rx: Receiver<Vec<f32>>,
    chunk: Vec<f32>,
    /// Next sample index in `chunk`.
    offset: usize,
    channels: usize,
    /// PCM frames written so far.
    pos: u64,
    ended: bool,
}

impl PcmFeeder {
    fn new(rx: Receiver<Vec<f32>>, channels: usize) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            offset: 0,
            channels: channels.max(1),
            pos: 0,
            ended: false,
        }
    }

    /// `true` if a full source frame is available at `offset`.
    fn ensure_frame(&mut self) -> bool {
        while self.offset + self.channels > self.chunk.len() {
            if self.ended {
                return false;
            }
            match self.rx.try_recv() {
                Ok(next) => {
                    self.chunk = next;
                    self.offset = 0;
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    self.ended = true;
                    return false;
                }
            }
        }
        true
    }

    /// Fill `out` (interleaved, `out_channels` wide). Returns `true` once
    /// every source frame has been written.
    fn fill(&mut self, out: &mut [f32], out_channels: usize) -> bool {
        for frame in out.chunks_mut(out_channels.max(1)) {
            if self.ensure_frame() {
                let base = self.offset;
                for (c, slot) in frame.iter_mut().enumerate() {
                    *slot = self.chunk[base + c.min(self.channels - 1)];
                }
                self.offset += self.channels;
                self.pos += 1;
            } else {
                frame.fill(0.0);
            }
        }
        // Déconnecté d'abord : plus aucun envoi possible, `is_empty` est fiable.
        if !self.ended
            && self.offset + self.channels > self.chunk.len()
            && self.rx.is_disconnected()
            && self.rx.is_empty()
        {
            self.ended = true;
        }
        self.ended
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

/// Lecture asynchrone d'un fichier PCM sur le périphérique par défaut.
///
/// Un worker dédié décode le fichier paquet par paquet, possède le stream
/// cpal en exclusivité et publie la position dans la [`MediaClock`]. Au plus
/// `QUEUE_CHUNKS` paquets attendent en mémoire. Le worker s'arrête au plus
/// un paquet plus 10 ms après la levée du jeton d'annulation. Un échec
/// (décodage, périphérique, stream) est journalisé et la lecture est
/// considérée absente.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use vs_audio::playback::PlaybackChannel;
/// use vs_core::{cancel::CancelToken, clock::MediaClock};
///
/// let mut channel = PlaybackChannel::start(
///     Path::new("/tmp/track.wav"),
///     CancelToken::new(),
///     Arc::new(MediaClock::new(0)),
/// ).unwrap();
/// channel.stop();
/// channel.stop(); // idempotent
/// ```
pub struct PlaybackChannel {
    cancel: CancelToken,
    clock: Arc<MediaClock>,
    worker: Option<thread::JoinHandle<()>>,
}

impl PlaybackChannel {
    /// Spawn the playback worker. Returns immediately; decoding and device
    /// setup happen on the worker.
    ///
    /// # Errors
    /// Returns [`AudioError::Stream`] if the worker thread cannot be spawned.
    pub fn start(
        path: &Path,
        cancel: CancelToken,
        clock: Arc<MediaClock>,
    ) -> Result<Self, AudioError> {
        let worker_path: PathBuf = path.to_path_buf();
        let worker_cancel = cancel.clone();
        let worker_clock = Arc::clone(&clock);

        let worker = thread::Builder::new()
            .name("vs-audio".to_string())
            .spawn(move || {
                let result = play_file(&worker_path, &worker_cancel, &worker_clock);
                worker_clock.finish();
                match result {
                    Ok(()) => log::info!("Thread audio terminé proprement."),
                    Err(e) => log::warn!("Audio indisponible, lecture muette : {e}"),
                }
            })
            .map_err(|e| AudioError::Stream(format!("spawn du thread audio : {e}")))?;

        Ok(Self {
            cancel,
            clock,
            worker: Some(worker),
        })
    }

    /// Lève le jeton puis attend le worker. Idempotent.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            log::warn!("Thread audio: panique pendant la lecture");
        }
    }

    /// `true` while samples are being played.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished()) && self.clock.is_running()
    }
}

impl AudioOutput for PlaybackChannel {
    fn stop(&mut self) {
        PlaybackChannel::stop(self);
    }

    fn is_playing(&self) -> bool {
        PlaybackChannel::is_playing(self)
    }
}

impl Drop for PlaybackChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Décode un paquet et le pousse dans la file.
///
/// Retourne `false` en fin de fichier, sur annulation, ou si le callback a
/// disparu. L'envoi attend par tranches de [`POLL_INTERVAL`] pour rester
/// réactif au jeton quand la file est pleine.
fn push_next(source: &mut AudioStream, tx: &Sender<Vec<f32>>, cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    let Some(mut chunk) = source.next_chunk() else {
        return false;
    };
    loop {
        match tx.send_timeout(chunk, POLL_INTERVAL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if cancel.is_cancelled() {
                    return false;
                }
                chunk = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

/// Remplit la file sans bloquer. Retourne `false` si le décodage est fini.
fn prefill(source: &mut AudioStream, tx: &Sender<Vec<f32>>, cancel: &CancelToken) -> bool {
    while !tx.is_full() {
        if !push_next(source, tx, cancel) {
            return false;
        }
    }
    true
}

/// Corps du worker : ouverture, préremplissage, stream, alimentation.
fn play_file(path: &Path, cancel: &CancelToken, clock: &Arc<MediaClock>) -> Result<(), AudioError> {
    let mut source = AudioStream::open(path).map_err(|e| AudioError::Decode(format!("{e:#}")))?;
    let (tx, rx) = flume::bounded(QUEUE_CHUNKS);

    let mut decoding = prefill(&mut source, &tx, cancel);
    if cancel.is_cancelled() {
        return Ok(());
    }
    if rx.is_empty() {
        return Err(AudioError::Decode(format!(
            "aucun échantillon dans {}",
            path.display()
        )));
    }

    let sample_rate = source.sample_rate();
    clock.set_sample_rate(sample_rate);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)?;

    let config = cpal::StreamConfig {
        channels: OUTPUT_CHANNELS as u16,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut feeder = PcmFeeder::new(rx, source.channels());
    let cb_clock = Arc::clone(clock);
    let err_clock = Arc::clone(clock);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let ended = feeder.fill(data, OUTPUT_CHANNELS);
                cb_clock.record_frames(feeder.position());
                if ended {
                    cb_clock.finish();
                }
            },
            move |err| {
                log::error!("Audio output error: {err}");
                err_clock.finish();
            },
            None,
        )
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    log::info!("Audio playback started @ {sample_rate}Hz");

    while decoding && !clock.is_ended() {
        decoding = push_next(&mut source, &tx, cancel);
    }
    // Plus d'envoi : le feeder voit la déconnexion une fois la file vidée.
    drop(tx);

    while !cancel.is_cancelled() && !clock.is_ended() {
        thread::sleep(POLL_INTERVAL);
    }
    drop(stream);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::testing::write_wav;
    use std::time::Instant;

    fn feeder(chunks: Vec<Vec<f32>>, channels: usize) -> (PcmFeeder, Sender<Vec<f32>>) {
        let (tx, rx) = flume::unbounded();
        for c in chunks {
            tx.send(c).unwrap();
        }
        (PcmFeeder::new(rx, channels), tx)
    }

    #[test]
    fn mono_is_duplicated() {
        let (mut f, tx) = feeder(vec![vec![0.1, 0.2]], 1);
        drop(tx);
        let mut out = [9.0f32; 4];
        assert!(f.fill(&mut out, 2));
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
        assert_eq!(f.position(), 2);
    }

    #[test]
    fn frames_span_chunks_then_silence() {
        let (mut f, tx) = feeder(vec![vec![0.1, -0.1], vec![0.2, -0.2]], 2);
        drop(tx);
        let mut out = [9.0f32; 6];
        assert!(f.fill(&mut out, 2));
        assert_eq!(out, [0.1, -0.1, 0.2, -0.2, 0.0, 0.0]);
    }

    #[test]
    fn underrun_is_silence_not_end() {
        let (mut f, tx) = feeder(vec![vec![0.5; 4]], 2);
        let mut out = [9.0f32; 8];
        assert!(!f.fill(&mut out, 2));
        assert_eq!(out, [0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(f.position(), 2);

        tx.send(vec![0.25, 0.25]).unwrap();
        drop(tx);
        let mut out = [9.0f32; 4];
        assert!(f.fill(&mut out, 2));
        assert_eq!(out, [0.25, 0.25, 0.0, 0.0]);
        assert_eq!(f.position(), 3);
    }

    #[test]
    fn surround_keeps_front_channels() {
        let (mut f, _tx) = feeder(vec![vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]], 6);
        let mut out = [0.0f32; 2];
        f.fill(&mut out, 2);
        assert_eq!(out, [1.0, 2.0]);
    }

    fn long_wav(dir: &Path) -> PathBuf {
        let path = dir.join("long.wav");
        // 10 minutes mono à 8 kHz.
        write_wav(&path, 8000, 1, 8000 * 600, 1000);
        path
    }

    #[test]
    fn prefill_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = AudioStream::open(long_wav(dir.path())).unwrap();
        let (tx, rx) = flume::bounded(QUEUE_CHUNKS);
        assert!(prefill(&mut source, &tx, &CancelToken::new()));
        assert_eq!(rx.len(), QUEUE_CHUNKS);
        let queued: usize = rx.drain().map(|c| c.len()).sum();
        assert!(queued < 8000 * 600);
    }

    #[test]
    fn push_gives_up_on_cancel_when_queue_is_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = AudioStream::open(long_wav(dir.path())).unwrap();
        let (tx, _rx) = flume::bounded(1);
        let cancel = CancelToken::new();
        assert!(push_next(&mut source, &tx, &cancel));

        let flag = cancel.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            flag.cancel();
        });
        let start = Instant::now();
        assert!(!push_next(&mut source, &tx, &cancel));
        assert!(start.elapsed() < Duration::from_secs(1));
        waker.join().unwrap();
    }

    #[test]
    fn stop_is_prompt_on_long_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = long_wav(dir.path());
        let clock = Arc::new(MediaClock::new(0));
        let mut channel = PlaybackChannel::start(&path, CancelToken::new(), Arc::clone(&clock)).unwrap();
        let start = Instant::now();
        channel.stop();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(clock.is_ended());
        assert!(!channel.is_playing());
    }

    #[test]
    fn backend_failure_is_silent_and_stop_is_idempotent() {
        let clock = Arc::new(MediaClock::new(0));
        let mut channel = PlaybackChannel::start(
            Path::new("/nonexistent/vidscii.wav"),
            CancelToken::new(),
            Arc::clone(&clock),
        )
        .unwrap();
        channel.stop();
        assert!(!channel.is_playing());
        assert!(clock.is_ended());
        channel.stop();
    }

    #[test]
    fn cancelled_before_device_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, 8000, 1, 800, 1000);

        let cancel = CancelToken::new();
        cancel.cancel();
        let clock = Arc::new(MediaClock::new(0));
        let mut channel = PlaybackChannel::start(&path, cancel, Arc::clone(&clock)).unwrap();
        channel.stop();
        assert!(clock.is_ended());
        assert_eq!(clock.frames_played(), 0);
        assert!(!channel.is_playing());
    }
}
