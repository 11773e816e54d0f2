use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Décodage paquet par paquet d'un fichier audio en f32 entrelacé.
///
/// Rien n'est décodé à l'ouverture : chaque appel à
/// [`AudioStream::next_chunk`] lit et décode un seul paquet, ce qui borne la
/// mémoire et laisse l'appelant vérifier l'annulation entre deux paquets.
///
/// Supports WAV, MP3, FLAC, OGG, AAC via symphonia.
///
/// # Example
/// ```no_run
/// use vs_audio::decode::AudioStream;
/// let mut stream = AudioStream::open("track.wav").unwrap();
/// println!("{} canaux @ {}Hz", stream.channels(), stream.sample_rate());
/// while let Some(chunk) = stream.next_chunk() {
///     let _ = chunk.len();
/// }
/// ```
pub struct AudioStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    /// 0 tant que le conteneur ne l'annonce pas (fixé au premier paquet).
    channels: usize,
    sample_rate: u32,
    sample_buf: Option<SampleBuffer<f32>>,
    max_sample_frames: usize,
}

impl AudioStream {
    /// Probe the container and build the decoder for its default track.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, probed, or has no
    /// decodable track.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Cannot open audio file: {}", path.display()))?;
        let mss = MediaSourceStream::new(
            Box::new(file),
            symphonia::core::io::MediaSourceStreamOptions::default(),
        );

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Failed to probe audio format")?;

        let format = probed.format;
        let track = format
            .default_track()
            .context("No default audio track found")?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track
            .codec_params
            .channels
            .map_or(0, symphonia::core::audio::Channels::count);
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        log::info!(
            "Audio ouvert : {} ch @ {sample_rate}Hz depuis {}",
            channels,
            path.display()
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            channels,
            sample_rate,
            sample_buf: None,
            max_sample_frames: 0,
        })
    }

    /// Interleaved channel count (≥ 1).
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels.max(1)
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Décode le paquet suivant de la piste. `None` en fin de flux ou sur
    /// erreur de lecture du conteneur ; un paquet corrompu est sauté.
    pub fn next_chunk(&mut self) -> Option<Vec<f32>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return None;
                }
                Err(e) => {
                    log::warn!("Audio decode packet error: {e}");
                    return None;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Audio decode frame error: {e}");
                    continue;
                }
            };

            let spec = *decoded.spec();
            if self.channels == 0 {
                self.channels = spec.channels.count();
            }
            let num_frames = decoded.capacity();
            // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
            if self.sample_buf.is_none() || num_frames > self.max_sample_frames {
                self.sample_buf = Some(SampleBuffer::<f32>::new(num_frames as u64, spec));
                self.max_sample_frames = num_frames;
            }
            let buf = self.sample_buf.as_mut()?;
            buf.copy_interleaved_ref(decoded);
            if buf.samples().is_empty() {
                continue;
            }
            return Some(buf.samples().to_vec());
        }
    }
}

/// Helpers shared by the crate's tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::io::Write;
    use std::path::Path;

    /// Write a 16-bit PCM WAV file with a constant sample value.
    pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: u32, value: i16) {
        let data_len = frames * u32::from(channels) * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * u32::from(channels) * 2).to_le_bytes());
        bytes.extend_from_slice(&(channels * 2).to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.extend_from_slice(&value.to_le_bytes().repeat((frames * u32::from(channels)) as usize));
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(&bytes).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::testing::write_wav;
    use super::*;

    #[test]
    fn streams_stereo_wav_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 8000, 2, 400, 16384);

        let mut stream = AudioStream::open(&path).unwrap();
        assert_eq!(stream.channels(), 2);
        assert_eq!(stream.sample_rate(), 8000);

        let mut total = 0;
        while let Some(chunk) = stream.next_chunk() {
            assert_eq!(chunk.len() % 2, 0);
            assert!(chunk.iter().all(|s| (s - 0.5).abs() < 1e-3));
            total += chunk.len();
        }
        assert_eq!(total, 800);
        assert!(stream.next_chunk().is_none());
    }

    #[test]
    fn open_does_not_decode_the_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.wav");
        write_wav(&path, 8000, 1, 8000 * 600, 100);

        let mut stream = AudioStream::open(&path).unwrap();
        let first = stream.next_chunk().unwrap();
        assert!(!first.is_empty());
        assert!(first.len() < 8000 * 600);
    }

    #[test]
    fn missing_file_fails() {
        assert!(AudioStream::open("/nonexistent/vidscii.wav").is_err());
    }
}
