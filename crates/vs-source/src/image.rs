use std::path::Path;

use vs_core::error::CoreError;
use vs_core::frame::FrameBuffer;
use vs_core::traits::MediaSource;

/// Source d'image statique : une seule frame, puis fin de flux.
///
/// # Example
/// ```no_run
/// use vs_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::open(Path::new("cover.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: Option<FrameBuffer>,
    size: (u32, u32),
}

impl ImageSource {
    /// Load an image from disk.
    ///
    /// # Errors
    /// Returns [`CoreError::Open`] if the image cannot be read or decoded.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let frame = load_image(path)?;
        Ok(Self::from_frame(frame))
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        let size = (frame.width, frame.height);
        Self {
            frame: Some(frame),
            size,
        }
    }
}

impl MediaSource for ImageSource {
    fn next_frame(&mut self) -> Option<FrameBuffer> {
        self.frame.take()
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn frame_rate(&self) -> Option<f64> {
        None
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

/// Decode an image file into an RGBA frame.
///
/// # Errors
/// Returns [`CoreError::Open`] if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<FrameBuffer, CoreError> {
    let img = ::image::open(path).map_err(|e| CoreError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    FrameBuffer::from_rgba(rgba.into_raw(), width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame_then_exhausted() {
        let mut source = ImageSource::from_frame(FrameBuffer::new(4, 2));
        assert_eq!(source.native_size(), (4, 2));
        assert!(source.next_frame().is_some());
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn missing_file_is_open_error() {
        let result = ImageSource::open(Path::new("/nonexistent/vidscii-test.png"));
        assert!(matches!(result, Err(CoreError::Open { .. })));
    }
}
