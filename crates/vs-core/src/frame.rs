use std::fmt;

use crate::error::CoreError;

/// Frame couleur décodée.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use vs_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes, checking that the length matches the dimensions.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrame`] on empty dimensions or a length
    /// mismatch.
    ///
    /// # Example
    /// ```
    /// use vs_core::frame::FrameBuffer;
    /// assert!(FrameBuffer::from_rgba(vec![0; 8], 2, 1).is_ok());
    /// assert!(FrameBuffer::from_rgba(vec![0; 7], 2, 1).is_err());
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, CoreError> {
        let frame = Self {
            data,
            width,
            height,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Check that the frame is non-empty and well-formed.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrame`] if width or height is zero or the
    /// buffer length is not `width * height * 4`.
    pub fn validate(&self) -> Result<(), CoreError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.data.len() != expected {
            return Err(CoreError::InvalidFrame {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }
}

/// Grille d'intensités mono-canal, row-major.
///
/// Construite une fois par frame par le transformeur, immuable ensuite.
///
/// # Example
/// ```
/// use vs_core::frame::LuminanceGrid;
/// let grid = LuminanceGrid::new(2, 1, vec![0, 255]).unwrap();
/// assert_eq!(grid.get(1, 0), Some(255));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LuminanceGrid {
    samples: Vec<u8>,
    width: u32,
    height: u32,
}

impl LuminanceGrid {
    /// Build a grid from row-major samples.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrame`] if `samples.len() != width * height`
    /// or a dimension is zero.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || samples.len() != width as usize * height as usize {
            return Err(CoreError::InvalidFrame {
                width,
                height,
                len: samples.len(),
            });
        }
        Ok(Self {
            samples,
            width,
            height,
        })
    }

    /// Width in samples.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in samples.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major samples.
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Sample at (x, y), `None` hors de la grille.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> std::slice::Chunks<'_, u8> {
        self.samples.chunks(self.width as usize)
    }
}

/// Lignes de texte prêtes à afficher.
///
/// # Example
/// ```
/// use vs_core::frame::RenderedFrame;
/// let frame = RenderedFrame::new(vec!["@ #".into(), ". .".into()]);
/// assert_eq!(frame.to_string(), "@ #\n. .");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedFrame {
    rows: Vec<String>,
}

impl RenderedFrame {
    /// Wrap already-joined rows.
    #[must_use]
    pub fn new(rows: Vec<String>) -> Self {
        Self { rows }
    }

    /// The rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Display for RenderedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_validation() {
        assert!(FrameBuffer::new(0, 10).validate().is_err());
        assert!(FrameBuffer::new(3, 2).validate().is_ok());
        let broken = FrameBuffer {
            data: vec![0; 5],
            width: 3,
            height: 2,
        };
        assert!(matches!(
            broken.validate(),
            Err(CoreError::InvalidFrame { len: 5, .. })
        ));
    }

    #[test]
    fn grid_rows() {
        let grid = LuminanceGrid::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rows: Vec<&[u8]> = grid.rows().collect();
        assert_eq!(rows, vec![&[1, 2, 3][..], &[4, 5, 6][..]]);
        assert_eq!(grid.get(0, 1), Some(4));
        assert_eq!(grid.get(2, 1), Some(6));
        // (3, 0) tomberait sur (0, 1) sans le contrôle de colonne
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn grid_rejects_mismatch() {
        assert!(LuminanceGrid::new(2, 2, vec![0; 3]).is_err());
        assert!(LuminanceGrid::new(0, 0, vec![]).is_err());
    }
}
