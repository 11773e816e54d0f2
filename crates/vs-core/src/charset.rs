use crate::error::CoreError;

/// 10 caractères, du plus dense au plus clair. Défaut.
pub const CHARSET_COMPACT: &str = "@%#*+=-:. ";

/// 70 caractères (Paul Bourke), dense→clair.
pub const CHARSET_STANDARD: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Blocs Unicode, dense→clair.
pub const CHARSET_BLOCKS: &str = "█▓▒░ ";

/// Resolve a preset name ("compact", "standard", "blocks") to its charset.
///
/// # Example
/// ```
/// use vs_core::charset::{preset, CHARSET_BLOCKS};
/// assert_eq!(preset("blocks"), Some(CHARSET_BLOCKS));
/// assert_eq!(preset("nope"), None);
/// ```
#[must_use]
pub fn preset(name: &str) -> Option<&'static str> {
    match name {
        "compact" => Some(CHARSET_COMPACT),
        "standard" => Some(CHARSET_STANDARD),
        "blocks" => Some(CHARSET_BLOCKS),
        _ => None,
    }
}

/// Ordered glyph ramp with a precomputed luminance lookup table.
///
/// Sample `s` maps to `ramp[floor(s / 255 * (N - 1))]`. The table is filled
/// once with `i * (N - 1) / 255`, which is the same floor, so `0` always
/// lands on the first glyph and `255` on the last one.
///
/// # Example
/// ```
/// use vs_core::charset::GlyphRamp;
/// let ramp = GlyphRamp::new("@#. ").unwrap();
/// assert_eq!(ramp.map(0), '@');
/// assert_eq!(ramp.map(85), '#');
/// assert_eq!(ramp.map(170), '.');
/// assert_eq!(ramp.map(255), ' ');
/// ```
#[derive(Clone, Debug)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
    lut: [char; 256],
}

impl GlyphRamp {
    /// Build a ramp from a charset ordered first→last glyph.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the charset has fewer than 2 glyphs.
    pub fn new(charset: &str) -> Result<Self, CoreError> {
        Self::from_glyphs(charset.chars().collect())
    }

    /// Build a ramp from an explicit glyph list.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if fewer than 2 glyphs are given.
    pub fn from_glyphs(glyphs: Vec<char>) -> Result<Self, CoreError> {
        let len = glyphs.len();
        if len < 2 {
            return Err(CoreError::Config(format!(
                "la rampe de glyphes doit contenir au moins 2 caractères (reçu {len})"
            )));
        }
        let mut lut = [' '; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = glyphs[i * (len - 1) / 255];
        }
        Ok(Self { glyphs, lut })
    }

    /// Map an intensity sample to its glyph.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, sample: u8) -> char {
        self.lut[sample as usize]
    }

    /// Map a float intensity, clamping it into `[0, 255]` first.
    ///
    /// # Example
    /// ```
    /// use vs_core::charset::GlyphRamp;
    /// let ramp = GlyphRamp::new("ab").unwrap();
    /// assert_eq!(ramp.map_f32(-12.0), 'a');
    /// assert_eq!(ramp.map_f32(900.0), 'b');
    /// ```
    #[must_use]
    pub fn map_f32(&self, sample: f32) -> char {
        let clamped = if sample.is_nan() {
            0.0
        } else {
            sample.clamp(0.0, 255.0)
        };
        self.map(clamped as u8)
    }

    /// Number of glyphs in the ramp.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`: a ramp holds at least two glyphs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The ordered glyphs.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }
}
