use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use rayon::prelude::*;
use vs_core::config::RenderConfig;
use vs_core::error::CoreError;
use vs_core::frame::{FrameBuffer, LuminanceGrid};

/// Luminance ITU-R 601 (mêmes poids que la conversion "L" classique).
///
/// # Example
/// ```
/// use vs_ascii::transform::luma_601;
/// assert_eq!(luma_601(255, 255, 255), 255);
/// assert_eq!(luma_601(0, 0, 0), 0);
/// ```
#[inline(always)]
#[must_use]
pub fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000) as u8
}

/// Output height for a target width, preserving the source aspect ratio.
///
/// `round(target_width * src_height / src_width)`, never below one row.
///
/// # Example
/// ```
/// use vs_ascii::transform::output_height;
/// assert_eq!(output_height(100, 640, 360), 56);
/// assert_eq!(output_height(4, 3, 2), 3);
/// ```
#[must_use]
pub fn output_height(target_width: u32, src_width: u32, src_height: u32) -> u32 {
    if src_width == 0 {
        return 1;
    }
    let h = (f64::from(target_width) * f64::from(src_height) / f64::from(src_width)).round();
    (h as u32).max(1)
}

/// Precomputed contrast stretch + optional inversion.
fn tone_lut(alpha: f32, beta: f32, invert: bool) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let stretched = (alpha * i as f32 + beta).round().clamp(0.0, 255.0) as u8;
        *slot = if invert { 255 - stretched } else { stretched };
    }
    lut
}

fn invalid(frame: &FrameBuffer) -> CoreError {
    CoreError::InvalidFrame {
        width: frame.width,
        height: frame.height,
        len: frame.data.len(),
    }
}

/// Converts color frames into luminance grids at the configured width.
///
/// Steps: 601 luminance, contrast stretch `clamp(alpha * in + beta)`,
/// optional inversion, then bilinear resampling to
/// `(width, output_height(width, w, h))`. The resizer and the full-size
/// scratch buffer are reused across frames.
///
/// # Example
/// ```
/// use vs_ascii::transform::FrameTransformer;
/// use vs_core::config::RenderConfig;
/// use vs_core::frame::FrameBuffer;
///
/// let config = RenderConfig { width: 8, ..RenderConfig::default() };
/// let mut transformer = FrameTransformer::new(&config).unwrap();
/// let grid = transformer.transform(&FrameBuffer::new(32, 16)).unwrap();
/// assert_eq!((grid.width(), grid.height()), (8, 4));
/// ```
pub struct FrameTransformer {
    width: u32,
    tone: [u8; 256],
    resizer: Resizer,
    options: ResizeOptions,
    /// Full-resolution luminance scratch, reused between frames.
    gray: Vec<u8>,
    /// Taille native de la source, si connue. Prime sur la taille des
    /// frames pour le calcul de la hauteur (frames pré-réduites arrondies).
    aspect: Option<(u32, u32)>,
}

impl FrameTransformer {
    /// Build a transformer from the render configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the configured width is zero.
    pub fn new(config: &RenderConfig) -> Result<Self, CoreError> {
        Self::with_params(
            config.width,
            config.contrast_alpha,
            config.contrast_beta,
            config.invert,
        )
    }

    /// Build a transformer from explicit parameters.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `width` is zero.
    pub fn with_params(width: u32, alpha: f32, beta: f32, invert: bool) -> Result<Self, CoreError> {
        if width == 0 {
            return Err(CoreError::Config("la largeur cible doit être > 0".into()));
        }
        Ok(Self {
            width,
            tone: tone_lut(alpha, beta, invert),
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            gray: Vec::new(),
            aspect: None,
        })
    }

    /// Fixe le ratio de référence à la taille native de la source.
    /// Une dimension nulle revient au ratio de chaque frame.
    pub fn set_source_size(&mut self, width: u32, height: u32) {
        self.aspect = (width > 0 && height > 0).then_some((width, height));
    }

    /// Target width in samples.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Convert one frame.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrame`] if the frame is empty or its
    /// buffer does not match its dimensions.
    pub fn transform(&mut self, frame: &FrameBuffer) -> Result<LuminanceGrid, CoreError> {
        frame.validate()?;

        let (w, h) = (frame.width, frame.height);
        let row_px = w as usize;
        self.gray.clear();
        self.gray.resize(row_px * h as usize, 0);

        let tone = &self.tone;
        self.gray
            .par_chunks_mut(row_px)
            .zip(frame.data.par_chunks(row_px * 4))
            .for_each(|(dst, src)| {
                for (d, px) in dst.iter_mut().zip(src.chunks_exact(4)) {
                    *d = tone[luma_601(px[0], px[1], px[2]) as usize];
                }
            });

        let tw = self.width;
        let (aw, ah) = self.aspect.unwrap_or((w, h));
        let th = output_height(tw, aw, ah);
        if tw == w && th == h {
            return LuminanceGrid::new(tw, th, self.gray.clone());
        }

        let mut out = vec![0u8; tw as usize * th as usize];
        let src_image = Image::from_slice_u8(w, h, &mut self.gray, PixelType::U8)
            .map_err(|_| invalid(frame))?;
        let mut dst_image =
            Image::from_slice_u8(tw, th, &mut out, PixelType::U8).map_err(|_| invalid(frame))?;
        self.resizer
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| {
                log::debug!("resize {w}x{h} -> {tw}x{th} échoué : {e}");
                invalid(frame)
            })?;

        LuminanceGrid::new(tw, th, out)
    }
}
