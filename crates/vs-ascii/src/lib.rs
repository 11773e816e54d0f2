/// ASCII conversion engine for vidscii.
///
/// Converts color frames to luminance grids, then luminance grids to rows
/// of glyphs.
pub mod render;
pub mod transform;

pub use render::render;
pub use transform::FrameTransformer;
