/// Configuration, types, and shared structures for vidscii.
///
/// This crate contains the frame types, the glyph ramp, the shared clock and
/// the collaborator traits used across the vidscii workspace.

pub mod cancel;
pub mod charset;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use cancel::CancelToken;
pub use charset::GlyphRamp;
pub use config::RenderConfig;
pub use error::CoreError;
pub use frame::{FrameBuffer, LuminanceGrid, RenderedFrame};
