// Audio extraction, decoding and playback for vidscii.

pub mod decode;
pub mod error;
pub mod extract;
pub mod playback;

pub use error::AudioError;
pub use playback::PlaybackChannel;
