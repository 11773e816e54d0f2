/// Terminal output and frame pacing for vidscii.
///
/// Provides the ratatui display sink, the keyboard cancel poller, the
/// frame pacer and FPS tracking.
pub mod canvas;
pub mod fps;
pub mod pacer;
pub mod terminal;
