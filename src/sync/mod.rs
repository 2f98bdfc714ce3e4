//! Position synchronization: the lyric line cursor and the video
//! reconciler, both driven by the tracker's snapshots.

pub mod cursor;
pub mod video;

pub use cursor::{LinePhase, LyricCursor};
pub use video::VideoSync;
