//! Secondary media player capability.
//!
//! The video player runs on its own clock; the synchronizer only needs a
//! narrow surface: read the current position/state, and nudge transport.
//! Implementations report `None` from [`MediaPlayer::status`] until the
//! underlying player is actually ready to be driven.

pub mod mpv;

/// A point-in-time read of the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStatus {
    pub position_secs: f64,
    pub playing: bool,
}

/// Transport capability of the secondary player. Commands are
/// fire-and-forget: a player that has gone away simply ignores them, and
/// the next reconcile pass retries.
pub trait MediaPlayer {
    /// Current position and play state, or `None` while the player cannot
    /// report yet.
    fn status(&self) -> Option<PlayerStatus>;
    fn play(&self);
    fn pause(&self);
    fn seek_to(&self, seconds: f64);
}
