use serde::{Deserialize, Serialize};

/// Identity of the track the external player reports as current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackIdentity {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub duration_ms: Option<u64>,
}

impl TrackIdentity {
    /// Key used to detect track changes and to gate async completions.
    pub fn key(&self) -> String {
        format!("{}-{}", self.artist, self.title)
    }
}

/// Parsed "current playback" response.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub track: TrackIdentity,
    pub position_ms: u64,
    pub is_playing: bool,
}

/// One poll-cycle observation. Replaced wholesale on the next tick.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub track_key: String,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
}

impl PlaybackSnapshot {
    pub fn position_secs(&self) -> f64 {
        self.position_ms as f64 / 1_000.0
    }
}
