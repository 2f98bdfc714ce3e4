//! Keeps the video player's transport state and clock pinned to the
//! polled playback position.

use crate::player::{MediaPlayer, PlayerStatus};
use crate::spotify::models::PlaybackSnapshot;

/// The video player is only driveable once its backend reports in; until
/// then (and again after every track change) the handle holds nothing.
pub enum MediaHandle {
    NotReady,
    Ready(Box<dyn MediaPlayer + Send>),
}

/// Reconciles one secondary player against playback snapshots.
///
/// The player's own clock free-runs between corrections; it is only
/// reseeked when it drifts past the threshold, because seeking every tick
/// would stutter playback.
pub struct VideoSync {
    handle: MediaHandle,
    drift_threshold_secs: f64,
}

impl VideoSync {
    pub fn new(drift_threshold_secs: f64) -> Self {
        Self {
            handle: MediaHandle::NotReady,
            drift_threshold_secs,
        }
    }

    pub fn attach(&mut self, player: Box<dyn MediaPlayer + Send>) {
        self.handle = MediaHandle::Ready(player);
    }

    /// Invalidate the handle. A stale player must not be driven while the
    /// next track's video is still being looked up.
    pub fn detach(&mut self) {
        self.handle = MediaHandle::NotReady;
    }

    #[allow(dead_code)]
    pub fn is_ready(&self) -> bool {
        matches!(self.handle, MediaHandle::Ready(_))
    }

    /// Apply one snapshot. Every step is skipped, never fatal, when the
    /// player cannot report its state; the next snapshot retries.
    pub fn reconcile(&self, snapshot: &PlaybackSnapshot) {
        let MediaHandle::Ready(player) = &self.handle else {
            return;
        };
        let Some(status) = player.status() else {
            return;
        };

        self.reconcile_transport(player.as_ref(), &status, snapshot);
        self.reconcile_position(player.as_ref(), &status, snapshot);
    }

    fn reconcile_transport(
        &self,
        player: &dyn MediaPlayer,
        status: &PlayerStatus,
        snapshot: &PlaybackSnapshot,
    ) {
        // Only touch transport on disagreement; re-issuing play on a playing
        // player causes visible restart flicker.
        if snapshot.is_playing == status.playing {
            return;
        }
        if snapshot.is_playing {
            player.play();
        } else {
            player.pause();
        }
    }

    fn reconcile_position(
        &self,
        player: &dyn MediaPlayer,
        status: &PlayerStatus,
        snapshot: &PlaybackSnapshot,
    ) {
        let target_secs = snapshot.position_secs();
        if (status.position_secs - target_secs).abs() > self.drift_threshold_secs {
            player.seek_to(target_secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Calls {
        plays: usize,
        pauses: usize,
        seeks: Vec<f64>,
    }

    struct FakePlayer {
        status: Option<PlayerStatus>,
        calls: Arc<Mutex<Calls>>,
    }

    impl FakePlayer {
        fn ready(position_secs: f64, playing: bool) -> (Self, Arc<Mutex<Calls>>) {
            let calls = Arc::new(Mutex::new(Calls::default()));
            (
                Self {
                    status: Some(PlayerStatus {
                        position_secs,
                        playing,
                    }),
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn unresponsive() -> (Self, Arc<Mutex<Calls>>) {
            let calls = Arc::new(Mutex::new(Calls::default()));
            (
                Self {
                    status: None,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl MediaPlayer for FakePlayer {
        fn status(&self) -> Option<PlayerStatus> {
            self.status
        }

        fn play(&self) {
            self.calls.lock().unwrap().plays += 1;
        }

        fn pause(&self) {
            self.calls.lock().unwrap().pauses += 1;
        }

        fn seek_to(&self, seconds: f64) {
            self.calls.lock().unwrap().seeks.push(seconds);
        }
    }

    fn snapshot(position_ms: u64, is_playing: bool) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track_key: "artist-title".to_string(),
            position_ms,
            duration_ms: 200_000,
            is_playing,
        }
    }

    #[test]
    fn test_small_drift_left_alone() {
        let (player, calls) = FakePlayer::ready(10.0, true);
        let mut sync = VideoSync::new(2.0);
        sync.attach(Box::new(player));

        // 1.5 s apart: the video clock keeps free-running.
        sync.reconcile(&snapshot(11_500, true));
        assert!(calls.lock().unwrap().seeks.is_empty());
    }

    #[test]
    fn test_large_drift_seeks_to_spotify_time() {
        let (player, calls) = FakePlayer::ready(10.0, true);
        let mut sync = VideoSync::new(2.0);
        sync.attach(Box::new(player));

        sync.reconcile(&snapshot(12_500, true));
        assert_eq!(calls.lock().unwrap().seeks, vec![12.5]);
    }

    #[test]
    fn test_transport_only_on_disagreement() {
        let (player, calls) = FakePlayer::ready(10.0, true);
        let mut sync = VideoSync::new(2.0);
        sync.attach(Box::new(player));

        // Already playing: no play command.
        sync.reconcile(&snapshot(10_000, true));
        assert_eq!(calls.lock().unwrap().plays, 0);

        // Spotify paused: exactly one pause.
        sync.reconcile(&snapshot(10_000, false));
        assert_eq!(calls.lock().unwrap().pauses, 1);
    }

    #[test]
    fn test_paused_player_resumed() {
        let (player, calls) = FakePlayer::ready(10.0, false);
        let mut sync = VideoSync::new(2.0);
        sync.attach(Box::new(player));

        sync.reconcile(&snapshot(10_000, true));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.plays, 1);
        assert_eq!(calls.pauses, 0);
    }

    #[test]
    fn test_unready_player_skipped() {
        let (player, calls) = FakePlayer::unresponsive();
        let mut sync = VideoSync::new(2.0);
        sync.attach(Box::new(player));

        sync.reconcile(&snapshot(60_000, true));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.plays, 0);
        assert!(calls.seeks.is_empty());
    }

    #[test]
    fn test_detached_handle_skipped() {
        let (player, calls) = FakePlayer::ready(0.0, false);
        let mut sync = VideoSync::new(2.0);
        sync.attach(Box::new(player));
        sync.detach();
        assert!(!sync.is_ready());

        sync.reconcile(&snapshot(60_000, true));
        assert_eq!(calls.lock().unwrap().plays, 0);
    }
}
