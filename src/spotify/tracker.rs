//! Recurring poll of the external player's playback position.
//!
//! The player's clock is only observable through this poll; every consumer
//! downstream works off the snapshots emitted here. Failures never stop the
//! cadence: the next scheduled tick is the retry mechanism.

use crate::session::events::{Event, PlaybackEvent};
use crate::spotify::SpotifyClient;
use crate::spotify::models::{PlaybackSnapshot, PlayerState};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Anything that can answer "what is playing right now".
pub trait PlaybackSource: Send + Sync + 'static {
    fn playback_state(
        &self,
    ) -> impl Future<Output = anyhow::Result<Option<PlayerState>>> + Send;
}

impl PlaybackSource for SpotifyClient {
    async fn playback_state(&self) -> anyhow::Result<Option<PlayerState>> {
        SpotifyClient::playback_state(self).await
    }
}

/// Handle to a running tracker. Dropping it without calling
/// [`TrackerHandle::stop`] aborts the task on the next tick boundary.
pub struct TrackerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TrackerHandle {
    /// Halt the poll loop and wait for it to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }
}

/// Start polling `source` every `poll_interval`, emitting playback events
/// into `tx`. The first poll happens immediately.
pub fn spawn<S: PlaybackSource>(
    source: S,
    tx: mpsc::Sender<Event>,
    poll_interval: Duration,
) -> TrackerHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_key: Option<String> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            let state = tokio::select! {
                state = source.playback_state() => state,
                _ = shutdown_rx.changed() => break,
            };

            let state = match state {
                Ok(Some(state)) => state,
                // Nothing playing: no snapshot, no change event this tick.
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("playback state query failed: {e:#}");
                    continue;
                }
            };

            let key = state.track.key();
            if last_key.as_deref() != Some(key.as_str()) {
                last_key = Some(key.clone());
                let change = Event::Playback(PlaybackEvent::TrackChanged(state.track.clone()));
                if tx.send(change).await.is_err() {
                    break;
                }
            }

            let snapshot = PlaybackSnapshot {
                track_key: key,
                position_ms: state.position_ms,
                duration_ms: state.track.duration_ms.unwrap_or(0),
                is_playing: state.is_playing,
            };
            if tx
                .send(Event::Playback(PlaybackEvent::Snapshot(snapshot)))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    TrackerHandle { shutdown, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::models::TrackIdentity;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Plays back a script of poll responses, then reports silence.
    #[derive(Clone)]
    struct ScriptedSource {
        script: Arc<Mutex<VecDeque<Result<Option<PlayerState>, String>>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<PlayerState>, String>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
            }
        }
    }

    impl PlaybackSource for ScriptedSource {
        async fn playback_state(&self) -> anyhow::Result<Option<PlayerState>> {
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(state)) => Ok(state),
                Some(Err(e)) => Err(anyhow::anyhow!(e)),
                None => Ok(None),
            }
        }
    }

    fn playing(artist: &str, title: &str, position_ms: u64) -> PlayerState {
        PlayerState {
            track: TrackIdentity {
                artist: artist.to_string(),
                title: title.to_string(),
                album: None,
                duration_ms: Some(200_000),
            },
            position_ms,
            is_playing: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_change_then_snapshots() {
        let source = ScriptedSource::new(vec![
            Ok(Some(playing("a", "one", 0))),
            Ok(Some(playing("a", "one", 1_000))),
            Err("boom".to_string()),
            Ok(None),
            Ok(Some(playing("b", "two", 0))),
        ]);
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn(source, tx, Duration::from_millis(1_000));

        // Tick 1: new track key -> change event followed by its snapshot.
        assert!(matches!(
            rx.recv().await,
            Some(Event::Playback(PlaybackEvent::TrackChanged(t))) if t.key() == "a-one"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(Event::Playback(PlaybackEvent::Snapshot(s)))
                if s.track_key == "a-one" && s.position_ms == 0
        ));

        // Tick 2: same key -> snapshot only.
        assert!(matches!(
            rx.recv().await,
            Some(Event::Playback(PlaybackEvent::Snapshot(s))) if s.position_ms == 1_000
        ));

        // Ticks 3 (error) and 4 (nothing playing) emit nothing; the next
        // message is tick 5's track change.
        assert!(matches!(
            rx.recv().await,
            Some(Event::Playback(PlaybackEvent::TrackChanged(t))) if t.key() == "b-two"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(Event::Playback(PlaybackEvent::Snapshot(s))) if s.track_key == "b-two"
        ));

        handle.stop().await;
        // Sender dropped with the task: the stream ends.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling() {
        let source = ScriptedSource::new(vec![Ok(Some(playing("a", "one", 0)))]);
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn(source, tx, Duration::from_millis(1_000));

        let _ = rx.recv().await;
        let _ = rx.recv().await;
        handle.stop().await;
        assert!(rx.recv().await.is_none());
    }
}
