//! Coordination loop.
//!
//! One task owns all mutable state and drains one event channel. The
//! tracker feeds playback events into it; lyric resolution and video
//! lookup run as spawned tasks that report back through the same channel,
//! tagged with the track key they were started for. Results whose key no
//! longer matches the current track are dropped, so a slow fetch for the
//! previous track can never clobber the current one.

pub mod events;

use crate::config::SyncConfig;
use crate::lyrics::{HttpResolver, LyricsRequest, LyricsResult};
use crate::player::mpv::MpvPlayer;
use crate::spotify::models::TrackIdentity;
use crate::spotify::tracker::{self, PlaybackSource};
use crate::sync::{LyricCursor, VideoSync};
use crate::youtube::YoutubeClient;
use events::{Event, LyricsEvent, MediaEvent, PlaybackEvent, SessionUpdate};
use std::time::Duration;
use tokio::sync::mpsc;

/// Side effects `reduce` wants performed; executing them is the run
/// loop's job so state transitions stay synchronous and testable.
#[derive(Debug)]
enum Effect {
    ResolveLyrics(TrackIdentity),
    LocateVideo(TrackIdentity),
}

#[derive(Debug, Default)]
struct Outcome {
    effects: Vec<Effect>,
    updates: Vec<SessionUpdate>,
}

pub struct Session {
    resolver: HttpResolver,
    youtube: Option<YoutubeClient>,
    mpv: Option<MpvPlayer>,
    cursor: LyricCursor,
    video: VideoSync,
    current_key: Option<String>,
    updates: mpsc::Sender<SessionUpdate>,
}

impl Session {
    pub fn new(
        resolver: HttpResolver,
        youtube: Option<YoutubeClient>,
        mpv: Option<MpvPlayer>,
        sync_cfg: &SyncConfig,
        updates: mpsc::Sender<SessionUpdate>,
    ) -> Self {
        Self {
            resolver,
            youtube,
            mpv,
            cursor: LyricCursor::new(),
            video: VideoSync::new(sync_cfg.drift_threshold_secs),
            current_key: None,
            updates,
        }
    }

    /// Drive the session until the renderer goes away.
    pub async fn run<S: PlaybackSource>(
        mut self,
        source: S,
        poll_interval: Duration,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);
        let tracker = tracker::spawn(source, tx.clone(), poll_interval);

        'events: while let Some(ev) = rx.recv().await {
            let outcome = self.reduce(ev);
            for update in outcome.updates {
                if self.updates.send(update).await.is_err() {
                    break 'events;
                }
            }
            for effect in outcome.effects {
                self.dispatch(effect, &tx);
            }
        }

        tracker.stop().await;
        Ok(())
    }

    /// All state mutation happens here, synchronously and in event order.
    fn reduce(&mut self, ev: Event) -> Outcome {
        let mut outcome = Outcome::default();
        match ev {
            Event::Playback(PlaybackEvent::TrackChanged(track)) => {
                self.current_key = Some(track.key());
                self.cursor.clear();
                self.video.detach();

                outcome.updates.push(SessionUpdate::TrackChanged(track.clone()));
                outcome.effects.push(Effect::ResolveLyrics(track.clone()));
                if self.youtube.is_some() && self.mpv.is_some() {
                    outcome.effects.push(Effect::LocateVideo(track));
                }
            }
            Event::Playback(PlaybackEvent::Snapshot(snapshot)) => {
                if self.current_key.as_deref() != Some(snapshot.track_key.as_str()) {
                    return outcome;
                }
                if self.cursor.update(&snapshot) {
                    let index = self.cursor.active_index();
                    outcome.updates.push(SessionUpdate::ActiveLine {
                        index,
                        text: index
                            .and_then(|i| self.cursor.line_text(i))
                            .map(String::from),
                    });
                }
                self.video.reconcile(&snapshot);
            }
            Event::Lyrics(LyricsEvent::Resolved { track_key, result }) => {
                if self.current_key.as_deref() != Some(track_key.as_str()) {
                    tracing::debug!("dropping stale lyrics for {track_key}");
                    return outcome;
                }
                match &result {
                    LyricsResult::Synced { timeline, .. } => {
                        self.cursor.set_timeline(timeline.clone());
                    }
                    LyricsResult::Plain { text, .. } => self.cursor.set_plain(text),
                    LyricsResult::NotFound | LyricsResult::FetchError { .. } => {
                        self.cursor.clear();
                    }
                }
                outcome.updates.push(SessionUpdate::Lyrics(result));
            }
            Event::Media(MediaEvent::Located {
                track_key,
                video_id,
            }) => {
                if self.current_key.as_deref() != Some(track_key.as_str()) {
                    tracing::debug!("dropping stale video for {track_key}");
                    return outcome;
                }
                if let Some(mpv) = &self.mpv {
                    mpv.load_video(&video_id);
                    self.video.attach(Box::new(mpv.clone()));
                }
            }
            Event::Media(MediaEvent::NotFound { track_key }) => {
                tracing::info!("no music video for {track_key}");
            }
        }
        outcome
    }

    fn dispatch(&self, effect: Effect, tx: &mpsc::Sender<Event>) {
        match effect {
            Effect::ResolveLyrics(track) => {
                let resolver = self.resolver.clone();
                let tx = tx.clone();
                let track_key = track.key();
                tokio::spawn(async move {
                    let result = resolver.resolve(LyricsRequest::from(&track)).await;
                    let _ = tx
                        .send(Event::Lyrics(LyricsEvent::Resolved { track_key, result }))
                        .await;
                });
            }
            Effect::LocateVideo(track) => {
                let Some(youtube) = self.youtube.clone() else {
                    return;
                };
                let tx = tx.clone();
                let track_key = track.key();
                tokio::spawn(async move {
                    let event = match youtube.find_music_video(&track.artist, &track.title).await
                    {
                        Ok(Some(video_id)) => MediaEvent::Located {
                            track_key,
                            video_id,
                        },
                        Ok(None) => MediaEvent::NotFound { track_key },
                        Err(e) => {
                            tracing::warn!("video lookup failed: {e:#}");
                            MediaEvent::NotFound { track_key }
                        }
                    };
                    let _ = tx.send(Event::Media(event)).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::{
        GeniusClient, LrclibClient, LyricResolver, LyricSource, Timeline, TrackMeta,
    };
    use crate::spotify::models::PlaybackSnapshot;

    fn session() -> (Session, mpsc::Receiver<SessionUpdate>) {
        let (updates_tx, updates_rx) = mpsc::channel(64);
        let session = Session::new(
            LyricResolver::new(LrclibClient::new(), GeniusClient::new("")),
            None,
            None,
            &SyncConfig::default(),
            updates_tx,
        );
        (session, updates_rx)
    }

    fn track(artist: &str, title: &str) -> TrackIdentity {
        TrackIdentity {
            artist: artist.to_string(),
            title: title.to_string(),
            album: None,
            duration_ms: Some(200_000),
        }
    }

    fn snapshot(track: &TrackIdentity, position_ms: u64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track_key: track.key(),
            position_ms,
            duration_ms: 200_000,
            is_playing: true,
        }
    }

    fn synced_result(timeline: Timeline) -> LyricsResult {
        LyricsResult::Synced {
            source: LyricSource::Lrclib,
            meta: TrackMeta {
                artist: "a".to_string(),
                title: "t".to_string(),
                album: None,
                duration_secs: None,
            },
            timeline,
            plain: None,
        }
    }

    #[test]
    fn test_track_change_resets_and_requests_lyrics() {
        let (mut session, _rx) = session();
        let outcome = session.reduce(Event::Playback(PlaybackEvent::TrackChanged(track(
            "artist", "one",
        ))));

        assert_eq!(session.current_key.as_deref(), Some("artist-one"));
        assert_eq!(session.cursor.line_count(), 0);
        assert!(matches!(
            outcome.updates.as_slice(),
            [SessionUpdate::TrackChanged(t)] if t.title == "one"
        ));
        // No video collaborators configured: lyrics are the only effect.
        assert!(matches!(
            outcome.effects.as_slice(),
            [Effect::ResolveLyrics(t)] if t.title == "one"
        ));
    }

    #[test]
    fn test_snapshot_moves_cursor_and_emits_line() {
        let (mut session, _rx) = session();
        let current = track("artist", "one");
        session.reduce(Event::Playback(PlaybackEvent::TrackChanged(current.clone())));
        session.reduce(Event::Lyrics(LyricsEvent::Resolved {
            track_key: current.key(),
            result: synced_result(Timeline::parse("[00:01.00]hello\n[00:05.00]world")),
        }));

        let outcome = session.reduce(Event::Playback(PlaybackEvent::Snapshot(snapshot(
            &current, 2_000,
        ))));
        assert!(matches!(
            outcome.updates.as_slice(),
            [SessionUpdate::ActiveLine { index: Some(0), text: Some(text) }] if text == "hello"
        ));

        // Same line on the next tick: nothing to re-render.
        let outcome = session.reduce(Event::Playback(PlaybackEvent::Snapshot(snapshot(
            &current, 3_000,
        ))));
        assert!(outcome.updates.is_empty());
    }

    #[test]
    fn test_stale_lyrics_are_dropped() {
        let (mut session, _rx) = session();
        let first = track("artist", "one");
        let second = track("artist", "two");

        session.reduce(Event::Playback(PlaybackEvent::TrackChanged(first.clone())));
        session.reduce(Event::Playback(PlaybackEvent::TrackChanged(second.clone())));

        // The resolution started for track one completes after track two
        // became current: it must not install anything.
        let outcome = session.reduce(Event::Lyrics(LyricsEvent::Resolved {
            track_key: first.key(),
            result: synced_result(Timeline::parse("[00:01.00]stale")),
        }));
        assert!(outcome.updates.is_empty());
        assert_eq!(session.cursor.line_count(), 0);

        let outcome = session.reduce(Event::Lyrics(LyricsEvent::Resolved {
            track_key: second.key(),
            result: synced_result(Timeline::parse("[00:01.00]fresh")),
        }));
        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(session.cursor.line_count(), 1);
    }

    #[test]
    fn test_snapshot_for_old_track_ignored() {
        let (mut session, _rx) = session();
        let first = track("artist", "one");
        let second = track("artist", "two");

        session.reduce(Event::Playback(PlaybackEvent::TrackChanged(first.clone())));
        session.reduce(Event::Playback(PlaybackEvent::TrackChanged(second.clone())));
        session.reduce(Event::Lyrics(LyricsEvent::Resolved {
            track_key: second.key(),
            result: synced_result(Timeline::parse("[00:01.00]fresh")),
        }));

        let outcome = session.reduce(Event::Playback(PlaybackEvent::Snapshot(snapshot(
            &first, 2_000,
        ))));
        assert!(outcome.updates.is_empty());
        assert_eq!(session.cursor.active_index(), None);
    }

    #[test]
    fn test_failed_resolution_clears_and_reports() {
        let (mut session, _rx) = session();
        let current = track("artist", "one");
        session.reduce(Event::Playback(PlaybackEvent::TrackChanged(current.clone())));

        let outcome = session.reduce(Event::Lyrics(LyricsEvent::Resolved {
            track_key: current.key(),
            result: LyricsResult::NotFound,
        }));
        assert!(matches!(
            outcome.updates.as_slice(),
            [SessionUpdate::Lyrics(LyricsResult::NotFound)]
        ));
        assert_eq!(session.cursor.line_count(), 0);
    }
}
