use crate::lyrics::LyricsResult;
use crate::spotify::models::{PlaybackSnapshot, TrackIdentity};

/// Everything that flows through the session's single event channel.
#[derive(Debug)]
pub enum Event {
    Playback(PlaybackEvent),
    Lyrics(LyricsEvent),
    Media(MediaEvent),
}

#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// The polled track key differs from the previous emission.
    TrackChanged(TrackIdentity),
    /// One poll tick's observation.
    Snapshot(PlaybackSnapshot),
}

/// Completion of a lyric resolution, tagged with the track it was started
/// for so stale results can be dropped.
#[derive(Debug)]
pub enum LyricsEvent {
    Resolved {
        track_key: String,
        result: LyricsResult,
    },
}

/// Completion of a music-video lookup, tagged the same way.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    Located {
        track_key: String,
        video_id: String,
    },
    NotFound {
        track_key: String,
    },
}

/// Updates pushed to the rendering collaborator. The renderer owns
/// scrolling and highlighting; this is everything it needs and nothing
/// more.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    TrackChanged(TrackIdentity),
    Lyrics(LyricsResult),
    ActiveLine {
        index: Option<usize>,
        text: Option<String>,
    },
}
