//! Lyric acquisition.
//!
//! Tracks resolve against a timestamp-capable source first (LRCLIB) and
//! fall back to a plain-text source (Genius). Both normalize into one
//! [`LyricsResult`]; network failures surface as a variant, never as an
//! error the caller has to handle mid-render.

pub mod genius;
pub mod lrclib;
pub mod parser;

pub use genius::GeniusClient;
pub use lrclib::LrclibClient;
pub use parser::{LyricLine, Timeline};

use crate::spotify::models::TrackIdentity;

/// Which service a lyrics result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricSource {
    Lrclib,
    Genius,
}

impl LyricSource {
    pub fn label(self) -> &'static str {
        match self {
            LyricSource::Lrclib => "lrclib",
            LyricSource::Genius => "genius",
        }
    }
}

/// What to look up. Duration is whole seconds, used as a disambiguation
/// hint by LRCLIB.
#[derive(Debug, Clone)]
pub struct LyricsRequest {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub duration_secs: Option<u64>,
}

impl From<&TrackIdentity> for LyricsRequest {
    fn from(track: &TrackIdentity) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
            duration_secs: track.duration_ms.map(|ms| ms / 1_000),
        }
    }
}

/// Track metadata attached to a result. The source's own values win over
/// the request's: the source may have corrected capitalization or aliases.
#[derive(Debug, Clone)]
pub struct TrackMeta {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub duration_secs: Option<u64>,
}

/// Outcome of a lyric lookup. Every consumer handles every variant.
#[derive(Debug, Clone)]
pub enum LyricsResult {
    /// Line-timestamped lyrics, ready for exact position mapping.
    Synced {
        source: LyricSource,
        meta: TrackMeta,
        timeline: Timeline,
        plain: Option<String>,
    },
    /// Untimed text; positions can only be estimated against it.
    Plain {
        source: LyricSource,
        meta: TrackMeta,
        text: String,
    },
    /// Neither source knows the track.
    NotFound,
    /// Something failed along the chain; the reason is display-ready.
    FetchError { reason: String },
}

/// Raw response from the timestamp-capable source.
#[derive(Debug, Clone, Default)]
pub struct TimedLookup {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_secs: Option<u64>,
    pub synced_text: Option<String>,
    pub plain_text: Option<String>,
}

/// One match from the plain-text source's search.
#[derive(Debug, Clone)]
pub struct SongMatch {
    #[allow(dead_code)]
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub url: String,
}

/// Timestamp-capable lookup, tried first.
pub trait TimedLyricsSource: Send + Sync {
    fn lookup(
        &self,
        request: LyricsRequest,
    ) -> impl Future<Output = anyhow::Result<Option<TimedLookup>>> + Send;
}

/// Plain-text search-then-fetch source, tried when the timed source has
/// nothing.
pub trait PlainLyricsSource: Send + Sync {
    fn search(&self, query: &str) -> impl Future<Output = anyhow::Result<Vec<SongMatch>>> + Send;
    fn plain_lyrics(&self, song: &SongMatch)
    -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Resolves a track to lyrics, primary source first, falling back to the
/// plain source.
#[derive(Debug, Clone)]
pub struct LyricResolver<T, P> {
    timed: T,
    plain: P,
}

/// The production resolver: LRCLIB backed by Genius.
pub type HttpResolver = LyricResolver<LrclibClient, GeniusClient>;

impl<T: TimedLyricsSource, P: PlainLyricsSource> LyricResolver<T, P> {
    pub fn new(timed: T, plain: P) -> Self {
        Self { timed, plain }
    }

    /// Resolve a request. Never fails: every error along the chain is
    /// folded into the returned variant.
    pub async fn resolve(&self, request: LyricsRequest) -> LyricsResult {
        match self.try_resolve(&request).await {
            Ok(result) => result,
            Err(e) => LyricsResult::FetchError {
                reason: format!("{e:#}"),
            },
        }
    }

    async fn try_resolve(&self, request: &LyricsRequest) -> anyhow::Result<LyricsResult> {
        match self.timed.lookup(request.clone()).await {
            Ok(Some(record)) => {
                if let Some(synced) = non_blank(record.synced_text.as_deref()) {
                    let timeline = Timeline::parse(synced);
                    // A synced field that parses to nothing can never show a
                    // line; treat it like an untimed record.
                    if !timeline.is_empty() {
                        return Ok(LyricsResult::Synced {
                            source: LyricSource::Lrclib,
                            meta: merge_meta(&record, request),
                            timeline,
                            plain: record.plain_text.clone(),
                        });
                    }
                }
                if let Some(plain) = non_blank(record.plain_text.as_deref()) {
                    return Ok(LyricsResult::Plain {
                        source: LyricSource::Lrclib,
                        meta: merge_meta(&record, request),
                        text: plain.to_string(),
                    });
                }
                self.fall_back(request).await
            }
            Ok(None) => self.fall_back(request).await,
            Err(e) => {
                tracing::debug!("timed lyric source failed, falling back: {e:#}");
                self.fall_back(request).await
            }
        }
    }

    async fn fall_back(&self, request: &LyricsRequest) -> anyhow::Result<LyricsResult> {
        let query = format!("{} {}", request.artist, request.title);
        let matches = self.plain.search(&query).await?;
        let Some(song) = matches.into_iter().next() else {
            return Ok(LyricsResult::NotFound);
        };

        let text = self.plain.plain_lyrics(&song).await?;
        Ok(LyricsResult::Plain {
            source: LyricSource::Genius,
            meta: TrackMeta {
                artist: song.artist,
                title: song.title,
                album: request.album.clone(),
                duration_secs: request.duration_secs,
            },
            text,
        })
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

fn merge_meta(record: &TimedLookup, request: &LyricsRequest) -> TrackMeta {
    TrackMeta {
        artist: record.artist.clone().unwrap_or_else(|| request.artist.clone()),
        title: record.title.clone().unwrap_or_else(|| request.title.clone()),
        album: record.album.clone().or_else(|| request.album.clone()),
        duration_secs: record.duration_secs.or(request.duration_secs),
    }
}
