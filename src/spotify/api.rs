//! Spotify Web API client: playback state plus transport controls.
//!
//! The access token comes from the config; obtaining one is the user's
//! problem (any OAuth helper with `user-read-playback-state` and
//! `user-modify-playback-state` scopes will do).

use crate::spotify::models::{PlayerState, TrackIdentity};
use anyhow::Context;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PlaybackResponse {
    item: Option<Item>,
    progress_ms: Option<u64>,
    is_playing: bool,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    duration_ms: u64,
    artists: Vec<ArtistRef>,
    album: Option<AlbumRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumRef {
    name: String,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
}

impl SpotifyClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.spotify.com/v1";

    pub fn new(access_token: &str) -> anyhow::Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .context("access token is not a valid header value")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Query the player. `Ok(None)` means nothing is playing right now
    /// (Spotify answers 204, or an envelope without an item).
    pub async fn playback_state(&self) -> anyhow::Result<Option<PlayerState>> {
        let url = format!("{}/me/player", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("send playback state request")?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body: PlaybackResponse = response
            .error_for_status()
            .context("playback state http status")?
            .json()
            .await
            .context("parse playback state json")?;

        let Some(item) = body.item else {
            return Ok(None);
        };

        let artist = item
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Some(PlayerState {
            track: TrackIdentity {
                artist,
                title: item.name,
                album: item.album.map(|a| a.name),
                duration_ms: Some(item.duration_ms),
            },
            position_ms: body.progress_ms.unwrap_or(0),
            is_playing: body.is_playing,
        }))
    }

    pub async fn play(&self) -> anyhow::Result<()> {
        self.command(reqwest::Method::PUT, "me/player/play").await
    }

    pub async fn pause(&self) -> anyhow::Result<()> {
        self.command(reqwest::Method::PUT, "me/player/pause").await
    }

    pub async fn next(&self) -> anyhow::Result<()> {
        self.command(reqwest::Method::POST, "me/player/next").await
    }

    pub async fn previous(&self) -> anyhow::Result<()> {
        self.command(reqwest::Method::POST, "me/player/previous")
            .await
    }

    async fn command(&self, method: reqwest::Method, path: &str) -> anyhow::Result<()> {
        let url = format!("{}/{path}", self.base_url);
        self.http
            .request(method, &url)
            .send()
            .await
            .with_context(|| format!("send {path} request"))?
            .error_for_status()
            .with_context(|| format!("{path} http status"))?;
        Ok(())
    }
}
