//! LRCLIB API client.
//!
//! LRCLIB is a free lyrics API that serves synchronized (LRC format)
//! lyrics keyed by track metadata. API documentation: https://lrclib.net/docs

use crate::lyrics::{LyricsRequest, TimedLookup, TimedLyricsSource};
use serde::Deserialize;

/// LRCLIB `/get` response.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LrclibRecord {
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration: Option<f64>,
    pub plain_lyrics: Option<String>,
    pub synced_lyrics: Option<String>,
}

/// LRCLIB API client.
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = "chorus/0.1.0 (https://github.com/chorus-player/chorus)";

    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Look a track up by its metadata. `Ok(None)` means LRCLIB has no
    /// record for it.
    pub async fn get(
        &self,
        artist: &str,
        title: &str,
        album: Option<&str>,
        duration_secs: Option<u64>,
    ) -> anyhow::Result<Option<LrclibRecord>> {
        let mut url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(artist)
        );

        if let Some(album) = album {
            url.push_str(&format!("&album_name={}", urlencoding::encode(album)));
        }

        if let Some(duration) = duration_secs {
            url.push_str(&format!("&duration={duration}"));
        }

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let record: LrclibRecord = response.json().await?;
            Ok(Some(record))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }
}

impl Default for LrclibClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TimedLyricsSource for LrclibClient {
    async fn lookup(&self, request: LyricsRequest) -> anyhow::Result<Option<TimedLookup>> {
        let record = self
            .get(
                &request.artist,
                &request.title,
                request.album.as_deref(),
                request.duration_secs,
            )
            .await?;

        Ok(record.map(|r| TimedLookup {
            title: r.track_name,
            artist: r.artist_name,
            album: r.album_name,
            duration_secs: r.duration.map(|d| d as u64),
            synced_text: r.synced_lyrics,
            plain_text: r.plain_lyrics,
        }))
    }
}
