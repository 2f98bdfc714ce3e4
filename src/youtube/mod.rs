//! Music-video lookup on the YouTube Data API.

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    const DEFAULT_BASE_URL: &'static str = "https://www.googleapis.com/youtube/v3";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Find an embeddable music video for the track. `Ok(None)` when the
    /// search comes back empty.
    pub async fn find_music_video(
        &self,
        artist: &str,
        title: &str,
    ) -> anyhow::Result<Option<String>> {
        let query = format!("{artist} {title} music video");
        let url = format!(
            "{}/search?part=snippet&type=video&videoEmbeddable=true&maxResults=1&q={}&key={}",
            self.base_url,
            urlencoding::encode(&query),
            self.api_key
        );

        let response: SearchResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("send youtube search request")?
            .error_for_status()
            .context("youtube search http status")?
            .json()
            .await
            .context("parse youtube search json")?;

        Ok(response.items.into_iter().next().map(|item| item.id.video_id))
    }
}
