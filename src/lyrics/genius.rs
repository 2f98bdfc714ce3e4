//! Genius lyrics client.
//!
//! Genius exposes search through its public API, but not lyric text. The
//! text is pulled out of the song page's lyric containers instead, then
//! cleaned of page furniture (contributor counts, section titles, promo
//! snippets, the trailing "Embed" marker).

use crate::lyrics::{PlainLyricsSource, SongMatch};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: SongResult,
}

#[derive(Debug, Deserialize)]
struct SongResult {
    id: u64,
    title: String,
    url: String,
    primary_artist: ArtistResult,
}

#[derive(Debug, Deserialize)]
struct ArtistResult {
    name: String,
}

/// Genius API client.
#[derive(Debug, Clone)]
pub struct GeniusClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GeniusClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.genius.com";
    const USER_AGENT: &'static str = "chorus/0.1.0 (https://github.com/chorus-player/chorus)";

    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Search songs. The first hit is the best match Genius has.
    pub async fn search_songs(&self, query: &str) -> anyhow::Result<Vec<SongMatch>> {
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(query));

        let response: SearchResponse = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("send genius search request")?
            .error_for_status()
            .context("genius search http status")?
            .json()
            .await
            .context("parse genius search json")?;

        Ok(response
            .response
            .hits
            .into_iter()
            .map(|hit| SongMatch {
                id: hit.result.id,
                title: hit.result.title,
                artist: hit.result.primary_artist.name,
                url: hit.result.url,
            })
            .collect())
    }

    /// Fetch the song page and extract its cleaned lyric text.
    pub async fn fetch_lyrics(&self, song: &SongMatch) -> anyhow::Result<String> {
        let html = self
            .client
            .get(&song.url)
            .send()
            .await
            .context("fetch genius song page")?
            .error_for_status()
            .context("genius song page http status")?
            .text()
            .await
            .context("read genius song page")?;

        let text = extract_lyric_text(&html)
            .with_context(|| format!("no lyric containers in {}", song.url))?;
        Ok(strip_page_furniture(&text))
    }
}

impl PlainLyricsSource for GeniusClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SongMatch>> {
        self.search_songs(query).await
    }

    async fn plain_lyrics(&self, song: &SongMatch) -> anyhow::Result<String> {
        self.fetch_lyrics(song).await
    }
}

/// Pull the text out of every `data-lyrics-container` block, turning `<br>`
/// into newlines and dropping the remaining markup.
fn extract_lyric_text(html: &str) -> Option<String> {
    static CONTAINER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?s)<div[^>]*data-lyrics-container="true"[^>]*>(.*?)</div>"#)
            .expect("valid container regex")
    });
    static LINE_BREAK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid br regex"));
    static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));

    let mut raw = String::new();
    for caps in CONTAINER.captures_iter(html) {
        raw.push_str(&caps[1]);
        raw.push('\n');
    }
    if raw.is_empty() {
        return None;
    }

    let text = LINE_BREAK.replace_all(&raw, "\n");
    let text = MARKUP.replace_all(&text, "");
    Some(decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
}

/// Remove the non-lyric scaffolding Genius renders around the text.
pub fn strip_page_furniture(raw: &str) -> String {
    static RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?i)\d+\s*Contributors?.*?Lyrics",
            r"(?i)\d+\s*Contributor.*?\n",
            r"(?im).*?Lyrics\s*$",
            r"(?i)You might also like",
            r"(?i)See.*?Live",
            r"(?i)Get tickets as low as \$\d+",
            r"(?m)Embed$",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid stripper regex"))
        .collect()
    });
    static BLANK_RUNS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("valid blank-run regex"));

    let mut text = raw.replace("\r\n", "\n");
    for rule in RULES.iter() {
        text = rule.replace_all(&text, "").into_owned();
    }
    BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}
