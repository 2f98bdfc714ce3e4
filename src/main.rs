mod config;
mod lyrics;
mod player;
mod session;
mod spotify;
mod sync;
mod youtube;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lyrics::{GeniusClient, HttpResolver, LrclibClient, LyricResolver, LyricsRequest, LyricsResult};
use session::events::SessionUpdate;
use spotify::SpotifyClient;

#[derive(Debug, Parser)]
#[command(name = "chorus", version, about = "Synced lyrics companion for Spotify playback")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow Spotify playback and print the lyric lines as they go by
    /// (default).
    Run {
        /// Also open an mpv window with a matching music video, kept in
        /// sync with Spotify.
        #[arg(long)]
        video: bool,
    },
    /// Fetch lyrics for one track and print them (headless).
    Lyrics {
        artist: String,
        title: String,
        #[arg(long)]
        album: Option<String>,
        /// Track length in seconds, used as a lookup hint.
        #[arg(long)]
        duration: Option<u64>,
        /// Print plain text even when synced lyrics exist.
        #[arg(long)]
        plain: bool,
    },
    /// Control Spotify playback.
    Playback {
        #[command(subcommand)]
        cmd: PlaybackCommand,
    },
    /// Store API credentials in the config file.
    Auth {
        #[command(subcommand)]
        cmd: AuthCommand,
    },
}

#[derive(Debug, Subcommand)]
enum PlaybackCommand {
    Play,
    Pause,
    Next,
    Previous,
}

#[derive(Debug, Subcommand)]
enum AuthCommand {
    /// Spotify OAuth access token (user-read-playback-state scope).
    Spotify { token: String },
    /// Genius API access token (plain-lyrics fallback).
    Genius { token: String },
    /// YouTube Data API key (music-video lookup).
    Youtube { key: String },
    /// Clear all stored credentials.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Run { video: false }) {
        Command::Run { video } => run(cfg, video).await?,
        Command::Lyrics {
            artist,
            title,
            album,
            duration,
            plain,
        } => {
            let resolver = make_resolver(&cfg);
            let result = resolver
                .resolve(LyricsRequest {
                    artist,
                    title,
                    album,
                    duration_secs: duration,
                })
                .await;
            print_lyrics(&result, plain);
        }
        Command::Playback { cmd } => {
            let client = make_spotify(&cfg)?;
            match cmd {
                PlaybackCommand::Play => client.play().await?,
                PlaybackCommand::Pause => client.pause().await?,
                PlaybackCommand::Next => client.next().await?,
                PlaybackCommand::Previous => client.previous().await?,
            }
        }
        Command::Auth { cmd } => {
            let mut cfg = cfg;
            match cmd {
                AuthCommand::Spotify { token } => cfg.spotify.access_token = Some(token),
                AuthCommand::Genius { token } => cfg.genius.access_token = Some(token),
                AuthCommand::Youtube { key } => cfg.youtube.api_key = Some(key),
                AuthCommand::Clear => {
                    cfg.spotify.access_token = None;
                    cfg.genius.access_token = None;
                    cfg.youtube.api_key = None;
                }
            }
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Updated credentials.");
        }
    }

    Ok(())
}

async fn run(cfg: config::Config, video: bool) -> anyhow::Result<()> {
    let client = make_spotify(&cfg)?;
    let resolver = make_resolver(&cfg);

    let youtube = cfg.youtube.api_key.as_deref().map(youtube::YoutubeClient::new);
    let mpv = match (video, &youtube) {
        (false, _) => None,
        (true, None) => {
            tracing::warn!("--video needs a YouTube API key (chorus auth youtube <KEY>)");
            None
        }
        (true, Some(_)) => match player::mpv::MpvPlayer::spawn().await {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("video disabled: {e:#}");
                None
            }
        },
    };

    let (updates_tx, mut updates_rx) = tokio::sync::mpsc::channel(64);
    let session = session::Session::new(resolver, youtube, mpv, &cfg.sync, updates_tx);
    let poll_interval = std::time::Duration::from_millis(cfg.sync.poll_interval_ms.max(100));
    let runner = tokio::spawn(session.run(client, poll_interval));

    println!("Waiting for Spotify playback... (Ctrl-C to quit)");
    while let Some(update) = updates_rx.recv().await {
        render(update);
    }

    runner.await.context("session task")??;
    Ok(())
}

fn render(update: SessionUpdate) {
    match update {
        SessionUpdate::TrackChanged(track) => {
            println!();
            println!("♪ {} — {}", track.artist, track.title);
        }
        SessionUpdate::Lyrics(result) => match result {
            LyricsResult::Synced {
                source, timeline, ..
            } => println!("  [{} synced lines from {}]", timeline.len(), source.label()),
            LyricsResult::Plain { source, text, .. } => println!(
                "  [{} plain lines from {}]",
                text.lines().filter(|l| !l.trim().is_empty()).count(),
                source.label()
            ),
            LyricsResult::NotFound => println!("  [no lyrics found]"),
            LyricsResult::FetchError { reason } => println!("  [lyrics unavailable: {reason}]"),
        },
        SessionUpdate::ActiveLine {
            text: Some(text), ..
        } => println!("    {text}"),
        SessionUpdate::ActiveLine { .. } => {}
    }
}

fn print_lyrics(result: &LyricsResult, prefer_plain: bool) {
    match result {
        LyricsResult::Synced {
            source,
            meta,
            timeline,
            plain,
        } => {
            println!("{} — {}  (synced, {})", meta.artist, meta.title, source.label());
            match plain {
                Some(plain) if prefer_plain => println!("{plain}"),
                _ => println!("{}", timeline.to_lrc()),
            }
        }
        LyricsResult::Plain { source, meta, text } => {
            println!("{} — {}  (plain, {})", meta.artist, meta.title, source.label());
            println!("{text}");
        }
        LyricsResult::NotFound => println!("No lyrics found."),
        LyricsResult::FetchError { reason } => println!("Lyrics unavailable: {reason}"),
    }
}

fn make_spotify(cfg: &config::Config) -> anyhow::Result<SpotifyClient> {
    let token = cfg
        .spotify
        .access_token
        .as_deref()
        .context("no Spotify access token configured (run `chorus auth spotify <TOKEN>`)")?;
    SpotifyClient::new(token)
}

fn make_resolver(cfg: &config::Config) -> HttpResolver {
    LyricResolver::new(
        LrclibClient::new(),
        GeniusClient::new(cfg.genius.access_token.clone().unwrap_or_default()),
    )
}
