//! Active-line tracking against polled playback positions.

use crate::lyrics::Timeline;
use crate::spotify::models::PlaybackSnapshot;

/// How the renderer should treat a line relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePhase {
    Past,
    Active,
    Future,
}

#[derive(Debug, Clone, Default)]
enum CursorContent {
    #[default]
    Empty,
    Synced(Timeline),
    Plain(Vec<String>),
}

/// Maps playback positions onto a lyric line index.
///
/// With a synced timeline the mapping is exact; with plain text the index
/// is estimated from playback progress. Each snapshot recomputes the index
/// from scratch, so seeks and skips land on the right line immediately.
/// While the player is paused the cursor freezes: a paused player's
/// reported position may still jitter.
#[derive(Debug, Clone, Default)]
pub struct LyricCursor {
    content: CursorContent,
    active: Option<usize>,
}

impl LyricCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a synced timeline for a new track. Resets the active line.
    pub fn set_timeline(&mut self, timeline: Timeline) {
        self.content = CursorContent::Synced(timeline);
        self.active = None;
    }

    /// Install plain text for a new track; its non-blank lines become the
    /// entries positions are estimated against.
    pub fn set_plain(&mut self, text: &str) {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        self.content = CursorContent::Plain(lines);
        self.active = None;
    }

    /// Drop all content (track changed, nothing resolved yet).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Index of the active line, if any line is active yet.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    #[allow(dead_code)]
    pub fn line_count(&self) -> usize {
        match &self.content {
            CursorContent::Empty => 0,
            CursorContent::Synced(timeline) => timeline.len(),
            CursorContent::Plain(lines) => lines.len(),
        }
    }

    pub fn line_text(&self, index: usize) -> Option<&str> {
        match &self.content {
            CursorContent::Empty => None,
            CursorContent::Synced(timeline) => {
                timeline.lines.get(index).map(|l| l.text.as_str())
            }
            CursorContent::Plain(lines) => lines.get(index).map(String::as_str),
        }
    }

    /// Derived rendering classification; nothing active means every line is
    /// still ahead.
    #[allow(dead_code)]
    pub fn phase(&self, index: usize) -> LinePhase {
        match self.active {
            Some(active) if index < active => LinePhase::Past,
            Some(active) if index == active => LinePhase::Active,
            _ => LinePhase::Future,
        }
    }

    /// Apply one snapshot. Returns `true` only when the active index
    /// changed; an unchanged index must not retrigger scrolling downstream.
    pub fn update(&mut self, snapshot: &PlaybackSnapshot) -> bool {
        if !snapshot.is_playing {
            return false;
        }

        let next = match &self.content {
            CursorContent::Empty => None,
            CursorContent::Synced(timeline) => active_synced(timeline, snapshot.position_ms),
            CursorContent::Plain(lines) => {
                active_estimated(lines.len(), snapshot.position_ms, snapshot.duration_ms)
            }
        };

        if next == self.active {
            return false;
        }
        self.active = next;
        true
    }
}

/// Largest `i` with `time[i] <= position`; `None` while the position is
/// still ahead of the first line.
fn active_synced(timeline: &Timeline, position_ms: u64) -> Option<usize> {
    let mut active = None;
    for (i, line) in timeline.lines.iter().enumerate() {
        if line.time_ms <= position_ms {
            active = Some(i);
        } else {
            break;
        }
    }
    active
}

fn active_estimated(line_count: usize, position_ms: u64, duration_ms: u64) -> Option<usize> {
    if line_count == 0 {
        return None;
    }
    let ratio = if duration_ms == 0 {
        0.0
    } else {
        position_ms as f64 / duration_ms as f64
    };
    let index = (ratio * line_count as f64).floor() as usize;
    Some(index.min(line_count - 1))
}
