//! LRC timeline parser.
//!
//! Parses line-timestamped lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Minutes are unbounded, seconds are two digits, and the fraction may be
//! 1-3 digits (normalized to centiseconds). Lines that carry no
//! recognizable tag, and tags whose text is empty (instrumental-gap
//! markers), produce no timeline entry.

use once_cell::sync::Lazy;
use regex::Regex;

static TIMESTAMP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+):(\d{2})\.(\d{1,3})\](.*)$").expect("valid LRC tag regex"));

/// A single lyric line with its start offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Offset from the start of the track, in milliseconds.
    pub time_ms: u64,
    /// The lyric text, trimmed, never empty.
    pub text: String,
}

impl LyricLine {
    pub fn new(time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            text: text.into(),
        }
    }
}

/// Parsed lyric lines in input order.
///
/// Well-formed LRC files are already time-ascending, so parsing preserves
/// the file's order instead of re-sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub lines: Vec<LyricLine>,
}

impl Timeline {
    /// Parse LRC text. Unparseable input yields an empty timeline; there is
    /// no error case.
    pub fn parse(raw: &str) -> Self {
        let mut lines = Vec::new();

        for line in raw.lines() {
            let Some(caps) = TIMESTAMP_TAG.captures(line.trim_start()) else {
                continue;
            };

            let (Some(minutes), Some(seconds)) = (
                caps[1].parse::<u64>().ok(),
                caps[2].parse::<u64>().ok(),
            ) else {
                continue;
            };
            let Some(centis) = parse_fraction(&caps[3]) else {
                continue;
            };

            let text = caps[4].trim();
            if text.is_empty() {
                continue;
            }

            lines.push(LyricLine::new(
                minutes * 60_000 + seconds * 1_000 + centis * 10,
                text,
            ));
        }

        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Render back to `[mm:ss.cc]text` lines.
    pub fn to_lrc(&self) -> String {
        self.lines
            .iter()
            .map(|l| {
                let minutes = l.time_ms / 60_000;
                let seconds = (l.time_ms % 60_000) / 1_000;
                let centis = (l.time_ms % 1_000) / 10;
                format!("[{minutes:02}:{seconds:02}.{centis:02}]{}", l.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Normalize a 1-3 digit fraction to centiseconds: right-pad to two digits,
/// truncate a third.
fn parse_fraction(fraction: &str) -> Option<u64> {
    match fraction.len() {
        1 => fraction.parse::<u64>().ok().map(|d| d * 10),
        2 => fraction.parse::<u64>().ok(),
        3 => fraction[..2].parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let timeline = Timeline::parse("[00:12.34]First line\n[00:15.00]Second line");
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.lines[0], LyricLine::new(12_340, "First line"));
        assert_eq!(timeline.lines[1], LyricLine::new(15_000, "Second line"));
    }

    #[test]
    fn test_fraction_widths() {
        // 1 digit pads right, 3 digits truncate to centiseconds.
        let timeline = Timeline::parse("[00:12.5]a\n[00:12.345]b");
        assert_eq!(timeline.lines[0].time_ms, 12_500);
        assert_eq!(timeline.lines[1].time_ms, 12_340);
    }

    #[test]
    fn test_empty_text_dropped_and_order_kept() {
        let timeline = Timeline::parse("[00:12.50]Hello\n[00:15.00]\n[00:10.00]World");
        assert_eq!(
            timeline.lines,
            vec![
                LyricLine::new(12_500, "Hello"),
                LyricLine::new(10_000, "World"),
            ]
        );
    }

    #[test]
    fn test_untagged_and_malformed_lines_ignored() {
        let raw = "\
[ti:Some Song]
just a stray line
[00:12.]no fraction digits
[0:05.00]one-digit seconds
[00:20.00]kept";
        let timeline = Timeline::parse(raw);
        assert_eq!(timeline.lines, vec![LyricLine::new(20_000, "kept")]);
    }

    #[test]
    fn test_no_empty_text_ever() {
        let raw = "[00:01.00]   \n[00:02.00]\t\n[00:03.00]x";
        let timeline = Timeline::parse(raw);
        assert!(timeline.lines.iter().all(|l| !l.text.is_empty()));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_round_trip() {
        let timeline = Timeline::parse("[00:12.50]Hello\n[01:02.03]World");
        assert_eq!(Timeline::parse(&timeline.to_lrc()), timeline);
    }
}
