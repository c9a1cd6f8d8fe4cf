//! Raw track source: reads scraped tracklists into `TrackRecord`s.
//!
//! Two input shapes are accepted:
//! - text, one `ARTIST - TITLE` per line as the tracklist page renders it
//!   (split on the first `" - "`; `#` comments and blank lines ignored)
//! - `.json`, an array of `{ "artist": .., "title": .. }` objects
//!
//! Source indices run across all files in the order given, so first-seen
//! order survives concatenation of several tracklists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::errors::TrackError;
use crate::models::TrackRecord;

/// Records read from one or more tracklists, plus the ones that were rejected
#[derive(Debug, Default)]
pub struct ParsedTracklist {
    pub records: Vec<TrackRecord>,
    pub invalid: Vec<TrackError>,
}

impl ParsedTracklist {
    /// Total entries seen, valid or not; the next source index
    pub fn entries_seen(&self) -> usize {
        self.records.len() + self.invalid.len()
    }

    fn push(&mut self, artist: &str, title: &str) {
        match TrackRecord::new(artist, title, self.entries_seen()) {
            Ok(record) => self.records.push(record),
            Err(e) => self.invalid.push(e),
        }
    }

    fn extend_from_text(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (artist, title) = split_track_line(line);
            self.push(artist, title);
        }
    }

    fn extend_from_json(&mut self, entries: Vec<RawEntry>) {
        for entry in entries {
            self.push(&entry.artist, &entry.title);
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
}

/// Split a scraped `ARTIST(S) - TITLE` value.
/// Lines without a separator become artist-only (empty title), which
/// `TrackRecord::new` then rejects.
pub fn split_track_line(line: &str) -> (&str, &str) {
    match line.split_once(" - ") {
        Some((artist, title)) => (artist.trim(), title.trim()),
        None => (line.trim(), ""),
    }
}

/// Parse tracklist text held in memory
pub fn parse_tracklist_text(text: &str) -> ParsedTracklist {
    let mut parsed = ParsedTracklist::default();
    parsed.extend_from_text(text);
    parsed
}

/// Read and concatenate tracklist files in order
pub fn load_tracklists(paths: &[PathBuf]) -> Result<ParsedTracklist> {
    let mut parsed = ParsedTracklist::default();
    for path in paths {
        load_into(&mut parsed, path)?;
        tracing::debug!(path = %path.display(), entries = parsed.entries_seen(), "tracklist.loaded");
    }
    Ok(parsed)
}

fn load_into(parsed: &mut ParsedTracklist, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tracklist {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let entries: Vec<RawEntry> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse tracklist JSON {:?}", path))?;
        parsed.extend_from_json(entries);
    } else {
        parsed.extend_from_text(&text);
    }
    Ok(())
}
