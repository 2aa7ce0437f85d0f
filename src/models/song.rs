use serde::{Deserialize, Serialize};

/// Artist/track pair split out of a now-playing title.
///
/// Only built by `services::title_parser::parse`, so both fields are
/// non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongIdentity {
    artist: String,
    track: String,
}

impl SongIdentity {
    pub(crate) fn new(artist: String, track: String) -> Self {
        Self { artist, track }
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn track(&self) -> &str {
        &self.track
    }
}

/// A song whose original release year has been verified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedSong {
    pub artist: String,
    pub track: String,
    /// Four ASCII digits
    pub year: String,
    /// Always `year - year % 10`
    pub decade: i32,
}

impl ResolvedSong {
    /// Returns `None` unless `year` is exactly four ASCII digits.
    pub fn new(identity: &SongIdentity, year: &str) -> Option<Self> {
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let numeric: i32 = year.parse().ok()?;

        Some(Self {
            artist: identity.artist().to_string(),
            track: identity.track().to_string(),
            year: year.to_string(),
            decade: decade_of(numeric),
        })
    }
}

/// Start year of the 10-year bucket containing `year` (1987 -> 1980).
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}
