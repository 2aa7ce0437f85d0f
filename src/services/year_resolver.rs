//! Release-Year Resolver
//!
//! Finds the original release year of a song by searching recordings,
//! dropping low-relevance hits, and taking the earliest dated official
//! release among the rest. Releases are ordered by date only, never by
//! relevance, so later reissues cannot win.

use crate::services::error::LookupError;
use crate::services::musicbrainz::{recording_query, Recording, RecordingSearch};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves an artist/track pair to a four-digit year.
#[async_trait]
pub trait YearLookup: Send + Sync {
    /// `None` when no qualifying release exists or the lookup failed.
    async fn resolve_year(&self, artist: &str, track: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Recordings scoring below this are ignored
    pub min_score: u32,
    /// Fetch another page only while the lowest score on the current page reaches this
    pub page_continue_score: u32,
    pub page_size: usize,
    pub max_pages: usize,
    /// Keep only recordings whose title equals the track (case-insensitive)
    pub require_exact_title_match: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_score: 75,
            page_continue_score: 75,
            page_size: 100,
            max_pages: 5,
            require_exact_title_match: false,
        }
    }
}

pub struct ReleaseYearResolver {
    search: Arc<dyn RecordingSearch>,
    config: ResolverConfig,
}

impl ReleaseYearResolver {
    pub fn new(search: Arc<dyn RecordingSearch>, config: ResolverConfig) -> Self {
        Self { search, config }
    }

    pub async fn lookup(&self, artist: &str, track: &str) -> Result<String, LookupError> {
        let query = recording_query(artist, track);
        let recordings = self.collect_recordings(&query).await?;

        tracing::debug!(
            "Collected {} recordings for {} - {}",
            recordings.len(),
            artist,
            track
        );

        earliest_official_year(&recordings, track, &self.config).ok_or(LookupError::NoYearFound)
    }

    async fn collect_recordings(&self, query: &str) -> Result<Vec<Recording>, LookupError> {
        let page_size = self.config.page_size.max(1);
        let mut recordings = Vec::new();
        let mut offset = 0;

        for page_index in 0..self.config.max_pages.max(1) {
            let page = match self.search.search_recordings(query, page_size, offset).await {
                Ok(page) => page,
                Err(e) if page_index == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!("Stopping pagination at offset {}: {}", offset, e);
                    break;
                }
            };

            let fetched = page.recordings.len();
            let min_score = page.recordings.iter().map(|r| r.score).min();
            recordings.extend(page.recordings);
            offset += fetched;

            let has_more = page.count > offset;
            match min_score {
                Some(min) if has_more && min >= self.config.page_continue_score => continue,
                _ => break,
            }
        }

        Ok(recordings)
    }
}

#[async_trait]
impl YearLookup for ReleaseYearResolver {
    async fn resolve_year(&self, artist: &str, track: &str) -> Option<String> {
        match self.lookup(artist, track).await {
            Ok(year) => Some(year),
            Err(e) => {
                tracing::debug!("No year for {} - {}: {}", artist, track, e);
                None
            }
        }
    }
}

/// Year of the earliest dated official release among relevant recordings.
pub fn earliest_official_year(
    recordings: &[Recording],
    track: &str,
    config: &ResolverConfig,
) -> Option<String> {
    recordings
        .iter()
        .filter(|r| r.score >= config.min_score)
        .filter(|r| !config.require_exact_title_match || titles_match(&r.title, track))
        .flat_map(|r| r.releases())
        .filter(|release| {
            release
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("official"))
        })
        .filter_map(|release| release.date.as_deref())
        .filter(|date| has_year_prefix(date))
        .min()
        .map(|date| date[..4].to_string())
}

fn titles_match(recording_title: &str, track: &str) -> bool {
    recording_title.trim().to_lowercase() == track.trim().to_lowercase()
}

fn has_year_prefix(date: &str) -> bool {
    date.len() >= 4 && date.as_bytes()[..4].iter().all(u8::is_ascii_digit)
}
