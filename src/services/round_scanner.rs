//! Round Scanner
//!
//! Walks a freshly fetched, shuffled station pool one station at a time:
//! now-playing title -> artist/track split -> cached or fresh year lookup ->
//! decade rotation check. The first station that passes every step becomes
//! the round; the rest of the pool is never probed.

use crate::models::{ResolvedSong, ScanProgress, StationRecord};
use crate::services::error::LookupError;
use crate::services::now_playing::NowPlayingSource;
use crate::services::radio_browser::StationDirectory;
use crate::services::resolution_cache::{CacheEntry, ResolutionCache};
use crate::services::title_parser;
use crate::services::year_resolver::YearLookup;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Match(ResolvedSong, StationRecord),
    /// Every candidate was probed and none was acceptable
    Exhausted,
}

/// Why a station did not produce the round
#[derive(Debug, thiserror::Error)]
enum Skip {
    #[error("no now-playing title")]
    NoTitle,
    #[error("already used in an earlier round")]
    AlreadyPicked,
    #[error("already seen in this scan")]
    SeenThisScan,
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("decade {0}s was used last round")]
    SameDecade(i32),
}

pub struct RoundScanner {
    directory: Arc<dyn StationDirectory>,
    now_playing: Arc<dyn NowPlayingSource>,
    years: Arc<dyn YearLookup>,
}

impl RoundScanner {
    pub fn new(
        directory: Arc<dyn StationDirectory>,
        now_playing: Arc<dyn NowPlayingSource>,
        years: Arc<dyn YearLookup>,
    ) -> Self {
        Self {
            directory,
            now_playing,
            years,
        }
    }

    /// Run one scan against the session's cache.
    ///
    /// Stations are probed strictly in sequence. Acceptance returns straight
    /// out of the loop, so no further station is touched once a match exists.
    pub async fn scan(
        &self,
        cache: &mut ResolutionCache,
        progress: Option<&mpsc::Sender<ScanProgress>>,
    ) -> RoundOutcome {
        let stations = match self.directory.fetch_stations().await {
            Ok(stations) => stations,
            Err(e) => {
                tracing::warn!("Failed to load stations: {}", e);
                Vec::new()
            }
        };

        let total = stations.len();
        report(progress, ScanProgress::Started { stations: total }).await;

        let mut seen_this_scan = HashSet::new();

        for (index, station) in stations.into_iter().enumerate() {
            report(
                progress,
                ScanProgress::Checking {
                    index: index + 1,
                    total,
                    station: station.label().to_string(),
                },
            )
            .await;

            match self.probe(&station, cache, &mut seen_this_scan, progress).await {
                Ok((normalized, song)) => {
                    cache.mark_picked(normalized, song.clone());
                    cache.set_last_decade(song.decade);

                    tracing::info!(
                        station = %station.label(),
                        "Match found: {} - {} ({})",
                        song.artist,
                        song.track,
                        song.year
                    );
                    report(
                        progress,
                        ScanProgress::Matched {
                            station: station.label().to_string(),
                            artist: song.artist.clone(),
                            track: song.track.clone(),
                        },
                    )
                    .await;

                    return RoundOutcome::Match(song, station);
                }
                Err(skip) => {
                    tracing::debug!(station = %station.label(), "Skipping station: {}", skip);
                    report(
                        progress,
                        ScanProgress::Skipped {
                            station: station.label().to_string(),
                            reason: skip.to_string(),
                        },
                    )
                    .await;
                }
            }
        }

        tracing::info!("Scan exhausted {} stations without a match", total);
        report(progress, ScanProgress::Exhausted { checked: total }).await;
        RoundOutcome::Exhausted
    }

    async fn probe(
        &self,
        station: &StationRecord,
        cache: &mut ResolutionCache,
        seen_this_scan: &mut HashSet<String>,
        progress: Option<&mpsc::Sender<ScanProgress>>,
    ) -> Result<(String, ResolvedSong), Skip> {
        let raw = self.now_playing.now_playing(station).await.ok_or(Skip::NoTitle)?;

        let normalized = title_parser::normalize(&raw);
        if cache.has_been_picked(&normalized) {
            return Err(Skip::AlreadyPicked);
        }
        if !seen_this_scan.insert(normalized.clone()) {
            return Err(Skip::SeenThisScan);
        }

        let identity = title_parser::parse(&normalized)
            .ok_or_else(|| LookupError::ParseFailure(normalized.clone()))?;

        let entry = match cache.get(&normalized) {
            Some(entry) => {
                tracing::debug!("Cache hit for {:?}", normalized);
                entry.clone()
            }
            None => {
                let entry = self
                    .years
                    .resolve_year(identity.artist(), identity.track())
                    .await
                    .and_then(|year| ResolvedSong::new(&identity, &year))
                    .map(CacheEntry::Resolved)
                    .unwrap_or(CacheEntry::Unknown);
                cache.put(normalized.clone(), entry.clone());
                entry
            }
        };

        let song = match entry {
            CacheEntry::Resolved(song) => song,
            CacheEntry::Unknown => return Err(LookupError::NoYearFound.into()),
        };

        report(
            progress,
            ScanProgress::Resolved {
                artist: song.artist.clone(),
                track: song.track.clone(),
                year: song.year.clone(),
            },
        )
        .await;

        if cache.last_decade() == Some(song.decade) {
            return Err(Skip::SameDecade(song.decade));
        }

        Ok((normalized, song))
    }
}

async fn report(progress: Option<&mpsc::Sender<ScanProgress>>, event: ScanProgress) {
    if let Some(tx) = progress {
        let _ = tx.send(event).await;
    }
}
