use crate::models::ResolvedSong;
use std::collections::HashMap;

/// Result of a year lookup, remembered for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Resolved(ResolvedSong),
    /// Lookup ran and found nothing; don't ask again this session
    Unknown,
}

/// Session-scoped memo keyed by normalized now-playing title.
///
/// Also tracks which titles were already used as rounds and the decade of
/// the last accepted round. No eviction: it lives as long as the session.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, CacheEntry>,
    picked: HashMap<String, ResolvedSong>,
    last_decade: Option<i32>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, normalized_title: &str) -> Option<&CacheEntry> {
        self.entries.get(normalized_title)
    }

    pub fn put(&mut self, normalized_title: String, entry: CacheEntry) {
        self.entries.insert(normalized_title, entry);
    }

    pub fn has_been_picked(&self, normalized_title: &str) -> bool {
        self.picked.contains_key(normalized_title)
    }

    pub fn mark_picked(&mut self, normalized_title: String, song: ResolvedSong) {
        self.picked.insert(normalized_title, song);
    }

    pub fn last_decade(&self) -> Option<i32> {
        self.last_decade
    }

    pub fn set_last_decade(&mut self, decade: i32) {
        self.last_decade = Some(decade);
    }

    /// Forget everything: cached lookups, picked titles and the last decade.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.picked.clear();
        self.last_decade = None;
    }
}
