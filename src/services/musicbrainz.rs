//! MusicBrainz recording search
//!
//! Only the search endpoint is used; release years are derived from the
//! releases embedded in each recording (`inc=releases`).

use crate::services::error::LookupError;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::num::NonZeroU32;
use std::time::Duration;

/// One page of recording search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingSearchPage {
    /// Total number of matches the service knows about
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Recording {
    /// Relevance, 0-100
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub releases: Option<Vec<Release>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    /// "Official", "Promotion", "Bootleg", ...
    #[serde(default)]
    pub status: Option<String>,
    /// YYYY, YYYY-MM or YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,
}

impl Recording {
    pub fn releases(&self) -> &[Release] {
        self.releases.as_deref().unwrap_or(&[])
    }
}

/// Older mirrors send the score as a string
fn deserialize_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(u32),
        Text(String),
    }

    match Option::<RawScore>::deserialize(deserializer)? {
        Some(RawScore::Number(n)) => Ok(n),
        Some(RawScore::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
        None => Ok(0),
    }
}

/// Paged recording search. Abstracted so the resolver can run against fixtures.
#[async_trait]
pub trait RecordingSearch: Send + Sync {
    async fn search_recordings(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<RecordingSearchPage, LookupError>;
}

/// Lucene query for official releases of `track` by `artist`.
pub fn recording_query(artist: &str, track: &str) -> String {
    format!(
        "recording:({}) AND artist:({}) AND status:official",
        escape_lucene(track),
        escape_lucene(artist)
    )
}

fn escape_lucene(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(
            c,
            '+' | '-' | '&' | '|' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | '*'
                | '?' | ':' | '\\' | '/'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct MusicBrainzClient {
    base_url: String,
    http_client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl MusicBrainzClient {
    pub fn new(base_url: String, user_agent: &str, requests_per_second: u32) -> Result<Self, LookupError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl RecordingSearch for MusicBrainzClient {
    async fn search_recordings(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<RecordingSearchPage, LookupError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/ws/2/recording/", self.base_url);
        let limit = limit.to_string();
        let offset = offset.to_string();
        let params = [
            ("query", query),
            ("fmt", "json"),
            ("inc", "releases"),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];

        tracing::debug!(query = %query, offset = %offset, "Querying MusicBrainz");

        let response = self.http_client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            tracing::warn!("MusicBrainz returned {}: {}", status, snippet);
            return Err(LookupError::Upstream(status.as_u16()));
        }

        let body = response.text().await?;
        let page: RecordingSearchPage = serde_json::from_str(&body)?;

        tracing::debug!(
            "MusicBrainz page: {} recordings (count={}, offset={})",
            page.recordings.len(),
            page.count,
            page.offset
        );

        Ok(page)
    }
}
