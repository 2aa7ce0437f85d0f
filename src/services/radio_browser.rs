use crate::models::StationRecord;
use crate::services::error::LookupError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Source of the candidate station pool for a round.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    /// Fetch a fresh pool, already in probing order.
    async fn fetch_stations(&self) -> Result<Vec<StationRecord>, LookupError>;
}

#[derive(Debug, Clone)]
pub struct RadioBrowserClient {
    base_url: String,
    tag: String,
    limit: usize,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RadioBrowserStation {
    #[serde(default)]
    stationuuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    url_resolved: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    has_extended_info: bool,
}

impl From<RadioBrowserStation> for StationRecord {
    fn from(station: RadioBrowserStation) -> Self {
        // Prefer the URL as listed; radio-browser fills url_resolved after following playlists
        let stream_url = if station.url.trim().is_empty() {
            station.url_resolved.unwrap_or_default()
        } else {
            station.url
        };

        StationRecord {
            id: station.stationuuid,
            name: station.name.trim().to_string(),
            stream_url: stream_url.trim().to_string(),
            embedded_title: station.title.filter(|t| !t.trim().is_empty()),
            has_extended_info: station.has_extended_info,
        }
    }
}

impl RadioBrowserClient {
    pub fn new(base_url: String, tag: String, limit: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tag,
            limit,
            client,
        }
    }

    async fn search(&self) -> Result<Vec<StationRecord>, LookupError> {
        let url = format!("{}/json/stations/search", self.base_url);
        let limit = self.limit.to_string();
        let params = [
            ("order", "clickcount"),
            ("reverse", "true"),
            ("tag", self.tag.as_str()),
            ("limit", limit.as_str()),
            ("has_extended_info", "true"),
        ];

        tracing::debug!("Fetching stations from {} (tag={}, limit={})", url, self.tag, self.limit);

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Station directory error: {}", status);
            return Err(LookupError::Upstream(status.as_u16()));
        }

        let body = response.text().await?;
        parse_station_list(&body)
    }
}

#[async_trait]
impl StationDirectory for RadioBrowserClient {
    async fn fetch_stations(&self) -> Result<Vec<StationRecord>, LookupError> {
        let mut stations = self.search().await?;
        stations.shuffle(&mut rand::thread_rng());

        tracing::info!("Loaded {} candidate stations", stations.len());
        Ok(stations)
    }
}

/// Decode a directory response, keeping only stations that can tell us what is playing.
fn parse_station_list(body: &str) -> Result<Vec<StationRecord>, LookupError> {
    let raw: Vec<RadioBrowserStation> = serde_json::from_str(body)?;

    Ok(raw
        .into_iter()
        .map(StationRecord::from)
        .filter(|s| !s.stream_url.is_empty() && (s.embedded_title.is_some() || s.has_extended_info))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"stationuuid": "a1", "name": "Rock FM ", "url": "http://rock.example:8000/stream",
         "has_extended_info": true},
        {"stationuuid": "b2", "name": "Titled", "url": "http://titled.example/live",
         "title": "Queen - Bohemian Rhapsody", "has_extended_info": false},
        {"stationuuid": "c3", "name": "No info", "url": "http://plain.example/live",
         "has_extended_info": false},
        {"stationuuid": "d4", "name": "No url", "url": "", "has_extended_info": true},
        {"stationuuid": "e5", "name": "Resolved only", "url": "",
         "url_resolved": "http://resolved.example/live", "has_extended_info": true}
    ]"#;

    #[test]
    fn test_parse_station_list_filters_pool() {
        let stations = parse_station_list(FIXTURE).unwrap();
        let ids: Vec<&str> = stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2", "e5"]);

        assert_eq!(stations[0].name, "Rock FM");
        assert_eq!(stations[0].embedded_title, None);
        assert_eq!(
            stations[1].embedded_title.as_deref(),
            Some("Queen - Bohemian Rhapsody")
        );
        assert_eq!(stations[2].stream_url, "http://resolved.example/live");
    }

    #[test]
    fn test_parse_station_list_rejects_non_array() {
        assert!(matches!(
            parse_station_list(r#"{"error": "nope"}"#),
            Err(LookupError::Malformed(_))
        ));
    }
}
