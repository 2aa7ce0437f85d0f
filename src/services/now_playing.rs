use crate::models::StationRecord;
use crate::services::error::LookupError;
use crate::services::title_parser::SEPARATOR;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

/// Produces the raw now-playing title of a station.
///
/// Implementations never fail: any problem means "no title".
#[async_trait]
pub trait NowPlayingSource: Send + Sync {
    async fn now_playing(&self, station: &StationRecord) -> Option<String>;
}

/// Reads the title from the directory record or the station's Icecast status document.
#[derive(Debug, Clone)]
pub struct IcecastNowPlaying {
    client: Client,
    status_path: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct StatusDocument {
    icestats: IceStats,
}

#[derive(Debug, Deserialize)]
struct IceStats {
    #[serde(default)]
    source: Option<OneOrMany<IcecastSource>>,
}

/// Icecast emits a bare object when a server has a single mount
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

#[derive(Debug, Deserialize)]
struct IcecastSource {
    #[serde(default)]
    server_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl IcecastNowPlaying {
    pub fn new(status_path: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            status_path,
            timeout,
        }
    }

    async fn fetch_status_title(&self, station: &StationRecord) -> Result<Option<String>, LookupError> {
        let status_url = status_url(&station.stream_url, &self.status_path)
            .ok_or_else(|| LookupError::Malformed(format!("invalid stream url {}", station.stream_url)))?;

        tracing::debug!(station = %station.label(), "Fetching station status from {}", status_url);

        let response = self
            .client
            .get(status_url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Upstream(response.status().as_u16()));
        }

        let body = response.text().await?;
        title_from_status(&body, &station.name)
    }
}

#[async_trait]
impl NowPlayingSource for IcecastNowPlaying {
    async fn now_playing(&self, station: &StationRecord) -> Option<String> {
        if let Some(title) = station.embedded_title.as_ref() {
            if title.contains(SEPARATOR) {
                return Some(title.clone());
            }
        }

        match self.fetch_status_title(station).await {
            Ok(title) => title,
            Err(e) => {
                tracing::debug!(station = %station.label(), "Could not fetch station status: {}", e);
                None
            }
        }
    }
}

/// Swap the path of a stream URL for the status document path.
pub fn status_url(stream_url: &str, status_path: &str) -> Option<Url> {
    let mut url = Url::parse(stream_url).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    url.set_path(status_path);
    Some(url)
}

/// Pick the source whose server name matches the station, else the first one.
fn title_from_status(body: &str, station_name: &str) -> Result<Option<String>, LookupError> {
    let document: StatusDocument = serde_json::from_str(body)?;

    let sources = match document.icestats.source {
        Some(OneOrMany::Many(sources)) => sources,
        Some(OneOrMany::One(source)) => vec![source],
        None => return Ok(None),
    };

    let source = sources
        .iter()
        .find(|s| s.server_name.as_deref() == Some(station_name))
        .or_else(|| sources.first());

    Ok(source
        .and_then(|s| s.title.as_ref())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;

    /// Serve `app` on an ephemeral local port for the lifetime of the test.
    pub(crate) async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        addr
    }

    async fn icecast_server() -> SocketAddr {
        let app = Router::new()
            .route(
                "/status-json.xsl",
                get(|| async {
                    Json(json!({"icestats": {"source": {
                        "server_name": "Rock FM", "title": "Queen - Innuendo"
                    }}}))
                }),
            )
            .route(
                "/broken.xsl",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/slow.xsl",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Json(json!({"icestats": {"source": {"title": "Too - Late"}}}))
                }),
            );
        serve(app).await
    }

    fn station(name: &str, url: &str, title: Option<&str>) -> StationRecord {
        StationRecord {
            id: "id".to_string(),
            name: name.to_string(),
            stream_url: url.to_string(),
            embedded_title: title.map(str::to_string),
            has_extended_info: true,
        }
    }

    #[test]
    fn test_status_url_replaces_path() {
        let url = status_url("http://radio.example:8000/live/stream.mp3", "/status-json.xsl").unwrap();
        assert_eq!(url.as_str(), "http://radio.example:8000/status-json.xsl");

        assert!(status_url("not a url", "/status-json.xsl").is_none());
        assert!(status_url("mailto:dj@example.com", "/status-json.xsl").is_none());
    }

    #[test]
    fn test_title_prefers_matching_server_name() {
        let body = r#"{"icestats": {"source": [
            {"server_name": "Other", "title": "Wrong - Song"},
            {"server_name": "Rock FM", "title": "Queen - Innuendo"}
        ]}}"#;
        assert_eq!(
            title_from_status(body, "Rock FM").unwrap().as_deref(),
            Some("Queen - Innuendo")
        );
    }

    #[test]
    fn test_title_falls_back_to_first_source() {
        let body = r#"{"icestats": {"source": [
            {"server_name": "Other", "title": "First - Song"},
            {"server_name": "Another", "title": "Second - Song"}
        ]}}"#;
        assert_eq!(
            title_from_status(body, "Rock FM").unwrap().as_deref(),
            Some("First - Song")
        );
    }

    #[test]
    fn test_single_source_object() {
        let body = r#"{"icestats": {"source": {"server_name": "Solo", "title": "Blondie - Atomic"}}}"#;
        assert_eq!(
            title_from_status(body, "Anything").unwrap().as_deref(),
            Some("Blondie - Atomic")
        );
    }

    #[test]
    fn test_missing_or_empty_title() {
        let body = r#"{"icestats": {"source": [{"server_name": "Rock FM", "title": "  "}]}}"#;
        assert_eq!(title_from_status(body, "Rock FM").unwrap(), None);

        let body = r#"{"icestats": {}}"#;
        assert_eq!(title_from_status(body, "Rock FM").unwrap(), None);

        assert!(title_from_status("<html>", "Rock FM").is_err());
    }

    #[tokio::test]
    async fn test_embedded_title_skips_network() {
        let source = IcecastNowPlaying::new("/status-json.xsl".to_string(), Duration::from_millis(10));
        let s = station("A", "not a url", Some("Queen - Bohemian Rhapsody"));
        assert_eq!(
            source.now_playing(&s).await.as_deref(),
            Some("Queen - Bohemian Rhapsody")
        );
    }

    #[tokio::test]
    async fn test_unparsable_stream_url_is_no_title() {
        let source = IcecastNowPlaying::new("/status-json.xsl".to_string(), Duration::from_millis(10));
        let s = station("A", "not a url", Some("Just a station slogan"));
        assert_eq!(source.now_playing(&s).await, None);
    }

    #[tokio::test]
    async fn test_fetches_status_document() {
        let addr = icecast_server().await;
        let source = IcecastNowPlaying::new("/status-json.xsl".to_string(), Duration::from_secs(2));
        let s = station("Rock FM", &format!("http://{}/live/stream.mp3", addr), Some("Rock FM 24/7"));

        assert_eq!(source.now_playing(&s).await.as_deref(), Some("Queen - Innuendo"));
    }

    #[tokio::test]
    async fn test_error_status_is_no_title() {
        let addr = icecast_server().await;
        let source = IcecastNowPlaying::new("/broken.xsl".to_string(), Duration::from_secs(2));
        let s = station("Rock FM", &format!("http://{}/stream", addr), None);

        assert!(matches!(
            source.fetch_status_title(&s).await,
            Err(LookupError::Upstream(500))
        ));
        assert_eq!(source.now_playing(&s).await, None);
    }

    #[tokio::test]
    async fn test_slow_status_times_out() {
        let addr = icecast_server().await;
        let source = IcecastNowPlaying::new("/slow.xsl".to_string(), Duration::from_millis(100));
        let s = station("Rock FM", &format!("http://{}/stream", addr), None);

        let started = std::time::Instant::now();
        assert_eq!(source.now_playing(&s).await, None);
        assert!(started.elapsed() < Duration::from_millis(450));
    }

    #[tokio::test]
    async fn test_unreachable_station_is_no_title() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = IcecastNowPlaying::new("/status-json.xsl".to_string(), Duration::from_secs(2));
        let s = station("Gone", &format!("http://{}/stream", addr), None);
        assert_eq!(source.now_playing(&s).await, None);
    }
}
