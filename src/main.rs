mod api;
mod config;
mod error;
mod models;
mod services;

use crate::api::AppState;
use crate::config::Config;
use crate::services::{
    GameManager, IcecastNowPlaying, MemoryScoreStore, MusicBrainzClient, RadioBrowserClient,
    RedisScoreStore, ReleaseYearResolver, ResolverConfig, RoundScanner, ScoreStore,
};
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let scores: Arc<dyn ScoreStore> = match &config.redis_url {
        Some(url) => {
            let redis_client = redis::Client::open(url.as_str())?;
            let redis = redis::aio::ConnectionManager::new(redis_client).await?;
            tracing::info!("Connected to Redis, scores will persist");
            Arc::new(RedisScoreStore::new(redis))
        }
        None => {
            tracing::info!("REDIS_URL not set, keeping scores in memory");
            Arc::new(MemoryScoreStore::new())
        }
    };

    // Initialize services
    let directory = Arc::new(RadioBrowserClient::new(
        config.radio_browser_url.clone(),
        config.station_tag.clone(),
        config.station_limit,
    ));
    let now_playing = Arc::new(IcecastNowPlaying::new(
        config.status_path.clone(),
        Duration::from_millis(config.status_timeout_ms),
    ));
    let musicbrainz = Arc::new(MusicBrainzClient::new(
        config.musicbrainz_url.clone(),
        &config.musicbrainz_user_agent,
        config.musicbrainz_rate_per_sec,
    )?);
    let resolver = Arc::new(ReleaseYearResolver::new(
        musicbrainz,
        ResolverConfig {
            min_score: config.resolver_min_score,
            page_continue_score: config.resolver_page_continue_score,
            page_size: config.resolver_page_size,
            max_pages: config.resolver_max_pages,
            require_exact_title_match: config.resolver_exact_title,
        },
    ));

    let scanner = Arc::new(RoundScanner::new(directory, now_playing, resolver));
    let game_manager = Arc::new(GameManager::new(scanner, scores, config.max_rounds));

    let app_state = Arc::new(AppState { game_manager });

    let app = api::router(app_state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,decade_radio=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(allowed)
}
