use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Station directory host (radio-browser mirror)
    pub radio_browser_url: String,
    pub station_tag: String,
    pub station_limit: usize,
    /// Metadata host. May point at a caching proxy with the same response shape.
    pub musicbrainz_url: String,
    pub musicbrainz_user_agent: String,
    pub musicbrainz_rate_per_sec: u32,
    /// Path that replaces a stream URL's path to reach the Icecast status document
    pub status_path: String,
    pub status_timeout_ms: u64,
    pub resolver_min_score: u32,
    pub resolver_page_continue_score: u32,
    pub resolver_page_size: usize,
    pub resolver_max_pages: usize,
    pub resolver_exact_title: bool,
    pub max_rounds: u32,
    /// Scores persist in Redis when set, in memory otherwise
    pub redis_url: Option<String>,
    /// Allowed CORS origins (comma-separated). Use "*" for any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_rounds = parse_or("MAX_ROUNDS", 10u32);
        if max_rounds == 0 {
            return Err(anyhow::anyhow!("MAX_ROUNDS must be at least 1"));
        }

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_or("SERVER_PORT", 8000),
            radio_browser_url: env::var("RADIO_BROWSER_URL")
                .unwrap_or_else(|_| "https://all.api.radio-browser.info".to_string()),
            station_tag: env::var("STATION_TAG").unwrap_or_else(|_| "rock".to_string()),
            station_limit: parse_or("STATION_LIMIT", 60),
            musicbrainz_url: env::var("MUSICBRAINZ_URL")
                .unwrap_or_else(|_| "https://musicbrainz.org".to_string()),
            musicbrainz_user_agent: env::var("MUSICBRAINZ_USER_AGENT")
                .unwrap_or_else(|_| "DecadeRadio/0.1 (decade-radio@example.com)".to_string()),
            musicbrainz_rate_per_sec: parse_or("MUSICBRAINZ_RATE_PER_SEC", 1),
            status_path: env::var("STATUS_PATH")
                .unwrap_or_else(|_| "/status-json.xsl".to_string()),
            status_timeout_ms: parse_or("STATUS_TIMEOUT_MS", 4000),
            resolver_min_score: parse_or("RESOLVER_MIN_SCORE", 75),
            resolver_page_continue_score: parse_or("RESOLVER_PAGE_CONTINUE_SCORE", 75),
            resolver_page_size: parse_or("RESOLVER_PAGE_SIZE", 100),
            resolver_max_pages: parse_or("RESOLVER_MAX_PAGES", 5),
            resolver_exact_title: parse_or("RESOLVER_EXACT_TITLE", false),
            max_rounds,
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
            cors_origins,
        })
    }
}

/// Read `key` from the environment, keeping `default` when unset or unparsable.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {:?} for {}, using {:?}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}
