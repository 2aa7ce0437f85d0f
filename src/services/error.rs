use thiserror::Error;

/// Failures while probing a single station or looking up a single song.
///
/// None of these leave the scanner: each one turns into "skip this station".
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned status {0}")]
    Upstream(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No artist/track split in {0:?}")]
    ParseFailure(String),

    #[error("No release year found")]
    NoYearFound,
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LookupError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            LookupError::Upstream(status.as_u16())
        } else {
            LookupError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        LookupError::Malformed(e.to_string())
    }
}
