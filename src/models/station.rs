use serde::{Deserialize, Serialize};

/// A candidate station from the directory. Immutable for the duration of a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub stream_url: String,
    /// Now-playing title as reported by the directory itself, if any
    pub embedded_title: Option<String>,
    pub has_extended_info: bool,
}

impl StationRecord {
    /// Name used in logs and progress events; falls back to the stream URL.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.stream_url
        } else {
            &self.name
        }
    }
}
