use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Running score; this is the part that gets persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub points: u32,
    pub rounds: u32,
    pub correct: u32,
}

impl Score {
    /// Fraction of answered rounds that were guessed correctly, 0.0 before any round.
    pub fn accuracy(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.correct as f64 / self.rounds as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub artist: String,
    pub track: String,
    pub year: String,
    /// Decade of the release year
    pub actual: i32,
    /// `None` when the answer was revealed without a guess
    pub guessed: Option<i32>,
    pub correct: bool,
    pub station: String,
    pub answered_at: DateTime<Utc>,
}

/// The round as shown to the player. Year and decade stay hidden until answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundView {
    pub round_number: u32,
    pub artist: String,
    pub track: String,
    pub station_name: String,
    pub stream_url: String,
    pub answered: bool,
    pub year: Option<String>,
    pub decade: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundStart {
    Started { round: RoundView },
    /// No station produced an acceptable song; the player has to try again.
    Exhausted { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: Uuid,
    pub player: String,
    pub max_rounds: u32,
    pub score: Score,
    pub finished: bool,
    /// A round scan is running for this game
    pub scanning: bool,
    pub current_round: Option<RoundView>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 64))]
    pub player: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GuessRequest {
    /// A year or a decade start; only the decade is compared
    #[validate(range(min = 1000, max = 2999))]
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub points: u32,
    pub rounds: u32,
    pub correct: u32,
    pub accuracy: f64,
    pub results: Vec<RoundResult>,
}

/// Progress update emitted while a round scan walks the station pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ScanProgress {
    #[serde(rename = "started")]
    Started { stations: usize },
    #[serde(rename = "checking")]
    Checking {
        index: usize,
        total: usize,
        station: String,
    },
    #[serde(rename = "skipped")]
    Skipped { station: String, reason: String },
    #[serde(rename = "resolved")]
    Resolved {
        artist: String,
        track: String,
        year: String,
    },
    #[serde(rename = "matched")]
    Matched {
        station: String,
        artist: String,
        track: String,
    },
    #[serde(rename = "exhausted")]
    Exhausted { checked: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let score = Score {
            points: 7,
            rounds: 10,
            correct: 7,
        };
        assert!((score.accuracy() - 0.7).abs() < f64::EPSILON);
        assert_eq!(Score::default().accuracy(), 0.0);
    }

    #[test]
    fn test_round_start_serialization() {
        let value = serde_json::to_value(RoundStart::Exhausted {
            message: "try again".to_string(),
        })
        .unwrap();
        assert_eq!(value["status"], "exhausted");

        let progress = serde_json::to_value(ScanProgress::Started { stations: 3 }).unwrap();
        assert_eq!(progress["type"], "started");
        assert_eq!(progress["stations"], 3);
    }

    #[test]
    fn test_request_validation() {
        assert!(GuessRequest { value: 1984 }.validate().is_ok());
        assert!(GuessRequest { value: 42 }.validate().is_err());

        assert!(CreateGameRequest::default().validate().is_ok());
        let empty_player = CreateGameRequest {
            player: Some(String::new()),
            max_rounds: None,
        };
        assert!(empty_player.validate().is_err());
        let too_many_rounds = CreateGameRequest {
            player: None,
            max_rounds: Some(500),
        };
        assert!(too_many_rounds.validate().is_err());
    }
}
