use crate::error::{AppError, Result};
use crate::models::Score;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "decade-radio:score";

/// Key-value persistence for a player's score.
///
/// Callers treat this as best effort: failures are logged, never fatal.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn load(&self, player: &str) -> Result<Option<Score>>;
    async fn save(&self, player: &str, score: &Score) -> Result<()>;
}

fn score_key(player: &str) -> String {
    format!("{}:{}", KEY_PREFIX, player)
}

#[derive(Clone)]
pub struct RedisScoreStore {
    redis: ConnectionManager,
}

impl RedisScoreStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ScoreStore for RedisScoreStore {
    async fn load(&self, player: &str) -> Result<Option<Score>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(score_key(player)).await?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt stored score: {}", e))),
            None => Ok(None),
        }
    }

    async fn save(&self, player: &str, score: &Score) -> Result<()> {
        let json = serde_json::to_string(score)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode score: {}", e)))?;

        let mut conn = self.redis.clone();
        conn.set::<_, _, ()>(score_key(player), json).await?;
        Ok(())
    }
}

/// Process-local store used when no Redis is configured.
#[derive(Default)]
pub struct MemoryScoreStore {
    scores: RwLock<HashMap<String, Score>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn load(&self, player: &str) -> Result<Option<Score>> {
        Ok(self.scores.read().await.get(&score_key(player)).copied())
    }

    async fn save(&self, player: &str, score: &Score) -> Result<()> {
        self.scores.write().await.insert(score_key(player), *score);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip_per_player() {
        let store = MemoryScoreStore::new();
        assert_eq!(store.load("alice").await.unwrap(), None);

        let score = Score {
            points: 3,
            rounds: 5,
            correct: 3,
        };
        store.save("alice", &score).await.unwrap();

        assert_eq!(store.load("alice").await.unwrap(), Some(score));
        assert_eq!(store.load("bob").await.unwrap(), None);
    }

    #[test]
    fn test_score_key() {
        assert_eq!(score_key("alice"), "decade-radio:score:alice");
    }
}
