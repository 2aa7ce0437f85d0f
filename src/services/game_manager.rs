use crate::error::{AppError, Result};
use crate::models::{GameSnapshot, GameSummary, RoundResult, RoundStart, ScanProgress};
use crate::services::game_session::GameSession;
use crate::services::round_scanner::RoundScanner;
use crate::services::score_store::ScoreStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

const DEFAULT_PLAYER: &str = "default";

/// Owns every live game session plus the shared scanner and score store.
#[derive(Clone)]
pub struct GameManager {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<GameSession>>>>>,
    scanner: Arc<RoundScanner>,
    scores: Arc<dyn ScoreStore>,
    default_max_rounds: u32,
}

impl GameManager {
    pub fn new(scanner: Arc<RoundScanner>, scores: Arc<dyn ScoreStore>, default_max_rounds: u32) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            scanner,
            scores,
            default_max_rounds,
        }
    }

    pub async fn create_game(&self, player: Option<String>, max_rounds: Option<u32>) -> GameSnapshot {
        let player = player
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER.to_string());
        let max_rounds = max_rounds.unwrap_or(self.default_max_rounds);

        let mut session = GameSession::new(player.clone(), max_rounds);
        match self.scores.load(&player).await {
            Ok(Some(score)) => {
                tracing::info!("Restored score for {}: {:?}", player, score);
                session = session.with_score(score);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load score for {}: {}", player, e),
        }

        let snapshot = session.snapshot();
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::new(Mutex::new(session)));

        tracing::info!("Created game {} for {}", snapshot.id, snapshot.player);
        snapshot
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<GameSnapshot> {
        let session = self.session(id).await?;
        let session = session.lock().await;
        Ok(session.snapshot())
    }

    pub async fn summary(&self, id: Uuid) -> Result<GameSummary> {
        let session = self.session(id).await?;
        let session = session.lock().await;
        Ok(session.summary())
    }

    /// The session lock is only taken to claim the cache and to install the
    /// outcome; readers are not blocked while stations are probed. Dropping
    /// the future mid-scan releases the cache and leaves no round behind.
    pub async fn start_round(
        &self,
        id: Uuid,
        progress: Option<mpsc::Sender<ScanProgress>>,
    ) -> Result<RoundStart> {
        let session = self.session(id).await?;
        let mut cache = session.lock().await.begin_round()?;

        let outcome = self.scanner.scan(&mut cache, progress.as_ref()).await;

        // Installed before the cache guard drops so no second scan can slip in
        let start = session.lock().await.finish_round(outcome);
        Ok(start)
    }

    pub async fn submit_guess(&self, id: Uuid, value: i32) -> Result<RoundResult> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        let result = session.submit_guess(value)?;
        self.persist(&session).await;
        Ok(result)
    }

    pub async fn reveal(&self, id: Uuid) -> Result<RoundResult> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        let result = session.reveal()?;
        self.persist(&session).await;
        Ok(result)
    }

    pub async fn restart(&self, id: Uuid) -> Result<GameSnapshot> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.restart()?;
        self.persist(&session).await;

        tracing::info!("Restarted game {}", id);
        Ok(session.snapshot())
    }

    pub async fn end_game(&self, id: Uuid) -> Result<()> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| tracing::info!("Ended game {}", id))
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<GameSession>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    /// Best effort; a failed write never fails the request.
    async fn persist(&self, session: &GameSession) {
        if let Err(e) = self.scores.save(session.player(), &session.score()).await {
            tracing::warn!("Failed to save score for {}: {}", session.player(), e);
        }
    }
}
