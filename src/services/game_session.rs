use crate::error::{AppError, Result};
use crate::models::{
    decade_of, GameSnapshot, GameSummary, ResolvedSong, RoundResult, RoundStart, RoundView,
    Score, StationRecord,
};
use crate::services::resolution_cache::ResolutionCache;
use crate::services::round_scanner::RoundOutcome;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct ActiveRound {
    number: u32,
    song: ResolvedSong,
    station: StationRecord,
    answered: bool,
}

impl ActiveRound {
    fn view(&self) -> RoundView {
        RoundView {
            round_number: self.number,
            artist: self.song.artist.clone(),
            track: self.song.track.clone(),
            station_name: self.station.label().to_string(),
            stream_url: self.station.stream_url.clone(),
            answered: self.answered,
            year: self.answered.then(|| self.song.year.clone()),
            decade: self.answered.then_some(self.song.decade),
        }
    }
}

/// One player's game: score, round history and the session's lookup memory.
///
/// The cache sits behind its own lock. A scan holds that lock for its whole
/// run, so the rest of the session stays readable while stations are probed
/// and a held cache lock is what marks a scan as running.
pub struct GameSession {
    id: Uuid,
    player: String,
    max_rounds: u32,
    score: Score,
    results: Vec<RoundResult>,
    cache: Arc<Mutex<ResolutionCache>>,
    current: Option<ActiveRound>,
}

impl GameSession {
    pub fn new(player: String, max_rounds: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            player,
            max_rounds: max_rounds.max(1),
            score: Score::default(),
            results: Vec::new(),
            cache: Arc::new(Mutex::new(ResolutionCache::new())),
            current: None,
        }
    }

    /// Continue from a previously persisted score.
    pub fn with_score(mut self, score: Score) -> Self {
        self.score = score;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn is_finished(&self) -> bool {
        self.score.rounds >= self.max_rounds
    }

    pub fn is_scanning(&self) -> bool {
        self.cache.try_lock().is_err()
    }

    /// Claim the cache for a round scan.
    ///
    /// The returned guard is the scan's exclusive handle; while it is alive
    /// further scans and restarts are refused with `RoundInProgress`.
    pub fn begin_round(&mut self) -> Result<OwnedMutexGuard<ResolutionCache>> {
        if self.is_finished() {
            return Err(AppError::GameOver(self.max_rounds));
        }
        if self.current.as_ref().is_some_and(|round| !round.answered) {
            return Err(AppError::RoundInProgress);
        }

        let cache = self
            .cache
            .clone()
            .try_lock_owned()
            .map_err(|_| AppError::RoundInProgress)?;
        self.current = None;
        Ok(cache)
    }

    /// Install the outcome of a scan started with `begin_round`. The year stays
    /// hidden in the returned round.
    pub fn finish_round(&mut self, outcome: RoundOutcome) -> RoundStart {
        match outcome {
            RoundOutcome::Match(song, station) => {
                let round = ActiveRound {
                    number: self.score.rounds + 1,
                    song,
                    station,
                    answered: false,
                };
                let view = round.view();
                self.current = Some(round);
                RoundStart::Started { round: view }
            }
            RoundOutcome::Exhausted => RoundStart::Exhausted {
                message: "No station is playing a song we could date. Try again.".to_string(),
            },
        }
    }

    /// Score a guess; `value` may be a year or a decade, only its decade counts.
    pub fn submit_guess(&mut self, value: i32) -> Result<RoundResult> {
        if self.is_finished() {
            return Err(AppError::GameOver(self.max_rounds));
        }
        let actual = self.pending_round()?.song.decade;
        let correct = decade_of(value) == actual;
        self.answer(Some(value), correct)
    }

    /// Give up on the round: counts as a played, incorrect round.
    pub fn reveal(&mut self) -> Result<RoundResult> {
        self.pending_round()?;
        self.answer(None, false)
    }

    /// Fresh score and history; picked songs, decade rotation and cached lookups are forgotten.
    pub fn restart(&mut self) -> Result<()> {
        self.cache
            .try_lock()
            .map_err(|_| AppError::RoundInProgress)?
            .clear();
        self.score = Score::default();
        self.results.clear();
        self.current = None;
        Ok(())
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            points: self.score.points,
            rounds: self.score.rounds,
            correct: self.score.correct,
            accuracy: self.score.accuracy(),
            results: self.results.clone(),
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            player: self.player.clone(),
            max_rounds: self.max_rounds,
            score: self.score,
            finished: self.is_finished(),
            scanning: self.is_scanning(),
            current_round: self.current.as_ref().map(ActiveRound::view),
        }
    }

    fn pending_round(&self) -> Result<&ActiveRound> {
        self.current
            .as_ref()
            .filter(|round| !round.answered)
            .ok_or(AppError::NoActiveRound)
    }

    fn answer(&mut self, guessed: Option<i32>, correct: bool) -> Result<RoundResult> {
        let round = self
            .current
            .as_mut()
            .filter(|round| !round.answered)
            .ok_or(AppError::NoActiveRound)?;
        round.answered = true;

        let result = RoundResult {
            artist: round.song.artist.clone(),
            track: round.song.track.clone(),
            year: round.song.year.clone(),
            actual: round.song.decade,
            guessed,
            correct,
            station: round.station.label().to_string(),
            answered_at: Utc::now(),
        };

        self.score.rounds += 1;
        if correct {
            self.score.points += 1;
            self.score.correct += 1;
        }
        self.results.push(result.clone());

        tracing::info!(
            player = %self.player,
            "Round {} answered ({}), score {}/{}",
            self.score.rounds,
            if correct { "correct" } else { "wrong" },
            self.score.points,
            self.score.rounds
        );

        Ok(result)
    }
}
