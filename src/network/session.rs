//! Match Session Management
//!
//! One session per match. A session is the single serialization point for
//! its match: every write takes the session's write lock, checks the
//! optional expected version, applies the command and publishes a fresh
//! scoreboard on a watch channel. Scoreboard reads go through the channel
//! and never wait on a writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};

use crate::replay::transcript::{MatchTranscript, TranscriptError};
use crate::scoring::engine::{apply_command, validate_next_bowler, ScoringCommand};
use crate::scoring::error::ScoringError;
use crate::scoring::events::ScoringEvent;
use crate::scoring::over::BowlerCheck;
use crate::scoring::scoreboard::{InningsCard, Scoreboard};
use crate::scoring::rules::ScoringConfig;
use crate::scoring::state::{MatchId, MatchSetup, MatchState};

/// Default cap on live matches held by one manager.
pub const DEFAULT_MAX_MATCHES: usize = 1024;

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Engine rejected the operation.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Transcript could not be started.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// No room for another match.
    #[error("Match limit reached ({0})")]
    CapacityReached(usize),
}

/// Result of an accepted write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedUpdate {
    /// Match.
    pub match_id: MatchId,
    /// Version after the write.
    pub version: u64,
    /// Card of the innings the command applied to.
    pub innings: InningsCard,
    /// Events in order.
    pub events: Vec<ScoringEvent>,
    /// Match has a result.
    pub match_completed: bool,
}

/// Full record of a match for the details endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    /// Match.
    pub match_id: MatchId,
    /// Current version.
    pub version: u64,
    /// Hex-encoded state hash.
    pub state_hash: String,
    /// Scoring policy in force.
    pub config: ScoringConfig,
    /// Complete state, including ball logs.
    pub state: MatchState,
    /// Commands recorded so far.
    pub commands_recorded: usize,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last accepted write.
    pub updated_at: DateTime<Utc>,
}

/// A live match.
pub struct MatchSession {
    /// Match identifier.
    pub id: MatchId,

    /// Match state.
    state: MatchState,

    /// Scoring policy.
    config: ScoringConfig,

    /// Bumped on every accepted write.
    version: u64,

    /// Command log for replay.
    transcript: MatchTranscript,

    /// Creation time.
    created_at: DateTime<Utc>,

    /// Last accepted write.
    updated_at: DateTime<Utc>,

    /// Latest scoreboard.
    scoreboard_tx: watch::Sender<Arc<Scoreboard>>,
}

impl MatchSession {
    /// Create a session from a finalized setup.
    pub fn new(id: MatchId, setup: MatchSetup, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let config = setup.config.clone();
        let state = MatchState::new(id, setup.clone())?;
        let transcript = MatchTranscript::new(id, setup, state.compute_hash(), now.timestamp())?;
        let (scoreboard_tx, _) = watch::channel(Arc::new(Scoreboard::project(&state)));

        Ok(Self {
            id,
            state,
            config,
            version: 0,
            transcript,
            created_at: now,
            updated_at: now,
            scoreboard_tx,
        })
    }

    /// Match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Scoring policy.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Command log.
    pub fn transcript(&self) -> &MatchTranscript {
        &self.transcript
    }

    /// Last accepted write.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Receiver for scoreboard updates.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Scoreboard>> {
        self.scoreboard_tx.subscribe()
    }

    /// Latest published scoreboard.
    pub fn scoreboard(&self) -> Arc<Scoreboard> {
        self.scoreboard_tx.borrow().clone()
    }

    /// Apply a write.
    ///
    /// Rejected with a version conflict when `expected_version` is stale.
    pub fn apply(
        &mut self,
        command: ScoringCommand,
        expected_version: Option<u64>,
    ) -> Result<AppliedUpdate, SessionError> {
        if let Some(expected) = expected_version {
            if expected != self.version {
                return Err(ScoringError::VersionConflict {
                    expected,
                    actual: self.version,
                }
                .into());
            }
        }

        let index = self.state.current_innings;
        let events = apply_command(&mut self.state, &self.config, &command)?;

        self.version += 1;
        self.updated_at = Utc::now();
        self.transcript.record(self.version, command);
        if MatchTranscript::checkpoint_due(self.version) {
            self.transcript.add_checkpoint(self.version, self.state.compute_hash());
        }
        if self.state.is_completed() {
            self.transcript.finalize(self.state.compute_hash());
        }

        let scoreboard = Arc::new(Scoreboard::project(&self.state));
        let innings = scoreboard.innings[index].clone();
        self.scoreboard_tx.send_replace(scoreboard);

        Ok(AppliedUpdate {
            match_id: self.id,
            version: self.version,
            innings,
            events,
            match_completed: self.state.is_completed(),
        })
    }

    /// Pre-check a bowler. Read only.
    pub fn validate_next_bowler(&self, name: &str) -> Result<BowlerCheck, SessionError> {
        Ok(validate_next_bowler(&self.state, name)?)
    }

    /// Full details.
    pub fn details(&self) -> MatchDetails {
        MatchDetails {
            match_id: self.id,
            version: self.version,
            state_hash: hex::encode(self.state.compute_hash()),
            config: self.config.clone(),
            state: self.state.clone(),
            commands_recorded: self.transcript.command_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Manages all live matches.
pub struct SessionManager {
    /// Sessions by match.
    sessions: RwLock<BTreeMap<MatchId, Arc<RwLock<MatchSession>>>>,
    /// Scoreboard receivers by match.
    scoreboards: RwLock<BTreeMap<MatchId, watch::Receiver<Arc<Scoreboard>>>>,
    /// Cap on live matches.
    max_matches: usize,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new(max_matches: usize) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            scoreboards: RwLock::new(BTreeMap::new()),
            max_matches,
        }
    }

    /// Create a match from a finalized room and toss context.
    pub async fn create_match(&self, setup: MatchSetup) -> Result<(MatchId, Arc<Scoreboard>), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_matches {
            return Err(SessionError::CapacityReached(self.max_matches));
        }

        let id = uuid::Uuid::new_v4();
        let session = MatchSession::new(id, setup, Utc::now())?;
        let scoreboard = session.scoreboard();

        self.scoreboards.write().await.insert(id, session.subscribe());
        sessions.insert(id, Arc::new(RwLock::new(session)));

        Ok((id, scoreboard))
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &MatchId) -> Option<Arc<RwLock<MatchSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    async fn session(&self, id: &MatchId) -> Result<Arc<RwLock<MatchSession>>, SessionError> {
        self.get_session(id).await.ok_or(SessionError::Scoring(ScoringError::NotFound))
    }

    /// Apply a write to a match. Writers to one match are serialized.
    pub async fn apply(
        &self,
        id: &MatchId,
        command: ScoringCommand,
        expected_version: Option<u64>,
    ) -> Result<AppliedUpdate, SessionError> {
        let session = self.session(id).await?;
        let mut session = session.write().await;
        session.apply(command, expected_version)
    }

    /// Pre-check a bowler for the next delivery.
    pub async fn validate_next_bowler(&self, id: &MatchId, name: &str) -> Result<BowlerCheck, SessionError> {
        let session = self.session(id).await?;
        let session = session.read().await;
        session.validate_next_bowler(name)
    }

    /// Latest scoreboard. Does not take the session lock.
    pub async fn scoreboard(&self, id: &MatchId) -> Result<Arc<Scoreboard>, SessionError> {
        let scoreboards = self.scoreboards.read().await;
        scoreboards
            .get(id)
            .map(|rx| rx.borrow().clone())
            .ok_or(SessionError::Scoring(ScoringError::NotFound))
    }

    /// Subscribe to scoreboard updates for a match.
    pub async fn subscribe(&self, id: &MatchId) -> Option<watch::Receiver<Arc<Scoreboard>>> {
        self.scoreboards.read().await.get(id).cloned()
    }

    /// Full match details.
    pub async fn details(&self, id: &MatchId) -> Result<MatchDetails, SessionError> {
        let session = self.session(id).await?;
        let session = session.read().await;
        Ok(session.details())
    }

    /// Remove a session.
    pub async fn remove_session(&self, id: &MatchId) {
        self.sessions.write().await.remove(id);
        self.scoreboards.write().await.remove(id);
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop completed matches untouched for longer than `retention`.
    ///
    /// Returns the number removed.
    pub async fn cleanup(&self, retention: chrono::Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut sessions = self.sessions.write().await;
        let mut to_remove = Vec::new();

        for (id, session) in sessions.iter() {
            let s = session.read().await;
            if s.state().is_completed() && s.updated_at() < cutoff {
                to_remove.push(*id);
            }
        }

        let mut scoreboards = self.scoreboards.write().await;
        for id in &to_remove {
            sessions.remove(id);
            scoreboards.remove(id);
        }
        to_remove.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MATCHES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::verify::verify_transcript;
    use crate::scoring::delivery::BallInput;
    use crate::scoring::state::{Side, Toss, TossChoice};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn setup(overs: u32) -> MatchSetup {
        MatchSetup::new("Lions", "Tigers", overs, Toss::new(Side::TeamB, TossChoice::Bowl))
    }

    fn openers() -> ScoringCommand {
        ScoringCommand::StartInnings {
            striker: "A".into(),
            non_striker: "B".into(),
            bowler: "X".into(),
        }
    }

    #[tokio::test]
    async fn test_session_manager() {
        let manager = SessionManager::default();

        let (id, board) = manager.create_match(setup(20)).await.unwrap();
        assert_eq!(manager.session_count().await, 1);
        assert_eq!(board.match_id, id);
        assert!(manager.get_session(&id).await.is_some());

        manager.remove_session(&id).await;
        assert_eq!(manager.session_count().await, 0);
        assert!(matches!(
            manager.scoreboard(&id).await,
            Err(SessionError::Scoring(ScoringError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_apply_publishes_scoreboard() {
        let manager = SessionManager::default();
        let (id, _) = manager.create_match(setup(20)).await.unwrap();
        let mut rx = manager.subscribe(&id).await.unwrap();

        manager.apply(&id, openers(), Some(0)).await.unwrap();
        let update = manager
            .apply(&id, ScoringCommand::RecordBall(BallInput::runs(4)), Some(1))
            .await
            .unwrap();

        assert_eq!(update.version, 2);
        assert_eq!(update.innings.runs, 4);
        assert!(matches!(update.events[0], ScoringEvent::BallRecorded { .. }));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().innings[0].runs, 4);
        assert_eq!(manager.scoreboard(&id).await.unwrap().innings[0].runs, 4);
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let manager = SessionManager::default();
        let (id, _) = manager.create_match(setup(20)).await.unwrap();
        manager.apply(&id, openers(), None).await.unwrap();

        let err = manager
            .apply(&id, ScoringCommand::RecordBall(BallInput::runs(1)), Some(0))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::Scoring(ScoringError::VersionConflict { expected: 0, actual: 1 })
        );
        assert_eq!(manager.details(&id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_rejected_write_keeps_version() {
        let manager = SessionManager::default();
        let (id, _) = manager.create_match(setup(20)).await.unwrap();

        let err = manager
            .apply(&id, ScoringCommand::RecordBall(BallInput::runs(1)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Scoring(ScoringError::InvalidState(_))));

        let details = manager.details(&id).await.unwrap();
        assert_eq!(details.version, 0);
        assert_eq!(details.commands_recorded, 0);
        assert_eq!(details.state_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_unknown_match() {
        let manager = SessionManager::default();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(
            manager.apply(&id, openers(), None).await,
            Err(SessionError::Scoring(ScoringError::NotFound))
        ));
        assert!(manager.validate_next_bowler(&id, "X").await.is_err());
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let manager = SessionManager::new(1);
        manager.create_match(setup(20)).await.unwrap();
        assert_eq!(
            manager.create_match(setup(20)).await.unwrap_err(),
            SessionError::CapacityReached(1)
        );
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_matches() {
        let manager = SessionManager::default();
        let (live, _) = manager.create_match(setup(20)).await.unwrap();
        let (done, _) = manager.create_match(setup(20)).await.unwrap();
        manager.apply(&done, openers(), None).await.unwrap();
        manager
            .apply(&done, ScoringCommand::AbandonMatch { reason: "rain".into() }, None)
            .await
            .unwrap();

        let removed = manager.cleanup(chrono::Duration::zero()).await;

        assert_eq!(removed, 1);
        assert!(manager.get_session(&live).await.is_some());
        assert!(manager.get_session(&done).await.is_none());
    }

    #[tokio::test]
    async fn test_transcript_verifies_live_state() {
        let manager = SessionManager::default();
        let (id, _) = manager.create_match(setup(1)).await.unwrap();
        manager.apply(&id, openers(), None).await.unwrap();
        for runs in [1, 2, 3, 4, 6, 0] {
            manager
                .apply(&id, ScoringCommand::RecordBall(BallInput::runs(runs)), None)
                .await
                .unwrap();
        }

        let session = manager.get_session(&id).await.unwrap();
        let session = session.read().await;
        let result = verify_transcript(session.transcript(), Some(session.state().compute_hash()));
        assert!(result.valid, "{:?}", result.error);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_never_share_a_version() {
        let manager = Arc::new(SessionManager::default());
        let (id, _) = manager.create_match(setup(20)).await.unwrap();
        manager.apply(&id, openers(), None).await.unwrap();

        let mut handles = Vec::new();
        for task in 0..8u64 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(task);
                let mut accepted = Vec::new();
                for _ in 0..10 {
                    let details = manager.details(&id).await.unwrap();
                    let over = details.state.current().current_over();
                    let bowler = if over % 2 == 0 { "X" } else { "Y" };
                    let runs = rng.gen_range(0..=6);

                    if rng.gen_bool(0.5) {
                        tokio::task::yield_now().await;
                    }

                    let input = BallInput::runs(runs).by(bowler);
                    match manager
                        .apply(&id, ScoringCommand::RecordBall(input), Some(details.version))
                        .await
                    {
                        Ok(update) => accepted.push((update.version, runs)),
                        Err(SessionError::Scoring(ScoringError::VersionConflict { .. })) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
                accepted
            }));
        }

        let mut accepted = Vec::new();
        for handle in handles {
            accepted.extend(handle.await.unwrap());
        }

        let mut versions: Vec<u64> = accepted.iter().map(|(v, _)| *v).collect();
        versions.sort_unstable();
        versions.dedup();
        assert_eq!(versions.len(), accepted.len());

        let details = manager.details(&id).await.unwrap();
        assert_eq!(details.version, 1 + accepted.len() as u64);
        let innings = details.state.current();
        assert_eq!(innings.legal_deliveries, accepted.len() as u32);
        assert_eq!(innings.total_runs, accepted.iter().map(|(_, r)| *r).sum::<u32>());
    }
}
