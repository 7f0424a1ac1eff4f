//! Match Transcript Recording
//!
//! Records everything needed to rebuild a match by replay: the setup it was
//! created from and every command that was accepted, in order.

use serde::{Deserialize, Serialize};

use crate::core::hash::{hash_with_domain, StateHash};
use crate::scoring::engine::ScoringCommand;
use crate::scoring::rules::ScoringConfig;
use crate::scoring::state::{MatchId, MatchSetup};

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Commands between state hash checkpoints.
pub const CHECKPOINT_INTERVAL: u64 = 30;

/// Complete command log for one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Match metadata.
    pub metadata: TranscriptMetadata,

    /// Finalized room and toss context.
    pub setup: MatchSetup,

    /// Hash of the freshly created match.
    pub initial_state_hash: StateHash,

    /// Accepted commands in order.
    pub commands: Vec<CommandRecord>,

    /// Periodic state hashes for partial verification.
    pub checkpoints: Vec<StateCheckpoint>,

    /// Hash after the match completed.
    pub final_state_hash: Option<StateHash>,
}

/// Match metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Match identifier (UUID bytes).
    pub match_id: [u8; 16],

    /// Unix timestamp when the match was created.
    pub created_at: i64,

    /// Hash of the scoring policy, so replays under other rules are detected.
    pub config_hash: StateHash,
}

/// One accepted command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Session version after the command.
    pub version: u64,

    /// The command.
    pub command: ScoringCommand,
}

/// State hash at a given version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Session version.
    pub version: u64,

    /// State hash at this version.
    pub state_hash: StateHash,
}

/// Hash of a scoring policy.
pub fn config_hash(config: &ScoringConfig) -> Result<StateHash, TranscriptError> {
    hash_serialized(b"CRICKET_SCORER_CONFIG_V1", config)
}

fn hash_serialized<T: Serialize>(domain: &[u8], value: &T) -> Result<StateHash, TranscriptError> {
    let bytes = bincode::serialize(value)
        .map_err(|e| TranscriptError::SerializationFailed(e.to_string()))?;
    Ok(hash_with_domain(domain, &bytes))
}

impl MatchTranscript {
    /// Start a transcript for a new match.
    pub fn new(
        match_id: MatchId,
        setup: MatchSetup,
        initial_state_hash: StateHash,
        created_at: i64,
    ) -> Result<Self, TranscriptError> {
        let config_hash = config_hash(&setup.config)?;
        Ok(Self {
            version: TRANSCRIPT_VERSION,
            metadata: TranscriptMetadata {
                match_id: match_id.into_bytes(),
                created_at,
                config_hash,
            },
            setup,
            initial_state_hash,
            commands: Vec::new(),
            checkpoints: Vec::new(),
            final_state_hash: None,
        })
    }

    /// Match identifier.
    pub fn match_id(&self) -> MatchId {
        MatchId::from_bytes(self.metadata.match_id)
    }

    /// Record an accepted command.
    pub fn record(&mut self, version: u64, command: ScoringCommand) {
        self.commands.push(CommandRecord { version, command });
    }

    /// Record a state checkpoint.
    pub fn add_checkpoint(&mut self, version: u64, state_hash: StateHash) {
        self.checkpoints.push(StateCheckpoint { version, state_hash });
    }

    /// Should a checkpoint be taken at `version`?
    pub fn checkpoint_due(version: u64) -> bool {
        version > 0 && version % CHECKPOINT_INTERVAL == 0
    }

    /// Seal the transcript once the match has completed.
    pub fn finalize(&mut self, final_state_hash: StateHash) {
        self.final_state_hash = Some(final_state_hash);
    }

    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.final_state_hash.is_some()
    }

    /// Number of recorded commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        bincode::serialize(self).map_err(|e| TranscriptError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self = bincode::deserialize(data)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;
        transcript.check_version()?;
        Ok(transcript)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, TranscriptError> {
        serde_json::to_string(self).map_err(|e| TranscriptError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let transcript: Self = serde_json::from_str(json)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;
        transcript.check_version()?;
        Ok(transcript)
    }

    fn check_version(&self) -> Result<(), TranscriptError> {
        if self.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: self.version,
            });
        }
        Ok(())
    }
}

/// Errors that can occur with transcripts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    /// Serialization failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization failed.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Version mismatch.
    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Version found.
        got: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::delivery::{BallInput, Extras};
    use crate::scoring::state::{Side, Toss, TossChoice};
    use crate::scoring::wicket::DismissalKind;

    fn transcript() -> MatchTranscript {
        let setup = MatchSetup::new("Lions", "Tigers", 20, Toss::new(Side::TeamA, TossChoice::Bat));
        let mut t = MatchTranscript::new(uuid::Uuid::nil(), setup, [7; 32], 1_700_000_000).unwrap();
        t.record(1, ScoringCommand::StartInnings {
            striker: "A".into(),
            non_striker: "B".into(),
            bowler: "X".into(),
        });
        t.record(2, ScoringCommand::RecordBall(BallInput {
            runs: 1,
            extras: Extras::no_ball(1),
            commentary: "edged".into(),
            ..Default::default()
        }));
        t.record(3, ScoringCommand::RecordBall(BallInput::wicket(DismissalKind::RunOut, "B").by("X")));
        t
    }

    #[test]
    fn test_bincode_roundtrip() {
        let t = transcript();
        let bytes = t.to_bytes().unwrap();
        let back = MatchTranscript::from_bytes(&bytes).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.command_count(), 3);
        assert_eq!(back.match_id(), uuid::Uuid::nil());
    }

    #[test]
    fn test_json_roundtrip() {
        let t = transcript();
        let back = MatchTranscript::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut t = transcript();
        t.version = 9;
        let bytes = t.to_bytes().unwrap();
        assert!(matches!(
            MatchTranscript::from_bytes(&bytes),
            Err(TranscriptError::VersionMismatch { expected: 1, got: 9 })
        ));
    }

    #[test]
    fn test_config_hash_tracks_policy() {
        let default = ScoringConfig::default();
        let strict = ScoringConfig { byes_charged_to_bowler: false, ..Default::default() };
        assert_eq!(config_hash(&default).unwrap(), config_hash(&ScoringConfig::default()).unwrap());
        assert_ne!(config_hash(&default).unwrap(), config_hash(&strict).unwrap());
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[test]
    fn test_hash_reports_serialization_failure() {
        assert!(matches!(
            hash_serialized(b"TEST", &Unserializable),
            Err(TranscriptError::SerializationFailed(msg)) if msg.contains("refused")
        ));
    }

    #[test]
    fn test_checkpoint_schedule() {
        assert!(!MatchTranscript::checkpoint_due(0));
        assert!(!MatchTranscript::checkpoint_due(29));
        assert!(MatchTranscript::checkpoint_due(30));
    }
}
