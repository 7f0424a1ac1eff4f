//! Verification API
//!
//! Verify matches by deterministic replay of their transcripts.

use crate::core::hash::StateHash;
use crate::replay::transcript::{config_hash, MatchTranscript, TranscriptError};
use crate::scoring::engine::apply_command;
use crate::scoring::error::ScoringError;
use crate::scoring::state::MatchState;

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Hash the replay was checked against.
    pub expected_final_hash: StateHash,

    /// Checkpoint verification results.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single checkpoint.
#[derive(Debug)]
pub struct CheckpointResult {
    /// Session version.
    pub version: u64,
    /// Expected hash from transcript.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Setup in the transcript does not create a match.
    #[error("Invalid setup: {0}")]
    InvalidSetup(ScoringError),

    /// Scoring policy could not be hashed.
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// Scoring policy differs from the one recorded.
    #[error("Scoring config hash mismatch")]
    ConfigMismatch,

    /// Initial state hash mismatch.
    #[error("Initial state hash mismatch")]
    InitialStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// A recorded command was rejected on replay.
    #[error("Command {index} ({name}) rejected on replay: {error}")]
    CommandRejected {
        /// Position in the transcript.
        index: usize,
        /// Command name.
        name: &'static str,
        /// Engine error.
        error: ScoringError,
    },

    /// Checkpoint hash mismatch.
    #[error("Checkpoint mismatch at version {version}")]
    CheckpointMismatch {
        /// Version where mismatch occurred.
        version: u64,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Final state hash mismatch.
    #[error("Final state hash mismatch")]
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// No hash to compare against.
    #[error("Transcript is incomplete")]
    IncompleteTranscript,
}

/// Rebuild the match state from a transcript.
pub fn replay_transcript(transcript: &MatchTranscript) -> Result<MatchState, VerificationError> {
    replay(transcript, &mut Vec::new())
}

fn replay(
    transcript: &MatchTranscript,
    checkpoint_results: &mut Vec<CheckpointResult>,
) -> Result<MatchState, VerificationError> {
    let config = &transcript.setup.config;
    if config_hash(config)? != transcript.metadata.config_hash {
        return Err(VerificationError::ConfigMismatch);
    }

    // 1. Reconstruct initial state
    let mut state = MatchState::new(transcript.match_id(), transcript.setup.clone())
        .map_err(VerificationError::InvalidSetup)?;

    let initial_hash = state.compute_hash();
    if initial_hash != transcript.initial_state_hash {
        return Err(VerificationError::InitialStateMismatch {
            expected: transcript.initial_state_hash,
            computed: initial_hash,
        });
    }

    // 2. Replay command by command with checkpoint verification
    let mut checkpoints = transcript.checkpoints.iter().peekable();

    for (index, record) in transcript.commands.iter().enumerate() {
        apply_command(&mut state, config, &record.command).map_err(|error| {
            VerificationError::CommandRejected {
                index,
                name: record.command.name(),
                error,
            }
        })?;

        while let Some(checkpoint) = checkpoints.next_if(|c| c.version == record.version) {
            let computed = state.compute_hash();
            let valid = computed == checkpoint.state_hash;
            checkpoint_results.push(CheckpointResult {
                version: checkpoint.version,
                expected: checkpoint.state_hash,
                computed,
                valid,
            });

            if !valid {
                return Err(VerificationError::CheckpointMismatch {
                    version: checkpoint.version,
                    expected: checkpoint.state_hash,
                    computed,
                });
            }
        }
    }

    Ok(state)
}

/// Verify a transcript by full replay.
///
/// Compares against `expected`, or the transcript's own final hash when
/// `expected` is `None`.
pub fn verify_transcript(
    transcript: &MatchTranscript,
    expected: Option<StateHash>,
) -> VerificationResult {
    let expected_final_hash = match expected.or(transcript.final_state_hash) {
        Some(hash) => hash,
        None => {
            return VerificationResult {
                valid: false,
                computed_final_hash: [0; 32],
                expected_final_hash: [0; 32],
                checkpoint_results: vec![],
                error: Some(VerificationError::IncompleteTranscript),
            };
        }
    };

    let mut checkpoint_results = Vec::new();
    let state = match replay(transcript, &mut checkpoint_results) {
        Ok(state) => state,
        Err(error) => {
            return VerificationResult {
                valid: false,
                computed_final_hash: [0; 32],
                expected_final_hash,
                checkpoint_results,
                error: Some(error),
            };
        }
    };

    // 3. Verify final state
    let final_hash = state.compute_hash();
    let valid = final_hash == expected_final_hash;

    VerificationResult {
        valid,
        computed_final_hash: final_hash,
        expected_final_hash,
        checkpoint_results,
        error: if valid {
            None
        } else {
            Some(VerificationError::FinalStateMismatch {
                expected: expected_final_hash,
                computed: final_hash,
            })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::delivery::BallInput;
    use crate::scoring::engine::ScoringCommand;
    use crate::scoring::state::{MatchSetup, Side, Toss, TossChoice};
    use crate::scoring::wicket::DismissalKind;

    fn commands() -> Vec<ScoringCommand> {
        let mut commands = vec![ScoringCommand::StartInnings {
            striker: "A".into(),
            non_striker: "B".into(),
            bowler: "X".into(),
        }];
        for runs in [1, 4, 0, 2, 6, 1] {
            commands.push(ScoringCommand::RecordBall(BallInput::runs(runs)));
        }
        commands.push(ScoringCommand::ChangeBowler { name: "Y".into() });
        commands.push(ScoringCommand::RecordBall(BallInput::wicket(DismissalKind::Caught, "A")));
        commands.push(ScoringCommand::SelectNextBatsman { name: "C".into() });
        commands
    }

    /// Play commands live, recording as a session does.
    fn recorded() -> (MatchTranscript, MatchState) {
        let setup = MatchSetup::new("Lions", "Tigers", 20, Toss::new(Side::TeamA, TossChoice::Bat));
        let id = uuid::Uuid::new_v4();
        let mut state = MatchState::new(id, setup.clone()).unwrap();
        let config = setup.config.clone();
        let mut transcript = MatchTranscript::new(id, setup, state.compute_hash(), 0).unwrap();

        for (i, command) in commands().into_iter().enumerate() {
            apply_command(&mut state, &config, &command).unwrap();
            let version = i as u64 + 1;
            transcript.record(version, command);
            if version % 4 == 0 {
                transcript.add_checkpoint(version, state.compute_hash());
            }
        }
        (transcript, state)
    }

    #[test]
    fn test_replay_rebuilds_state() {
        let (transcript, live) = recorded();
        let replayed = replay_transcript(&transcript).unwrap();
        assert_eq!(replayed, live);
        assert_eq!(replayed.current().total_runs, 14);
    }

    #[test]
    fn test_verify_against_live_hash() {
        let (transcript, live) = recorded();
        let result = verify_transcript(&transcript, Some(live.compute_hash()));
        assert!(result.valid, "{:?}", result.error);
        assert_eq!(result.checkpoint_results.len(), 2);
        assert!(result.checkpoint_results.iter().all(|c| c.valid));
    }

    #[test]
    fn test_tampered_command_detected() {
        let (mut transcript, live) = recorded();
        transcript.commands[2].command = ScoringCommand::RecordBall(BallInput::runs(6));

        let result = verify_transcript(&transcript, Some(live.compute_hash()));
        assert!(!result.valid);
        assert!(matches!(result.error, Some(VerificationError::CheckpointMismatch { version: 4, .. })));
    }

    #[test]
    fn test_rejected_command_reported() {
        let (mut transcript, _) = recorded();
        transcript.checkpoints.clear();
        transcript.commands.push(crate::replay::transcript::CommandRecord {
            version: 99,
            command: ScoringCommand::SelectNextBatsman { name: "D".into() },
        });

        let err = replay_transcript(&transcript).unwrap_err();
        assert!(matches!(err, VerificationError::CommandRejected { index: 10, .. }));
    }

    #[test]
    fn test_incomplete_without_expected_hash() {
        let (transcript, _) = recorded();
        let result = verify_transcript(&transcript, None);
        assert!(matches!(result.error, Some(VerificationError::IncompleteTranscript)));
    }

    #[test]
    fn test_config_tampering_detected() {
        let (mut transcript, _) = recorded();
        transcript.setup.config.max_bat_runs = 9;
        assert_eq!(replay_transcript(&transcript).unwrap_err(), VerificationError::ConfigMismatch);
    }
}
