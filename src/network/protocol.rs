//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every message is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::network::session::{AppliedUpdate, MatchDetails, SessionError};
use crate::scoring::delivery::BallInput;
use crate::scoring::engine::ScoringCommand;
use crate::scoring::error::{ErrorKind, ScoringError};
use crate::scoring::over::BowlerCheck;
use crate::scoring::scoreboard::Scoreboard;
use crate::scoring::state::{MatchId, MatchSetup};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
///
/// Writes may carry `expected_version`; a stale value is rejected with
/// `version_conflict` and nothing is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a match from a finalized room and toss.
    CreateMatch { setup: MatchSetup },

    /// Name openers and opening bowler.
    StartInnings {
        match_id: MatchId,
        striker: String,
        non_striker: String,
        bowler: String,
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Record one delivery.
    RecordBall {
        match_id: MatchId,
        ball: BallInput,
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Fill the vacant slot after a wicket.
    SelectNextBatsman {
        match_id: MatchId,
        name: String,
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Pre-check a bowler without changing anything.
    ValidateNextBowler { match_id: MatchId, bowler: String },

    /// Set the bowler of the current over.
    ChangeBowler {
        match_id: MatchId,
        name: String,
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Close the innings by hand.
    EndInnings {
        match_id: MatchId,
        reason: String,
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Complete the match without a result.
    AbandonMatch {
        match_id: MatchId,
        reason: String,
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Read the scoreboard.
    GetScoreboard { match_id: MatchId },

    /// Read the full match record.
    GetMatchDetails { match_id: MatchId },

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

/// A write addressed to one match.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    /// Target match.
    pub match_id: MatchId,
    /// Engine command.
    pub command: ScoringCommand,
    /// Optimistic concurrency check.
    pub expected_version: Option<u64>,
}

impl ClientMessage {
    /// Split out the engine command, if this message is a write.
    pub fn into_write(self) -> Result<WriteRequest, ClientMessage> {
        let (match_id, command, expected_version) = match self {
            ClientMessage::StartInnings { match_id, striker, non_striker, bowler, expected_version } => (
                match_id,
                ScoringCommand::StartInnings { striker, non_striker, bowler },
                expected_version,
            ),
            ClientMessage::RecordBall { match_id, ball, expected_version } => {
                (match_id, ScoringCommand::RecordBall(ball), expected_version)
            }
            ClientMessage::SelectNextBatsman { match_id, name, expected_version } => {
                (match_id, ScoringCommand::SelectNextBatsman { name }, expected_version)
            }
            ClientMessage::ChangeBowler { match_id, name, expected_version } => {
                (match_id, ScoringCommand::ChangeBowler { name }, expected_version)
            }
            ClientMessage::EndInnings { match_id, reason, expected_version } => {
                (match_id, ScoringCommand::EndInnings { reason }, expected_version)
            }
            ClientMessage::AbandonMatch { match_id, reason, expected_version } => {
                (match_id, ScoringCommand::AbandonMatch { reason }, expected_version)
            }
            other => return Err(other),
        };
        Ok(WriteRequest { match_id, command, expected_version })
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Match created.
    MatchCreated {
        match_id: MatchId,
        version: u64,
        scoreboard: Scoreboard,
    },

    /// Write accepted.
    Applied(AppliedUpdate),

    /// Bowler pre-check passed.
    BowlerValidated {
        match_id: MatchId,
        check: BowlerCheck,
    },

    /// Scoreboard projection.
    Scoreboard { scoreboard: Scoreboard },

    /// Full match record.
    MatchDetails(Box<MatchDetails>),

    /// Pong response.
    Pong {
        /// Echo of client timestamp.
        timestamp: u64,
        /// Server time, unix millis.
        server_time: u64,
    },

    /// Request rejected.
    Error(ServerError),

    /// Server shutting down.
    Shutdown { reason: String },
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Match does not exist.
    NotFound,
    /// Operation outside its lifecycle state.
    InvalidState,
    /// Cricket sequencing rule broken.
    RuleViolation,
    /// Malformed field.
    ValidationError,
    /// Stale expected version.
    VersionConflict,
    /// Message could not be parsed.
    InvalidInput,
    /// Server limit reached.
    CapacityReached,
    /// Server failed to handle a valid request.
    Internal,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::InvalidState => ErrorCode::InvalidState,
            ErrorKind::RuleViolation => ErrorCode::RuleViolation,
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::Conflict => ErrorCode::VersionConflict,
        }
    }
}

impl From<&ScoringError> for ServerError {
    fn from(err: &ScoringError) -> Self {
        Self {
            code: err.kind().into(),
            message: err.to_string(),
        }
    }
}

impl From<&SessionError> for ServerError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Scoring(e) => e.into(),
            SessionError::CapacityReached(_) => Self {
                code: ErrorCode::CapacityReached,
                message: err.to_string(),
            },
            SessionError::Transcript(_) => Self {
                code: ErrorCode::Internal,
                message: err.to_string(),
            },
        }
    }
}

impl ServerMessage {
    /// Error message from a session failure.
    pub fn error(err: &SessionError) -> Self {
        ServerMessage::Error(err.into())
    }

    /// Unparseable request.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        })
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::delivery::Extras;
    use crate::scoring::wicket::DismissalKind;

    #[test]
    fn test_record_ball_from_json() {
        let json = r#"{
            "type": "record_ball",
            "match_id": "00000000-0000-0000-0000-000000000000",
            "ball": {"runs": 1, "extras": {"no_ball": 1}, "bowler": "X"}
        }"#;
        let msg = ClientMessage::from_json(json).unwrap();

        let write = msg.into_write().unwrap();
        assert_eq!(write.match_id, uuid::Uuid::nil());
        assert_eq!(write.expected_version, None);
        match write.command {
            ScoringCommand::RecordBall(ball) => {
                assert_eq!(ball.runs, 1);
                assert_eq!(ball.extras, Extras::no_ball(1));
                assert_eq!(ball.bowler.as_deref(), Some("X"));
            }
            other => panic!("Wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_wicket_type_accepts_scorer_spelling() {
        let json = r#"{
            "type": "record_ball",
            "match_id": "00000000-0000-0000-0000-000000000000",
            "ball": {"is_wicket": true, "wicket_type": "runout", "wicket_player": "B"},
            "expected_version": 7
        }"#;
        let write = ClientMessage::from_json(json).unwrap().into_write().unwrap();
        assert_eq!(write.expected_version, Some(7));
        match write.command {
            ScoringCommand::RecordBall(ball) => {
                assert_eq!(ball.wicket_type, Some(DismissalKind::RunOut));
            }
            other => panic!("Wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_reads_are_not_writes() {
        let msg = ClientMessage::GetScoreboard { match_id: uuid::Uuid::nil() };
        assert_eq!(msg.clone().into_write(), Err(msg));
        assert!(ClientMessage::Ping { timestamp: 1 }.into_write().is_err());
    }

    #[test]
    fn test_error_codes_on_the_wire() {
        let msg = ServerMessage::error(&SessionError::Scoring(ScoringError::rule("consecutive overs")));
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "rule_violation");

        let conflict: ServerError = (&ScoringError::VersionConflict { expected: 1, actual: 2 }).into();
        assert_eq!(conflict.code, ErrorCode::VersionConflict);
        let invalid: ServerError = (&ScoringError::validation("bad")).into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(ClientMessage::from_json(r#"{"type": "teleport"}"#).is_err());
    }
}
