//! Scoring Events
//!
//! Emitted by every write, in the order the transitions happened.

use serde::{Deserialize, Serialize};

use crate::scoring::delivery::Ball;
use crate::scoring::result::MatchResult;
use crate::scoring::state::Side;
use crate::scoring::wicket::FallOfWicket;

/// Something that happened while applying a command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScoringEvent {
    /// Openers and bowler named
    InningsStarted {
        innings: usize,
        team: Option<Side>,
        striker: String,
        non_striker: String,
        bowler: String,
    },

    /// Delivery appended to the log
    BallRecorded {
        innings: usize,
        ball: Ball,
    },

    /// Batsman dismissed
    WicketFell {
        innings: usize,
        fall: FallOfWicket,
        bowler_credited: bool,
    },

    /// Sixth legal ball of an over bowled
    OverCompleted {
        innings: usize,
        /// 0-based over index
        over: u32,
        bowler: String,
        maiden: bool,
    },

    /// New batsman took the vacant slot
    BatsmanSelected {
        innings: usize,
        name: String,
    },

    /// Bowler for the current over set
    BowlerChanged {
        innings: usize,
        bowler: String,
    },

    /// Innings closed
    InningsCompleted {
        innings: usize,
        team: Option<Side>,
        runs: u32,
        wickets: u32,
        overs: String,
        reason: String,
    },

    /// Result decided
    MatchCompleted {
        result: MatchResult,
    },
}

impl ScoringEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ScoringEvent::InningsStarted { .. } => "innings_started",
            ScoringEvent::BallRecorded { .. } => "ball_recorded",
            ScoringEvent::WicketFell { .. } => "wicket_fell",
            ScoringEvent::OverCompleted { .. } => "over_completed",
            ScoringEvent::BatsmanSelected { .. } => "batsman_selected",
            ScoringEvent::BowlerChanged { .. } => "bowler_changed",
            ScoringEvent::InningsCompleted { .. } => "innings_completed",
            ScoringEvent::MatchCompleted { .. } => "match_completed",
        }
    }
}
