//! Scoring Engine Module
//!
//! All match scoring code. Pure and deterministic: no I/O, no clocks.
//!
//! ## Module Structure
//!
//! - `delivery`: Ball input, extras, legal/illegal classification
//! - `ledger`: Batting and bowling figures
//! - `partnership`: Pair at the crease and archived partnerships
//! - `over`: Strike rotation and the consecutive-over rule
//! - `wicket`: Dismissal kinds and fall-of-wicket records
//! - `innings`: Innings state and completion
//! - `state`: Match aggregate, toss and setup
//! - `result`: Result calculation
//! - `scoreboard`: Read-only projections
//! - `events`: Events emitted by writes
//! - `rules`: Scoring policy configuration
//! - `engine`: Operations on a match

pub mod delivery;
pub mod ledger;
pub mod partnership;
pub mod over;
pub mod wicket;
pub mod innings;
pub mod state;
pub mod result;
pub mod scoreboard;
pub mod events;
pub mod rules;
pub mod error;
pub mod engine;

// Re-export key types
pub use delivery::{Ball, BallInput, Extras};
pub use engine::{apply_command, BallOutcome, ScoringCommand};
pub use error::{ErrorKind, ScoringError, ScoringResult};
pub use events::ScoringEvent;
pub use innings::{Innings, InningsEnd, InningsStatus};
pub use over::BowlerCheck;
pub use result::{Margin, MatchResult, Winner};
pub use rules::ScoringConfig;
pub use scoreboard::Scoreboard;
pub use state::{MatchFormat, MatchId, MatchSetup, MatchState, MatchStatus, Side, Toss, TossChoice};
pub use wicket::DismissalKind;
