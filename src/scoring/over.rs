//! Strike Rotation & Over Controller
//!
//! Strike swaps after each delivery and the rule that no bowler may bowl two
//! overs in a row. The bowler of the last completed over is kept on the
//! innings and updated when an over closes, so the check never scans the log.

use serde::{Deserialize, Serialize};

use crate::scoring::delivery::Ball;
use crate::scoring::error::{ScoringError, ScoringResult};
use crate::scoring::innings::Innings;

/// Outcome of a bowler pre-check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerCheck {
    /// Over the next delivery belongs to (0-based).
    pub over: u32,
    /// Next delivery opens a new over.
    pub starts_new_over: bool,
    /// Bowler of the previous completed over.
    pub previous_over_bowler: Option<String>,
}

/// May `bowler` deliver the next ball?
///
/// Used by both the standalone pre-check and ball recording, so the two
/// always agree.
pub fn check_bowler(innings: &Innings, bowler: &str) -> ScoringResult<BowlerCheck> {
    if bowler.trim().is_empty() {
        return Err(ScoringError::validation("bowler name is empty"));
    }

    if innings.last_over_bowler.as_deref() == Some(bowler) {
        return Err(ScoringError::rule(format!(
            "{} bowled the previous over and cannot bowl consecutive overs",
            bowler
        )));
    }

    Ok(BowlerCheck {
        over: innings.current_over(),
        starts_new_over: innings.at_over_boundary(),
        previous_over_bowler: innings.last_over_bowler.clone(),
    })
}

/// Apply strike rotation for a delivery already counted.
///
/// Odd runs on a non-wicket legal ball swap ends; the end of an over swaps
/// again. Two swaps cancel.
pub fn rotate_strike(innings: &mut Innings, ball: &Ball, over_completed: bool) {
    if ball.is_legal() && !ball.is_wicket && ball.ran() % 2 == 1 {
        innings.partnership.swap_strike();
    }
    if over_completed {
        innings.partnership.swap_strike();
    }
}

/// Close the over just completed by `bowler`.
///
/// Returns whether it was a maiden.
pub fn close_over(innings: &mut Innings, bowler: &str) -> bool {
    let maiden = innings.over_runs_charged == 0;
    if maiden {
        innings.ledger.bowler_mut(bowler).maidens += 1;
    }

    innings.last_over_bowler = Some(bowler.to_string());
    innings.current_bowler = None;
    innings.over_runs_charged = 0;
    maiden
}
