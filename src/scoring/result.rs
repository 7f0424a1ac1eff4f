//! Match Result Calculator
//!
//! Compares the two innings totals once the second innings has closed.

use serde::{Deserialize, Serialize};

use crate::scoring::state::{MatchState, Side};

/// Who won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// One side won.
    Team(Side),
    /// Totals level.
    Tie,
    /// Abandoned without a result.
    NoResult,
}

/// Winning margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Margin {
    /// Run difference between the totals.
    Runs(u32),
}

/// Outcome of a completed match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Winner designation.
    pub winner: Winner,
    /// Margin, when a side won.
    pub margin: Option<Margin>,
    /// Human-readable summary.
    pub summary: String,
}

/// Derive the result from the two innings totals.
///
/// Pure: the same final state always yields the same result.
pub fn compute_result(state: &MatchState) -> MatchResult {
    let first = &state.innings[0];
    let second = &state.innings[1];

    let first_side = first.team.unwrap_or_else(|| state.toss.batting_first());
    let second_side = second.team.unwrap_or_else(|| first_side.other());

    let (winner, margin) = match second.total_runs.cmp(&first.total_runs) {
        std::cmp::Ordering::Greater => (
            Winner::Team(second_side),
            Some(Margin::Runs(second.total_runs - first.total_runs)),
        ),
        std::cmp::Ordering::Less => (
            Winner::Team(first_side),
            Some(Margin::Runs(first.total_runs - second.total_runs)),
        ),
        std::cmp::Ordering::Equal => (Winner::Tie, None),
    };

    let summary = match (winner, margin) {
        (Winner::Team(side), Some(Margin::Runs(runs))) => {
            let unit = if runs == 1 { "run" } else { "runs" };
            format!("{} won by {} {}", state.team_name(side), runs, unit)
        }
        _ => "Match tied".to_string(),
    };

    MatchResult { winner, margin, summary }
}

/// Result for an abandoned match.
pub fn no_result(reason: &str) -> MatchResult {
    MatchResult {
        winner: Winner::NoResult,
        margin: None,
        summary: format!("No result ({})", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::state::{MatchSetup, Toss, TossChoice};

    fn finished(first: u32, second: u32) -> MatchState {
        let setup = MatchSetup::new("Lions", "Tigers", 20, Toss::new(Side::TeamA, TossChoice::Bat));
        let mut state = MatchState::new(uuid::Uuid::nil(), setup).unwrap();
        state.innings[0].total_runs = first;
        state.innings[1].team = Some(Side::TeamB);
        state.innings[1].total_runs = second;
        state
    }

    #[test]
    fn test_defending_side_wins() {
        let result = compute_result(&finished(150, 148));
        assert_eq!(result.winner, Winner::Team(Side::TeamA));
        assert_eq!(result.margin, Some(Margin::Runs(2)));
        assert_eq!(result.summary, "Lions won by 2 runs");
    }

    #[test]
    fn test_chasing_side_wins() {
        let result = compute_result(&finished(150, 151));
        assert_eq!(result.winner, Winner::Team(Side::TeamB));
        assert_eq!(result.summary, "Tigers won by 1 run");
    }

    #[test]
    fn test_level_totals_tie() {
        let result = compute_result(&finished(150, 150));
        assert_eq!(result.winner, Winner::Tie);
        assert_eq!(result.margin, None);
        assert_eq!(result.summary, "Match tied");
    }

    #[test]
    fn test_result_is_idempotent() {
        let state = finished(99, 120);
        assert_eq!(compute_result(&state), compute_result(&state));
    }

    #[test]
    fn test_no_result_summary() {
        let result = no_result("rain");
        assert_eq!(result.winner, Winner::NoResult);
        assert_eq!(result.summary, "No result (rain)");
    }
}
