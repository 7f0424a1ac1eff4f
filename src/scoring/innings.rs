//! Innings State and Lifecycle
//!
//! One side's batting effort, and the rules that close it and move the
//! match on to the next innings or to a result.
//!
//! ```text
//! NotStarted ──start_innings──▶ Active ──overs / all out / target / manual──▶ Completed
//! ```

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::scoring::delivery::{Ball, Extras};
use crate::scoring::events::ScoringEvent;
use crate::scoring::ledger::{format_overs, Ledger};
use crate::scoring::partnership::CurrentPartnership;
use crate::scoring::result::compute_result;
use crate::scoring::rules::{ScoringConfig, BALLS_PER_OVER};
use crate::scoring::state::{MatchState, MatchStatus, Side};
use crate::scoring::wicket::FallOfWicket;

/// Lifecycle of one innings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsStatus {
    /// Openers not yet named.
    #[default]
    NotStarted,
    /// Deliveries being recorded.
    Active,
    /// Closed.
    Completed,
}

/// Why an innings closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsEnd {
    /// All overs bowled.
    OversCompleted,
    /// Side bowled out.
    AllOut,
    /// Chasing side passed the target.
    TargetReached,
    /// Ended by the scorer (declaration, forfeit, weather).
    Manual(String),
    /// Match abandoned while the innings was open.
    Abandoned(String),
}

impl InningsEnd {
    /// Short human-readable reason.
    pub fn describe(&self) -> String {
        match self {
            InningsEnd::OversCompleted => "overs completed".to_string(),
            InningsEnd::AllOut => "all out".to_string(),
            InningsEnd::TargetReached => "target reached".to_string(),
            InningsEnd::Manual(reason) => reason.clone(),
            InningsEnd::Abandoned(reason) => format!("abandoned: {}", reason),
        }
    }
}

/// One side's innings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    /// Batting side. Unset for the second innings until the first ends.
    pub team: Option<Side>,

    /// Overs allowed.
    pub overs_limit: u32,

    /// Lifecycle.
    pub status: InningsStatus,

    /// Total runs.
    pub total_runs: u32,

    /// Wickets fallen.
    pub wickets: u32,

    /// Legal deliveries bowled.
    pub legal_deliveries: u32,

    /// Extras conceded, by type.
    pub extras: Extras,

    /// Append-only ball log.
    pub balls: Vec<Ball>,

    /// Batting and bowling figures.
    pub ledger: Ledger,

    /// Fall-of-wicket records.
    pub fall_of_wickets: Vec<FallOfWicket>,

    /// Closed partnerships by pair key.
    pub partnerships: BTreeMap<String, u32>,

    /// Pair at the crease.
    pub partnership: CurrentPartnership,

    /// Bowler of the current over.
    pub current_bowler: Option<String>,

    /// Bowler who delivered the last ball of the previous completed over.
    pub last_over_bowler: Option<String>,

    /// Runs charged to bowlers in the over in progress.
    pub over_runs_charged: u32,

    /// Why the innings closed.
    pub end: Option<InningsEnd>,
}

impl Innings {
    /// Create an empty innings.
    pub fn new(team: Option<Side>, overs_limit: u32) -> Self {
        Self {
            team,
            overs_limit,
            status: InningsStatus::NotStarted,
            total_runs: 0,
            wickets: 0,
            legal_deliveries: 0,
            extras: Extras::NONE,
            balls: Vec::new(),
            ledger: Ledger::default(),
            fall_of_wickets: Vec::new(),
            partnerships: BTreeMap::new(),
            partnership: CurrentPartnership::default(),
            current_bowler: None,
            last_over_bowler: None,
            over_runs_charged: 0,
            end: None,
        }
    }

    /// Legal deliveries allowed.
    pub fn max_deliveries(&self) -> u32 {
        ScoringConfig::deliveries_for(self.overs_limit)
    }

    /// Legal deliveries still to come.
    pub fn balls_remaining(&self) -> u32 {
        self.max_deliveries().saturating_sub(self.legal_deliveries)
    }

    /// Over in progress (0-based).
    pub fn current_over(&self) -> u32 {
        self.legal_deliveries / BALLS_PER_OVER
    }

    /// Next legal delivery opens an over.
    pub fn at_over_boundary(&self) -> bool {
        self.legal_deliveries % BALLS_PER_OVER == 0
    }

    /// Overs as `"<overs>.<balls>"`.
    pub fn overs(&self) -> String {
        format_overs(self.legal_deliveries)
    }

    /// Runs per six legal balls.
    pub fn run_rate(&self) -> f64 {
        if self.legal_deliveries == 0 {
            return 0.0;
        }
        crate::scoring::ledger::round2(
            self.total_runs as f64 * BALLS_PER_OVER as f64 / self.legal_deliveries as f64,
        )
    }

    /// Deliveries accepted.
    pub fn is_active(&self) -> bool {
        self.status == InningsStatus::Active
    }

    /// Closed.
    pub fn is_completed(&self) -> bool {
        self.status == InningsStatus::Completed
    }

    /// Any ball recorded yet.
    pub fn has_deliveries(&self) -> bool {
        !self.balls.is_empty()
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Should the current innings close after the last delivery?
pub fn completion_due(state: &MatchState, config: &ScoringConfig) -> Option<InningsEnd> {
    let index = state.current_innings;
    let innings = &state.innings[index];

    if !innings.is_active() {
        return None;
    }

    if index == 1 && config.complete_on_target_reached {
        if let Some(target) = state.target() {
            if innings.total_runs >= target {
                return Some(InningsEnd::TargetReached);
            }
        }
    }

    if innings.legal_deliveries >= innings.max_deliveries() {
        return Some(InningsEnd::OversCompleted);
    }

    if config.complete_on_all_out && innings.wickets >= config.all_out_wickets {
        return Some(InningsEnd::AllOut);
    }

    None
}

/// Close the current innings and advance the match.
///
/// First innings: the second inherits the other side (if unset) and becomes
/// current. Second innings: the match completes and the result is computed.
pub fn complete_current_innings(state: &mut MatchState, end: InningsEnd) -> Vec<ScoringEvent> {
    let mut events = Vec::new();
    let index = state.current_innings;

    {
        let innings = &mut state.innings[index];
        innings.status = InningsStatus::Completed;
        innings.end = Some(end.clone());
        innings.current_bowler = None;

        events.push(ScoringEvent::InningsCompleted {
            innings: index,
            team: innings.team,
            runs: innings.total_runs,
            wickets: innings.wickets,
            overs: innings.overs(),
            reason: end.describe(),
        });
    }

    if index == 0 {
        if state.innings[1].team.is_none() {
            state.innings[1].team = state.innings[0].team.map(Side::other);
        }
        state.current_innings = 1;
    } else {
        let result = compute_result(state);
        state.status = MatchStatus::Completed;
        state.result = Some(result.clone());
        events.push(ScoringEvent::MatchCompleted { result });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::result::Winner;
    use crate::scoring::state::{MatchSetup, Toss, TossChoice};

    fn state() -> MatchState {
        let setup = MatchSetup::new("Lions", "Tigers", 2, Toss::new(Side::TeamB, TossChoice::Bat));
        let mut state = MatchState::new(uuid::Uuid::nil(), setup).unwrap();
        state.status = MatchStatus::InProgress;
        state.innings[0].status = InningsStatus::Active;
        state
    }

    #[test]
    fn test_innings_helpers() {
        let mut innings = Innings::new(Some(Side::TeamA), 20);
        assert_eq!(innings.max_deliveries(), 120);
        assert!(innings.at_over_boundary());
        innings.legal_deliveries = 45;
        innings.total_runs = 60;
        assert_eq!(innings.overs(), "7.3");
        assert_eq!(innings.current_over(), 7);
        assert_eq!(innings.balls_remaining(), 75);
        assert_eq!(innings.run_rate(), 8.0);
    }

    #[test]
    fn test_overs_limit_completes() {
        let config = ScoringConfig::default();
        let mut state = state();
        state.innings[0].legal_deliveries = 11;
        assert_eq!(completion_due(&state, &config), None);
        state.innings[0].legal_deliveries = 12;
        assert_eq!(completion_due(&state, &config), Some(InningsEnd::OversCompleted));
    }

    #[test]
    fn test_all_out_is_configurable() {
        let mut config = ScoringConfig::default();
        let mut state = state();
        state.innings[0].wickets = 10;
        assert_eq!(completion_due(&state, &config), Some(InningsEnd::AllOut));

        config.complete_on_all_out = false;
        assert_eq!(completion_due(&state, &config), None);
    }

    #[test]
    fn test_first_innings_hands_over() {
        let mut state = state();
        assert_eq!(state.innings[0].team, Some(Side::TeamB));
        assert_eq!(state.innings[1].team, None);

        let events = complete_current_innings(&mut state, InningsEnd::OversCompleted);

        assert_eq!(events.len(), 1);
        assert!(state.innings[0].is_completed());
        assert_eq!(state.current_innings, 1);
        assert_eq!(state.innings[1].team, Some(Side::TeamA));
        assert_eq!(state.status, MatchStatus::InProgress);
        assert!(state.result.is_none());
    }

    #[test]
    fn test_second_innings_completes_match() {
        let mut state = state();
        state.innings[0].total_runs = 150;
        complete_current_innings(&mut state, InningsEnd::OversCompleted);
        state.innings[1].status = InningsStatus::Active;
        state.innings[1].total_runs = 148;

        let events = complete_current_innings(&mut state, InningsEnd::AllOut);

        assert_eq!(state.status, MatchStatus::Completed);
        let result = state.result.as_ref().unwrap();
        assert_eq!(result.winner, Winner::Team(Side::TeamB));
        assert!(matches!(events.last(), Some(ScoringEvent::MatchCompleted { .. })));
    }

    #[test]
    fn test_target_reached() {
        let config = ScoringConfig::default();
        let mut state = state();
        state.innings[0].total_runs = 20;
        complete_current_innings(&mut state, InningsEnd::OversCompleted);
        state.innings[1].status = InningsStatus::Active;

        state.innings[1].total_runs = 20;
        assert_eq!(completion_due(&state, &config), None);
        state.innings[1].total_runs = 21;
        assert_eq!(completion_due(&state, &config), Some(InningsEnd::TargetReached));

        state.revised_target = Some(25);
        assert_eq!(completion_due(&state, &config), None);
    }
}
