//! Scoreboard Projector
//!
//! Read-only view derived from the match state. Never mutates the state.

use serde::{Deserialize, Serialize};

use crate::scoring::delivery::Extras;
use crate::scoring::innings::{Innings, InningsStatus};
use crate::scoring::ledger::round2;
use crate::scoring::result::MatchResult;
use crate::scoring::rules::BALLS_PER_OVER;
use crate::scoring::state::{MatchId, MatchState, MatchStatus, Side};
use crate::scoring::wicket::{DismissalKind, FallOfWicket};

/// One batsman's line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattingLine {
    /// Player name.
    pub name: String,
    /// Runs.
    pub runs: u32,
    /// Balls faced.
    pub balls: u32,
    /// Fours.
    pub fours: u32,
    /// Sixes.
    pub sixes: u32,
    /// Runs per 100 balls.
    pub strike_rate: f64,
    /// Dismissed.
    pub is_out: bool,
    /// How.
    pub dismissal: Option<DismissalKind>,
}

/// One bowler's line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BowlingLine {
    /// Player name.
    pub name: String,
    /// Overs as `"o.b"`.
    pub overs: String,
    /// Maidens.
    pub maidens: u32,
    /// Runs conceded.
    pub runs_conceded: u32,
    /// Wickets.
    pub wickets: u32,
    /// Wide runs.
    pub wides: u32,
    /// No-ball runs.
    pub no_balls: u32,
    /// Runs per over.
    pub economy: f64,
}

/// Scorecard for one innings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InningsCard {
    /// Innings index.
    pub index: usize,
    /// Batting side.
    pub team: Option<Side>,
    /// Batting side's name.
    pub team_name: Option<String>,
    /// Lifecycle.
    pub status: InningsStatus,
    /// Total.
    pub runs: u32,
    /// Wickets.
    pub wickets: u32,
    /// Overs as `"o.b"`.
    pub overs: String,
    /// Runs per over.
    pub run_rate: f64,
    /// Extras conceded.
    pub extras: Extras,
    /// On strike.
    pub striker: Option<String>,
    /// Other end.
    pub non_striker: Option<String>,
    /// Bowler of the current over.
    pub current_bowler: Option<String>,
    /// Runs in the current partnership.
    pub partnership_runs: u32,
    /// Batting figures in order of appearance.
    pub batting: Vec<BattingLine>,
    /// Bowling figures in order of appearance.
    pub bowling: Vec<BowlingLine>,
    /// Fall of wickets.
    pub fall_of_wickets: Vec<FallOfWicket>,
    /// Closed partnerships as `(pair, runs)`.
    pub partnerships: Vec<(String, u32)>,
    /// Why it closed.
    pub end_reason: Option<String>,
}

/// Full read-side projection of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Match.
    pub match_id: MatchId,
    /// Lifecycle.
    pub status: MatchStatus,
    /// Name of side A.
    pub team_a: String,
    /// Name of side B.
    pub team_b: String,
    /// Innings in play.
    pub current_innings: usize,
    /// Both innings.
    pub innings: Vec<InningsCard>,
    /// Chasing target, once the first innings has closed.
    pub target: Option<u32>,
    /// Runs still needed, while the chase is on.
    pub required_runs: Option<u32>,
    /// Runs needed per over, while the chase is on.
    pub required_run_rate: Option<f64>,
    /// Result.
    pub result: Option<MatchResult>,
}

impl Scoreboard {
    /// Project the scoreboard for a match.
    pub fn project(state: &MatchState) -> Self {
        let innings = state
            .innings
            .iter()
            .enumerate()
            .map(|(index, innings)| project_innings(state, index, innings))
            .collect();

        let target = state.target();
        let (required_runs, required_run_rate) = chase(state, target);

        Self {
            match_id: state.match_id,
            status: state.status,
            team_a: state.team_a.clone(),
            team_b: state.team_b.clone(),
            current_innings: state.current_innings,
            innings,
            target,
            required_runs,
            required_run_rate,
            result: state.result.clone(),
        }
    }

    /// Innings card in play.
    pub fn current(&self) -> Option<&InningsCard> {
        self.innings.get(self.current_innings)
    }

    /// One-line summary such as `"Lions 45/2 (7.3 ov)"`.
    pub fn headline(&self) -> String {
        if let Some(result) = &self.result {
            return result.summary.clone();
        }
        match self.current() {
            Some(card) => format!(
                "{} {}/{} ({} ov)",
                card.team_name.as_deref().unwrap_or("?"),
                card.runs,
                card.wickets,
                card.overs
            ),
            None => String::new(),
        }
    }
}

fn project_innings(state: &MatchState, index: usize, innings: &Innings) -> InningsCard {
    let batting = innings
        .ledger
        .batting_order()
        .into_iter()
        .map(|(name, entry)| BattingLine {
            name: name.clone(),
            runs: entry.runs,
            balls: entry.balls,
            fours: entry.fours,
            sixes: entry.sixes,
            strike_rate: entry.strike_rate(),
            is_out: entry.is_out,
            dismissal: entry.dismissal,
        })
        .collect();

    let bowling = innings
        .ledger
        .bowling_order()
        .into_iter()
        .map(|(name, entry)| BowlingLine {
            name: name.clone(),
            overs: entry.overs(),
            maidens: entry.maidens,
            runs_conceded: entry.runs_conceded,
            wickets: entry.wickets,
            wides: entry.wides,
            no_balls: entry.no_balls,
            economy: entry.economy(),
        })
        .collect();

    InningsCard {
        index,
        team: innings.team,
        team_name: innings.team.map(|side| state.team_name(side).to_string()),
        status: innings.status,
        runs: innings.total_runs,
        wickets: innings.wickets,
        overs: innings.overs(),
        run_rate: innings.run_rate(),
        extras: innings.extras,
        striker: innings.partnership.striker.clone(),
        non_striker: innings.partnership.non_striker.clone(),
        current_bowler: innings.current_bowler.clone(),
        partnership_runs: innings.partnership.runs,
        batting,
        bowling,
        fall_of_wickets: innings.fall_of_wickets.clone(),
        partnerships: innings
            .partnerships
            .iter()
            .map(|(pair, runs)| (pair.clone(), *runs))
            .collect(),
        end_reason: innings.end.as_ref().map(|end| end.describe()),
    }
}

/// Required runs and rate, defined only while the second innings is active.
fn chase(state: &MatchState, target: Option<u32>) -> (Option<u32>, Option<f64>) {
    let second = &state.innings[1];
    let target = match target {
        Some(target) if second.is_active() => target,
        _ => return (None, None),
    };

    if second.total_runs >= target {
        return (None, None);
    }
    let required = target - second.total_runs;

    let remaining = second.balls_remaining();
    if remaining == 0 {
        return (Some(required), None);
    }

    let rate = round2(required as f64 * BALLS_PER_OVER as f64 / remaining as f64);
    (Some(required), Some(rate))
}
