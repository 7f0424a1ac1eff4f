//! Scoring Engine
//!
//! The write path. Every operation checks the whole transition before
//! touching the state, then applies it without further failure points, so a
//! rejected command leaves the match exactly as it was.
//!
//! ```text
//! BallInput ─▶ classify ─▶ totals + ledger ─▶ partnership / wicket
//!           ─▶ strike + over ─▶ innings completion ─▶ result
//! ```

use serde::{Deserialize, Serialize};

use crate::scoring::delivery::{classify, Ball, BallInput};
use crate::scoring::error::{ScoringError, ScoringResult};
use crate::scoring::events::ScoringEvent;
use crate::scoring::innings::{completion_due, complete_current_innings, InningsEnd, InningsStatus};
use crate::scoring::ledger::Ledger;
use crate::scoring::over::{check_bowler, close_over, rotate_strike, BowlerCheck};
use crate::scoring::partnership::CurrentPartnership;
use crate::scoring::result::no_result;
use crate::scoring::rules::{ScoringConfig, BALLS_PER_OVER};
use crate::scoring::state::{MatchState, MatchStatus};
use crate::scoring::wicket::resolve_wicket;

// =============================================================================
// COMMANDS
// =============================================================================

/// A state-changing operation, as recorded in transcripts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringCommand {
    /// Name the openers and the opening bowler.
    StartInnings {
        /// On strike.
        striker: String,
        /// Other end.
        non_striker: String,
        /// Opening bowler.
        bowler: String,
    },
    /// Record one delivery.
    RecordBall(BallInput),
    /// Fill the vacant slot after a wicket.
    SelectNextBatsman {
        /// Incoming batsman.
        name: String,
    },
    /// Set the bowler of the current over.
    ChangeBowler {
        /// Bowler.
        name: String,
    },
    /// Close the innings by hand.
    EndInnings {
        /// Declaration, forfeit, weather.
        reason: String,
    },
    /// Complete the match without a result.
    AbandonMatch {
        /// Why.
        reason: String,
    },
}

impl ScoringCommand {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ScoringCommand::StartInnings { .. } => "start_innings",
            ScoringCommand::RecordBall(_) => "record_ball",
            ScoringCommand::SelectNextBatsman { .. } => "select_next_batsman",
            ScoringCommand::ChangeBowler { .. } => "change_bowler",
            ScoringCommand::EndInnings { .. } => "end_innings",
            ScoringCommand::AbandonMatch { .. } => "abandon_match",
        }
    }
}

/// Apply a command to the match.
pub fn apply_command(
    state: &mut MatchState,
    config: &ScoringConfig,
    command: &ScoringCommand,
) -> ScoringResult<Vec<ScoringEvent>> {
    match command {
        ScoringCommand::StartInnings { striker, non_striker, bowler } => {
            start_innings(state, striker, non_striker, bowler)
        }
        ScoringCommand::RecordBall(input) => {
            record_ball(state, config, input.clone()).map(|outcome| outcome.events)
        }
        ScoringCommand::SelectNextBatsman { name } => select_next_batsman(state, name),
        ScoringCommand::ChangeBowler { name } => change_bowler(state, name),
        ScoringCommand::EndInnings { reason } => end_innings(state, reason),
        ScoringCommand::AbandonMatch { reason } => abandon_match(state, reason),
    }
}

// =============================================================================
// GUARDS
// =============================================================================

fn ensure_not_completed(state: &MatchState) -> ScoringResult<()> {
    if state.is_completed() {
        return Err(ScoringError::invalid_state("match already completed"));
    }
    Ok(())
}

fn ensure_active_innings(state: &MatchState) -> ScoringResult<()> {
    ensure_not_completed(state)?;
    match state.current().status {
        InningsStatus::Active => Ok(()),
        InningsStatus::NotStarted => Err(ScoringError::invalid_state(format!(
            "innings {} has not started",
            state.current_innings + 1
        ))),
        InningsStatus::Completed => Err(ScoringError::invalid_state(format!(
            "innings {} already completed",
            state.current_innings + 1
        ))),
    }
}

fn required_name<'a>(value: &'a str, field: &str) -> ScoringResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScoringError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

// =============================================================================
// INNINGS START
// =============================================================================

/// Name the openers and opening bowler of the current innings.
///
/// May be repeated to correct the names until the first ball is recorded.
pub fn start_innings(
    state: &mut MatchState,
    striker: &str,
    non_striker: &str,
    bowler: &str,
) -> ScoringResult<Vec<ScoringEvent>> {
    ensure_not_completed(state)?;

    let innings = state.current();
    if innings.is_completed() {
        return Err(ScoringError::invalid_state("innings already completed"));
    }
    if innings.has_deliveries() {
        return Err(ScoringError::invalid_state(
            "innings already has deliveries recorded",
        ));
    }

    let striker = required_name(striker, "striker")?;
    let non_striker = required_name(non_striker, "non_striker")?;
    let bowler = required_name(bowler, "bowler")?;
    if striker == non_striker {
        return Err(ScoringError::validation("striker and non_striker must differ"));
    }
    check_bowler(innings, bowler)?;

    let index = state.current_innings;
    let innings = state.current_mut();
    innings.status = InningsStatus::Active;
    innings.partnership = CurrentPartnership::new(striker, non_striker);
    innings.ledger = Ledger::default();
    innings.ledger.batsman_mut(striker);
    innings.ledger.batsman_mut(non_striker);
    innings.ledger.bowler_mut(bowler);
    innings.current_bowler = Some(bowler.to_string());
    let team = innings.team;

    state.status = MatchStatus::InProgress;

    Ok(vec![ScoringEvent::InningsStarted {
        innings: index,
        team,
        striker: striker.to_string(),
        non_striker: non_striker.to_string(),
        bowler: bowler.to_string(),
    }])
}

// =============================================================================
// BALL RECORDING
// =============================================================================

/// What a recorded delivery did.
#[derive(Clone, Debug, PartialEq)]
pub struct BallOutcome {
    /// The appended record.
    pub ball: Ball,
    /// Ball closed an over.
    pub over_completed: bool,
    /// Ball closed the innings.
    pub innings_completed: bool,
    /// Ball decided the match.
    pub match_completed: bool,
    /// Events in order.
    pub events: Vec<ScoringEvent>,
}

/// Record one delivery against the current innings.
pub fn record_ball(
    state: &mut MatchState,
    config: &ScoringConfig,
    mut input: BallInput,
) -> ScoringResult<BallOutcome> {
    // 1. Validate everything up front
    ensure_active_innings(state)?;
    input.validate(config)?;
    input.wicket_player = input.wicket_player.map(|name| name.trim().to_string());

    let innings = state.current();
    let (striker, non_striker) = match (&innings.partnership.striker, &innings.partnership.non_striker) {
        (Some(s), Some(n)) => (s.clone(), n.clone()),
        _ => {
            return Err(ScoringError::rule(
                "striker and non-striker must both be set before the next delivery",
            ))
        }
    };

    let bowler = input
        .bowler
        .as_deref()
        .map(str::trim)
        .map(str::to_string)
        .or_else(|| innings.current_bowler.clone())
        .ok_or_else(|| ScoringError::rule("no bowler set for this delivery"))?;
    check_bowler(innings, &bowler)?;

    // 2. Classify and build the record
    let index = state.current_innings;
    let class = classify(innings.legal_deliveries, &input.extras);
    let ball = Ball::from_input(input, class, striker, non_striker, bowler.clone());
    let mut events = vec![ScoringEvent::BallRecorded { innings: index, ball: ball.clone() }];

    // 3. Totals and ledger
    let innings = state.current_mut();
    innings.total_runs += ball.total_runs;
    innings.extras.accumulate(&ball.extras);
    if class.legal {
        innings.legal_deliveries += 1;
    }
    let charged = innings.ledger.record_delivery(&ball, config);
    innings.over_runs_charged += charged;
    innings.current_bowler = Some(bowler.clone());

    // 4. Partnership and wicket
    match (ball.is_wicket, ball.wicket_type, ball.wicket_player.as_deref()) {
        (true, Some(kind), Some(dismissed)) => {
            innings.partnership.close_on_wicket(dismissed, &mut innings.partnerships);
            let fall = resolve_wicket(innings, &bowler, dismissed, kind, config);
            events.push(ScoringEvent::WicketFell {
                innings: index,
                fall,
                bowler_credited: config.credits_bowler(kind),
            });
        }
        _ => innings.partnership.add_delivery(ball.total_runs, class.legal),
    }

    // 5. Strike and over
    let over_completed = class.legal && innings.legal_deliveries % BALLS_PER_OVER == 0;
    rotate_strike(innings, &ball, over_completed);
    if over_completed {
        let maiden = close_over(innings, &bowler);
        events.push(ScoringEvent::OverCompleted {
            innings: index,
            over: ball.over,
            bowler: bowler.clone(),
            maiden,
        });
    }

    innings.balls.push(ball.clone());

    // 6. Innings lifecycle
    let mut innings_completed = false;
    if let Some(end) = completion_due(state, config) {
        innings_completed = true;
        events.extend(complete_current_innings(state, end));
    }

    Ok(BallOutcome {
        ball,
        over_completed,
        innings_completed,
        match_completed: state.is_completed(),
        events,
    })
}

// =============================================================================
// PLAYER CHANGES
// =============================================================================

/// Fill the first vacant partnership slot.
///
/// A batsman who retired hurt may come back; anyone else already out may not.
pub fn select_next_batsman(state: &mut MatchState, name: &str) -> ScoringResult<Vec<ScoringEvent>> {
    ensure_active_innings(state)?;
    let name = required_name(name, "batsman")?;

    let innings = state.current();
    if innings.partnership.vacancy().is_none() {
        return Err(ScoringError::rule("no vacant slot: both batsmen are at the crease"));
    }
    if innings.partnership.contains(name) {
        return Err(ScoringError::rule(format!("{} is already at the crease", name)));
    }
    if let Some(entry) = innings.ledger.batsman(name) {
        let resumable = entry.dismissal.is_some_and(|kind| kind.may_resume());
        if entry.is_out && !resumable {
            return Err(ScoringError::rule(format!("{} is already out", name)));
        }
    }

    let index = state.current_innings;
    let innings = state.current_mut();
    innings.partnership.fill_vacancy(name);
    let entry = innings.ledger.batsman_mut(name);
    entry.is_out = false;
    entry.dismissal = None;

    Ok(vec![ScoringEvent::BatsmanSelected { innings: index, name: name.to_string() }])
}

/// Check a bowler for the next delivery without changing anything.
pub fn validate_next_bowler(state: &MatchState, name: &str) -> ScoringResult<BowlerCheck> {
    ensure_not_completed(state)?;
    let innings = state.current();
    if innings.is_completed() {
        return Err(ScoringError::invalid_state("innings already completed"));
    }
    check_bowler(innings, name.trim())
}

/// Set the bowler of the current over.
pub fn change_bowler(state: &mut MatchState, name: &str) -> ScoringResult<Vec<ScoringEvent>> {
    ensure_active_innings(state)?;
    let name = required_name(name, "bowler")?;
    check_bowler(state.current(), name)?;

    let index = state.current_innings;
    let innings = state.current_mut();
    innings.current_bowler = Some(name.to_string());
    innings.ledger.bowler_mut(name);

    Ok(vec![ScoringEvent::BowlerChanged { innings: index, bowler: name.to_string() }])
}

// =============================================================================
// MANUAL TRANSITIONS
// =============================================================================

/// Close the current innings by hand.
///
/// Same transition as completing the overs. Rejected once the innings is
/// already closed.
pub fn end_innings(state: &mut MatchState, reason: &str) -> ScoringResult<Vec<ScoringEvent>> {
    ensure_active_innings(state)?;
    let reason = required_name(reason, "reason")?;
    Ok(complete_current_innings(state, InningsEnd::Manual(reason.to_string())))
}

/// Complete the match without a result.
pub fn abandon_match(state: &mut MatchState, reason: &str) -> ScoringResult<Vec<ScoringEvent>> {
    ensure_not_completed(state)?;
    let reason = required_name(reason, "reason")?;

    let mut events = Vec::new();
    let index = state.current_innings;
    let innings = state.current_mut();
    if innings.is_active() {
        let end = InningsEnd::Abandoned(reason.to_string());
        innings.status = InningsStatus::Completed;
        innings.current_bowler = None;
        events.push(ScoringEvent::InningsCompleted {
            innings: index,
            team: innings.team,
            runs: innings.total_runs,
            wickets: innings.wickets,
            overs: innings.overs(),
            reason: end.describe(),
        });
        innings.end = Some(end);
    }

    let result = no_result(reason);
    state.status = MatchStatus::Completed;
    state.result = Some(result.clone());
    events.push(ScoringEvent::MatchCompleted { result });
    Ok(events)
}

// =============================================================================
// TESTS
// =============================================================================
