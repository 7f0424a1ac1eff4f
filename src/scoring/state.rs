//! Match State Definitions
//!
//! The match aggregate: fixture details, toss, and the two innings it owns.
//! Uses BTreeMap (inside innings) for deterministic iteration order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::scoring::error::{ScoringError, ScoringResult};
use crate::scoring::innings::{Innings, InningsStatus};
use crate::scoring::result::MatchResult;
use crate::scoring::rules::ScoringConfig;

/// Unique match identifier.
pub type MatchId = Uuid;

// =============================================================================
// SIDES & TOSS
// =============================================================================

/// One of the two teams in the fixture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Side {
    /// First team named in the room.
    TeamA = 0,
    /// Second team named in the room.
    TeamB = 1,
}

impl Side {
    /// The opposing side.
    pub fn other(self) -> Side {
        match self {
            Side::TeamA => Side::TeamB,
            Side::TeamB => Side::TeamA,
        }
    }
}

/// What the toss winner chose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TossChoice {
    /// Bat first.
    Bat,
    /// Bowl first.
    Bowl,
}

/// Toss outcome, finalized before the match is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    /// Side that won the toss.
    pub winner: Side,
    /// Their choice.
    pub choice: TossChoice,
}

impl Toss {
    /// Create a toss outcome.
    pub const fn new(winner: Side, choice: TossChoice) -> Self {
        Self { winner, choice }
    }

    /// Side batting in the first innings.
    pub fn batting_first(&self) -> Side {
        match self.choice {
            TossChoice::Bat => self.winner,
            TossChoice::Bowl => self.winner.other(),
        }
    }
}

/// Limited-overs format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    /// Ten overs a side.
    T10,
    /// Twenty overs a side.
    T20,
    /// Fifty overs a side.
    Odi,
    /// Overs agreed in the room.
    #[default]
    Custom,
}

impl MatchFormat {
    /// Standard overs for the format.
    pub fn default_overs(self) -> Option<u32> {
        match self {
            MatchFormat::T10 => Some(10),
            MatchFormat::T20 => Some(20),
            MatchFormat::Odi => Some(50),
            MatchFormat::Custom => None,
        }
    }
}

// =============================================================================
// MATCH SETUP
// =============================================================================

/// Finalized room and toss context used to create a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    /// Format.
    #[serde(default)]
    pub format: MatchFormat,
    /// Overs per innings. Falls back to the format's standard.
    #[serde(default)]
    pub overs_limit: Option<u32>,
    /// Name of [`Side::TeamA`].
    pub team_a: String,
    /// Name of [`Side::TeamB`].
    pub team_b: String,
    /// Toss outcome.
    pub toss: Toss,
    /// Scoring policy.
    #[serde(default)]
    pub config: ScoringConfig,
}

impl MatchSetup {
    /// Custom-format setup with default scoring policy.
    pub fn new(
        team_a: impl Into<String>,
        team_b: impl Into<String>,
        overs_limit: u32,
        toss: Toss,
    ) -> Self {
        Self {
            format: MatchFormat::Custom,
            overs_limit: Some(overs_limit),
            team_a: team_a.into(),
            team_b: team_b.into(),
            toss,
            config: ScoringConfig::default(),
        }
    }

    /// Resolved overs per innings.
    pub fn resolved_overs(&self) -> ScoringResult<u32> {
        let overs = self
            .overs_limit
            .or_else(|| self.format.default_overs())
            .ok_or_else(|| ScoringError::validation("overs_limit required for custom format"))?;

        if overs == 0 {
            return Err(ScoringError::validation("overs_limit must be positive"));
        }
        Ok(overs)
    }
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Lifecycle of the match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Created, first innings not started.
    #[default]
    NotStarted,
    /// Innings under way.
    InProgress,
    /// Result decided.
    Completed,
}

/// Complete state of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    /// Match identifier.
    pub match_id: MatchId,

    /// Format.
    pub format: MatchFormat,

    /// Overs per innings.
    pub overs_limit: u32,

    /// Name of [`Side::TeamA`].
    pub team_a: String,

    /// Name of [`Side::TeamB`].
    pub team_b: String,

    /// Toss outcome.
    pub toss: Toss,

    /// Exactly two innings.
    pub innings: Vec<Innings>,

    /// Index of the innings in play.
    pub current_innings: usize,

    /// Lifecycle.
    pub status: MatchStatus,

    /// Final result, set once the match completes.
    pub result: Option<MatchResult>,

    /// Revised target placeholder (rain rules are not computed).
    pub revised_target: Option<u32>,
}

impl MatchState {
    /// Create a match from a finalized setup.
    pub fn new(match_id: MatchId, setup: MatchSetup) -> ScoringResult<Self> {
        let overs_limit = setup.resolved_overs()?;

        let team_a = setup.team_a.trim().to_string();
        let team_b = setup.team_b.trim().to_string();
        if team_a.is_empty() || team_b.is_empty() {
            return Err(ScoringError::validation("team names must not be empty"));
        }
        if team_a == team_b {
            return Err(ScoringError::validation("team names must differ"));
        }

        let first = setup.toss.batting_first();

        Ok(Self {
            match_id,
            format: setup.format,
            overs_limit,
            team_a,
            team_b,
            toss: setup.toss,
            innings: vec![
                Innings::new(Some(first), overs_limit),
                Innings::new(None, overs_limit),
            ],
            current_innings: 0,
            status: MatchStatus::NotStarted,
            result: None,
            revised_target: None,
        })
    }

    /// Name of a side.
    pub fn team_name(&self, side: Side) -> &str {
        match side {
            Side::TeamA => &self.team_a,
            Side::TeamB => &self.team_b,
        }
    }

    /// Innings in play.
    pub fn current(&self) -> &Innings {
        &self.innings[self.current_innings]
    }

    /// Innings in play, mutably.
    pub fn current_mut(&mut self) -> &mut Innings {
        let index = self.current_innings;
        &mut self.innings[index]
    }

    /// Chasing target once the first innings has closed.
    pub fn target(&self) -> Option<u32> {
        if let Some(revised) = self.revised_target {
            return Some(revised);
        }
        let first = &self.innings[0];
        first.is_completed().then(|| first.total_runs + 1)
    }

    /// Match has a result.
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Deliveries recorded across both innings.
    pub fn balls_recorded(&self) -> u32 {
        self.innings.iter().map(|i| i.balls.len() as u32).sum()
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.balls_recorded(), |hasher| {
            hasher.update_bytes(self.match_id.as_bytes());
            hasher.update_u32(self.overs_limit);
            hasher.update_u8(self.status as u8);
            hasher.update_u32(self.current_innings as u32);

            for innings in &self.innings {
                hash_innings(innings, hasher);
            }

            if let Some(result) = &self.result {
                hasher.update_str(&result.summary);
            }
        })
    }
}

fn hash_innings(innings: &Innings, hasher: &mut StateHasher) {
    hasher.update_u8(innings.team.map(|s| s as u8 + 1).unwrap_or(0));
    hasher.update_u8(match innings.status {
        InningsStatus::NotStarted => 0,
        InningsStatus::Active => 1,
        InningsStatus::Completed => 2,
    });
    hasher.update_u32(innings.total_runs);
    hasher.update_u32(innings.wickets);
    hasher.update_u32(innings.legal_deliveries);
    hasher.update_opt_str(innings.partnership.striker.as_deref());
    hasher.update_opt_str(innings.partnership.non_striker.as_deref());
    hasher.update_opt_str(innings.current_bowler.as_deref());

    for ball in &innings.balls {
        hasher.update_u32(ball.over);
        hasher.update_u32(ball.ball_in_over);
        hasher.update_str(&ball.striker);
        hasher.update_str(&ball.non_striker);
        hasher.update_str(&ball.bowler);
        hasher.update_u32(ball.runs);
        hasher.update_u32(ball.extras.wide);
        hasher.update_u32(ball.extras.no_ball);
        hasher.update_u32(ball.extras.bye);
        hasher.update_u32(ball.extras.leg_bye);
        hasher.update_u32(ball.extras.penalty);
        hasher.update_bool(ball.is_wicket);
        hasher.update_opt_str(ball.wicket_type.map(|k| k.as_str()));
        hasher.update_opt_str(ball.wicket_player.as_deref());
        hasher.update_opt_str(ball.fielder.as_deref());
    }
}

// =============================================================================
// TESTS
// =============================================================================
