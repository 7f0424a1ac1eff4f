//! Delivery Input and Classification
//!
//! A submitted ball is either a legal delivery, which takes one of the six
//! slots in the over, or an illegal one (wide or no-ball) which does not.
//! Classification never fails; input validation happens before it.

use serde::{Deserialize, Serialize};

use crate::scoring::error::{ScoringError, ScoringResult};
use crate::scoring::rules::{ScoringConfig, BALLS_PER_OVER};
use crate::scoring::wicket::DismissalKind;

// =============================================================================
// EXTRAS
// =============================================================================

/// Breakdown of extras on one delivery (each a run count).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extras {
    /// Wide runs.
    pub wide: u32,
    /// No-ball runs.
    pub no_ball: u32,
    /// Byes.
    pub bye: u32,
    /// Leg-byes.
    pub leg_bye: u32,
    /// Penalty runs.
    pub penalty: u32,
}

impl Extras {
    /// No extras.
    pub const NONE: Self = Self { wide: 0, no_ball: 0, bye: 0, leg_bye: 0, penalty: 0 };

    /// Wide delivery worth `runs`.
    pub const fn wide(runs: u32) -> Self {
        Self { wide: runs, ..Self::NONE }
    }

    /// No-ball worth `runs`.
    pub const fn no_ball(runs: u32) -> Self {
        Self { no_ball: runs, ..Self::NONE }
    }

    /// Byes.
    pub const fn byes(runs: u32) -> Self {
        Self { bye: runs, ..Self::NONE }
    }

    /// Leg-byes.
    pub const fn leg_byes(runs: u32) -> Self {
        Self { leg_bye: runs, ..Self::NONE }
    }

    /// Sum of all extras.
    #[inline]
    pub fn total(&self) -> u32 {
        self.wide + self.no_ball + self.bye + self.leg_bye + self.penalty
    }

    /// Wide or no-ball present.
    #[inline]
    pub fn is_illegal(&self) -> bool {
        self.wide > 0 || self.no_ball > 0
    }

    /// Runs the batsmen physically ran for but are not credited with.
    #[inline]
    pub fn byes_total(&self) -> u32 {
        self.bye + self.leg_bye
    }

    /// Extras fields with their names, for validation messages.
    fn fields(&self) -> [(&'static str, u32); 5] {
        [
            ("wide", self.wide),
            ("no_ball", self.no_ball),
            ("bye", self.bye),
            ("leg_bye", self.leg_bye),
            ("penalty", self.penalty),
        ]
    }

    /// Accumulate another delivery's extras.
    pub fn accumulate(&mut self, other: &Extras) {
        self.wide += other.wide;
        self.no_ball += other.no_ball;
        self.bye += other.bye;
        self.leg_bye += other.leg_bye;
        self.penalty += other.penalty;
    }
}

// =============================================================================
// BALL INPUT
// =============================================================================

/// One delivery as submitted by the scorer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallInput {
    /// Runs off the bat.
    #[serde(default)]
    pub runs: u32,

    /// Extras on this delivery.
    #[serde(default)]
    pub extras: Extras,

    /// Bowler for this delivery. Falls back to the innings' current bowler.
    #[serde(default)]
    pub bowler: Option<String>,

    /// Did a wicket fall?
    #[serde(default)]
    pub is_wicket: bool,

    /// How the batsman was dismissed.
    #[serde(default)]
    pub wicket_type: Option<DismissalKind>,

    /// Dismissed batsman. Defaults to the striker.
    #[serde(default)]
    pub wicket_player: Option<String>,

    /// Fielder credited with the dismissal.
    #[serde(default)]
    pub fielder: Option<String>,

    /// Free-text commentary.
    #[serde(default)]
    pub commentary: String,
}

impl BallInput {
    /// Plain delivery with runs off the bat.
    pub fn runs(runs: u32) -> Self {
        Self { runs, ..Default::default() }
    }

    /// Delivery carrying only extras.
    pub fn extras(extras: Extras) -> Self {
        Self { extras, ..Default::default() }
    }

    /// Wicket delivery.
    pub fn wicket(kind: DismissalKind, player: impl Into<String>) -> Self {
        Self {
            is_wicket: true,
            wicket_type: Some(kind),
            wicket_player: Some(player.into()),
            ..Default::default()
        }
    }

    /// Set the bowler.
    pub fn by(mut self, bowler: impl Into<String>) -> Self {
        self.bowler = Some(bowler.into());
        self
    }

    /// Runs this delivery adds to the total.
    #[inline]
    pub fn total_runs(&self) -> u32 {
        self.runs + self.extras.total()
    }

    /// Check the input is well formed.
    pub fn validate(&self, config: &ScoringConfig) -> ScoringResult<()> {
        if self.runs > config.max_bat_runs {
            return Err(ScoringError::validation(format!(
                "runs off the bat {} exceed maximum {}",
                self.runs, config.max_bat_runs
            )));
        }

        for (field, value) in self.extras.fields() {
            if value > config.max_extra_runs {
                return Err(ScoringError::validation(format!(
                    "{} extras {} exceed maximum {}",
                    field, value, config.max_extra_runs
                )));
            }
        }

        if let Some(bowler) = &self.bowler {
            if bowler.trim().is_empty() {
                return Err(ScoringError::validation("bowler name is empty"));
            }
        }

        if self.is_wicket {
            if self.wicket_type.is_none() {
                return Err(ScoringError::validation("wicket ball requires wicket_type"));
            }
            if self.wicket_player.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(ScoringError::validation("wicket_player is empty"));
            }
        } else if self.wicket_type.is_some() || self.wicket_player.is_some() {
            return Err(ScoringError::validation(
                "wicket details supplied on a non-wicket ball",
            ));
        }

        Ok(())
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Placement of a delivery within the innings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryClass {
    /// Counts as one of the six balls.
    pub legal: bool,
    /// Over index (0-based).
    pub over: u32,
    /// Ball within the over (1-6), 0 for illegal deliveries.
    pub ball_in_over: u32,
}

/// Classify a delivery given the legal deliveries bowled before it.
pub fn classify(legal_deliveries: u32, extras: &Extras) -> DeliveryClass {
    let legal = !extras.is_illegal();
    let over = legal_deliveries / BALLS_PER_OVER;
    let ball_in_over = if legal {
        (legal_deliveries % BALLS_PER_OVER) + 1
    } else {
        0
    };

    DeliveryClass { legal, over, ball_in_over }
}

// =============================================================================
// BALL RECORD
// =============================================================================

/// One recorded delivery. Immutable once appended to the innings log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    /// Over index (0-based).
    pub over: u32,
    /// Ball within the over (1-6), 0 for wides and no-balls.
    pub ball_in_over: u32,
    /// Batsman on strike.
    pub striker: String,
    /// Batsman at the other end.
    pub non_striker: String,
    /// Bowler.
    pub bowler: String,
    /// Runs off the bat.
    pub runs: u32,
    /// Extras breakdown.
    pub extras: Extras,
    /// Runs off the bat plus all extras.
    pub total_runs: u32,
    /// Did a wicket fall?
    pub is_wicket: bool,
    /// Dismissal kind.
    pub wicket_type: Option<DismissalKind>,
    /// Dismissed batsman.
    pub wicket_player: Option<String>,
    /// Fielder credited.
    pub fielder: Option<String>,
    /// Commentary.
    pub commentary: String,
}

impl Ball {
    /// Build the record for a classified input.
    pub fn from_input(
        input: BallInput,
        class: DeliveryClass,
        striker: String,
        non_striker: String,
        bowler: String,
    ) -> Self {
        let total_runs = input.total_runs();
        let wicket_player = if input.is_wicket {
            input.wicket_player.or_else(|| Some(striker.clone()))
        } else {
            None
        };

        Self {
            over: class.over,
            ball_in_over: class.ball_in_over,
            striker,
            non_striker,
            bowler,
            runs: input.runs,
            extras: input.extras,
            total_runs,
            is_wicket: input.is_wicket,
            wicket_type: input.wicket_type,
            wicket_player,
            fielder: input.fielder,
            commentary: input.commentary,
        }
    }

    /// Took an over slot.
    #[inline]
    pub fn is_legal(&self) -> bool {
        self.ball_in_over != 0
    }

    /// Runs physically completed between the wickets, for strike rotation.
    #[inline]
    pub fn ran(&self) -> u32 {
        self.runs + self.extras.byes_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_legal() {
        let class = classify(0, &Extras::NONE);
        assert!(class.legal);
        assert_eq!(class.over, 0);
        assert_eq!(class.ball_in_over, 1);

        let class = classify(5, &Extras::byes(2));
        assert!(class.legal);
        assert_eq!(class.over, 0);
        assert_eq!(class.ball_in_over, 6);

        let class = classify(6, &Extras::leg_byes(1));
        assert_eq!(class.over, 1);
        assert_eq!(class.ball_in_over, 1);
    }

    #[test]
    fn test_classify_illegal_keeps_current_over() {
        let wide = classify(8, &Extras::wide(1));
        assert!(!wide.legal);
        assert_eq!(wide.over, 1);
        assert_eq!(wide.ball_in_over, 0);

        let both = classify(8, &Extras { wide: 1, no_ball: 1, ..Extras::NONE });
        assert!(!both.legal);
    }

    #[test]
    fn test_no_ball_runs_kept_distinct() {
        let input = BallInput {
            runs: 4,
            extras: Extras::no_ball(1),
            ..Default::default()
        };
        assert_eq!(input.total_runs(), 5);

        let class = classify(0, &input.extras);
        let ball = Ball::from_input(input, class, "A".into(), "B".into(), "X".into());
        assert_eq!(ball.runs, 4);
        assert_eq!(ball.extras.no_ball, 1);
        assert_eq!(ball.total_runs, 5);
        assert!(!ball.is_legal());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let config = ScoringConfig::default();

        assert!(BallInput::runs(4).validate(&config).is_ok());
        assert!(matches!(
            BallInput::runs(9).validate(&config),
            Err(ScoringError::Validation(_))
        ));

        let missing_kind = BallInput { is_wicket: true, ..Default::default() };
        assert!(matches!(missing_kind.validate(&config), Err(ScoringError::Validation(_))));

        let stray_details = BallInput {
            wicket_player: Some("A".into()),
            ..Default::default()
        };
        assert!(matches!(stray_details.validate(&config), Err(ScoringError::Validation(_))));

        let huge_wide = BallInput::extras(Extras { wide: u32::MAX, bye: 1, ..Extras::NONE });
        assert!(matches!(huge_wide.validate(&config), Err(ScoringError::Validation(_))));
        let penalty = BallInput::extras(Extras { penalty: 5, ..Extras::NONE });
        assert!(penalty.validate(&config).is_ok());

        let empty_bowler = BallInput::runs(0).by("  ");
        assert!(matches!(empty_bowler.validate(&config), Err(ScoringError::Validation(_))));
    }

    #[test]
    fn test_wicket_player_defaults_to_striker() {
        let input = BallInput {
            is_wicket: true,
            wicket_type: Some(DismissalKind::Bowled),
            ..Default::default()
        };
        let ball = Ball::from_input(input, classify(0, &Extras::NONE), "A".into(), "B".into(), "X".into());
        assert_eq!(ball.wicket_player.as_deref(), Some("A"));
    }

    #[test]
    fn test_ball_input_json_defaults() {
        let input: BallInput = serde_json::from_str(r#"{"runs": 2, "bowler": "X"}"#).unwrap();
        assert_eq!(input.runs, 2);
        assert_eq!(input.extras, Extras::NONE);
        assert!(!input.is_wicket);
        assert_eq!(input.bowler.as_deref(), Some("X"));
    }
}
