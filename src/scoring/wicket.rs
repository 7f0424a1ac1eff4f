//! Wicket Resolution
//!
//! Dismissal kinds, bowler credit and the fall-of-wicket record.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::scoring::innings::Innings;
use crate::scoring::ledger::format_overs;
use crate::scoring::rules::ScoringConfig;

/// How a batsman was dismissed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DismissalKind {
    /// Bowled.
    Bowled,
    /// Caught.
    Caught,
    /// Leg before wicket.
    Lbw,
    /// Stumped.
    Stumped,
    /// Hit wicket.
    HitWicket,
    /// Run out.
    RunOut,
    /// Obstructing the field.
    ObstructingTheField,
    /// Handled the ball.
    HandledTheBall,
    /// Hit the ball twice.
    HitTheBallTwice,
    /// Timed out.
    TimedOut,
    /// Retired hurt (may resume).
    RetiredHurt,
    /// Retired out.
    RetiredOut,
}

impl DismissalKind {
    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            DismissalKind::Bowled => "bowled",
            DismissalKind::Caught => "caught",
            DismissalKind::Lbw => "lbw",
            DismissalKind::Stumped => "stumped",
            DismissalKind::HitWicket => "hit_wicket",
            DismissalKind::RunOut => "run_out",
            DismissalKind::ObstructingTheField => "obstructing_the_field",
            DismissalKind::HandledTheBall => "handled_the_ball",
            DismissalKind::HitTheBallTwice => "hit_the_ball_twice",
            DismissalKind::TimedOut => "timed_out",
            DismissalKind::RetiredHurt => "retired_hurt",
            DismissalKind::RetiredOut => "retired_out",
        }
    }

    /// Can the batsman come back in later?
    pub fn may_resume(self) -> bool {
        matches!(self, DismissalKind::RetiredHurt)
    }
}

impl fmt::Display for DismissalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a dismissal name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dismissal kind: {0}")]
pub struct UnknownDismissal(pub String);

impl FromStr for DismissalKind {
    type Err = UnknownDismissal;

    /// Accepts scorer spellings such as `"runout"`, `"Run Out"` or `"run-out"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match normalized.as_str() {
            "bowled" | "b" => DismissalKind::Bowled,
            "caught" | "c" | "caughtandbowled" => DismissalKind::Caught,
            "lbw" | "legbeforewicket" => DismissalKind::Lbw,
            "stumped" | "st" => DismissalKind::Stumped,
            "hitwicket" => DismissalKind::HitWicket,
            "runout" => DismissalKind::RunOut,
            "obstructingthefield" | "obstructing" => DismissalKind::ObstructingTheField,
            "handledtheball" => DismissalKind::HandledTheBall,
            "hittheballtwice" => DismissalKind::HitTheBallTwice,
            "timedout" => DismissalKind::TimedOut,
            "retired" | "retiredhurt" => DismissalKind::RetiredHurt,
            "retiredout" => DismissalKind::RetiredOut,
            _ => return Err(UnknownDismissal(s.to_string())),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for DismissalKind {
    type Error = UnknownDismissal;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DismissalKind> for String {
    fn from(kind: DismissalKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Score and position when a wicket fell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallOfWicket {
    /// Wicket number (1-based).
    pub wicket: u32,
    /// Dismissed batsman.
    pub player: String,
    /// Innings total at the fall.
    pub score: u32,
    /// `"<completed overs>.<balls in current over>"`.
    pub overs: String,
    /// How.
    pub dismissal: DismissalKind,
}

/// Apply a wicket to the innings.
///
/// Expects the delivery's runs and legal-ball count to be applied already, so
/// the recorded score and position include this ball.
pub fn resolve_wicket(
    innings: &mut Innings,
    bowler: &str,
    dismissed: &str,
    kind: DismissalKind,
    config: &ScoringConfig,
) -> FallOfWicket {
    innings.wickets += 1;

    if config.credits_bowler(kind) {
        innings.ledger.bowler_mut(bowler).wickets += 1;
    }

    let batsman = innings.ledger.batsman_mut(dismissed);
    batsman.is_out = true;
    batsman.dismissal = Some(kind);

    let fall = FallOfWicket {
        wicket: innings.wickets,
        player: dismissed.to_string(),
        score: innings.total_runs,
        overs: format_overs(innings.legal_deliveries),
        dismissal: kind,
    };
    innings.fall_of_wickets.push(fall.clone());
    fall
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::state::Side;

    #[test]
    fn test_parse_scorer_spellings() {
        assert_eq!("runout".parse::<DismissalKind>().unwrap(), DismissalKind::RunOut);
        assert_eq!("Run Out".parse::<DismissalKind>().unwrap(), DismissalKind::RunOut);
        assert_eq!("run-out".parse::<DismissalKind>().unwrap(), DismissalKind::RunOut);
        assert_eq!("LBW".parse::<DismissalKind>().unwrap(), DismissalKind::Lbw);
        assert_eq!("retired".parse::<DismissalKind>().unwrap(), DismissalKind::RetiredHurt);
        assert!("caught behind the sightscreen".parse::<DismissalKind>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&DismissalKind::HitWicket).unwrap();
        assert_eq!(json, "\"hit_wicket\"");
        let parsed: DismissalKind = serde_json::from_str("\"runout\"").unwrap();
        assert_eq!(parsed, DismissalKind::RunOut);
        assert!(serde_json::from_str::<DismissalKind>("\"nope\"").is_err());
    }

    #[test]
    fn test_bowled_credits_bowler() {
        let config = ScoringConfig::default();
        let mut innings = Innings::new(Some(Side::TeamA), 20);
        innings.total_runs = 37;
        innings.legal_deliveries = 27;

        let fall = resolve_wicket(&mut innings, "X", "A", DismissalKind::Bowled, &config);

        assert_eq!(innings.wickets, 1);
        assert_eq!(innings.ledger.bowler("X").unwrap().wickets, 1);
        let a = innings.ledger.batsman("A").unwrap();
        assert!(a.is_out);
        assert_eq!(a.dismissal, Some(DismissalKind::Bowled));
        assert_eq!(fall.score, 37);
        assert_eq!(fall.overs, "4.3");
        assert_eq!(innings.fall_of_wickets.len(), 1);
    }

    #[test]
    fn test_run_out_no_bowler_credit() {
        let config = ScoringConfig::default();
        let mut innings = Innings::new(Some(Side::TeamA), 20);

        resolve_wicket(&mut innings, "X", "B", DismissalKind::RunOut, &config);

        assert_eq!(innings.wickets, 1);
        assert_eq!(innings.ledger.bowler("X").map(|b| b.wickets).unwrap_or(0), 0);
        assert!(innings.ledger.batsman("B").unwrap().is_out);
    }
}
