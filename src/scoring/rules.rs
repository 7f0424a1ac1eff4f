//! Scoring Rules Configuration
//!
//! Policy switches for the places where scoring conventions differ.
//! Defaults reproduce the reference scorer's behavior.

use serde::{Deserialize, Serialize};

use crate::scoring::wicket::DismissalKind;

/// Legal deliveries in one over.
pub const BALLS_PER_OVER: u32 = 6;

/// Default wickets that bowl a side out (eleven players, ten partnerships).
pub const DEFAULT_ALL_OUT_WICKETS: u32 = 10;

/// Default upper bound for runs off the bat on one delivery (six plus an overthrow).
pub const DEFAULT_MAX_BAT_RUNS: u32 = 7;

/// Default upper bound for each kind of extra on one delivery.
pub const DEFAULT_MAX_EXTRA_RUNS: u32 = 7;

/// Configuration for scoring policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Dismissals that do not credit the bowler with a wicket.
    pub bowler_neutral_dismissals: Vec<DismissalKind>,

    /// Whether byes and leg-byes count against the bowler's runs conceded.
    pub byes_charged_to_bowler: bool,

    /// Wickets after which a side is all out.
    pub all_out_wickets: u32,

    /// Complete the innings automatically once the side is all out.
    pub complete_on_all_out: bool,

    /// Complete the second innings automatically once the target is reached.
    pub complete_on_target_reached: bool,

    /// Largest accepted runs-off-the-bat value for one delivery.
    pub max_bat_runs: u32,

    /// Largest accepted value for each extras field on one delivery.
    pub max_extra_runs: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bowler_neutral_dismissals: vec![
                DismissalKind::RunOut,
                DismissalKind::ObstructingTheField,
                DismissalKind::RetiredHurt,
                DismissalKind::RetiredOut,
            ],
            byes_charged_to_bowler: true,
            all_out_wickets: DEFAULT_ALL_OUT_WICKETS,
            complete_on_all_out: true,
            complete_on_target_reached: true,
            max_bat_runs: DEFAULT_MAX_BAT_RUNS,
            max_extra_runs: DEFAULT_MAX_EXTRA_RUNS,
        }
    }
}

impl ScoringConfig {
    /// Does this dismissal credit the bowler?
    pub fn credits_bowler(&self, kind: DismissalKind) -> bool {
        !self.bowler_neutral_dismissals.contains(&kind)
    }

    /// Legal deliveries allowed in an innings of `overs_limit` overs.
    #[inline]
    pub fn deliveries_for(overs_limit: u32) -> u32 {
        overs_limit.saturating_mul(BALLS_PER_OVER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_neutral_dismissals() {
        let config = ScoringConfig::default();
        assert!(!config.credits_bowler(DismissalKind::RunOut));
        assert!(!config.credits_bowler(DismissalKind::ObstructingTheField));
        assert!(!config.credits_bowler(DismissalKind::RetiredHurt));
        assert!(config.credits_bowler(DismissalKind::Bowled));
        assert!(config.credits_bowler(DismissalKind::Caught));
        assert!(config.credits_bowler(DismissalKind::Stumped));
    }

    #[test]
    fn test_neutral_list_is_extendable() {
        let mut config = ScoringConfig::default();
        config.bowler_neutral_dismissals.push(DismissalKind::TimedOut);
        assert!(!config.credits_bowler(DismissalKind::TimedOut));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"byes_charged_to_bowler": false}"#).unwrap();
        assert!(!config.byes_charged_to_bowler);
        assert_eq!(config.all_out_wickets, DEFAULT_ALL_OUT_WICKETS);
        assert_eq!(config.max_extra_runs, DEFAULT_MAX_EXTRA_RUNS);
        assert_eq!(ScoringConfig::deliveries_for(20), 120);
    }
}
