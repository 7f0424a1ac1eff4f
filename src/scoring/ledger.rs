//! Batting and Bowling Ledger
//!
//! Running per-player figures keyed by name. Entries are created the first
//! time a name is referenced and never removed; names are opaque strings
//! (registered usernames or guest names) and are not checked against a roster.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::scoring::delivery::Ball;
use crate::scoring::rules::{ScoringConfig, BALLS_PER_OVER};
use crate::scoring::wicket::DismissalKind;

/// Round to two decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a legal-delivery count as `"<overs>.<balls>"`.
pub fn format_overs(legal_deliveries: u32) -> String {
    format!(
        "{}.{}",
        legal_deliveries / BALLS_PER_OVER,
        legal_deliveries % BALLS_PER_OVER
    )
}

// =============================================================================
// BATSMAN
// =============================================================================

/// Batting figures for one player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatsmanEntry {
    /// Order of first appearance (0-based).
    pub position: u32,
    /// Runs off the bat.
    pub runs: u32,
    /// Legal balls faced.
    pub balls: u32,
    /// Fours hit.
    pub fours: u32,
    /// Sixes hit.
    pub sixes: u32,
    /// Has been dismissed.
    pub is_out: bool,
    /// How.
    pub dismissal: Option<DismissalKind>,
}

impl BatsmanEntry {
    /// Runs per hundred balls, 0 before the first ball.
    pub fn strike_rate(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        round2(self.runs as f64 * 100.0 / self.balls as f64)
    }

    /// Credit runs off the bat.
    fn add_runs(&mut self, runs: u32) {
        self.runs += runs;
        match runs {
            4 => self.fours += 1,
            6 => self.sixes += 1,
            _ => {}
        }
    }
}

// =============================================================================
// BOWLER
// =============================================================================

/// Bowling figures for one player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerEntry {
    /// Order of first appearance (0-based).
    pub position: u32,
    /// Legal balls bowled.
    pub balls: u32,
    /// Runs charged.
    pub runs_conceded: u32,
    /// Wickets credited.
    pub wickets: u32,
    /// Wide runs.
    pub wides: u32,
    /// No-ball runs.
    pub no_balls: u32,
    /// Completed overs with nothing charged.
    pub maidens: u32,
}

impl BowlerEntry {
    /// Overs bowled as `"<overs>.<balls>"`.
    pub fn overs(&self) -> String {
        format_overs(self.balls)
    }

    /// Runs per six balls, 0 before the first legal ball.
    pub fn economy(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        round2(self.runs_conceded as f64 * BALLS_PER_OVER as f64 / self.balls as f64)
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// Batting and bowling figures for one innings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Batsmen by name.
    pub batsmen: BTreeMap<String, BatsmanEntry>,
    /// Bowlers by name.
    pub bowlers: BTreeMap<String, BowlerEntry>,
}

impl Ledger {
    /// Get or create a batsman entry.
    pub fn batsman_mut(&mut self, name: &str) -> &mut BatsmanEntry {
        let position = self.batsmen.len() as u32;
        self.batsmen
            .entry(name.to_string())
            .or_insert_with(|| BatsmanEntry { position, ..Default::default() })
    }

    /// Get or create a bowler entry.
    pub fn bowler_mut(&mut self, name: &str) -> &mut BowlerEntry {
        let position = self.bowlers.len() as u32;
        self.bowlers
            .entry(name.to_string())
            .or_insert_with(|| BowlerEntry { position, ..Default::default() })
    }

    /// Batsman entry by name.
    pub fn batsman(&self, name: &str) -> Option<&BatsmanEntry> {
        self.batsmen.get(name)
    }

    /// Bowler entry by name.
    pub fn bowler(&self, name: &str) -> Option<&BowlerEntry> {
        self.bowlers.get(name)
    }

    /// Batsmen in order of appearance.
    pub fn batting_order(&self) -> Vec<(&String, &BatsmanEntry)> {
        let mut order: Vec<_> = self.batsmen.iter().collect();
        order.sort_by_key(|(_, e)| e.position);
        order
    }

    /// Bowlers in order of appearance.
    pub fn bowling_order(&self) -> Vec<(&String, &BowlerEntry)> {
        let mut order: Vec<_> = self.bowlers.iter().collect();
        order.sort_by_key(|(_, e)| e.position);
        order
    }

    /// Runs on this ball charged to the bowler.
    pub fn charged_runs(ball: &Ball, config: &ScoringConfig) -> u32 {
        if config.byes_charged_to_bowler {
            ball.total_runs
        } else {
            ball.total_runs - ball.extras.byes_total()
        }
    }

    /// Apply one delivery to the bowler and striker.
    ///
    /// Returns the runs charged to the bowler.
    pub fn record_delivery(&mut self, ball: &Ball, config: &ScoringConfig) -> u32 {
        let legal = ball.is_legal();
        let charged = Self::charged_runs(ball, config);

        let bowler = self.bowler_mut(&ball.bowler);
        bowler.runs_conceded += charged;
        bowler.wides += ball.extras.wide;
        bowler.no_balls += ball.extras.no_ball;
        if legal {
            bowler.balls += 1;
        }

        // No-balls are not a ball faced, but runs hit off them still count.
        if legal {
            let striker = self.batsman_mut(&ball.striker);
            striker.balls += 1;
            striker.add_runs(ball.runs);
        } else if ball.runs > 0 {
            self.batsman_mut(&ball.striker).add_runs(ball.runs);
        }

        charged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::delivery::{classify, BallInput, Extras};

    fn ball(input: BallInput, legal_before: u32) -> Ball {
        let class = classify(legal_before, &input.extras);
        Ball::from_input(input, class, "A".into(), "B".into(), "X".into())
    }

    #[test]
    fn test_legal_delivery_updates_striker_and_bowler() {
        let config = ScoringConfig::default();
        let mut ledger = Ledger::default();

        ledger.record_delivery(&ball(BallInput::runs(4), 0), &config);
        ledger.record_delivery(&ball(BallInput::runs(6), 1), &config);
        ledger.record_delivery(&ball(BallInput::runs(5), 2), &config);

        let a = ledger.batsman("A").unwrap();
        assert_eq!(a.runs, 15);
        assert_eq!(a.balls, 3);
        assert_eq!(a.fours, 1);
        assert_eq!(a.sixes, 1);
        assert_eq!(a.strike_rate(), 500.0);

        let x = ledger.bowler("X").unwrap();
        assert_eq!(x.balls, 3);
        assert_eq!(x.runs_conceded, 15);
        assert_eq!(x.economy(), 30.0);
        assert!(ledger.batsman("B").is_none());
    }

    #[test]
    fn test_no_ball_runs_credit_batsman_not_ball_faced() {
        let config = ScoringConfig::default();
        let mut ledger = Ledger::default();
        let input = BallInput { runs: 4, extras: Extras::no_ball(1), ..Default::default() };

        ledger.record_delivery(&ball(input, 0), &config);

        let a = ledger.batsman("A").unwrap();
        assert_eq!(a.runs, 4);
        assert_eq!(a.balls, 0);
        assert_eq!(a.fours, 1);

        let x = ledger.bowler("X").unwrap();
        assert_eq!(x.balls, 0);
        assert_eq!(x.no_balls, 1);
        assert_eq!(x.runs_conceded, 5);
        assert_eq!(x.economy(), 0.0);
    }

    #[test]
    fn test_wide_touches_only_bowler() {
        let config = ScoringConfig::default();
        let mut ledger = Ledger::default();

        ledger.record_delivery(&ball(BallInput::extras(Extras::wide(2)), 0), &config);

        assert!(ledger.batsman("A").is_none());
        let x = ledger.bowler("X").unwrap();
        assert_eq!(x.wides, 2);
        assert_eq!(x.runs_conceded, 2);
        assert_eq!(x.balls, 0);
    }

    #[test]
    fn test_byes_never_credit_batsman() {
        let mut ledger = Ledger::default();
        let charged = ledger.record_delivery(&ball(BallInput::extras(Extras::byes(4)), 0), &ScoringConfig::default());

        let a = ledger.batsman("A").unwrap();
        assert_eq!(a.runs, 0);
        assert_eq!(a.balls, 1);
        assert_eq!(a.fours, 0);
        assert_eq!(charged, 4);
        assert_eq!(ledger.bowler("X").unwrap().runs_conceded, 4);
    }

    #[test]
    fn test_byes_excluded_when_configured() {
        let config = ScoringConfig { byes_charged_to_bowler: false, ..Default::default() };
        let mut ledger = Ledger::default();
        let input = BallInput { runs: 1, extras: Extras::leg_byes(2), ..Default::default() };

        let charged = ledger.record_delivery(&ball(input, 0), &config);
        assert_eq!(charged, 1);
        assert_eq!(ledger.bowler("X").unwrap().runs_conceded, 1);
    }

    #[test]
    fn test_entries_keep_order_of_appearance() {
        let mut ledger = Ledger::default();
        ledger.batsman_mut("Zed");
        ledger.batsman_mut("Amy");
        ledger.batsman_mut("Zed");

        let order: Vec<_> = ledger.batting_order().into_iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_format_overs() {
        assert_eq!(format_overs(0), "0.0");
        assert_eq!(format_overs(5), "0.5");
        assert_eq!(format_overs(6), "1.0");
        assert_eq!(format_overs(119), "19.5");
    }
}
