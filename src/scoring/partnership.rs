//! Partnership Tracker
//!
//! The two batsmen at the crease and the runs added since the last wicket.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Which end of the current pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Facing the next delivery.
    Striker,
    /// At the bowler's end.
    NonStriker,
}

/// Key for a partnership, independent of who was on strike.
pub fn partnership_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{} & {}", a, b)
    } else {
        format!("{} & {}", b, a)
    }
}

/// The pair at the crease.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPartnership {
    /// On strike. Empty while awaiting the next batsman.
    pub striker: Option<String>,
    /// Other end. Empty while awaiting the next batsman.
    pub non_striker: Option<String>,
    /// Runs since the last wicket.
    pub runs: u32,
    /// Legal balls since the last wicket.
    pub balls: u32,
}

impl CurrentPartnership {
    /// Fresh pair.
    pub fn new(striker: impl Into<String>, non_striker: impl Into<String>) -> Self {
        Self {
            striker: Some(striker.into()),
            non_striker: Some(non_striker.into()),
            runs: 0,
            balls: 0,
        }
    }

    /// Both ends occupied.
    pub fn is_complete(&self) -> bool {
        self.striker.is_some() && self.non_striker.is_some()
    }

    /// Is `name` at either end?
    pub fn contains(&self, name: &str) -> bool {
        self.striker.as_deref() == Some(name) || self.non_striker.as_deref() == Some(name)
    }

    /// Swap ends.
    pub fn swap_strike(&mut self) {
        std::mem::swap(&mut self.striker, &mut self.non_striker);
    }

    /// First empty slot (striker first).
    pub fn vacancy(&self) -> Option<Slot> {
        if self.striker.is_none() {
            Some(Slot::Striker)
        } else if self.non_striker.is_none() {
            Some(Slot::NonStriker)
        } else {
            None
        }
    }

    /// Fill the first empty slot.
    pub fn fill_vacancy(&mut self, name: impl Into<String>) -> Option<Slot> {
        let slot = self.vacancy()?;
        match slot {
            Slot::Striker => self.striker = Some(name.into()),
            Slot::NonStriker => self.non_striker = Some(name.into()),
        }
        Some(slot)
    }

    /// Add a non-wicket delivery.
    pub fn add_delivery(&mut self, runs: u32, legal: bool) {
        self.runs += runs;
        if legal {
            self.balls += 1;
        }
    }

    /// Key for the pair, if both ends are occupied.
    pub fn key(&self) -> Option<String> {
        match (&self.striker, &self.non_striker) {
            (Some(a), Some(b)) => Some(partnership_key(a, b)),
            _ => None,
        }
    }

    /// Close the partnership on a wicket.
    ///
    /// Adds the runs to `archive` under the pair's key, clears the dismissed
    /// player's slot and resets the counters. When `dismissed` matches
    /// neither end both slots are kept. Returns the slot that was cleared.
    pub fn close_on_wicket(
        &mut self,
        dismissed: &str,
        archive: &mut BTreeMap<String, u32>,
    ) -> Option<Slot> {
        if let Some(key) = self.key() {
            *archive.entry(key).or_insert(0) += self.runs;
        }

        self.runs = 0;
        self.balls = 0;

        if self.striker.as_deref() == Some(dismissed) {
            self.striker = None;
            Some(Slot::Striker)
        } else if self.non_striker.as_deref() == Some(dismissed) {
            self.non_striker = None;
            Some(Slot::NonStriker)
        } else {
            None
        }
    }
}
