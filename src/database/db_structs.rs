use crate::{
    database::StoreError,
    model::{
        constants::{DECAY_WINDOW, DEFAULT_RATING, DEFAULT_VOLATILITY},
        structures::site::Site
    }
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Player {
    /// Stable unique identifier (the USN)
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Graduation year
    pub year: Option<i32>,
    pub rating: f64,
    pub volatility: f64,
    pub times_played: u32,
    /// Highest rating ever reached
    pub best: f64,
    /// Contests remaining before inactivity decay triggers
    pub last_five: u32,
    pub handles: BTreeMap<Site, String>
}

impl Player {
    /// A freshly registered player with default rating values.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            email: None,
            year: None,
            rating: DEFAULT_RATING,
            volatility: DEFAULT_VOLATILITY,
            times_played: 0,
            best: DEFAULT_RATING,
            last_five: DECAY_WINDOW,
            handles: BTreeMap::new()
        }
    }

    /// Restores default rating values, keeping identity and handles.
    /// `lastFive` restarts at `decay_window`.
    pub fn reset(&mut self, decay_window: u32) {
        self.rating = DEFAULT_RATING;
        self.volatility = DEFAULT_VOLATILITY;
        self.best = DEFAULT_RATING;
        self.times_played = 0;
        self.last_five = decay_window;
    }

    /// Checks the invariants every stored record must satisfy before the
    /// rating core is allowed to read it. `lastFive` must lie in
    /// `1..=decay_window`.
    pub fn validate(&self, decay_window: u32) -> Result<(), StoreError> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            id: self.id.clone(),
            reason
        };

        if self.id.trim().is_empty() || self.id.chars().any(char::is_whitespace) {
            return Err(invalid(format!("identifier {:?} is empty or contains whitespace", self.id)));
        }
        if !self.rating.is_finite() {
            return Err(invalid(format!("rating {} is not finite", self.rating)));
        }
        if !self.best.is_finite() {
            return Err(invalid(format!("best {} is not finite", self.best)));
        }
        if !self.volatility.is_finite() || self.volatility <= 0.0 {
            return Err(invalid(format!("volatility {} must be finite and positive", self.volatility)));
        }
        if !(1..=decay_window).contains(&self.last_five) {
            return Err(invalid(format!(
                "lastFive {} is outside 1..={}",
                self.last_five, decay_window
            )));
        }

        Ok(())
    }
}

/// Validates every record and rejects duplicate identifiers.
pub fn validate_players(players: &[Player], decay_window: u32) -> Result<(), StoreError> {
    let mut seen = std::collections::HashSet::with_capacity(players.len());
    for player in players {
        player.validate(decay_window)?;
        if !seen.insert(player.id.as_str()) {
            return Err(StoreError::DuplicateId { id: player.id.clone() });
        }
    }

    Ok(())
}
