use crate::model::structures::{adjustment_kind::AdjustmentKind, rating_adjustment::RatingAdjustment};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of processing one rank list against the stored population.
#[derive(Debug, Clone, Serialize)]
pub struct ContestOutcome {
    /// Number of rated participants
    pub n: usize,
    /// Calibration factor shared by every participant's update
    pub cf: f64,
    /// Identifiers from the rank list with no matching player, sorted
    pub ignored: Vec<String>,
    pub adjustments: Vec<RatingAdjustment>,
    /// Players neither rated nor decayed
    pub untouched: usize,
    pub processed_at: DateTime<Utc>
}

impl ContestOutcome {
    pub fn rated(&self) -> usize {
        self.count(AdjustmentKind::Contest)
    }

    pub fn decayed(&self) -> usize {
        self.count(AdjustmentKind::Decay)
    }

    pub fn adjustment(&self, player_id: &str) -> Option<&RatingAdjustment> {
        self.adjustments.iter().find(|a| a.player_id == player_id)
    }

    fn count(&self, kind: AdjustmentKind) -> usize {
        self.adjustments.iter().filter(|a| a.kind == kind).count()
    }
}
