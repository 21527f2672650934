use crate::model::structures::adjustment_kind::AdjustmentKind;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingAdjustment {
    pub player_id: String,
    pub kind: AdjustmentKind,
    /// Rank achieved in the contest, absent for decay
    pub rank: Option<u32>,
    pub rating_before: f64,
    pub rating_after: f64,
    pub volatility_before: f64,
    pub volatility_after: f64
}

impl RatingAdjustment {
    pub fn rating_delta(&self) -> f64 {
        self.rating_after - self.rating_before
    }
}
