use serde::Serialize;

/// What caused a player's record to change during a contest run.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentKind {
    Contest,
    Decay
}
