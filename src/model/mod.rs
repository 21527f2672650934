//! Rank-only multiplayer rating.
//!
//! A contest is a rank list over known players. [`processor::ContestProcessor`]
//! turns one rank list into rating updates for the participants and decay
//! countdowns for everyone else.

pub mod constants;
pub mod decay;
pub mod field;
pub mod processor;
pub mod rank_file;
pub mod rating;
pub mod structures;
