use crate::{database::db_structs::Player, model::rating::RatingParameters};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayOutcome {
    /// Never played, nothing changes
    Untouched,
    /// The countdown advanced, rating unchanged
    Countdown { last_five: u32 },
    /// The countdown ran out; rating reduced and countdown reset
    Decayed { rating_before: f64, rating_after: f64 }
}

/// # How this works
/// - Called once per contest for every stored player who did not take part.
/// - Players who have never played are left alone.
/// - Otherwise `lastFive` counts down by one. When it would reach zero the
///     rating is multiplied by the decay factor and the countdown restarts
///     from the window size.
///
/// # Rules
/// - `lastFive` never drops below 1.
/// - The rating never increases.
pub fn decay(player: &mut Player, params: &RatingParameters) -> DecayOutcome {
    if player.times_played == 0 {
        return DecayOutcome::Untouched;
    }

    let remaining = player.last_five.saturating_sub(1);
    if remaining == 0 {
        let rating_before = player.rating;
        player.rating = decay_rating(player.rating, params.decay_factor);
        player.last_five = params.decay_window;

        return DecayOutcome::Decayed {
            rating_before,
            rating_after: player.rating
        };
    }

    player.last_five = remaining.max(1);
    DecayOutcome::Countdown {
        last_five: player.last_five
    }
}

/// Equal to `rating * factor` for positive ratings, and still a reduction
/// for negative ones.
fn decay_rating(rating: f64, factor: f64) -> f64 {
    rating - rating.abs() * (1.0 - factor)
}
