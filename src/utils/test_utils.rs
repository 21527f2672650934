use crate::{
    database::db_structs::Player,
    model::{constants::DEFAULT_RATING, field::FieldEntry}
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

pub fn generate_player(id: &str, rating: f64, volatility: f64, times_played: u32) -> Player {
    let mut player = Player::new(id, format!("Player {}", id));
    player.rating = rating;
    player.volatility = volatility;
    player.times_played = times_played;
    player.best = rating.max(DEFAULT_RATING);

    player
}

/// `n` players with ids `P0..P{n-1}` and seeded random histories.
pub fn generate_players(n: usize, seed: u64) -> Vec<Player> {
    // Seeded RNG for reproducible populations
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..n)
        .map(|i| {
            let times_played = rng.random_range(0..12);
            let mut player = generate_player(
                &format!("P{}", i),
                rng.random_range(1000.0..2200.0),
                rng.random_range(80.0..350.0),
                times_played
            );
            if times_played > 0 {
                player.last_five = rng.random_range(1..=5);
            }

            player
        })
        .collect()
}

pub fn generate_field(n: usize, seed: u64) -> Vec<FieldEntry> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..n)
        .map(|_| FieldEntry::new(rng.random_range(1000.0..2200.0), rng.random_range(80.0..350.0)))
        .collect()
}

/// A path in the system temp directory, unique to this test process.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("contest_rating_{}_{}", std::process::id(), name))
}
