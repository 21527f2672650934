use crate::database::{db_structs::Player, PlayerStore, StoreError};
use serde::Serialize;
use std::{cmp::Ordering, path::Path};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode leaderboard: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write leaderboard to {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "USN")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Graduation Year")]
    pub year: Option<i32>,
    #[serde(rename = "Contests")]
    pub contests: u32,
    #[serde(rename = "Rating")]
    pub rating: i64,
    #[serde(rename = "Best")]
    pub best: i64
}

/// Players who have taken part in at least one contest, highest rating
/// first. Equal ratings are ordered by id.
pub fn leaderboard_rows(players: &[Player]) -> Vec<LeaderboardRow> {
    let mut active: Vec<&Player> = players.iter().filter(|p| p.times_played > 0).collect();
    active.sort_by(|a, b| match b.rating.total_cmp(&a.rating) {
        Ordering::Equal => a.id.cmp(&b.id),
        ordering => ordering
    });

    active
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardRow {
            rank: i + 1,
            id: p.id.clone(),
            name: p.name.clone(),
            year: p.year,
            contests: p.times_played,
            rating: round_rating(p.rating),
            best: round_rating(p.best)
        })
        .collect()
}

// Half-way values go to the even neighbour
fn round_rating(rating: f64) -> i64 {
    rating.round_ties_even() as i64
}

const HEADER: [&str; 7] = ["Rank", "USN", "Name", "Graduation Year", "Contests", "Rating", "Best"];

/// CSV with a header row, written even when no player is ranked.
pub fn to_csv(rows: &[LeaderboardRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(vec![]);
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.into_inner().map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Writes the leaderboard of every stored player to `path`, returning the
/// number of ranked players.
pub async fn export_leaderboard<S: PlayerStore>(store: &S, path: &Path) -> Result<usize, ExportError> {
    let players = store.get_players().await?;
    let rows = leaderboard_rows(&players);
    let bytes = to_csv(&rows)?;

    tokio::fs::write(path, bytes).await.map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source
    })?;

    info!("Exported {} ranked players to {}", rows.len(), path.display());
    Ok(rows.len())
}
