use super::{
    db_structs::{validate_players, Player},
    PlayerStore, StoreError
};
use crate::{
    model::{
        constants::{DECAY_WINDOW, DEFAULT_RATING, DEFAULT_VOLATILITY},
        structures::site::Site
    },
    utils::progress_utils::progress_bar
};
use itertools::Itertools;
use postgres_types::ToSql;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio_postgres::{Client, NoTls, Row, Transaction};
use tracing::{error, info, warn};

const PLAYER_COLUMNS: &str = "id, name, email, year, rating, volatility, times_played, best, last_five";

pub struct DbClient {
    client: Client,
    decay_window: u32
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls)
            .await
            .map_err(StoreError::Connection)?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client,
            decay_window: DECAY_WINDOW
        })
    }

    /// Validates and resets `lastFive` against `window` instead of the
    /// default decay window. Must match the processor's `decay_window`.
    pub fn with_decay_window(mut self, window: u32) -> Self {
        self.decay_window = window;
        self
    }

    fn player_from_row(row: &Row) -> Result<Player, StoreError> {
        let id: String = row.get("id");
        let times_played: i32 = row.get("times_played");
        let last_five: i32 = row.get("last_five");

        let non_negative = |field: &str, value: i32| {
            u32::try_from(value).map_err(|_| StoreError::InvalidRecord {
                id: id.clone(),
                reason: format!("{} {} is negative", field, value)
            })
        };

        Ok(Player {
            id: id.clone(),
            name: row.get("name"),
            email: row.get("email"),
            year: row.get("year"),
            rating: row.get("rating"),
            volatility: row.get("volatility"),
            times_played: non_negative("timesPlayed", times_played)?,
            best: row.get("best"),
            last_five: non_negative("lastFive", last_five)?,
            handles: BTreeMap::new()
        })
    }

    /// Attaches handles to their players. Rows naming an unknown site are skipped.
    fn attach_handles(players: &mut [Player], rows: &[Row]) {
        let index: HashMap<String, usize> = players.iter().enumerate().map(|(i, p)| (p.id.clone(), i)).collect();

        for row in rows {
            let player_id: String = row.get("player_id");
            let site: String = row.get("site");

            let Ok(site) = site.parse::<Site>() else {
                warn!("Ignoring handle for player {} on unknown site {}", player_id, site);
                continue;
            };

            if let Some(i) = index.get(&player_id) {
                players[*i].handles.insert(site, row.get("handle"));
            }
        }
    }

    async fn save_players(tx: &Transaction<'_>, players: &[Player]) -> Result<(), StoreError> {
        let update = tx
            .prepare(
                "UPDATE players SET name = $2, email = $3, year = $4, rating = $5, volatility = $6, \
                 times_played = $7, best = $8, last_five = $9 WHERE id = $1"
            )
            .await?;
        let upsert_handle = tx
            .prepare(
                "INSERT INTO player_handles (player_id, site, handle) VALUES ($1, $2, $3) \
                 ON CONFLICT (player_id, site) DO UPDATE SET handle = EXCLUDED.handle"
            )
            .await?;

        let p_bar = progress_bar(players.len() as u64, "Saving player ratings to db".to_string());

        for player in players {
            let times_played = player.times_played as i32;
            let last_five = player.last_five as i32;
            let values: &[&(dyn ToSql + Sync)] = &[
                &player.id,
                &player.name,
                &player.email,
                &player.year,
                &player.rating,
                &player.volatility,
                &times_played,
                &player.best,
                &last_five
            ];

            if tx.execute(&update, values).await? == 0 {
                return Err(StoreError::UnknownPlayer { id: player.id.clone() });
            }

            for (site, handle) in &player.handles {
                tx.execute(&upsert_handle, &[&player.id, &site.to_string(), handle])
                    .await?;
            }

            if let Some(bar) = &p_bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = p_bar {
            bar.finish();
        }

        Ok(())
    }
}

impl PlayerStore for DbClient {
    async fn get_players(&self) -> Result<Vec<Player>, StoreError> {
        info!("Fetching players...");
        let rows = self
            .client
            .query(format!("SELECT {} FROM players ORDER BY id", PLAYER_COLUMNS).as_str(), &[])
            .await?;
        let mut players = rows.iter().map(Self::player_from_row).collect::<Result<Vec<_>, _>>()?;

        let handle_rows = self
            .client
            .query("SELECT player_id, site, handle FROM player_handles", &[])
            .await?;
        Self::attach_handles(&mut players, &handle_rows);

        validate_players(&players, self.decay_window)?;

        info!("Players fetched");
        Ok(players)
    }

    async fn get_players_by_ids(&self, ids: &HashSet<String>) -> Result<Vec<Player>, StoreError> {
        let ids: Vec<String> = ids.iter().cloned().sorted().collect();

        let rows = self
            .client
            .query(
                format!("SELECT {} FROM players WHERE id = ANY($1) ORDER BY id", PLAYER_COLUMNS).as_str(),
                &[&ids]
            )
            .await?;
        let mut players = rows.iter().map(Self::player_from_row).collect::<Result<Vec<_>, _>>()?;

        let handle_rows = self
            .client
            .query(
                "SELECT player_id, site, handle FROM player_handles WHERE player_id = ANY($1)",
                &[&ids]
            )
            .await?;
        Self::attach_handles(&mut players, &handle_rows);

        validate_players(&players, self.decay_window)?;
        Ok(players)
    }

    /// Every update runs inside one transaction; any failure rolls the whole
    /// batch back when the transaction is dropped.
    async fn write_back(&mut self, players: &[Player]) -> Result<(), StoreError> {
        validate_players(players, self.decay_window)?;

        let tx = self.client.transaction().await?;

        match Self::save_players(&tx, players).await {
            Ok(()) => {}
            Err(e @ StoreError::UnknownPlayer { .. }) => return Err(e),
            Err(e) => return Err(StoreError::WriteFailure(Box::new(e)))
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::WriteFailure(Box::new(StoreError::Query(e))))?;

        info!("Committed {} player records", players.len());
        Ok(())
    }

    async fn reset_players(&mut self) -> Result<usize, StoreError> {
        let tx = self.client.transaction().await?;
        let times_played = 0i32;
        let last_five = self.decay_window as i32;

        let reset = tx
            .execute(
                "UPDATE players SET rating = $1, volatility = $2, best = $1, times_played = $3, last_five = $4",
                &[&DEFAULT_RATING, &DEFAULT_VOLATILITY, &times_played, &last_five]
            )
            .await
            .map_err(|e| StoreError::WriteFailure(Box::new(StoreError::Query(e))))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::WriteFailure(Box::new(StoreError::Query(e))))?;

        info!("Reset {} players to default ratings", reset);
        Ok(reset as usize)
    }
}
