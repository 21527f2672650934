use crate::{
    database::{
        db_structs::{validate_players, Player},
        PlayerStore, StoreError
    },
    model::{constants::DECAY_WINDOW, structures::site::Site}
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf}
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Whole store file. Players live in the `_default` table keyed by document
/// id; any other table is carried through untouched.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(rename = "_default", default)]
    players: IndexMap<String, PlayerDocument>,
    #[serde(flatten)]
    other_tables: IndexMap<String, Value>
}

/// On-disk shape of a player. Keys the rating core does not know about,
/// including platform handles, are carried in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerDocument {
    usn: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    rating: f64,
    volatility: f64,
    times_played: u32,
    best: f64,
    last_five: u32,
    #[serde(flatten)]
    extra: Map<String, Value>
}

impl PlayerDocument {
    fn to_player(&self) -> Player {
        let handles = self
            .extra
            .iter()
            .filter_map(|(key, value)| Some((key.parse::<Site>().ok()?, value.as_str()?.to_string())))
            .collect::<BTreeMap<_, _>>();

        Player {
            id: self.usn.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            year: self.year,
            rating: self.rating,
            volatility: self.volatility,
            times_played: self.times_played,
            best: self.best,
            last_five: self.last_five,
            handles
        }
    }

    fn from_player(player: &Player) -> PlayerDocument {
        let mut doc = PlayerDocument {
            usn: player.id.clone(),
            name: player.name.clone(),
            email: None,
            year: None,
            rating: 0.0,
            volatility: 0.0,
            times_played: 0,
            best: 0.0,
            last_five: 0,
            extra: Map::new()
        };
        doc.apply(player);

        doc
    }

    /// Copies the record's fields over the document, leaving unknown keys alone.
    fn apply(&mut self, player: &Player) {
        self.name = player.name.clone();
        self.email = player.email.clone();
        self.year = player.year;
        self.rating = player.rating;
        self.volatility = player.volatility;
        self.times_played = player.times_played;
        self.best = player.best;
        self.last_five = player.last_five;

        for (site, handle) in &player.handles {
            self.extra.insert(site.to_string(), Value::String(handle.clone()));
        }
    }
}

/// A player collection kept in a single JSON document file.
pub struct JsonStore {
    path: PathBuf,
    decay_window: u32
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonStore {
        JsonStore {
            path: path.into(),
            decay_window: DECAY_WINDOW
        }
    }

    /// Validates and resets `lastFive` against `window` instead of the
    /// default decay window. Must match the processor's `decay_window`.
    pub fn with_decay_window(mut self, window: u32) -> JsonStore {
        self.decay_window = window;
        self
    }

    /// Creates (or overwrites) a store file holding exactly `players`.
    pub async fn create(path: impl Into<PathBuf>, players: &[Player]) -> Result<JsonStore, StoreError> {
        JsonStore::new(path).seed(players).await
    }

    /// Overwrites the file with exactly `players`, validated against this
    /// store's decay window.
    pub async fn seed(self, players: &[Player]) -> Result<JsonStore, StoreError> {
        validate_players(players, self.decay_window)?;

        let document = Document {
            players: players
                .iter()
                .enumerate()
                .map(|(i, p)| ((i + 1).to_string(), PlayerDocument::from_player(p)))
                .collect(),
            other_tables: IndexMap::new()
        };
        self.persist(&document).await?;

        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source
        }
    }

    async fn load(&self) -> Result<Document, StoreError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| self.io_error(e))?;
        let document: Document = serde_json::from_slice(&bytes)?;

        debug!(
            "Loaded {} player documents and {} other tables from {}",
            document.players.len(),
            document.other_tables.len(),
            self.path.display()
        );
        Ok(document)
    }

    fn players(&self, document: &Document) -> Result<Vec<Player>, StoreError> {
        let players: Vec<Player> = document.players.values().map(PlayerDocument::to_player).collect();

        validate_players(&players, self.decay_window)?;
        Ok(players)
    }

    /// Writes the whole file next to its final location, then renames it into
    /// place so readers never observe a half-written store.
    async fn persist(&self, document: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_vec(document)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let write = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp_path, &self.path).await
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::WriteFailure(Box::new(self.io_error(e))));
        }

        Ok(())
    }
}

impl PlayerStore for JsonStore {
    async fn get_players(&self) -> Result<Vec<Player>, StoreError> {
        let document = self.load().await?;
        self.players(&document)
    }

    async fn get_players_by_ids(&self, ids: &HashSet<String>) -> Result<Vec<Player>, StoreError> {
        let players = self.get_players().await?;
        Ok(players.into_iter().filter(|p| ids.contains(&p.id)).collect())
    }

    async fn write_back(&mut self, players: &[Player]) -> Result<(), StoreError> {
        validate_players(players, self.decay_window)?;

        let mut document = self.load().await?;
        let table = &mut document.players;

        let doc_keys: HashMap<String, String> = table
            .iter()
            .map(|(key, doc)| (doc.usn.clone(), key.clone()))
            .collect();

        // Resolve every target first so an unknown id leaves the file untouched
        let mut targets = Vec::with_capacity(players.len());
        for player in players {
            match doc_keys.get(&player.id) {
                Some(key) => targets.push((key.clone(), player)),
                None => return Err(StoreError::UnknownPlayer { id: player.id.clone() })
            }
        }

        for (key, player) in targets {
            if let Some(doc) = table.get_mut(&key) {
                doc.apply(player);
            }
        }

        self.persist(&document).await?;

        info!("Wrote {} player records to {}", players.len(), self.path.display());
        Ok(())
    }

    async fn reset_players(&mut self) -> Result<usize, StoreError> {
        let mut players = self.get_players().await?;
        for player in players.iter_mut() {
            player.reset(self.decay_window);
        }

        self.write_back(&players).await?;
        Ok(players.len())
    }
}
