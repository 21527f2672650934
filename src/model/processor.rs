use crate::{
    database::{db_structs::Player, PlayerStore, StoreError},
    model::{
        decay::{decay, DecayOutcome},
        field::{Field, FieldEntry},
        rank_file::{RankFileError, RankList},
        rating::{RatingModel, RatingParameters},
        structures::{
            adjustment_kind::AdjustmentKind, contest_outcome::ContestOutcome, rating_adjustment::RatingAdjustment
        }
    },
    utils::progress_utils::progress_bar
};
use chrono::Utc;
use rayon::prelude::*;
use std::{collections::HashSet, path::Path};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("No participant in the rank list matched a known player")]
    EmptyField,

    #[error(transparent)]
    RankFile(#[from] RankFileError),

    #[error(transparent)]
    Store(#[from] StoreError)
}

pub struct ContestProcessor {
    pub model: RatingModel
}

impl Default for ContestProcessor {
    fn default() -> Self {
        Self::new(RatingParameters::default())
    }
}

impl ContestProcessor {
    pub fn new(params: RatingParameters) -> ContestProcessor {
        ContestProcessor {
            model: RatingModel::new(params)
        }
    }

    /// # Contest processing
    ///
    /// Applies one contest to the whole population, in memory.
    ///
    /// Steps:
    /// 1. Drop rank list identifiers with no stored player.
    /// 2. Build the field and its calibration factor from the remaining
    ///     participants. If nobody is left the run stops before any player is
    ///     touched.
    /// 3. Rate every participant against that same field; count down (and
    ///     possibly decay) every other player who has played before.
    ///
    /// `players` is only modified when `Ok` is returned.
    pub fn process(&self, players: &mut [Player], mut ranks: RankList) -> Result<ContestOutcome, ProcessorError> {
        let known: HashSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
        let mut ignored = ranks.retain(|id| known.contains(id));
        for id in &ignored {
            warn!("Ignoring unknown participant {}", id);
        }
        ignored.sort();

        if ranks.is_empty() {
            warn!("No participant matched a known player, nothing to process");
            return Err(ProcessorError::EmptyField);
        }

        let entries = players
            .iter()
            .filter(|p| ranks.contains(&p.id))
            .map(|p| FieldEntry::new(p.rating, p.volatility))
            .collect();
        let field = Field::new(entries).map_err(|_| ProcessorError::EmptyField)?;
        info!("Contest field: N = {}, Cf = {:.4}", field.len(), field.cf());

        let bar = progress_bar(players.len() as u64, "Rating players".to_string());
        let adjustments: Vec<RatingAdjustment> = players
            .par_iter_mut()
            .filter_map(|player| {
                let adjustment = match ranks.rank(&player.id) {
                    Some(rank) => Some(self.rate_participant(player, rank, &field)),
                    None => Self::decay_absentee(player, &self.model.params)
                };

                if let Some(bar) = &bar {
                    bar.inc(1);
                }
                adjustment
            })
            .collect();

        if let Some(bar) = bar {
            bar.finish();
        }

        let outcome = ContestOutcome {
            n: field.len(),
            cf: field.cf(),
            ignored,
            untouched: players.len() - adjustments.len(),
            adjustments,
            processed_at: Utc::now()
        };

        info!(
            "Rated {} participants, {} absentees counted down or decayed, {} untouched, {} ignored",
            outcome.rated(),
            outcome.decayed(),
            outcome.untouched,
            outcome.ignored.len()
        );

        Ok(outcome)
    }

    fn rate_participant(&self, player: &mut Player, rank: u32, field: &Field) -> RatingAdjustment {
        let own = FieldEntry::new(player.rating, player.volatility);
        let update = self.model.rate(own, player.times_played, rank, field);

        let adjustment = RatingAdjustment {
            player_id: player.id.clone(),
            kind: AdjustmentKind::Contest,
            rank: Some(rank),
            rating_before: player.rating,
            rating_after: update.rating,
            volatility_before: player.volatility,
            volatility_after: update.volatility
        };

        player.rating = update.rating;
        player.volatility = update.volatility;
        player.times_played += 1;
        player.best = player.best.max(update.rating);
        player.last_five = self.model.params.decay_window;

        adjustment
    }

    fn decay_absentee(player: &mut Player, params: &RatingParameters) -> Option<RatingAdjustment> {
        let rating_before = player.rating;

        match decay(player, params) {
            DecayOutcome::Untouched => None,
            outcome => {
                if let DecayOutcome::Decayed { rating_after, .. } = outcome {
                    debug!("Decayed {} from {:.2} to {:.2}", player.id, rating_before, rating_after);
                }

                Some(RatingAdjustment {
                    player_id: player.id.clone(),
                    kind: AdjustmentKind::Decay,
                    rank: None,
                    rating_before,
                    rating_after: player.rating,
                    volatility_before: player.volatility,
                    volatility_after: player.volatility
                })
            }
        }
    }
}

/// Reads a rank file, applies it to every stored player and writes all
/// changed records back as one batch. Nothing is written unless the whole
/// contest was processed.
pub async fn process_rank_file<S: PlayerStore>(
    store: &mut S,
    path: &Path,
    processor: &ContestProcessor
) -> Result<ContestOutcome, ProcessorError> {
    let span = info_span!("contest", run_id = %Uuid::new_v4(), rank_file = %path.display());

    async move {
        let ranks = RankList::read(path)?;
        info!("Read {} participants", ranks.len());

        let mut players = store.get_players().await?;
        let outcome = processor.process(&mut players, ranks)?;

        let changed: HashSet<&str> = outcome.adjustments.iter().map(|a| a.player_id.as_str()).collect();
        let batch: Vec<Player> = players.into_iter().filter(|p| changed.contains(p.id.as_str())).collect();

        store.write_back(&batch).await?;

        info!("Contest committed");
        Ok::<_, ProcessorError>(outcome)
    }
    .instrument(span)
    .await
}
