use crate::{
    database::{db_structs::Player, PlayerStore, StoreError},
    model::structures::site::Site
};
use itertools::Itertools;
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf}
};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReconcileError + '_ {
    move |source| ReconcileError::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Site handle to player id, for every player holding a handle on `site`.
pub fn handle_map(players: &[Player], site: Site) -> HashMap<String, String> {
    players
        .iter()
        .filter_map(|p| p.handles.get(&site).map(|handle| (handle.clone(), p.id.clone())))
        .collect()
}

/// Replaces every whitespace separated token equal to a known handle with the
/// matching player id. Separators and line breaks are kept as they are.
pub fn rewrite_ranks(text: &str, handles: &HashMap<String, String>) -> String {
    text.split_inclusive(char::is_whitespace)
        .map(|piece| {
            let token = piece.trim_end_matches(char::is_whitespace);
            let separator = &piece[token.len()..];

            match handles.get(token) {
                Some(id) => format!("{}{}", id, separator),
                None => piece.to_string()
            }
        })
        .collect()
}

/// Rank list tokens that did not resolve to a known player, per site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnmappedHandles {
    counts: HashMap<(Site, String), usize>
}

impl UnmappedHandles {
    pub fn record(&mut self, site: Site, handle: &str) {
        *self.counts.entry((site, handle.to_string())).or_default() += 1;
    }

    /// Distinct (site, handle) pairs
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, site: Site, handle: &str) -> usize {
        self.counts.get(&(site, handle.to_string())).copied().unwrap_or(0)
    }

    /// Number of distinct pairs, then one `site handle count` line per pair,
    /// most frequent first.
    pub fn report(&self) -> String {
        let mut out = format!("{}\n", self.len());
        let lines = self
            .counts
            .iter()
            .sorted_by(|((site_a, handle_a), a), ((site_b, handle_b), b)| {
                b.cmp(a).then_with(|| site_a.cmp(site_b)).then_with(|| handle_a.cmp(handle_b))
            })
            .map(|((site, handle), count)| format!("{} {} {}\n", site, handle, count));
        out.extend(lines);

        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileSummary {
    pub files_rewritten: usize,
    pub files_skipped: usize,
    pub unmapped: UnmappedHandles
}

/// Rewrites every `<site>-<details>.in` file in `ranks_dir` so that known site
/// handles become player ids, then writes the unmapped handle report.
pub async fn reconcile_handles<S: PlayerStore>(
    store: &S,
    ranks_dir: &Path,
    report_path: &Path
) -> Result<ReconcileSummary, ReconcileError> {
    let players = store.get_players().await?;
    let known_ids: HashSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
    let mut handle_maps: HashMap<Site, HashMap<String, String>> = HashMap::new();
    let mut summary = ReconcileSummary::default();

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(ranks_dir).await.map_err(io_error(ranks_dir))?;
    while let Some(entry) = entries.next_entry().await.map_err(io_error(ranks_dir))? {
        files.push(entry.path());
    }
    files.sort();

    for path in files {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let Some(site) = Site::from_file_name(file_name) else {
            error!(
                "Invalid rank file name {}, expected 'site-contest-details.in'",
                path.display()
            );
            summary.files_skipped += 1;
            continue;
        };

        let handles = handle_maps.entry(site).or_insert_with(|| handle_map(&players, site));
        let text = tokio::fs::read_to_string(&path).await.map_err(io_error(&path))?;
        let rewritten = rewrite_ranks(&text, handles);

        if rewritten != text {
            tokio::fs::write(&path, &rewritten).await.map_err(io_error(&path))?;
            summary.files_rewritten += 1;
            debug!("Rewrote handles in {}", path.display());
        }

        for token in rewritten.split_whitespace().filter(|t| !known_ids.contains(t)) {
            summary.unmapped.record(site, token);
        }
    }

    tokio::fs::write(report_path, summary.unmapped.report())
        .await
        .map_err(io_error(report_path))?;

    info!(
        "Reconciled rank files: {} rewritten, {} skipped, {} unmapped handles",
        summary.files_rewritten,
        summary.files_skipped,
        summary.unmapped.len()
    );
    Ok(summary)
}
