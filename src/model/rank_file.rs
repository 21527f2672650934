use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankFileError {
    #[error("Failed to read rank file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("Rank file {} contains no identifiers", .path.display())]
    Empty { path: PathBuf },

    #[error("Malformed rank file at line {line}: {reason}")]
    Malformed { line: usize, reason: String }
}

/// Identifier to rank mapping for a single contest.
///
/// Each line of a rank file is one tier of tied identifiers. Ranks skip ahead
/// by the size of the tier, so a file of tiers sized 3, 1, 2, 1 yields the
/// ranks 1, 1, 1, 4, 5, 5, 7.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankList {
    ranks: IndexMap<String, u32>
}

impl RankList {
    /// Builds the mapping from tiers of whitespace separated identifiers.
    /// Blank lines are skipped. An identifier seen twice keeps its last rank.
    pub fn parse<I, S>(lines: I) -> RankList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        let mut ranks = IndexMap::new();
        let mut current_rank = 1;

        for line in lines {
            let tier: Vec<&str> = line.as_ref().split_whitespace().collect();
            for id in &tier {
                ranks.insert(id.to_string(), current_rank);
            }

            // Ranks are not 1, 1, 1, 2 but 1, 1, 1, 4
            current_rank += tier.len() as u32;
        }

        RankList { ranks }
    }

    /// Reads and parses a rank file, rejecting content that is not text or
    /// holds no identifiers at all.
    pub fn read(path: &Path) -> Result<RankList, RankFileError> {
        let bytes = std::fs::read(path).map_err(|source| RankFileError::Io {
            path: path.to_path_buf(),
            source
        })?;

        let text = String::from_utf8(bytes).map_err(|e| RankFileError::Malformed {
            line: line_of_offset(e.as_bytes(), e.utf8_error().valid_up_to()),
            reason: "content is not valid UTF-8".to_string()
        })?;

        for (i, line) in text.lines().enumerate() {
            if let Some(c) = line.chars().find(|c| c.is_control() && !c.is_whitespace()) {
                return Err(RankFileError::Malformed {
                    line: i + 1,
                    reason: format!("unexpected control character {:?}", c)
                });
            }
        }

        let ranks = RankList::parse(text.lines());
        if ranks.is_empty() {
            return Err(RankFileError::Empty {
                path: path.to_path_buf()
            });
        }

        Ok(ranks)
    }

    pub fn rank(&self, id: &str) -> Option<u32> {
        self.ranks.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ranks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Identifiers in first-seen order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ranks.keys().map(String::as_str)
    }

    /// Keeps only the identifiers accepted by `keep`, returning the removed
    /// ones in file order.
    ///
    /// The remaining identifiers are ranked again among themselves: each one
    /// gets 1 + the number of remaining identifiers that finished strictly
    /// ahead of it, so ties stay tied and ranks still skip ahead by tier size.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool
    {
        let mut removed = Vec::new();
        self.ranks.retain(|id, _| {
            let kept = keep(id);
            if !kept {
                removed.push(id.clone());
            }
            kept
        });

        if !removed.is_empty() {
            let mut original: Vec<u32> = self.ranks.values().copied().collect();
            original.sort_unstable();
            for rank in self.ranks.values_mut() {
                *rank = original.partition_point(|r| *r < *rank) as u32 + 1;
            }
        }

        removed
    }
}

fn line_of_offset(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset].iter().filter(|b| **b == b'\n').count() + 1
}
