use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A contest platform on which a player may hold a handle.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Site {
    Codejam,
    Kickstart,
    Hackerearth,
    Hackerrank,
    Facebook,
    Codechef,
    Codeforces
}

impl Site {
    /// Derives the site from a rank file name following the
    /// `site-contest-details.in` convention.
    pub fn from_file_name(file_name: &str) -> Option<Site> {
        let prefix = file_name.split('-').next()?;
        prefix.parse().ok()
    }
}
