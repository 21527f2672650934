use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("No contest participant matched a known player")]
pub struct EmptyFieldError;

/// A participant's prior as seen by the rest of the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEntry {
    pub rating: f64,
    pub volatility: f64
}

impl FieldEntry {
    pub fn new(rating: f64, volatility: f64) -> FieldEntry {
        FieldEntry { rating, volatility }
    }
}

/// The (rating, volatility) pairs of every rated participant in one contest,
/// together with the calibration factor derived from them.
///
/// A field is built once per contest, before any update, and never changes
/// afterwards: every participant is compared against the same snapshot.
#[derive(Debug, Clone)]
pub struct Field {
    entries: Vec<FieldEntry>,
    cf: f64
}

impl Field {
    /// Entries are kept in a canonical order so that sums, and therefore the
    /// calibration factor and every update, do not depend on the order in
    /// which the store returned the participants.
    pub fn new(mut entries: Vec<FieldEntry>) -> Result<Field, EmptyFieldError> {
        if entries.is_empty() {
            return Err(EmptyFieldError);
        }

        entries.sort_by(canonical_order);
        let cf = calibration_factor(&entries);

        Ok(Field { entries, cf })
    }

    /// N
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cf
    pub fn cf(&self) -> f64 {
        self.cf
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    /// Every entry except a single one equal to `own`. Removing exactly one
    /// copy makes the participant's own pair contribute nothing, while other
    /// participants with identical priors still count as opponents.
    pub fn opponents_of(&self, own: FieldEntry) -> impl Iterator<Item = &FieldEntry> + '_ {
        let mut skipped = false;
        self.entries.iter().filter(move |entry| {
            if !skipped && **entry == own {
                skipped = true;
                return false;
            }
            true
        })
    }
}

fn canonical_order(a: &FieldEntry, b: &FieldEntry) -> Ordering {
    a.rating
        .total_cmp(&b.rating)
        .then_with(|| a.volatility.total_cmp(&b.volatility))
}

/// `Cf = sqrt(mean(V^2) + var(R))`, using the sample variance of ratings.
fn calibration_factor(entries: &[FieldEntry]) -> f64 {
    let n = entries.len() as f64;
    let mean_sq_volatility = entries.iter().map(|e| e.volatility * e.volatility).sum::<f64>() / n;

    let rating_variance = if entries.len() > 1 {
        let mean = entries.iter().map(|e| e.rating).sum::<f64>() / n;
        entries.iter().map(|e| (e.rating - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };

    (mean_sq_volatility + rating_variance).sqrt()
}
