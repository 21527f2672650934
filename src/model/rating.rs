use crate::model::{
    constants::*,
    field::{Field, FieldEntry}
};

/// The tunable curves of the rating model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingParameters {
    pub default_volatility: f64,
    pub min_volatility: f64,
    pub performance_beta: f64,
    pub search_margin: f64,
    pub bisection_tolerance: f64,
    pub bisection_max_iterations: u32,
    pub weight_base: f64,
    pub weight_novice: f64,
    pub cap_base: f64,
    pub cap_novice: f64,
    pub volatility_smoothing: f64,
    pub decay_factor: f64,
    pub decay_window: u32
}

impl Default for RatingParameters {
    fn default() -> Self {
        RatingParameters {
            default_volatility: DEFAULT_VOLATILITY,
            min_volatility: MIN_VOLATILITY,
            performance_beta: PERFORMANCE_BETA,
            search_margin: SEARCH_MARGIN,
            bisection_tolerance: BISECTION_TOLERANCE,
            bisection_max_iterations: BISECTION_MAX_ITERATIONS,
            weight_base: WEIGHT_BASE,
            weight_novice: WEIGHT_NOVICE,
            cap_base: CAP_BASE,
            cap_novice: CAP_NOVICE,
            volatility_smoothing: VOLATILITY_SMOOTHING,
            decay_factor: DECAY_FACTOR,
            decay_window: DECAY_WINDOW
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub rating: f64,
    pub volatility: f64
}

/// Pairwise-comparison rating model for rank-only multiplayer contests.
#[derive(Debug, Clone, Default)]
pub struct RatingModel {
    pub params: RatingParameters
}

impl RatingModel {
    pub fn new(params: RatingParameters) -> RatingModel {
        RatingModel { params }
    }

    /// # Rating a single participant
    ///
    /// 1. The achieved rank becomes the fraction of the field the participant
    ///     is expected to have beaten.
    /// 2. The performance rating is the rating whose average win probability
    ///     against every opponent equals that fraction.
    /// 3. The gap between the performance rating and the prior rating is
    ///     normalized by the field calibration factor and blended in with an
    ///     experience weight, capped per contest.
    /// 4. Volatility moves part of the way towards an experience dependent
    ///     target.
    ///
    /// `own` must be the participant's own entry in `field`. `times_played`
    /// is the count before this contest.
    pub fn rate(&self, own: FieldEntry, times_played: u32, rank: u32, field: &Field) -> RatingUpdate {
        let opponents: Vec<&FieldEntry> = field.opponents_of(own).collect();

        let delta = if opponents.is_empty() {
            0.0
        } else {
            let target = target_win_fraction(rank, field.len());
            let performance = self.performance_rating_against(own, &opponents, target);

            let mean_scale =
                opponents.iter().map(|o| self.comparison_scale(o)).sum::<f64>() / opponents.len() as f64;
            let gap = (performance - own.rating) * field.cf() / mean_scale;

            let weight = self.experience_weight(times_played);
            let cap = self.movement_cap(times_played);

            (gap * weight / (1.0 + weight)).clamp(-cap, cap)
        };

        RatingUpdate {
            rating: own.rating + delta,
            volatility: self.next_volatility(own.volatility, times_played)
        }
    }

    /// Logistic probability that a player rated `rating` finishes ahead of
    /// `opponent`. A more volatile opponent flattens the curve.
    pub fn win_probability(&self, rating: f64, opponent: &FieldEntry) -> f64 {
        let z = (rating - opponent.rating) / self.comparison_scale(opponent);
        1.0 / (1.0 + (-z).exp())
    }

    /// Rating at which the average win probability against the field, the
    /// participant's own entry excluded, equals `target`.
    pub fn performance_rating(&self, own: FieldEntry, field: &Field, target: f64) -> f64 {
        let opponents: Vec<&FieldEntry> = field.opponents_of(own).collect();
        if opponents.is_empty() {
            return own.rating;
        }

        self.performance_rating_against(own, &opponents, target)
    }

    /// Bisection over `[lowest - margin, highest + margin]`, where the bounds
    /// cover the participant and every opponent. Targets outside the reachable
    /// range resolve to the nearest bound.
    fn performance_rating_against(&self, own: FieldEntry, opponents: &[&FieldEntry], target: f64) -> f64 {
        let expected = |rating: f64| {
            opponents.iter().map(|o| self.win_probability(rating, o)).sum::<f64>() / opponents.len() as f64
        };

        let (lowest, highest) = opponents
            .iter()
            .fold((own.rating, own.rating), |(lo, hi), o| (lo.min(o.rating), hi.max(o.rating)));
        let mut lo = lowest - self.params.search_margin;
        let mut hi = highest + self.params.search_margin;

        if expected(hi) <= target {
            return hi;
        }
        if expected(lo) >= target {
            return lo;
        }

        let mut iterations = 0;
        while hi - lo > self.params.bisection_tolerance && iterations < self.params.bisection_max_iterations {
            let mid = 0.5 * (lo + hi);
            if expected(mid) < target {
                lo = mid;
            } else {
                hi = mid;
            }
            iterations += 1;
        }

        0.5 * (lo + hi)
    }

    fn comparison_scale(&self, opponent: &FieldEntry) -> f64 {
        self.params.performance_beta.hypot(opponent.volatility)
    }

    /// Blend weight `w`; a participant moves `w / (1 + w)` of the way towards
    /// their normalized performance. Largest for a first contest.
    pub fn experience_weight(&self, times_played: u32) -> f64 {
        let novice = self.params.weight_novice / (times_played as f64 + 1.0);
        1.0 / (self.params.weight_base - novice) - 1.0
    }

    pub fn movement_cap(&self, times_played: u32) -> f64 {
        self.params.cap_base + self.params.cap_novice / (times_played as f64 + 2.0)
    }

    pub fn target_volatility(&self, times_played: u32) -> f64 {
        let target = self.params.default_volatility / (times_played as f64 + 2.0).sqrt();
        target.max(self.params.min_volatility)
    }

    fn next_volatility(&self, volatility: f64, times_played: u32) -> f64 {
        let target = self.target_volatility(times_played);
        let next = volatility + self.params.volatility_smoothing * (target - volatility);

        next.max(self.params.min_volatility)
    }
}

/// Fraction of the other `n - 1` participants beaten by rank `rank`.
/// A lone participant gets the neutral 0.5. Ranks past the field count as
/// beating nobody.
pub fn target_win_fraction(rank: u32, n: usize) -> f64 {
    if n <= 1 {
        return 0.5;
    }

    let n = n as f64;
    ((n - rank as f64) / (n - 1.0)).clamp(0.0, 1.0)
}
