// Model constants
pub const DEFAULT_RATING: f64 = 1500.0;
pub const DEFAULT_VOLATILITY: f64 = 350.0;
pub const MIN_VOLATILITY: f64 = 75.0;
/// Spread of a single contest performance around the true rating.
pub const PERFORMANCE_BETA: f64 = 200.0;
pub const SEARCH_MARGIN: f64 = 1000.0;
pub const BISECTION_TOLERANCE: f64 = 1e-6;
pub const BISECTION_MAX_ITERATIONS: u32 = 200;
// Experience weighting, w = 1 / (WEIGHT_BASE - WEIGHT_NOVICE / (tp + 1)) - 1
pub const WEIGHT_BASE: f64 = 0.82;
pub const WEIGHT_NOVICE: f64 = 0.42;
// Maximum movement per contest, CAP_BASE + CAP_NOVICE / (tp + 2)
pub const CAP_BASE: f64 = 150.0;
pub const CAP_NOVICE: f64 = 1500.0;
pub const VOLATILITY_SMOOTHING: f64 = 0.3;
// Decay constants
pub const DECAY_FACTOR: f64 = 0.99;
pub const DECAY_WINDOW: u32 = 5;
