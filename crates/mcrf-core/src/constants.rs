//! Numeric tolerances and instance-shaping defaults.

/// Slack added to depot capacities when comparing accumulated edge weights.
pub const EPSILON_WEIGHTS: f64 = 0.000001;

/// Slack on the pricing optimality test `total >= -dual - EPSILON_PRICING_PROBLEM`.
pub const EPSILON_PRICING_PROBLEM: f64 = 0.000001;

/// Weight of the relative edge length in the geometry-based edge cut score.
pub const GEOMETRY_CUT_SCALE: f64 = 0.5;

/// Number of incident edges each vertex keeps in the geometry-based edge cut.
pub const GEOMETRY_CUT_DEGREE: usize = 3;

/// Depot capacity is the minimum spanning forest weight divided by this factor
/// times the number of depots.
pub const CAPACITY_DIVISOR: f64 = 5.0;
