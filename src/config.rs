//! Configuration for the timeline engine.

use serde::{Deserialize, Serialize};

/// Tunable constants for timeline computation.
///
/// Every component takes the config by reference; the engine holds no other
/// state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Float magnitude below which a task counts as critical.
    ///
    /// Wide enough to absorb floating-point error from date-difference
    /// arithmetic.
    pub critical_float_epsilon: f64,
    /// Working hours per calendar day used for effort estimates.
    pub hours_per_day: f64,
    /// Minimum effort assumed when estimating a window from hours.
    pub min_estimated_hours: f64,
    /// Every resolved duration is clamped to at least this many days.
    pub min_duration_days: f64,
    /// Progress assumed for in-flight tasks with no effort estimate.
    pub default_progress: f64,
    /// Effort-derived progress never exceeds this until a task is done.
    pub in_flight_progress_cap: f64,
    /// Days of padding added around the min/max task dates.
    pub window_padding_days: i64,
    /// Width of the default window anchored at "now" for empty timelines.
    pub default_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            critical_float_epsilon: 0.01,
            hours_per_day: 8.0,
            min_estimated_hours: 8.0,
            min_duration_days: 1.0,
            default_progress: 50.0,
            in_flight_progress_cap: 90.0,
            window_padding_days: 7,
            default_window_days: 30,
        }
    }
}
