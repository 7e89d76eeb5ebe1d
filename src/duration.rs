//! Task window and progress resolution.
//!
//! Tasks are rarely fully dated in practice. The resolver guarantees every
//! task a usable window with `start <= end` and a duration of at least one
//! day, which the CPM pass requires as a precondition.

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::models::Task;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A task's resolved calendar window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Whole days, never below the configured minimum.
    pub duration_days: f64,
    /// Completion percentage, 0-100.
    pub progress: f64,
}

/// Estimate a duration in whole days from the task's effort estimate.
fn estimated_days(task: &Task, config: &EngineConfig) -> f64 {
    let hours = task.estimated_hours.max(config.min_estimated_hours);
    (hours / config.hours_per_day)
        .ceil()
        .max(config.min_duration_days)
}

/// Whole-day span between two instants, clamped to the duration floor.
fn day_span(start: DateTime<Utc>, end: DateTime<Utc>, config: &EngineConfig) -> f64 {
    let days = (end - start).num_seconds() as f64 / SECONDS_PER_DAY;
    days.ceil().max(config.min_duration_days)
}

/// Resolve a task's working window, in priority order:
/// explicit start+due, due only (estimate backward), start only (estimate
/// forward), neither (estimate forward from the creation timestamp).
pub fn resolve_window(task: &Task, config: &EngineConfig) -> ResolvedWindow {
    let (start, end, duration_days) = match (task.start_date, task.due_date) {
        (Some(start), Some(due)) if due > start => (start, due, day_span(start, due, config)),
        (Some(start), Some(_)) => {
            // Inverted or zero-length explicit window: clamp to the floor.
            let duration = config.min_duration_days;
            (start, start + whole_days(duration), duration)
        }
        (None, Some(due)) => {
            let duration = estimated_days(task, config);
            (due - whole_days(duration), due, duration)
        }
        (Some(start), None) => {
            let duration = estimated_days(task, config);
            (start, start + whole_days(duration), duration)
        }
        (None, None) => {
            let duration = estimated_days(task, config);
            (task.created_at, task.created_at + whole_days(duration), duration)
        }
    };

    ResolvedWindow {
        start,
        end,
        duration_days,
        progress: resolve_progress(task, config),
    }
}

/// Progress percentage derived from status and effort.
///
/// Terminal tasks are 100%. In-flight tasks report effort burn-down capped
/// below completion; with no estimate to divide by, a flat default is used.
/// Not-yet-started tasks are 0%.
pub fn resolve_progress(task: &Task, config: &EngineConfig) -> f64 {
    if task.status.is_terminal() {
        100.0
    } else if task.status.is_started() {
        if task.estimated_hours > 0.0 {
            (task.actual_hours / task.estimated_hours * 100.0).min(config.in_flight_progress_cap)
        } else {
            config.default_progress
        }
    } else {
        0.0
    }
}

fn whole_days(days: f64) -> Duration {
    Duration::seconds((days * SECONDS_PER_DAY) as i64)
}
