//! Impact scoring, risk assessment, and completion scenarios for the
//! critical-task set.

use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::models::{ScheduledTask, TimelineData};

const SECONDS_PER_DAY: f64 = 86_400.0;

// Impact-score weights (unitless; higher = more disruptive if delayed).
const IMPACT_BASE: f64 = 10.0;
const IMPACT_DURATION_WEIGHT: f64 = 2.0;
const IMPACT_DURATION_CAP: f64 = 20.0;
const IMPACT_PROGRESS_WEIGHT: f64 = 0.3;
const IMPACT_OVERDUE_WEIGHT: f64 = 5.0;
const IMPACT_DEPENDENT_WEIGHT: f64 = 3.0;
const BOTTLENECK_SCORE_THRESHOLD: f64 = 30.0;
const BOTTLENECK_PROGRESS_THRESHOLD: f64 = 50.0;

// Risk scoring.
const RISK_OVERDUE_POINTS: f64 = 15.0;
const RISK_LOW_PROGRESS_POINTS: f64 = 8.0;
const RISK_LOW_PROGRESS_THRESHOLD: f64 = 25.0;
const RISK_UNASSIGNED_POINTS: f64 = 10.0;
const RISK_CRITICAL_SHARE_POINTS: f64 = 20.0;
const RISK_CRITICAL_SHARE_THRESHOLD: f64 = 0.6;
const RISK_SHORT_TASK_POINTS: f64 = 5.0;
const RISK_SHORT_TASK_THRESHOLD: f64 = 2.0;
const RISK_HIGH_CUTOFF: f64 = 50.0;
const RISK_MEDIUM_CUTOFF: f64 = 25.0;

// Worst case pads the best case by this share of critical-path duration.
const WORST_CASE_BUFFER_RATIO: f64 = 0.2;

/// Per-task impact detail for a critical task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalTaskDetail {
    pub task_id: String,
    pub name: String,
    pub duration_days: f64,
    pub progress: f64,
    pub overdue_days: f64,
    /// Direct successor count in the dependency graph.
    pub dependent_count: usize,
    pub impact_score: f64,
    pub is_bottleneck: bool,
}

/// Risk factor categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    OverdueCriticalTasks,
    LowProgressCriticalTasks,
    UnassignedCriticalTasks,
    CriticalPathShare,
    ShortCriticalTasks,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
}

/// A severity-tagged contribution to the overall risk score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    pub severity: RiskSeverity,
    pub points: f64,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Aggregated risk over the critical-task set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
}

/// A projected completion date with its narrative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionScenario {
    pub date: DateTime<Utc>,
    /// Qualitative likelihood of hitting the date.
    pub probability: String,
    /// Stated assumptions; constant narrative per scenario kind.
    pub assumptions: Vec<String>,
}

/// Best / current-trajectory / worst completion projections.
///
/// All three are `None` when the critical set is empty. When present,
/// `best <= current <= worst`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionScenarios {
    pub best_case: Option<CompletionScenario>,
    pub current_trajectory: Option<CompletionScenario>,
    pub worst_case: Option<CompletionScenario>,
}

/// Recommendation urgency; declaration order is the display ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    Critical,
    High,
    Medium,
    Low,
}

/// An action derived from the risk factors and bottleneck list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: String,
    pub priority: RecommendationPriority,
    pub message: String,
}

/// The full critical-path analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathAnalysis {
    /// Critical tasks, most disruptive first.
    pub critical_tasks: Vec<CriticalTaskDetail>,
    pub risk: RiskAssessment,
    pub recommendations: Vec<Recommendation>,
    pub scenarios: CompletionScenarios,
}

/// Impact of delaying one critical task.
///
/// `base + min(cap, 2*duration) + 0.3*(100-progress) + 5*overdue + 3*dependents`
pub fn impact_score(
    duration_days: f64,
    progress: f64,
    overdue_days: f64,
    dependent_count: usize,
) -> f64 {
    IMPACT_BASE
        + (IMPACT_DURATION_WEIGHT * duration_days).min(IMPACT_DURATION_CAP)
        + IMPACT_PROGRESS_WEIGHT * (100.0 - progress)
        + IMPACT_OVERDUE_WEIGHT * overdue_days
        + IMPACT_DEPENDENT_WEIGHT * dependent_count as f64
}

fn overdue_days(task: &ScheduledTask, now: DateTime<Utc>) -> f64 {
    if task.task.status.is_terminal() || task.end >= now {
        0.0
    } else {
        (now - task.end).num_days().max(0) as f64
    }
}

fn whole_days(days: f64) -> Duration {
    Duration::seconds((days * SECONDS_PER_DAY) as i64)
}

/// Analyze the critical-task subset of a timeline.
pub fn analyze_critical_path(timeline: &TimelineData) -> CriticalPathAnalysis {
    let now = timeline.generated_at;
    let critical: Vec<&ScheduledTask> =
        timeline.tasks.iter().filter(|t| t.is_critical).collect();

    let mut dependents: FxHashMap<&str, usize> = FxHashMap::default();
    for edge in &timeline.edges {
        *dependents.entry(edge.predecessor_id.as_str()).or_insert(0) += 1;
    }

    let mut details: Vec<CriticalTaskDetail> = critical
        .iter()
        .map(|st| {
            let overdue = overdue_days(st, now);
            let dependent_count = dependents.get(st.id()).copied().unwrap_or(0);
            let score = impact_score(st.duration_days, st.progress, overdue, dependent_count);
            CriticalTaskDetail {
                task_id: st.id().to_string(),
                name: st.task.name.clone(),
                duration_days: st.duration_days,
                progress: st.progress,
                overdue_days: overdue,
                dependent_count,
                impact_score: score,
                is_bottleneck: score > BOTTLENECK_SCORE_THRESHOLD
                    && st.progress < BOTTLENECK_PROGRESS_THRESHOLD,
            }
        })
        .collect();
    details.sort_by(|a, b| {
        b.impact_score
            .partial_cmp(&a.impact_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    let risk = assess_risk(&details, &critical, timeline.tasks.len());
    let scenarios = build_scenarios(timeline, &critical);
    let recommendations = recommend(&details, &risk);

    CriticalPathAnalysis {
        critical_tasks: details,
        risk,
        recommendations,
        scenarios,
    }
}

fn assess_risk(
    details: &[CriticalTaskDetail],
    critical: &[&ScheduledTask],
    total_tasks: usize,
) -> RiskAssessment {
    let mut score = 0.0;
    let mut factors: Vec<RiskFactor> = Vec::new();

    let overdue = details.iter().filter(|d| d.overdue_days > 0.0).count();
    if overdue > 0 {
        let points = RISK_OVERDUE_POINTS * overdue as f64;
        score += points;
        factors.push(RiskFactor {
            kind: RiskFactorKind::OverdueCriticalTasks,
            severity: RiskSeverity::High,
            points,
            description: format!("{overdue} critical task(s) past their end date"),
        });
    }

    let low_progress = details
        .iter()
        .filter(|d| d.progress < RISK_LOW_PROGRESS_THRESHOLD)
        .count();
    if low_progress > 0 {
        let points = RISK_LOW_PROGRESS_POINTS * low_progress as f64;
        score += points;
        factors.push(RiskFactor {
            kind: RiskFactorKind::LowProgressCriticalTasks,
            severity: RiskSeverity::Medium,
            points,
            description: format!("{low_progress} critical task(s) below 25% progress"),
        });
    }

    let unassigned = critical
        .iter()
        .filter(|st| st.task.assignee.is_none())
        .count();
    if unassigned > 0 {
        let points = RISK_UNASSIGNED_POINTS * unassigned as f64;
        score += points;
        factors.push(RiskFactor {
            kind: RiskFactorKind::UnassignedCriticalTasks,
            severity: RiskSeverity::Medium,
            points,
            description: format!("{unassigned} critical task(s) without an assignee"),
        });
    }

    if total_tasks > 0 {
        let share = critical.len() as f64 / total_tasks as f64;
        if share > RISK_CRITICAL_SHARE_THRESHOLD {
            score += RISK_CRITICAL_SHARE_POINTS;
            factors.push(RiskFactor {
                kind: RiskFactorKind::CriticalPathShare,
                severity: RiskSeverity::Medium,
                points: RISK_CRITICAL_SHARE_POINTS,
                description: format!(
                    "{:.0}% of all tasks are on the critical path",
                    share * 100.0
                ),
            });
        }
    }

    if !critical.is_empty() {
        let avg_duration =
            critical.iter().map(|st| st.duration_days).sum::<f64>() / critical.len() as f64;
        if avg_duration < RISK_SHORT_TASK_THRESHOLD {
            score += RISK_SHORT_TASK_POINTS;
            factors.push(RiskFactor {
                kind: RiskFactorKind::ShortCriticalTasks,
                severity: RiskSeverity::Low,
                points: RISK_SHORT_TASK_POINTS,
                description: format!(
                    "average critical task is only {avg_duration:.1} day(s); the path is fragmented"
                ),
            });
        }
    }

    let level = if score > RISK_HIGH_CUTOFF {
        RiskLevel::High
    } else if score > RISK_MEDIUM_CUTOFF {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        score,
        level,
        factors,
    }
}

fn build_scenarios(timeline: &TimelineData, critical: &[&ScheduledTask]) -> CompletionScenarios {
    if critical.is_empty() {
        return CompletionScenarios::default();
    }
    let now = timeline.generated_at;
    let origin = timeline.schedule_origin;

    let max_finish = critical
        .iter()
        .map(|st| st.earliest_finish)
        .fold(0.0, f64::max);
    let best_date = origin + whole_days(max_finish);

    let total_duration: f64 = critical.iter().map(|st| st.duration_days).sum();
    let worst_date = best_date + whole_days((WORST_CASE_BUFFER_RATIO * total_duration).ceil());

    // Projected from the observed progress rate since the earliest critical
    // start; guarded against zero or negative rates.
    let avg_progress =
        critical.iter().map(|st| st.progress).sum::<f64>() / critical.len() as f64;
    let earliest_start = critical.iter().map(|st| st.start).min().unwrap_or(origin);
    let elapsed_days = (now - earliest_start).num_seconds() as f64 / SECONDS_PER_DAY;
    let current_date = if avg_progress > 0.0 && elapsed_days > 0.0 {
        let rate = avg_progress / elapsed_days;
        let remaining_days = (100.0 - avg_progress) / rate;
        now + whole_days(remaining_days)
    } else {
        best_date
    };
    let current_date = current_date.clamp(best_date, worst_date);

    CompletionScenarios {
        best_case: Some(CompletionScenario {
            date: best_date,
            probability: "low".to_string(),
            assumptions: vec![
                "every critical task starts at its earliest start".to_string(),
                "no new blocking work appears".to_string(),
            ],
        }),
        current_trajectory: Some(CompletionScenario {
            date: current_date,
            probability: "moderate".to_string(),
            assumptions: vec![
                "progress continues at the observed average rate".to_string(),
                "completed effort is representative of remaining effort".to_string(),
            ],
        }),
        worst_case: Some(CompletionScenario {
            date: worst_date,
            probability: "high".to_string(),
            assumptions: vec![
                "critical work overruns by the full contingency buffer".to_string(),
                "no scope is cut to recover the schedule".to_string(),
            ],
        }),
    }
}

fn recommend(details: &[CriticalTaskDetail], risk: &RiskAssessment) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = Vec::new();

    for factor in &risk.factors {
        match factor.kind {
            RiskFactorKind::OverdueCriticalTasks => recs.push(Recommendation {
                kind: "overdue_recovery".to_string(),
                priority: RecommendationPriority::Critical,
                message: "Recover overdue critical tasks first; every day late moves the \
                          project end date."
                    .to_string(),
            }),
            RiskFactorKind::UnassignedCriticalTasks => recs.push(Recommendation {
                kind: "assignment_needed".to_string(),
                priority: RecommendationPriority::High,
                message: "Assign an owner to every critical task; unowned work slips silently."
                    .to_string(),
            }),
            RiskFactorKind::CriticalPathShare => recs.push(Recommendation {
                kind: "parallel_execution".to_string(),
                priority: RecommendationPriority::Medium,
                message: "Most tasks sit on the critical path; restructure dependencies to \
                          open parallel work."
                    .to_string(),
            }),
            RiskFactorKind::LowProgressCriticalTasks => recs.push(Recommendation {
                kind: "progress_review".to_string(),
                priority: RecommendationPriority::Medium,
                message: "Review critical tasks below 25% progress for hidden blockers."
                    .to_string(),
            }),
            RiskFactorKind::ShortCriticalTasks => {}
        }
    }

    if details.iter().any(|d| d.is_bottleneck) {
        recs.push(Recommendation {
            kind: "bottleneck_mitigation".to_string(),
            priority: RecommendationPriority::High,
            message: "High-impact, low-progress bottlenecks need immediate attention or \
                      additional staffing."
                .to_string(),
        });
    }

    recs.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.kind.cmp(&b.kind)));
    recs
}
