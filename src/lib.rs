//! Project timeline engine.
//!
//! Computes schedules from tasks and their directed dependencies: per-task
//! timing windows, cycle detection, critical-path extraction via the
//! forward/backward CPM passes, and the risk/impact/scenario analytics
//! built on top.
//!
//! Every computation is a pure function of an immutable input snapshot plus
//! an injected "now" instant; the engine holds no state beyond its
//! configuration and performs no I/O, so concurrent computations need no
//! coordination. Persistence, rendering, and transport are the host's
//! concern.

pub mod config;
pub mod cpm;
pub mod duration;
pub mod filter;
pub mod graph;
pub mod impact;
pub mod models;
pub mod timeline;

use chrono::{DateTime, Utc};

pub use config::EngineConfig;
pub use cpm::{run_cpm, CpmError, CpmResult, TaskTiming};
pub use duration::{resolve_progress, resolve_window, ResolvedWindow};
pub use filter::{
    apply_filter, CompletionBucket, FilterStats, FilteredTimeline, TimelineFilter,
};
pub use graph::{build_graph, detect_cycles, CycleReport, NodeId, TaskIndex, TimelineGraph};
pub use impact::{
    analyze_critical_path, impact_score, CompletionScenario, CompletionScenarios,
    CriticalPathAnalysis, CriticalTaskDetail, Recommendation, RecommendationPriority,
    RiskAssessment, RiskFactor, RiskFactorKind, RiskLevel, RiskSeverity,
};
pub use models::{
    DateRange, DependencyEdge, DependencyKind, DependencyRecord, DependencySource, Milestone,
    MilestoneSource, ScheduledTask, Task, TaskPriority, TaskStatus, TimelineData,
};
pub use timeline::{build_timeline, CycleError};

/// Stateless timeline service.
///
/// Holds only the configuration; every method takes all required data as
/// parameters and returns a freshly computed value.
#[derive(Clone, Debug, Default)]
pub struct TimelineEngine {
    config: EngineConfig,
}

impl TimelineEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a timeline from raw task and dependency records, optionally
    /// constrained to a project and/or date window.
    ///
    /// `now` is injected rather than read from a global clock so results
    /// stay deterministic and testable.
    pub fn build_timeline(
        &self,
        tasks: &[Task],
        dependencies: &[DependencyRecord],
        project: Option<&str>,
        window: Option<&DateRange>,
        now: DateTime<Utc>,
    ) -> Result<TimelineData, CycleError> {
        timeline::build_timeline(tasks, dependencies, project, window, now, &self.config)
    }

    /// Apply attribute/search/date filters to an assembled timeline and
    /// recompute the critical path over the surviving subgraph.
    pub fn filter_timeline(
        &self,
        timeline: &TimelineData,
        filter: &TimelineFilter,
    ) -> FilteredTimeline {
        filter::apply_filter(timeline, filter, &self.config)
    }

    /// Score, risk-assess, and project completion scenarios for the
    /// timeline's critical-task set.
    pub fn analyze_critical_path(&self, timeline: &TimelineData) -> CriticalPathAnalysis {
        impact::analyze_critical_path(timeline)
    }
}
