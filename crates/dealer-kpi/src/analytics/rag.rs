use crate::dataset::{KpiMetric, Polarity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_AMBER_TOLERANCE: f64 = 0.9;

/// Three-level goal attainment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    Red,
    Amber,
    Green,
}

impl RagStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Amber => "Amber",
            Self::Green => "Green",
        }
    }
}

/// Boundary between Amber and Red for a goal.
pub fn amber_threshold(goal: f64, polarity: Polarity, amber_tolerance: f64) -> f64 {
    match polarity {
        Polarity::HigherIsBetter => amber_tolerance * goal,
        Polarity::LowerIsBetter => goal / amber_tolerance,
    }
}

/// Classifies `value` against `goal`.
///
/// Higher-is-better: Green at or above the goal, Amber at or above
/// `tolerance * goal`. Lower-is-better: Green at or below the goal, Amber at
/// or below `goal / tolerance`. Everything else is Red.
pub fn classify(value: f64, goal: f64, polarity: Polarity, amber_tolerance: f64) -> RagStatus {
    let amber = amber_threshold(goal, polarity, amber_tolerance);
    match polarity {
        Polarity::HigherIsBetter if value >= goal => RagStatus::Green,
        Polarity::HigherIsBetter if value >= amber => RagStatus::Amber,
        Polarity::LowerIsBetter if value <= goal => RagStatus::Green,
        Polarity::LowerIsBetter if value <= amber => RagStatus::Amber,
        _ => RagStatus::Red,
    }
}

/// Adjustable per-metric goals. Never persisted; callers override per pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GoalSet {
    goals: BTreeMap<KpiMetric, f64>,
}

impl Default for GoalSet {
    fn default() -> Self {
        let goals = KpiMetric::ordered()
            .into_iter()
            .map(|metric| (metric, default_goal(metric)))
            .collect();
        Self { goals }
    }
}

impl GoalSet {
    pub fn goal(&self, metric: KpiMetric) -> Option<f64> {
        self.goals.get(&metric).copied()
    }

    pub fn set(&mut self, metric: KpiMetric, goal: f64) {
        self.goals.insert(metric, goal);
    }

    /// Default goals with the supplied entries replaced.
    pub fn with_overrides(overrides: &HashMap<KpiMetric, f64>) -> Self {
        let mut goals = Self::default();
        for (metric, goal) in overrides {
            goals.set(*metric, *goal);
        }
        goals
    }

    pub fn iter(&self) -> impl Iterator<Item = (KpiMetric, f64)> + '_ {
        self.goals.iter().map(|(metric, goal)| (*metric, *goal))
    }
}

fn default_goal(metric: KpiMetric) -> f64 {
    match metric {
        KpiMetric::PartsLoyalty => 0.80,
        KpiMetric::AutoReplenishment => 0.75,
        KpiMetric::MaintenancePenetration => 0.45,
        KpiMetric::BulkOilPenetration => 0.60,
        KpiMetric::ServiceLaneUtilization => 0.75,
        KpiMetric::TimeInBayMaintMin => 45.0,
        KpiMetric::TimeInBayAdvMin => 90.0,
        KpiMetric::TotalWaitMin => 60.0,
        KpiMetric::RetentionRate => 0.65,
        KpiMetric::ComplianceScore => 0.85,
    }
}
