use dealer_kpi::config::{AppConfig, ScoringConfig};
use dealer_kpi::dataset::{Dataset, DatasetLoader, KpiMetric};
use dealer_kpi::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) dataset: Arc<Dataset>,
    pub(crate) scoring: ScoringConfig,
}

/// Loads the KPI snapshot once; handlers share it read-only.
pub(crate) fn load_dataset(data_dir: &Path) -> Result<Arc<Dataset>, AppError> {
    let (dataset, summary) = DatasetLoader::from_dir(data_dir)?;
    if dataset.kpi_records().is_empty() {
        warn!(data_dir = %data_dir.display(), "KPI series is empty; every dashboard will report no data");
    }
    if summary.orphan_records > 0 || summary.duplicate_dealers > 0 {
        warn!(
            orphans = summary.orphan_records,
            duplicates = summary.duplicate_dealers,
            "snapshot loaded with dropped rows"
        );
    }
    Ok(Arc::new(dataset))
}

pub(crate) fn resolve_data_dir(config: &AppConfig, override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| config.data.data_dir.clone())
}

/// A `metric=value` goal override given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GoalOverride {
    pub(crate) metric: KpiMetric,
    pub(crate) goal: f64,
}

pub(crate) fn parse_goal_override(raw: &str) -> Result<GoalOverride, String> {
    let (metric, goal) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected METRIC=GOAL, got '{raw}'"))?;
    let metric: KpiMetric = metric.parse().map_err(|err| format!("{err}"))?;
    let goal = goal
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("goal for {metric} must be numeric ({err})"))?;
    Ok(GoalOverride { metric, goal })
}

pub(crate) fn parse_tolerance(raw: &str) -> Result<f64, String> {
    ScoringConfig::parse_tolerance(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_override_accepts_column_names_and_dashes() {
        let parsed = parse_goal_override("total-wait-min=50").expect("override parses");
        assert_eq!(
            parsed,
            GoalOverride {
                metric: KpiMetric::TotalWaitMin,
                goal: 50.0
            }
        );
        assert!(parse_goal_override("parts_loyalty").is_err());
        assert!(parse_goal_override("parts_loyalty=high").is_err());
        assert!(parse_goal_override("warp_speed=1").is_err());
    }

    #[test]
    fn tolerance_must_be_in_unit_interval() {
        assert_eq!(parse_tolerance("0.85"), Ok(0.85));
        assert!(parse_tolerance("0").is_err());
    }
}
