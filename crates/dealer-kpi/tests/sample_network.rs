use dealer_kpi::analytics::{
    estimate_roi, ComplianceBand, FilterCriteria, GoalSet, KpiError, RoiInputs,
    DEFAULT_AMBER_TOLERANCE,
};
use dealer_kpi::dataset::{Dataset, DatasetLoader, KpiMetric, LoadSummary};
use dealer_kpi::report::DashboardReport;
use std::path::PathBuf;

fn sample_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn load_sample() -> (Dataset, LoadSummary) {
    DatasetLoader::from_dir(sample_dir()).expect("bundled sample data loads")
}

fn dashboard(criteria: &FilterCriteria) -> Result<DashboardReport, KpiError> {
    let (dataset, _) = load_sample();
    DashboardReport::build(
        &dataset,
        criteria,
        &GoalSet::default(),
        DEFAULT_AMBER_TOLERANCE,
    )
}

#[test]
fn sample_data_loads_cleanly() {
    let (dataset, summary) = load_sample();

    assert_eq!(summary.dealers, 6);
    assert_eq!(summary.kpi_records, 60);
    assert_eq!(summary.shop_records, 50);
    assert_eq!(summary.orphan_records, 0);
    assert_eq!(summary.duplicate_dealers, 0);
    assert_eq!(summary.out_of_range_fractions, 0);

    assert_eq!(dataset.regions(), vec!["Midwest", "South", "Southwest"]);
    let (first, last) = dataset.date_range().expect("series present");
    assert_eq!(first.to_string(), "2025-03-03");
    assert_eq!(last.to_string(), "2025-05-05");
}

#[test]
fn network_dashboard_weights_latest_week() {
    let report = dashboard(&FilterCriteria::default()).expect("network report");

    assert_eq!(report.as_of.to_string(), "2025-05-05");
    assert_eq!(report.dealers_selected, 6);
    assert_eq!(report.series.len(), 10);

    let loyalty = report.card(KpiMetric::PartsLoyalty).expect("loyalty card");
    assert!((loyalty.value - 0.827_521_021).abs() < 1e-6);

    // D006 reported no wait time in the latest week and drops out of the mean.
    let wait = report.card(KpiMetric::TotalWaitMin).expect("wait card");
    assert!((wait.value - 58.151_269_035).abs() < 1e-6);

    assert!((report.ro_growth - 0.211_357_210).abs() < 1e-6);
}

#[test]
fn ranking_excludes_incomplete_dealer() {
    let report = dashboard(&FilterCriteria::default()).expect("network report");

    let order: Vec<&str> = report
        .ranking
        .ranked
        .iter()
        .map(|entry| entry.dealer_id.as_str())
        .collect();
    assert_eq!(order, vec!["D002", "D005", "D001", "D004", "D003"]);
    assert_eq!(report.ranking.excluded.len(), 1);
    assert_eq!(report.ranking.excluded[0].dealer_id, "D006");
    assert!(report.ranking.excluded[0].reason.contains("total_wait_min"));
}

#[test]
fn region_filter_narrows_cards() {
    let criteria = FilterCriteria {
        region: Some("Midwest".into()),
        ..FilterCriteria::default()
    };
    let report = dashboard(&criteria).expect("midwest report");

    assert_eq!(report.dealers_selected, 3);
    let loyalty = report.card(KpiMetric::PartsLoyalty).expect("loyalty card");
    assert!((loyalty.value - 0.853_030_303).abs() < 1e-6);
}

#[test]
fn compliance_band_selects_on_latest_score() {
    let criteria = FilterCriteria {
        compliance_band: ComplianceBand::Below70,
        ..FilterCriteria::default()
    };
    let report = dashboard(&criteria).expect("below-70 report");
    assert_eq!(report.dealers_selected, 1);
    // Only D006 remains and it cannot be ranked.
    assert!(report.ranking.ranked.is_empty());
    assert!(report.card(KpiMetric::TotalWaitMin).is_none());
    assert_eq!(report.unavailable, vec![KpiMetric::TotalWaitMin]);
}

#[test]
fn empty_filter_is_reported_as_no_data() {
    let criteria = FilterCriteria {
        region: Some("South".into()),
        journey_stage: Some("Sustain".into()),
        ..FilterCriteria::default()
    };
    assert_eq!(dashboard(&criteria).err(), Some(KpiError::NoDataForFilter));
}

#[test]
fn what_if_uses_network_maintenance_penetration() {
    let report = dashboard(&FilterCriteria::default()).expect("network report");
    let baseline = report
        .card(KpiMetric::MaintenancePenetration)
        .expect("maintenance card")
        .value;

    let estimate = estimate_roi(&RoiInputs::new(baseline, 0.05, 75.0, 120.0));
    assert!((estimate.incremental_ros - 50.0).abs() < 1e-6);
    assert!((estimate.total_incremental_gross - 21_000.0).abs() < 1e-3);
}
