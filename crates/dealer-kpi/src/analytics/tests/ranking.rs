use super::common::*;
use crate::analytics::{latest_per_dealer, normalize, rank, MetricSpec, RANKING_METRICS};
use crate::dataset::{Dataset, DatasetLoader, KpiMetric, KpiRecord, Polarity};
use std::io::Cursor;

#[test]
fn normalize_maps_extremes_to_unit_interval() {
    let scaled = normalize(&[2.0, 4.0, 6.0], Polarity::HigherIsBetter);
    assert_eq!(scaled[0], 0.0);
    assert!((scaled[1] - 0.5).abs() < 1e-6);
    assert!((scaled[2] - 1.0).abs() < 1e-6);
}

#[test]
fn normalize_inverts_lower_is_better() {
    let scaled = normalize(&[30.0, 60.0], Polarity::LowerIsBetter);
    assert!((scaled[0] - 1.0).abs() < 1e-6);
    assert_eq!(scaled[1], 0.0);
}

#[test]
fn normalize_ties_collapse_to_zero() {
    let scaled = normalize(&[0.5, 0.5, 0.5], Polarity::HigherIsBetter);
    assert!(scaled.iter().all(|v| *v == 0.0));
}

#[test]
fn strongest_dealer_ranks_first() {
    let dataset = network();
    let latest = latest_per_dealer(dataset.kpi_records());
    let ranking = rank(&latest, &dataset, &RANKING_METRICS);

    let order: Vec<&str> = ranking
        .ranked
        .iter()
        .map(|entry| entry.dealer_id.as_str())
        .collect();
    assert_eq!(order, vec!["N1", "S1", "N2"]);
    assert_eq!(
        ranking.ranked.iter().map(|e| e.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let leader = ranking.leader().expect("leader");
    assert_eq!(leader.dealer_name, "N1 Motors");
    assert!(leader.score > 0.99 && leader.score <= 1.0);
    let middle = &ranking.ranked[1];
    assert!((middle.score - 0.5).abs() < 1e-6);
    assert_eq!(ranking.laggard().map(|e| e.score), Some(0.0));
    assert!(ranking.excluded.is_empty());
}

#[test]
fn dealer_missing_an_input_is_excluded_not_zeroed() {
    let mut gap = graded_record("B", date(5), 0.99, 50);
    gap.total_wait_min = None;
    let (dataset, _) = Dataset::new(
        vec![
            dealer("A", "West", "Launch"),
            dealer("B", "West", "Launch"),
            dealer("C", "West", "Launch"),
        ],
        vec![
            graded_record("A", date(5), 0.80, 50),
            gap,
            graded_record("C", date(5), 0.40, 50),
        ],
        Vec::new(),
    );
    let latest = latest_per_dealer(dataset.kpi_records());
    let ranking = rank(&latest, &dataset, &RANKING_METRICS);

    assert_eq!(ranking.ranked.len(), 2);
    assert_eq!(ranking.ranked[0].dealer_id, "A");
    assert_eq!(ranking.excluded.len(), 1);
    assert_eq!(ranking.excluded[0].dealer_id, "B");
    assert!(ranking.excluded[0].reason.contains("total_wait_min"));
}

#[test]
fn nan_cell_in_csv_excludes_dealer_from_ranking() {
    let dealers = "dealer_id,dealer_name,region,state,journey_stage,bays_express,bays_total,hours_open_weekly\n\
A,Alpha Ford,West,CO,Launch,2,10,60\n\
B,Bravo Ford,West,CO,Launch,2,10,60\n\
C,Charlie Ford,West,CO,Launch,2,10,60\n";
    let kpis = "dealer_id,date,parts_loyalty,auto_replenishment,maintenance_penetration,bulk_oil_penetration,service_lane_utilization,time_in_bay_maint_min,time_in_bay_adv_min,total_wait_min,retention_rate,compliance_score,express_lane_ros\n\
A,2025-01-06,0.9,0.9,0.9,0.9,0.9,30,60,40,0.9,0.9,100\n\
B,2025-01-06,0.5,0.5,0.5,0.5,0.5,50,90,60,0.5,0.5,100\n\
C,2025-01-06,NaN,0.1,0.1,0.1,0.1,90,150,95,0.1,0.1,100\n";
    let (dataset, _) = DatasetLoader::from_readers(
        Cursor::new(dealers),
        Cursor::new(kpis),
        None::<Cursor<&str>>,
    )
    .expect("NaN cells load as missing");

    let latest = latest_per_dealer(dataset.kpi_records());
    let ranking = rank(&latest, &dataset, &RANKING_METRICS);

    let order: Vec<&str> = ranking.ranked.iter().map(|e| e.dealer_id.as_str()).collect();
    assert_eq!(order, vec!["A", "B"]);
    assert!(ranking.ranked.iter().all(|entry| entry.score.is_finite()));
    assert_eq!(ranking.excluded.len(), 1);
    assert_eq!(ranking.excluded[0].dealer_id, "C");
    assert!(ranking.excluded[0].reason.contains("parts_loyalty"));
}

#[test]
fn non_finite_values_built_in_memory_count_as_missing() {
    let mut poisoned = graded_record("B", date(5), 0.99, 50);
    poisoned.retention_rate = Some(f64::NAN);
    let (dataset, _) = Dataset::new(
        vec![dealer("A", "West", "Launch"), dealer("B", "West", "Launch")],
        vec![graded_record("A", date(5), 0.50, 50), poisoned],
        Vec::new(),
    );
    let latest = latest_per_dealer(dataset.kpi_records());
    let ranking = rank(&latest, &dataset, &RANKING_METRICS);

    assert_eq!(ranking.ranked.len(), 1);
    assert_eq!(ranking.ranked[0].dealer_id, "A");
    assert_eq!(ranking.excluded[0].dealer_id, "B");
}

#[test]
fn records_for_unknown_dealers_are_excluded() {
    let dataset = network();
    let stray = graded_record("GHOST", date(13), 1.0, 999);
    let mut latest = latest_per_dealer(dataset.kpi_records());
    latest.insert("GHOST", &stray);

    let ranking = rank(&latest, &dataset, &RANKING_METRICS);
    assert_eq!(ranking.ranked.len(), 3);
    assert_eq!(ranking.excluded.len(), 1);
    assert!(ranking.excluded[0].reason.contains("unknown dealer GHOST"));
}

#[test]
fn single_metric_ranking_respects_polarity() {
    let dataset = network();
    let latest = latest_per_dealer(dataset.kpi_records());
    // Inverting the polarity of a lower-is-better metric flips the order.
    let slowest_first = [MetricSpec::new(KpiMetric::TotalWaitMin, Polarity::HigherIsBetter)];
    let ranking = rank(&latest, &dataset, &slowest_first);

    assert_eq!(ranking.leader().map(|e| e.dealer_id.as_str()), Some("N2"));
    assert_eq!(ranking.laggard().map(|e| e.dealer_id.as_str()), Some("N1"));
}

#[test]
fn equal_scores_keep_dealer_id_order() {
    let (dataset, _) = Dataset::new(
        vec![dealer("B", "West", "Launch"), dealer("A", "West", "Launch")],
        vec![record("B", date(1), 0.5, 10), record("A", date(1), 0.5, 10)],
        Vec::new(),
    );
    let latest = latest_per_dealer(dataset.kpi_records());
    let ranking = rank(&latest, &dataset, &RANKING_METRICS);

    let order: Vec<&str> = ranking.ranked.iter().map(|e| e.dealer_id.as_str()).collect();
    assert_eq!(order, vec!["A", "B"]);
}

#[test]
fn empty_snapshot_ranks_nobody() {
    let dataset = network();
    let latest = latest_per_dealer(std::iter::empty::<&KpiRecord>());
    let ranking = rank(&latest, &dataset, &RANKING_METRICS);
    assert!(ranking.ranked.is_empty());
    assert!(ranking.leader().is_none());
}
