use crate::dataset::{Dataset, Dealer, KpiRecord, ShopKpiRecord, ShopProfile};
use chrono::NaiveDate;

pub(crate) fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).expect("valid January date")
}

pub(crate) fn dealer(id: &str, region: &str, journey_stage: &str) -> Dealer {
    Dealer {
        dealer_id: id.to_string(),
        dealer_name: format!("{id} Motors"),
        region: region.to_string(),
        state: "IA".to_string(),
        journey_stage: journey_stage.to_string(),
        shop: ShopProfile {
            bays_express: 2,
            bays_total: 10,
            hours_open_weekly: 60,
        },
    }
}

/// A record carrying `value` in every KPI column.
pub(crate) fn record(dealer_id: &str, date: NaiveDate, value: f64, ros: u32) -> KpiRecord {
    KpiRecord {
        dealer_id: dealer_id.to_string(),
        date,
        parts_loyalty: Some(value),
        auto_replenishment: Some(value),
        maintenance_penetration: Some(value),
        bulk_oil_penetration: Some(value),
        service_lane_utilization: Some(value),
        time_in_bay_maint_min: Some(value),
        time_in_bay_adv_min: Some(value),
        total_wait_min: Some(value),
        retention_rate: Some(value),
        compliance_score: Some(value),
        express_lane_ros: ros,
    }
}

/// A realistic record: fractions from `quality`, durations shrinking as it improves.
pub(crate) fn graded_record(dealer_id: &str, date: NaiveDate, quality: f64, ros: u32) -> KpiRecord {
    KpiRecord {
        time_in_bay_maint_min: Some(60.0 - 20.0 * quality),
        time_in_bay_adv_min: Some(120.0 - 30.0 * quality),
        total_wait_min: Some(80.0 - 30.0 * quality),
        ..record(dealer_id, date, quality, ros)
    }
}

pub(crate) fn shop_record(
    dealer_id: &str,
    date: NaiveDate,
    utilization: Option<f64>,
    ro_per_bay_hour: Option<f64>,
) -> ShopKpiRecord {
    ShopKpiRecord {
        dealer_id: dealer_id.to_string(),
        date,
        utilization,
        ro_per_bay_hour,
    }
}

/// Three dealers across two regions with two weeks of graded history.
///
/// Latest week: N1 quality 0.9 / 300 ROs, N2 quality 0.6 / 100 ROs,
/// S1 quality 0.75 / 200 ROs.
pub(crate) fn network() -> Dataset {
    let dealers = vec![
        dealer("N1", "North", "Launch"),
        dealer("N2", "North", "Accelerate"),
        dealer("S1", "South", "Launch"),
    ];
    let records = vec![
        graded_record("N1", date(6), 0.85, 280),
        graded_record("N2", date(6), 0.55, 90),
        graded_record("S1", date(6), 0.70, 150),
        graded_record("N1", date(13), 0.90, 300),
        graded_record("N2", date(13), 0.60, 100),
        graded_record("S1", date(13), 0.75, 200),
    ];
    let shops = vec![
        shop_record("N1", date(13), Some(0.80), Some(1.5)),
        shop_record("S1", date(13), Some(0.60), None),
    ];

    Dataset::new(dealers, records, shops).0
}
