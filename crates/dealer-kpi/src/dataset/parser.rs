use super::domain::{Dealer, KpiRecord, ShopKpiRecord, ShopProfile};
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// A parsed row that still needs its date resolved.
#[derive(Debug)]
pub(crate) struct Dated<T> {
    pub(crate) raw_date: String,
    pub(crate) line: u64,
    pub(crate) row: T,
}

pub(crate) fn parse_dealers<R: Read>(reader: R) -> Result<Vec<Dealer>, csv::Error> {
    let mut csv_reader = csv_reader(reader);
    let mut dealers = Vec::new();

    for record in csv_reader.deserialize::<DealerRow>() {
        let row = record?;
        dealers.push(Dealer {
            dealer_id: row.dealer_id,
            dealer_name: row.dealer_name,
            region: row.region,
            state: row.state,
            journey_stage: row.journey_stage,
            shop: ShopProfile {
                bays_express: row.bays_express,
                bays_total: row.bays_total,
                hours_open_weekly: row.hours_open_weekly,
            },
        });
    }

    Ok(dealers)
}

pub(crate) fn parse_kpi_rows<R: Read>(reader: R) -> Result<Vec<Dated<KpiRow>>, csv::Error> {
    parse_dated(reader)
}

pub(crate) fn parse_shop_rows<R: Read>(reader: R) -> Result<Vec<Dated<ShopRow>>, csv::Error> {
    parse_dated(reader)
}

fn parse_dated<R, T>(reader: R) -> Result<Vec<Dated<T>>, csv::Error>
where
    R: Read,
    T: HasDate + DeserializeOwned,
{
    let mut csv_reader = csv_reader(reader);
    let mut rows = Vec::new();

    // Header is line 1.
    for (index, record) in csv_reader.deserialize::<T>().enumerate() {
        let row = record?;
        rows.push(Dated {
            raw_date: row.raw_date().to_string(),
            line: index as u64 + 2,
            row,
        });
    }

    Ok(rows)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub(crate) trait HasDate {
    fn raw_date(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct DealerRow {
    dealer_id: String,
    dealer_name: String,
    region: String,
    state: String,
    journey_stage: String,
    bays_express: u32,
    bays_total: u32,
    hours_open_weekly: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KpiRow {
    dealer_id: String,
    date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    parts_loyalty: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    auto_replenishment: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    maintenance_penetration: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bulk_oil_penetration: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    service_lane_utilization: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    time_in_bay_maint_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    time_in_bay_adv_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    total_wait_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    retention_rate: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    compliance_score: Option<f64>,
    express_lane_ros: u32,
}

impl HasDate for KpiRow {
    fn raw_date(&self) -> &str {
        &self.date
    }
}

impl KpiRow {
    pub(crate) fn into_record(self, date: NaiveDate) -> KpiRecord {
        KpiRecord {
            dealer_id: self.dealer_id,
            date,
            parts_loyalty: self.parts_loyalty,
            auto_replenishment: self.auto_replenishment,
            maintenance_penetration: self.maintenance_penetration,
            bulk_oil_penetration: self.bulk_oil_penetration,
            service_lane_utilization: self.service_lane_utilization,
            time_in_bay_maint_min: self.time_in_bay_maint_min,
            time_in_bay_adv_min: self.time_in_bay_adv_min,
            total_wait_min: self.total_wait_min,
            retention_rate: self.retention_rate,
            compliance_score: self.compliance_score,
            express_lane_ros: self.express_lane_ros,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShopRow {
    dealer_id: String,
    date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    utilization: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    ro_per_bay_hour: Option<f64>,
}

impl HasDate for ShopRow {
    fn raw_date(&self) -> &str {
        &self.date
    }
}

impl ShopRow {
    pub(crate) fn into_record(self, date: NaiveDate) -> ShopKpiRecord {
        ShopKpiRecord {
            dealer_id: self.dealer_id,
            date,
            utilization: self.utilization,
            ro_per_bay_hour: self.ro_per_bay_hour,
        }
    }
}

/// Spreadsheet exports write these for an absent value.
const NULL_TOKENS: [&str; 6] = ["na", "n/a", "#n/a", "nan", "null", "none"];

fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS
        .iter()
        .any(|token| raw.eq_ignore_ascii_case(token))
}

/// Blank cells and null tokens are missing metrics, as are NaN and infinities.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if is_null_token(raw) => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(|value| value.is_finite().then_some(value))
            .map_err(serde::de::Error::custom),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp truncated to its day.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    None
}
