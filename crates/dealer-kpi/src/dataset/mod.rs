//! Immutable KPI snapshot and the CSV loader that produces it.
//!
//! The snapshot is built once at start-up and then only read: every dashboard
//! pass filters and derives from it without mutating it.

pub mod domain;
mod parser;

use crate::analytics::KpiError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use domain::{
    Dealer, KpiMetric, KpiRecord, MetricUnit, Polarity, ShopKpiRecord, ShopMetric, ShopProfile,
};

pub const DEALERS_FILE: &str = "dealers.csv";
pub const KPI_SERIES_FILE: &str = "kpi_series.csv";
pub const SHOP_KPI_FILE: &str = "shop_kpi.csv";

#[derive(Debug)]
pub enum DatasetLoadError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    InvalidDate { table: &'static str, line: u64, value: String },
}

impl std::fmt::Display for DatasetLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetLoadError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            DatasetLoadError::Csv(err) => write!(f, "invalid KPI CSV data: {}", err),
            DatasetLoadError::InvalidDate { table, line, value } => write!(
                f,
                "{} line {}: '{}' is not a YYYY-MM-DD date",
                table, line, value
            ),
        }
    }
}

impl std::error::Error for DatasetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetLoadError::Io { source, .. } => Some(source),
            DatasetLoadError::Csv(err) => Some(err),
            DatasetLoadError::InvalidDate { .. } => None,
        }
    }
}

impl From<csv::Error> for DatasetLoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Counters reported after a load so operators can spot dirty inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub dealers: usize,
    pub kpi_records: usize,
    pub shop_records: usize,
    pub orphan_records: usize,
    pub duplicate_dealers: usize,
    pub out_of_range_fractions: usize,
}

/// Read-only snapshot of dealer metadata and KPI series.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    dealers: Vec<Dealer>,
    dealer_index: HashMap<String, usize>,
    kpi_records: Vec<KpiRecord>,
    shop_records: Vec<ShopKpiRecord>,
}

impl Dataset {
    /// Builds a snapshot, dropping duplicate dealers and orphan records.
    pub fn new(
        dealers: Vec<Dealer>,
        kpi_records: Vec<KpiRecord>,
        shop_records: Vec<ShopKpiRecord>,
    ) -> (Self, LoadSummary) {
        let mut summary = LoadSummary::default();
        let mut dealer_index = HashMap::new();
        let mut unique_dealers = Vec::with_capacity(dealers.len());

        for dealer in dealers {
            if dealer_index.contains_key(&dealer.dealer_id) {
                warn!(dealer_id = %dealer.dealer_id, "duplicate dealer row ignored");
                summary.duplicate_dealers += 1;
                continue;
            }
            dealer_index.insert(dealer.dealer_id.clone(), unique_dealers.len());
            unique_dealers.push(dealer);
        }

        let mut dataset = Self {
            dealers: unique_dealers,
            dealer_index,
            kpi_records: Vec::new(),
            shop_records: Vec::new(),
        };

        for record in kpi_records {
            if dataset.dealer(&record.dealer_id).is_err() {
                summary.orphan_records += 1;
                continue;
            }
            summary.out_of_range_fractions += out_of_range_fractions(&record);
            dataset.kpi_records.push(record);
        }

        for record in shop_records {
            if dataset.dealer(&record.dealer_id).is_err() {
                summary.orphan_records += 1;
                continue;
            }
            dataset.shop_records.push(record);
        }

        summary.dealers = dataset.dealers.len();
        summary.kpi_records = dataset.kpi_records.len();
        summary.shop_records = dataset.shop_records.len();

        if summary.orphan_records > 0 {
            warn!(
                orphans = summary.orphan_records,
                "dropped KPI rows referencing unknown dealers"
            );
        }
        if summary.out_of_range_fractions > 0 {
            warn!(
                cells = summary.out_of_range_fractions,
                "fraction KPI values outside [0, 1] kept as-is"
            );
        }

        (dataset, summary)
    }

    pub fn dealers(&self) -> &[Dealer] {
        &self.dealers
    }

    pub fn kpi_records(&self) -> &[KpiRecord] {
        &self.kpi_records
    }

    pub fn shop_records(&self) -> &[ShopKpiRecord] {
        &self.shop_records
    }

    pub fn dealer(&self, dealer_id: &str) -> Result<&Dealer, KpiError> {
        self.dealer_index
            .get(dealer_id)
            .map(|index| &self.dealers[*index])
            .ok_or_else(|| KpiError::UnknownDealerReference {
                dealer_id: dealer_id.to_string(),
            })
    }

    /// KPI records belonging to the given dealers, in load order.
    pub fn records_for<'a>(&'a self, dealers: &[&Dealer]) -> Vec<&'a KpiRecord> {
        let ids: HashSet<&str> = dealers.iter().map(|d| d.dealer_id.as_str()).collect();
        self.kpi_records
            .iter()
            .filter(|record| ids.contains(record.dealer_id.as_str()))
            .collect()
    }

    pub fn shop_records_for<'a>(&'a self, dealers: &[&Dealer]) -> Vec<&'a ShopKpiRecord> {
        let ids: HashSet<&str> = dealers.iter().map(|d| d.dealer_id.as_str()).collect();
        self.shop_records
            .iter()
            .filter(|record| ids.contains(record.dealer_id.as_str()))
            .collect()
    }

    pub fn regions(&self) -> Vec<String> {
        self.distinct(|dealer| &dealer.region)
    }

    pub fn journey_stages(&self) -> Vec<String> {
        self.distinct(|dealer| &dealer.journey_stage)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.kpi_records.iter().map(|r| r.date).min()?;
        let last = self.kpi_records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&Dealer) -> &String,
    {
        self.dealers
            .iter()
            .map(|dealer| field(dealer).clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn out_of_range_fractions(record: &KpiRecord) -> usize {
    KpiMetric::ordered()
        .into_iter()
        .filter(|metric| metric.unit() == MetricUnit::Fraction)
        .filter_map(|metric| record.value(metric))
        .filter(|value| !(0.0..=1.0).contains(value))
        .count()
}

pub struct DatasetLoader;

impl DatasetLoader {
    /// Loads `dealers.csv`, `kpi_series.csv` and, when present, `shop_kpi.csv`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<(Dataset, LoadSummary), DatasetLoadError> {
        let dir = dir.as_ref();
        let dealers = open(dir.join(DEALERS_FILE))?;
        let kpis = open(dir.join(KPI_SERIES_FILE))?;

        let shop_path = dir.join(SHOP_KPI_FILE);
        let shops = if shop_path.exists() {
            Some(open(shop_path)?)
        } else {
            None
        };

        let loaded = Self::from_readers(dealers, kpis, shops)?;
        info!(
            data_dir = %dir.display(),
            dealers = loaded.1.dealers,
            kpi_records = loaded.1.kpi_records,
            shop_records = loaded.1.shop_records,
            "KPI snapshot loaded"
        );
        Ok(loaded)
    }

    pub fn from_readers<D, K, S>(
        dealers: D,
        kpis: K,
        shops: Option<S>,
    ) -> Result<(Dataset, LoadSummary), DatasetLoadError>
    where
        D: Read,
        K: Read,
        S: Read,
    {
        let dealers = parser::parse_dealers(dealers)?;

        let mut kpi_records = Vec::new();
        for dated in parser::parse_kpi_rows(kpis)? {
            let date = resolve_date(KPI_SERIES_FILE, dated.line, &dated.raw_date)?;
            kpi_records.push(dated.row.into_record(date));
        }

        let mut shop_records = Vec::new();
        if let Some(shops) = shops {
            for dated in parser::parse_shop_rows(shops)? {
                let date = resolve_date(SHOP_KPI_FILE, dated.line, &dated.raw_date)?;
                shop_records.push(dated.row.into_record(date));
            }
        }

        Ok(Dataset::new(dealers, kpi_records, shop_records))
    }
}

fn open(path: PathBuf) -> Result<std::fs::File, DatasetLoadError> {
    std::fs::File::open(&path).map_err(|source| DatasetLoadError::Io { path, source })
}

fn resolve_date(table: &'static str, line: u64, raw: &str) -> Result<NaiveDate, DatasetLoadError> {
    parser::parse_date(raw).ok_or_else(|| DatasetLoadError::InvalidDate {
        table,
        line,
        value: raw.to_string(),
    })
}
