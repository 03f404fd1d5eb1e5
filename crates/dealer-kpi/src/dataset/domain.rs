use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction in which a KPI improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HigherIsBetter => "Higher is better",
            Self::LowerIsBetter => "Lower is better",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Fraction,
    Minutes,
}

/// The numeric KPI columns carried by every [`KpiRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiMetric {
    PartsLoyalty,
    AutoReplenishment,
    MaintenancePenetration,
    BulkOilPenetration,
    ServiceLaneUtilization,
    TimeInBayMaintMin,
    TimeInBayAdvMin,
    TotalWaitMin,
    RetentionRate,
    ComplianceScore,
}

impl KpiMetric {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::PartsLoyalty,
            Self::AutoReplenishment,
            Self::MaintenancePenetration,
            Self::BulkOilPenetration,
            Self::ServiceLaneUtilization,
            Self::TimeInBayMaintMin,
            Self::TimeInBayAdvMin,
            Self::TotalWaitMin,
            Self::RetentionRate,
            Self::ComplianceScore,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PartsLoyalty => "Parts Loyalty",
            Self::AutoReplenishment => "Auto Replenishment",
            Self::MaintenancePenetration => "Maintenance Penetration",
            Self::BulkOilPenetration => "Bulk Oil Penetration",
            Self::ServiceLaneUtilization => "Service Lane Utilization",
            Self::TimeInBayMaintMin => "Time in Bay (Maintenance)",
            Self::TimeInBayAdvMin => "Time in Bay (Advanced)",
            Self::TotalWaitMin => "Total Wait",
            Self::RetentionRate => "Retention Rate",
            Self::ComplianceScore => "Compliance Score",
        }
    }

    /// Column name used in the KPI series CSV.
    pub const fn column(self) -> &'static str {
        match self {
            Self::PartsLoyalty => "parts_loyalty",
            Self::AutoReplenishment => "auto_replenishment",
            Self::MaintenancePenetration => "maintenance_penetration",
            Self::BulkOilPenetration => "bulk_oil_penetration",
            Self::ServiceLaneUtilization => "service_lane_utilization",
            Self::TimeInBayMaintMin => "time_in_bay_maint_min",
            Self::TimeInBayAdvMin => "time_in_bay_adv_min",
            Self::TotalWaitMin => "total_wait_min",
            Self::RetentionRate => "retention_rate",
            Self::ComplianceScore => "compliance_score",
        }
    }

    pub const fn unit(self) -> MetricUnit {
        match self {
            Self::TimeInBayMaintMin | Self::TimeInBayAdvMin | Self::TotalWaitMin => {
                MetricUnit::Minutes
            }
            _ => MetricUnit::Fraction,
        }
    }

    pub const fn polarity(self) -> Polarity {
        match self.unit() {
            MetricUnit::Minutes => Polarity::LowerIsBetter,
            MetricUnit::Fraction => Polarity::HigherIsBetter,
        }
    }

    /// Renders a value in the metric's display unit.
    pub fn format_value(self, value: f64) -> String {
        match self.unit() {
            MetricUnit::Fraction => format!("{:.1}%", value * 100.0),
            MetricUnit::Minutes => format!("{value:.1} min"),
        }
    }
}

impl fmt::Display for KpiMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown KPI metric '{}'", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl FromStr for KpiMetric {
    type Err = UnknownMetric;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ordered()
            .into_iter()
            .find(|metric| metric.column() == needle)
            .ok_or_else(|| UnknownMetric(value.to_string()))
    }
}

/// Physical shop attributes owned 1:1 by a dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfile {
    pub bays_express: u32,
    pub bays_total: u32,
    pub hours_open_weekly: u32,
}

impl ShopProfile {
    pub fn express_bay_share(&self) -> Option<f64> {
        if self.bays_total == 0 {
            None
        } else {
            Some(self.bays_express as f64 / self.bays_total as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    pub dealer_id: String,
    pub dealer_name: String,
    pub region: String,
    pub state: String,
    pub journey_stage: String,
    pub shop: ShopProfile,
}

/// One dealer's KPI values on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub dealer_id: String,
    pub date: NaiveDate,
    pub parts_loyalty: Option<f64>,
    pub auto_replenishment: Option<f64>,
    pub maintenance_penetration: Option<f64>,
    pub bulk_oil_penetration: Option<f64>,
    pub service_lane_utilization: Option<f64>,
    pub time_in_bay_maint_min: Option<f64>,
    pub time_in_bay_adv_min: Option<f64>,
    pub total_wait_min: Option<f64>,
    pub retention_rate: Option<f64>,
    pub compliance_score: Option<f64>,
    pub express_lane_ros: u32,
}

impl KpiRecord {
    /// The metric value, or `None` when absent or not finite.
    pub fn value(&self, metric: KpiMetric) -> Option<f64> {
        let value = match metric {
            KpiMetric::PartsLoyalty => self.parts_loyalty,
            KpiMetric::AutoReplenishment => self.auto_replenishment,
            KpiMetric::MaintenancePenetration => self.maintenance_penetration,
            KpiMetric::BulkOilPenetration => self.bulk_oil_penetration,
            KpiMetric::ServiceLaneUtilization => self.service_lane_utilization,
            KpiMetric::TimeInBayMaintMin => self.time_in_bay_maint_min,
            KpiMetric::TimeInBayAdvMin => self.time_in_bay_adv_min,
            KpiMetric::TotalWaitMin => self.total_wait_min,
            KpiMetric::RetentionRate => self.retention_rate,
            KpiMetric::ComplianceScore => self.compliance_score,
        };
        value.filter(|value| value.is_finite())
    }

    pub fn weight(&self) -> f64 {
        self.express_lane_ros as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopMetric {
    Utilization,
    RoPerBayHour,
}

impl ShopMetric {
    pub const fn ordered() -> [Self; 2] {
        [Self::Utilization, Self::RoPerBayHour]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Utilization => "Bay Utilization",
            Self::RoPerBayHour => "ROs per Bay Hour",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopKpiRecord {
    pub dealer_id: String,
    pub date: NaiveDate,
    pub utilization: Option<f64>,
    pub ro_per_bay_hour: Option<f64>,
}

impl ShopKpiRecord {
    pub fn value(&self, metric: ShopMetric) -> Option<f64> {
        let value = match metric {
            ShopMetric::Utilization => self.utilization,
            ShopMetric::RoPerBayHour => self.ro_per_bay_hour,
        };
        value.filter(|value| value.is_finite())
    }
}
