use super::snapshot::latest_per_dealer;
use crate::dataset::{Dealer, KpiMetric, KpiRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Latest-compliance bands offered by the dashboard filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceBand {
    #[default]
    All,
    Below70,
    Between70And85,
    At85OrAbove,
}

impl ComplianceBand {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::All,
            Self::Below70,
            Self::Between70And85,
            Self::At85OrAbove,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Below70 => "<70%",
            Self::Between70And85 => "70-85%",
            Self::At85OrAbove => ">=85%",
        }
    }

    /// Half-open membership test; a dealer without a score only matches `All`.
    pub fn contains(self, score: Option<f64>) -> bool {
        match (self, score) {
            (Self::All, _) => true,
            (_, None) => false,
            (Self::Below70, Some(score)) => score < 0.70,
            (Self::Between70And85, Some(score)) => (0.70..0.85).contains(&score),
            (Self::At85OrAbove, Some(score)) => score >= 0.85,
        }
    }
}

impl fmt::Display for ComplianceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComplianceBand(pub String);

impl fmt::Display for UnknownComplianceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown compliance band '{}' (expected all, below70, between70and85, at85orabove)",
            self.0
        )
    }
}

impl std::error::Error for UnknownComplianceBand {}

impl FromStr for ComplianceBand {
    type Err = UnknownComplianceBand;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();

        match normalized.as_str() {
            "all" => Ok(Self::All),
            "below70" | "<70%" | "<70" => Ok(Self::Below70),
            "between70and85" | "7085%" | "7085" => Ok(Self::Between70And85),
            "at85orabove" | ">=85%" | ">=85" | "≥85%" => Ok(Self::At85OrAbove),
            _ => Err(UnknownComplianceBand(value.to_string())),
        }
    }
}

/// Dashboard filter selections. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, deserialize_with = "all_as_none")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "all_as_none")]
    pub journey_stage: Option<String>,
    #[serde(default)]
    pub compliance_band: ComplianceBand,
    /// Narrows the view to a single dealer.
    #[serde(default, deserialize_with = "all_as_none")]
    pub dealer_id: Option<String>,
}

impl FilterCriteria {
    /// Treats a missing, blank, or literal "All" selection as no filter.
    pub fn selection(value: Option<String>) -> Option<String> {
        value
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("all"))
    }

    pub fn matches(&self, dealer: &Dealer, latest_compliance: Option<f64>) -> bool {
        self.region
            .as_deref()
            .map_or(true, |region| dealer.region == region)
            && self
                .journey_stage
                .as_deref()
                .map_or(true, |stage| dealer.journey_stage == stage)
            && self
                .dealer_id
                .as_deref()
                .map_or(true, |id| dealer.dealer_id == id)
            && self.compliance_band.contains(latest_compliance)
    }
}

fn all_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(FilterCriteria::selection(opt))
}

/// Maps each dealer to the compliance score on its most recent record.
///
/// A dealer whose latest record has no compliance value maps to `None`.
pub fn latest_compliance_by_dealer<'a, I>(records: I) -> HashMap<String, Option<f64>>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    latest_per_dealer(records)
        .into_iter()
        .map(|(dealer_id, record)| {
            (
                dealer_id.to_string(),
                record.value(KpiMetric::ComplianceScore),
            )
        })
        .collect()
}

/// Dealers passing every criterion, in their original order.
pub fn filter_dealers<'a>(
    dealers: &'a [Dealer],
    latest_compliance: &HashMap<String, Option<f64>>,
    criteria: &FilterCriteria,
) -> Vec<&'a Dealer> {
    dealers
        .iter()
        .filter(|dealer| {
            let score = latest_compliance
                .get(&dealer.dealer_id)
                .copied()
                .flatten();
            criteria.matches(dealer, score)
        })
        .collect()
}
