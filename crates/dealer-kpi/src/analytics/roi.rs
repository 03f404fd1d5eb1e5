use serde::{Deserialize, Serialize};

/// What-if assumptions for the incremental gross estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiInputs {
    /// Baseline share of repair orders approved, in [0, 1].
    pub conversion_rate: f64,
    /// Expected conversion uplift in percentage points (0.05 = 5pp).
    pub conversion_uplift: f64,
    /// Expected accessory revenue uplift per vehicle.
    pub pvr_uplift: f64,
    pub gross_per_ro: f64,
    #[serde(default = "default_base_ros")]
    pub base_ros: f64,
    #[serde(default = "default_accessory_units")]
    pub accessory_units: f64,
}

impl RoiInputs {
    pub const DEFAULT_BASE_ROS: f64 = 1000.0;
    pub const DEFAULT_ACCESSORY_UNITS: f64 = 200.0;

    pub fn new(
        conversion_rate: f64,
        conversion_uplift: f64,
        pvr_uplift: f64,
        gross_per_ro: f64,
    ) -> Self {
        Self {
            conversion_rate,
            conversion_uplift,
            pvr_uplift,
            gross_per_ro,
            base_ros: Self::DEFAULT_BASE_ROS,
            accessory_units: Self::DEFAULT_ACCESSORY_UNITS,
        }
    }
}

fn default_base_ros() -> f64 {
    RoiInputs::DEFAULT_BASE_ROS
}

fn default_accessory_units() -> f64 {
    RoiInputs::DEFAULT_ACCESSORY_UNITS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiEstimate {
    pub approved_ros: f64,
    pub incremental_ros: f64,
    pub incremental_gross_service: f64,
    pub incremental_gross_accessory: f64,
    pub total_incremental_gross: f64,
}

pub fn estimate_roi(inputs: &RoiInputs) -> RoiEstimate {
    let approved_ros = inputs.conversion_rate * inputs.base_ros;
    let incremental_ros =
        (inputs.conversion_rate + inputs.conversion_uplift) * inputs.base_ros - approved_ros;
    let incremental_gross_service = incremental_ros * inputs.gross_per_ro;
    let incremental_gross_accessory = inputs.pvr_uplift * inputs.accessory_units;

    RoiEstimate {
        approved_ros,
        incremental_ros,
        incremental_gross_service,
        incremental_gross_accessory,
        total_incremental_gross: incremental_gross_service + incremental_gross_accessory,
    }
}
