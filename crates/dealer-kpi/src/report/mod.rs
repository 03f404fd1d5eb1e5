mod insights;
mod summary;
pub mod views;


pub use summary::{DashboardReport, KpiCard};
pub use views::{DashboardInsights, DashboardSummary, KpiCardView, NetworkOutlook, VolumePoint};

pub(crate) use insights::generate_insights;
