//! Dealer service KPI analytics: CSV snapshot loading, activity-weighted
//! aggregation, goal classification, and composite dealer ranking.

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
pub mod report;
pub mod telemetry;
