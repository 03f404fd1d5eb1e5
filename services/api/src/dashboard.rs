use crate::infra::{load_dataset, parse_goal_override, parse_tolerance, resolve_data_dir, GoalOverride};
use clap::Args;
use dealer_kpi::analytics::{
    estimate_roi, ComplianceBand, FilterCriteria, GoalSet, RoiEstimate, RoiInputs,
};
use dealer_kpi::config::AppConfig;
use dealer_kpi::dataset::{KpiMetric, MetricUnit, ShopMetric};
use dealer_kpi::error::AppError;
use dealer_kpi::report::{DashboardInsights, DashboardReport, DashboardSummary};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

/// Dealer selection shared by the dashboard and what-if commands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FilterArgs {
    /// Region to include ("All" for every region)
    #[arg(long)]
    pub(crate) region: Option<String>,
    /// Journey stage to include ("All" for every stage)
    #[arg(long)]
    pub(crate) journey_stage: Option<String>,
    /// Latest compliance band: all, <70%, 70-85%, >=85%
    #[arg(long, default_value_t = ComplianceBand::All)]
    pub(crate) compliance_band: ComplianceBand,
    /// Restrict the view to a single dealer id
    #[arg(long)]
    pub(crate) dealer: Option<String>,
}

impl FilterArgs {
    pub(crate) fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            region: FilterCriteria::selection(self.region.clone()),
            journey_stage: FilterCriteria::selection(self.journey_stage.clone()),
            compliance_band: self.compliance_band,
            dealer_id: FilterCriteria::selection(self.dealer.clone()),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DashboardArgs {
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
    /// Override a goal, e.g. --goal total_wait_min=50 (repeatable)
    #[arg(long = "goal", value_parser = parse_goal_override)]
    pub(crate) goals: Vec<GoalOverride>,
    /// Fraction of goal still rated Amber (overrides KPI_AMBER_TOLERANCE)
    #[arg(long, value_parser = parse_tolerance)]
    pub(crate) amber_tolerance: Option<f64>,
    /// Directory holding the KPI CSV files (overrides KPI_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Number of ranked dealers to list
    #[arg(long, default_value_t = 10)]
    pub(crate) top: usize,
    /// Emit the dashboard as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct WhatIfArgs {
    /// Baseline conversion rate; defaults to the selection's maintenance penetration
    #[arg(long)]
    pub(crate) conversion_rate: Option<f64>,
    /// Expected conversion uplift in percentage points (0.05 = 5pp)
    #[arg(long, default_value_t = 0.05)]
    pub(crate) conversion_uplift: f64,
    /// Expected accessory PVR uplift ($)
    #[arg(long, default_value_t = 75.0)]
    pub(crate) pvr_uplift: f64,
    /// Gross per approved RO ($)
    #[arg(long, default_value_t = 120.0)]
    pub(crate) gross_per_ro: f64,
    #[arg(long, default_value_t = RoiInputs::DEFAULT_BASE_ROS)]
    pub(crate) base_ros: f64,
    #[arg(long, default_value_t = RoiInputs::DEFAULT_ACCESSORY_UNITS)]
    pub(crate) accessory_units: f64,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    #[arg(long)]
    pub(crate) json: bool,
}

/// Later `--goal` flags for the same metric win.
pub(crate) fn goal_set(overrides: &[GoalOverride]) -> GoalSet {
    let overrides: HashMap<_, _> = overrides
        .iter()
        .map(|entry| (entry.metric, entry.goal))
        .collect();
    GoalSet::with_overrides(&overrides)
}

pub(crate) fn run_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let data_dir = resolve_data_dir(&config, args.data_dir);
    let dataset = load_dataset(&data_dir)?;
    let tolerance = args
        .amber_tolerance
        .unwrap_or(config.scoring.amber_tolerance);

    let criteria = args.filters.criteria();
    let report =
        match DashboardReport::build(&dataset, &criteria, &goal_set(&args.goals), tolerance) {
            Ok(report) => report,
            Err(err) if err.is_no_data() => {
                println!("No data for the selected filters ({err}).");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

    let summary = report.summary();
    let insights = summary.insights();

    if args.json {
        let payload = json!({ "dashboard": summary, "insights": insights });
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Dashboard JSON unavailable: {err}"),
        }
        return Ok(());
    }

    for line in dashboard_lines(&summary, &insights, args.top) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_what_if(args: WhatIfArgs) -> Result<(), AppError> {
    let conversion_rate = match args.conversion_rate {
        Some(rate) => rate,
        None => {
            let config = AppConfig::load()?;
            let dataset = load_dataset(&resolve_data_dir(&config, args.data_dir.clone()))?;
            let report = match DashboardReport::build(
                &dataset,
                &args.filters.criteria(),
                &GoalSet::default(),
                config.scoring.amber_tolerance,
            ) {
                Ok(report) => report,
                Err(err) if err.is_no_data() => {
                    println!("No data for the selected filters ({err}); pass --conversion-rate.");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            match report.card(KpiMetric::MaintenancePenetration) {
                Some(card) => card.value,
                None => {
                    println!("Maintenance penetration unavailable; pass --conversion-rate.");
                    return Ok(());
                }
            }
        }
    };

    let inputs = RoiInputs {
        conversion_rate,
        conversion_uplift: args.conversion_uplift,
        pvr_uplift: args.pvr_uplift,
        gross_per_ro: args.gross_per_ro,
        base_ros: args.base_ros,
        accessory_units: args.accessory_units,
    };
    let estimate = estimate_roi(&inputs);

    if args.json {
        let payload = json!({ "inputs": inputs, "estimate": estimate });
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("What-if JSON unavailable: {err}"),
        }
        return Ok(());
    }

    for line in what_if_lines(&inputs, &estimate) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn dashboard_lines(
    summary: &DashboardSummary,
    insights: &DashboardInsights,
    top: usize,
) -> Vec<String> {
    let mut lines = vec![
        "Dealer service KPI dashboard".to_string(),
        format!(
            "As of {} | {} dealer(s) | outlook {} ({} green / {} amber / {} red)",
            summary.as_of,
            summary.dealers_selected,
            insights.outlook.label(),
            insights.green_cards,
            insights.amber_cards,
            insights.red_cards
        ),
        format!("Filters: {}", describe_filters(&summary.criteria)),
        String::new(),
        "KPI cards (weighted by express lane ROs)".to_string(),
    ];

    for card in &summary.cards {
        let change = card
            .change
            .map(|delta| format!(" | change {}", signed(card.unit, delta)))
            .unwrap_or_default();
        lines.push(format!(
            "- {}: {} (goal {}, gap {}, {}) [{}]{}",
            card.label,
            card.display_value,
            card.display_goal,
            signed(card.unit, card.gap),
            card.polarity.label().to_lowercase(),
            card.status_label,
            change
        ));
    }
    for metric in &summary.unavailable_metrics {
        lines.push(format!("- {}: no data", metric.label()));
    }

    lines.push(String::new());
    lines.push(format!(
        "Express lane RO volume ({} dates, growth {:+.1}%)",
        summary.ro_volume.len(),
        summary.ro_growth * 100.0
    ));
    for point in &summary.ro_volume {
        lines.push(format!("  {}  {:>8.0}", point.date, point.express_lane_ros));
    }

    if !summary.shop_series.is_empty() {
        lines.push(String::new());
        lines.push("Shop utilization (unweighted)".to_string());
        for point in &summary.shop_series {
            let utilization = point
                .values
                .get(&ShopMetric::Utilization)
                .copied()
                .flatten()
                .map(|value| format!("{:.1}%", value * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            let throughput = point
                .values
                .get(&ShopMetric::RoPerBayHour)
                .copied()
                .flatten()
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            lines.push(format!(
                "  {}  {} utilization | {} RO/bay-hour | {} dealer(s)",
                point.date, utilization, throughput, point.dealers_reporting
            ));
        }
    }

    lines.push(String::new());
    lines.push("Composite ranking".to_string());
    if summary.ranking.ranked.is_empty() {
        lines.push("  No dealer has a complete set of ranking KPIs".to_string());
    }
    for entry in summary.ranking.ranked.iter().take(top) {
        lines.push(format!(
            "  {:>2}. {} ({}, {} / {}) score {:.3}",
            entry.rank,
            entry.dealer_name,
            entry.dealer_id,
            entry.region,
            entry.journey_stage,
            entry.score
        ));
    }
    for excluded in &summary.ranking.excluded {
        lines.push(format!("  excluded {}: {}", excluded.dealer_id, excluded.reason));
    }

    if !insights.observations.is_empty() {
        lines.push(String::new());
        lines.push("Observations".to_string());
        lines.extend(insights.observations.iter().map(|note| format!("- {note}")));
    }
    if !insights.recommended_actions.is_empty() {
        lines.push(String::new());
        lines.push("Recommended actions".to_string());
        lines.extend(
            insights
                .recommended_actions
                .iter()
                .map(|action| format!("- {action}")),
        );
    }

    lines
}

pub(crate) fn what_if_lines(inputs: &RoiInputs, estimate: &RoiEstimate) -> Vec<String> {
    vec![
        "What-if ROI estimator".to_string(),
        format!(
            "Baseline conversion {:.1}% + {:.1}pp uplift on {:.0} ROs",
            inputs.conversion_rate * 100.0,
            inputs.conversion_uplift * 100.0,
            inputs.base_ros
        ),
        format!("- Incremental approved ROs: {:.0}", estimate.incremental_ros),
        format!(
            "- Incremental service gross: ${:.0}",
            estimate.incremental_gross_service
        ),
        format!(
            "- Incremental accessory gross: ${:.0} ({:.0} units x ${:.0})",
            estimate.incremental_gross_accessory, inputs.accessory_units, inputs.pvr_uplift
        ),
        format!(
            "- Total incremental gross: ${:.0}",
            estimate.total_incremental_gross
        ),
    ]
}

fn describe_filters(criteria: &FilterCriteria) -> String {
    format!(
        "region {} | stage {} | compliance {}{}",
        criteria.region.as_deref().unwrap_or("All"),
        criteria.journey_stage.as_deref().unwrap_or("All"),
        criteria.compliance_band.label(),
        criteria
            .dealer_id
            .as_deref()
            .map(|id| format!(" | dealer {id}"))
            .unwrap_or_default()
    )
}

fn signed(unit: MetricUnit, value: f64) -> String {
    match unit {
        MetricUnit::Fraction => format!("{:+.1} pts", value * 100.0),
        MetricUnit::Minutes => format!("{value:+.1} min"),
    }
}
