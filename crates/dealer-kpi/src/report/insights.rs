use super::views::{DashboardInsights, DashboardSummary, KpiCardView, NetworkOutlook};
use crate::analytics::{RagStatus, GROWTH_WINDOW};
use crate::dataset::{KpiMetric, MetricUnit, Polarity};

/// Growth beyond this magnitude is called out as a trend.
const GROWTH_NOTICE: f64 = 0.05;

pub(crate) fn generate_insights(summary: &DashboardSummary) -> DashboardInsights {
    let count = |status: RagStatus| {
        summary
            .cards
            .iter()
            .filter(|card| card.status == status)
            .count()
    };
    let green_cards = count(RagStatus::Green);
    let amber_cards = count(RagStatus::Amber);
    let red_cards = count(RagStatus::Red);

    let outlook = if red_cards == 0 && amber_cards <= 2 {
        NetworkOutlook::Healthy
    } else if red_cards <= 2 {
        NetworkOutlook::Watch
    } else {
        NetworkOutlook::Critical
    };

    let mut red: Vec<&KpiCardView> = summary
        .cards
        .iter()
        .filter(|card| card.status == RagStatus::Red)
        .collect();
    red.sort_by(|a, b| shortfall(b).total_cmp(&shortfall(a)));
    let focus_metrics: Vec<&'static str> = red.iter().take(3).map(|card| card.label).collect();

    let mut observations = vec![format!(
        "{green_cards} of {} KPIs at goal across {} dealer{} as of {}",
        summary.cards.len(),
        summary.dealers_selected,
        if summary.dealers_selected == 1 { "" } else { "s" },
        summary.as_of
    )];

    if summary.ro_volume.len() < GROWTH_WINDOW * 2 {
        observations.push(format!(
            "Only {} reporting date(s); RO growth needs at least {}",
            summary.ro_volume.len(),
            GROWTH_WINDOW * 2
        ));
    } else if summary.ro_growth >= GROWTH_NOTICE {
        observations.push(format!(
            "Express lane RO volume up {:.0}% in the last {GROWTH_WINDOW} periods versus the first {GROWTH_WINDOW}",
            summary.ro_growth * 100.0
        ));
    } else if summary.ro_growth <= -GROWTH_NOTICE {
        observations.push(format!(
            "Express lane RO volume down {:.0}% in the last {GROWTH_WINDOW} periods versus the first {GROWTH_WINDOW}",
            summary.ro_growth.abs() * 100.0
        ));
    } else {
        observations.push("Express lane RO volume is flat across the period".to_string());
    }

    if let Some(card) = red.first() {
        observations.push(format!(
            "{} is furthest from goal at {} against {}",
            card.label, card.display_value, card.display_goal
        ));
    }

    for card in &summary.cards {
        if let Some(change) = card.change {
            if card.status != RagStatus::Green && slipping(card.polarity, change) {
                observations.push(format!(
                    "{} slipped since the previous period ({})",
                    card.label,
                    describe_change(card.metric, change)
                ));
            }
        }
    }

    if summary.ranking.ranked.len() > 1 {
        if let (Some(leader), Some(laggard)) =
            (summary.ranking.leader(), summary.ranking.laggard())
        {
            observations.push(format!(
                "{} leads the composite ranking ({:.2}); {} trails ({:.2})",
                leader.dealer_name, leader.score, laggard.dealer_name, laggard.score
            ));
        }
    }

    if !summary.ranking.excluded.is_empty() {
        observations.push(format!(
            "{} dealer(s) left out of the ranking for incomplete KPI data",
            summary.ranking.excluded.len()
        ));
    }

    if !summary.unavailable_metrics.is_empty() {
        let names: Vec<&str> = summary
            .unavailable_metrics
            .iter()
            .map(|metric| metric.label())
            .collect();
        observations.push(format!("No weighted data for {}", names.join(", ")));
    }

    let mut recommended_actions: Vec<String> = red
        .iter()
        .take(3)
        .map(|card| action_for(card.metric).to_string())
        .collect();

    if amber_cards > 0 && red_cards == 0 {
        recommended_actions
            .push("Hold weekly reviews on amber KPIs before they slip to red".to_string());
    }

    if let Some(laggard) = summary.ranking.laggard() {
        if summary.ranking.ranked.len() > 1 && red_cards > 0 {
            recommended_actions.push(format!(
                "Schedule a performance visit with {} ({})",
                laggard.dealer_name, laggard.region
            ));
        }
    }

    DashboardInsights {
        outlook,
        green_cards,
        amber_cards,
        red_cards,
        focus_metrics,
        observations,
        recommended_actions,
    }
}

fn shortfall(card: &KpiCardView) -> f64 {
    let shortfall = match card.polarity {
        Polarity::HigherIsBetter => -card.gap,
        Polarity::LowerIsBetter => card.gap,
    };
    if card.goal.abs() > f64::EPSILON {
        shortfall / card.goal.abs()
    } else {
        shortfall
    }
}

fn slipping(polarity: Polarity, change: f64) -> bool {
    match polarity {
        Polarity::HigherIsBetter => change < 0.0,
        Polarity::LowerIsBetter => change > 0.0,
    }
}

fn describe_change(metric: KpiMetric, change: f64) -> String {
    match metric.unit() {
        MetricUnit::Fraction => format!("{:+.1} pts", change * 100.0),
        MetricUnit::Minutes => format!("{change:+.1} min"),
    }
}

fn action_for(metric: KpiMetric) -> &'static str {
    match metric {
        KpiMetric::PartsLoyalty => "Review parts sourcing and steer counter sales back to OEM parts",
        KpiMetric::AutoReplenishment => "Enable automatic stock replenishment for fast-moving parts",
        KpiMetric::MaintenancePenetration => {
            "Coach advisors on presenting scheduled maintenance at write-up"
        }
        KpiMetric::BulkOilPenetration => "Move express lane oil changes onto bulk oil dispensing",
        KpiMetric::ServiceLaneUtilization => {
            "Route more quick-service work through the express lane"
        }
        KpiMetric::TimeInBayMaintMin => "Stage parts before maintenance jobs reach the bay",
        KpiMetric::TimeInBayAdvMin => "Pre-approve common advanced repairs to cut bay dwell",
        KpiMetric::TotalWaitMin => "Add express appointment slots at peak drop-off hours",
        KpiMetric::RetentionRate => "Launch a service reminder campaign for lapsed customers",
        KpiMetric::ComplianceScore => "Walk the express lane standards checklist with the dealer",
    }
}
