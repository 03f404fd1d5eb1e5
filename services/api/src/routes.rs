use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use dealer_kpi::analytics::{
    estimate_roi, ComplianceBand, FilterCriteria, GoalSet, RoiEstimate, RoiInputs,
};
use dealer_kpi::dataset::KpiMetric;
use dealer_kpi::error::AppError;
use dealer_kpi::report::{DashboardInsights, DashboardReport, DashboardSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardRequest {
    #[serde(default)]
    pub(crate) filters: FilterCriteria,
    /// Per-request goal overrides keyed by metric column name.
    #[serde(default)]
    pub(crate) goals: HashMap<KpiMetric, f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    #[serde(flatten)]
    pub(crate) summary: DashboardSummary,
    pub(crate) insights: DashboardInsights,
}

#[derive(Debug, Serialize)]
pub(crate) struct BandOption {
    pub(crate) band: ComplianceBand,
    pub(crate) label: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DealerOption {
    pub(crate) dealer_id: String,
    pub(crate) dealer_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct FilterOptions {
    pub(crate) regions: Vec<String>,
    pub(crate) journey_stages: Vec<String>,
    pub(crate) compliance_bands: Vec<BandOption>,
    pub(crate) dealers: Vec<DealerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) first_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) last_date: Option<NaiveDate>,
    pub(crate) goals: GoalSet,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/kpi/filters", get(filters_endpoint))
        .route("/api/v1/kpi/dashboard", post(dashboard_endpoint))
        .route("/api/v1/kpi/what-if", post(what_if_endpoint))
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn filters_endpoint(State(state): State<AppState>) -> Json<FilterOptions> {
    let dataset = &state.dataset;
    let (first_date, last_date) = dataset.date_range().unzip();

    Json(FilterOptions {
        regions: dataset.regions(),
        journey_stages: dataset.journey_stages(),
        compliance_bands: ComplianceBand::ordered()
            .into_iter()
            .map(|band| BandOption {
                band,
                label: band.label(),
            })
            .collect(),
        dealers: dataset
            .dealers()
            .iter()
            .map(|dealer| DealerOption {
                dealer_id: dealer.dealer_id.clone(),
                dealer_name: dealer.dealer_name.clone(),
            })
            .collect(),
        first_date,
        last_date,
        goals: GoalSet::default(),
    })
}

pub(crate) async fn dashboard_endpoint(
    State(state): State<AppState>,
    Json(request): Json<DashboardRequest>,
) -> Result<Json<DashboardResponse>, AppError> {
    let goals = GoalSet::with_overrides(&request.goals);
    let report = DashboardReport::build(
        &state.dataset,
        &request.filters,
        &goals,
        state.scoring.amber_tolerance,
    )?;
    let summary = report.summary();
    let insights = summary.insights();

    Ok(Json(DashboardResponse { summary, insights }))
}

pub(crate) async fn what_if_endpoint(Json(inputs): Json<RoiInputs>) -> Json<RoiEstimate> {
    Json(estimate_roi(&inputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dealer_kpi::config::ScoringConfig;
    use dealer_kpi::dataset::Dataset;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn sample_dataset() -> Arc<Dataset> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../crates/dealer-kpi/data");
        crate::infra::load_dataset(&dir).expect("sample data loads")
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            dataset: sample_dataset(),
            scoring: ScoringConfig::default(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn dashboard_endpoint_returns_cards_and_insights() {
        let request = DashboardRequest {
            filters: FilterCriteria {
                region: Some("Midwest".into()),
                ..FilterCriteria::default()
            },
            goals: HashMap::from([(KpiMetric::TotalWaitMin, 45.0)]),
        };

        let Json(body) = dashboard_endpoint(State(state(true)), Json(request))
            .await
            .expect("dashboard builds");

        assert_eq!(body.summary.dealers_selected, 3);
        assert_eq!(body.summary.cards.len(), KpiMetric::ordered().len());
        let wait = body
            .summary
            .cards
            .iter()
            .find(|card| card.metric == KpiMetric::TotalWaitMin)
            .expect("wait card");
        assert_eq!(wait.goal, 45.0);
        assert!(body.insights.red_cards >= 1);
    }

    #[tokio::test]
    async fn empty_filter_maps_to_not_found() {
        let app = router(state(true));
        let response = app
            .oneshot(post_json(
                "/api/v1/kpi/dashboard",
                json!({ "filters": { "region": "Atlantis" } }),
            ))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "no KPI data for the current filter");
    }

    #[tokio::test]
    async fn dashboard_route_accepts_all_sentinels() {
        let app = router(state(true));
        let response = app
            .oneshot(post_json(
                "/api/v1/kpi/dashboard",
                json!({
                    "filters": { "region": "All", "journey_stage": "All", "compliance_band": "all" },
                    "goals": { "compliance_score": 0.8 }
                }),
            ))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["dealers_selected"], 6);
        assert_eq!(body["ranking"]["ranked"][0]["dealer_id"], "D002");
        assert_eq!(body["ranking"]["excluded"][0]["dealer_id"], "D006");
        assert!(body["insights"]["observations"].is_array());
    }

    #[tokio::test]
    async fn filters_route_lists_options() {
        let app = router(state(true));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/kpi/filters")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["regions"], json!(["Midwest", "South", "Southwest"]));
        assert_eq!(body["compliance_bands"][1]["label"], "<70%");
        assert_eq!(body["dealers"].as_array().map(Vec::len), Some(6));
        assert_eq!(body["last_date"], "2025-05-05");
        assert_eq!(body["goals"]["total_wait_min"], 60.0);
    }

    #[tokio::test]
    async fn what_if_route_estimates_gross() {
        let app = router(state(true));
        let response = app
            .oneshot(post_json(
                "/api/v1/kpi/what-if",
                json!({
                    "conversion_rate": 0.7,
                    "conversion_uplift": 0.05,
                    "pvr_uplift": 75.0,
                    "gross_per_ro": 120.0
                }),
            ))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let total = body["total_incremental_gross"].as_f64().expect("number");
        assert!((total - 21_000.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = router(state(false))
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
