use crate::infra::{AppState, InMemoryDecisionLog, InMemoryReadingStore};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use garden::decision::{DecisionRepository, DecisionServiceError};
use garden::error::AppError;
use garden::readings::{
    AdcPayload, ClimatePayload, Reading, ReadingImportError, SensorType,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_HISTORY: usize = 20;
const MAX_HISTORY: usize = 500;

/// Shared handles the garden endpoints read from and write into.
#[derive(Clone)]
pub(crate) struct GardenApi {
    pub(crate) store: InMemoryReadingStore,
    pub(crate) decisions: Arc<InMemoryDecisionLog>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IngestRequest {
    pub(crate) readings: Vec<Reading>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) fn garden_routes(api: GardenApi) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/readings", post(ingest_readings))
        .route("/api/v1/decisions", get(decision_history))
        .route("/api/v1/decisions/latest", get(latest_decision))
        .with_state(api)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
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

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Accept a batch of readings. The whole batch is rejected if any payload does
/// not match its sensor type.
pub(crate) async fn ingest_readings(
    State(api): State<GardenApi>,
    Json(request): Json<IngestRequest>,
) -> Result<Response, AppError> {
    for (index, reading) in request.readings.iter().enumerate() {
        check_payload(index + 1, reading)?;
    }

    let accepted = api.store.insert(request.readings)?;
    debug!(accepted, "readings ingested");
    Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": accepted }))).into_response())
}

fn check_payload(row: usize, reading: &Reading) -> Result<(), ReadingImportError> {
    let parsed = match reading.sensor_type {
        SensorType::Climate => reading.parse::<ClimatePayload>().map(|_| ()),
        SensorType::SoilMoisture | SensorType::Light => reading.parse::<AdcPayload>().map(|_| ()),
    };

    parsed.map_err(|err| ReadingImportError::Payload {
        row,
        detail: format!("{} reading from {}: {err}", reading.sensor_type, reading.sensor_id),
    })
}

pub(crate) async fn latest_decision(State(api): State<GardenApi>) -> Result<Response, AppError> {
    let latest = api
        .decisions
        .latest()
        .map_err(DecisionServiceError::from)?;

    Ok(match latest {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no decision recorded yet" })),
        )
            .into_response(),
    })
}

pub(crate) async fn decision_history(
    State(api): State<GardenApi>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).min(MAX_HISTORY);
    let records = api
        .decisions
        .recent(limit)
        .map_err(DecisionServiceError::from)?;

    Ok((StatusCode::OK, Json(records)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use garden::decision::{Decision, DecisionOutcome};
    use garden::state::DerivedStateSnapshot;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> (Router, GardenApi) {
        let api = GardenApi {
            store: InMemoryReadingStore::default(),
            decisions: Arc::new(InMemoryDecisionLog::default()),
        };
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = garden_routes(api.clone()).layer(Extension(state));
        (router, api)
    }

    fn record_decision(api: &GardenApi, outcome: DecisionOutcome) {
        let created = Utc
            .with_ymd_and_hms(2026, 3, 14, 6, 0, 0)
            .single()
            .expect("valid timestamp");
        let decision = Decision {
            outcome,
            confidence: 0.0,
            policy_version: "2026.03-greenhouse".to_string(),
            created,
            reasons: Vec::new(),
        };
        api.decisions
            .save(decision, DerivedStateSnapshot::empty(created))
            .expect("save succeeds");
    }

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn readiness_reflects_startup() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let (router, _) = app(true);
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ingest_stores_valid_batch() {
        let (router, api) = app(true);
        let body = json!({
            "readings": [
                {
                    "created": "2026-03-14T06:00:00Z",
                    "sensor_type": "light",
                    "sensor_id": "ldr-1",
                    "payload": { "raw_adc": 3440 }
                },
                {
                    "created": "2026-03-14T06:01:00Z",
                    "sensor_type": "climate",
                    "sensor_id": "sht31-a",
                    "payload": { "temp": 22.5, "humidity": 58.0 }
                }
            ]
        });

        let response = router
            .oneshot(post_json("/api/v1/readings", body))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(read_json_body(response).await["accepted"], 2);
        let latest = garden::readings::ReadingStore::fetch_latest(
            &api.store,
            SensorType::Climate,
            "sht31-a",
        )
        .expect("fetch")
        .expect("stored");
        assert_eq!(latest.sensor_id, "sht31-a");
    }

    #[tokio::test]
    async fn ingest_rejects_mismatched_payload() {
        let (router, api) = app(true);
        let body = json!({
            "readings": [
                {
                    "created": "2026-03-14T06:00:00Z",
                    "sensor_type": "soil_moisture",
                    "sensor_id": "cap-1",
                    "payload": { "temp_c": 22.5 }
                }
            ]
        });

        let response = router
            .oneshot(post_json("/api/v1/readings", body))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = read_json_body(response).await;
        assert!(payload["error"]
            .as_str()
            .expect("error message")
            .contains("row 1"));
        assert!(garden::readings::ReadingStore::fetch_latest(
            &api.store,
            SensorType::SoilMoisture,
            "cap-1"
        )
        .expect("fetch")
        .is_none());
    }

    #[tokio::test]
    async fn latest_decision_is_404_until_first_cycle() {
        let (router, api) = app(true);
        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/decisions/latest")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        record_decision(&api, DecisionOutcome::Alert);
        let response = router
            .oneshot(
                Request::get("/api/v1/decisions/latest")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["id"], "dec-000001");
        assert_eq!(payload["decision"]["outcome"], "alert");
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let (router, api) = app(true);
        record_decision(&api, DecisionOutcome::NoAction);
        record_decision(&api, DecisionOutcome::Escalate);
        record_decision(&api, DecisionOutcome::NoAction);

        let response = router
            .oneshot(
                Request::get("/api/v1/decisions?limit=2")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        let ids: Vec<&str> = payload
            .as_array()
            .expect("array body")
            .iter()
            .filter_map(|record| record["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["dec-000003", "dec-000002"]);
    }
}
