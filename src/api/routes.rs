use axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::contract::ContractRegistry;
use crate::domain::ConsensusEnv;
use crate::fee::{FeeInputs, FeeSchedule};
use crate::observability::{MetricsRegistry, TimingGuard};
use crate::validation::Validator;

use super::request::{FeeRequest, ValidateRequest};
use super::response::{
    ErrorResponse, FeeResponse, HealthResponse, ReadyResponse, ValidateResponse,
};

/// Shared application state.
pub struct AppState {
    /// Current contract registry (updated via watch channel)
    pub registry_rx: watch::Receiver<Arc<ContractRegistry>>,

    /// Condition evaluator shared by all requests
    pub validator: Validator,

    /// Fee rates
    pub fee_schedule: FeeSchedule,

    pub metrics: Arc<MetricsRegistry>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Latency budget in milliseconds
    pub latency_budget_ms: u64,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Maximum requests served at once
    pub max_concurrency: usize,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(HandleErrorLayer::new(|_: BoxError| async {
            StatusCode::REQUEST_TIMEOUT
        }))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(ConcurrencyLimitLayer::new(state.max_concurrency));

    Router::new()
        .route("/v1/conditions/validate", post(handle_validate))
        .route("/v1/fee", post(handle_fee))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(middleware)
        .with_state(state)
}

/// Evaluate a contract's condition block for one event.
async fn handle_validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Response {
    let _timer = TimingGuard::new(&state.metrics);
    let start = Instant::now();

    let registry = state.registry_rx.borrow().clone();

    let Some(contract) = registry.get(&req.contract) else {
        debug!(contract = %req.contract, "Unknown contract");
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(format!(
                "no contract registered at {}",
                req.contract
            ))),
        )
            .into_response();
    };

    let event = match req.event() {
        Ok(event) => event,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(e.to_string())),
            )
                .into_response();
        }
    };

    let env = ConsensusEnv::new(req.consensus_timestamp(&event), &req.chain);
    let detail = state.validator.validate(&contract, &event, &env);
    state.metrics.record_validation(&detail);

    let elapsed = start.elapsed();
    if elapsed.as_millis() > state.latency_budget_ms as u128 {
        warn!(
            contract = %contract.address(),
            latency_ms = elapsed.as_millis(),
            budget_ms = state.latency_budget_ms,
            "Validation latency exceeded budget"
        );
    }

    info!(
        contract = %contract.address(),
        kind = %detail.kind,
        verdict = %detail.verdict,
        latency_us = elapsed.as_micros(),
        "Validation completed"
    );

    (
        StatusCode::OK,
        Json(ValidateResponse::new(
            contract.address().to_hex(),
            registry.version().to_string(),
            detail,
        )),
    )
        .into_response()
}

/// Price a transaction.
async fn handle_fee(State(state): State<Arc<AppState>>, Json(req): Json<FeeRequest>) -> Response {
    let _timer = TimingGuard::new(&state.metrics);

    let result = FeeInputs::from_transaction(&req.transaction, req.replicas).and_then(|inputs| {
        state
            .fee_schedule
            .compute(&inputs, req.price)
            .map(|breakdown| (inputs, breakdown))
    });

    match result {
        Ok((inputs, breakdown)) => {
            state.metrics.record_fee(true);
            info!(
                tx_type = %inputs.tx_type,
                fee = %breakdown.total,
                "Fee computed"
            );
            (StatusCode::OK, Json(FeeResponse::new(inputs, breakdown))).into_response()
        }
        Err(e) => {
            state.metrics.record_fee(false);
            debug!(error = %e, "Fee request rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.registry_rx.borrow();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        registry_version: registry.version().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    let registry = state.registry_rx.borrow();

    if registry.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("No contracts loaded", "NOT_READY")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            registry_version: registry.version().to_string(),
            contracts: registry.len(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let contracts = state.registry_rx.borrow().len();
    let metrics = state
        .metrics
        .to_prometheus(state.start_time.elapsed().as_secs(), contracts);

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}
