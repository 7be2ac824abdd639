use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::MemberId;
use super::repository::DocumentStore;
use super::service::{PoolService, PoolServiceError, PredictionSubmission};

/// Router builder exposing the pool's HTTP endpoints.
pub fn pool_router<S>(service: Arc<PoolService<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/v1/pool/season", get(season_handler::<S>))
        .route("/api/v1/pool/season/prizes", get(season_prizes_handler::<S>))
        .route(
            "/api/v1/pool/rounds/:number/outcome",
            get(outcome_handler::<S>),
        )
        .route(
            "/api/v1/pool/rounds/:number/doubles/:member_id/eligibility",
            get(eligibility_handler::<S>),
        )
        .route(
            "/api/v1/pool/rounds/:number/predictions",
            post(submit_prediction_handler::<S>),
        )
        .route(
            "/api/v1/pool/rounds/:number/predictions/:member_id/pardon",
            post(pardon_handler::<S>),
        )
        .route(
            "/api/v1/pool/rounds/:number/doubles",
            post(submit_doubles_handler::<S>),
        )
        .route("/api/v1/pool/ledger", get(ledger_handler::<S>))
        .route("/api/v1/pool/ledger/export", get(ledger_export_handler::<S>))
        .with_state(service)
}

fn error_response(error: PoolServiceError) -> Response {
    let status = match &error {
        PoolServiceError::Reduction(_) | PoolServiceError::NotEligible { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PoolServiceError::UnknownRound(_)
        | PoolServiceError::UnknownMember(_)
        | PoolServiceError::MissingPrediction { .. }
        | PoolServiceError::NoSubmissions(_) => StatusCode::NOT_FOUND,
        PoolServiceError::Store(_) | PoolServiceError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn season_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.season_summary() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn season_prizes_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.season_prizes() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn outcome_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
    Path(number): Path<u32>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.round_outcome(number) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn eligibility_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
    Path((number, member_id)): Path<(u32, u32)>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.doubles_eligibility(number, MemberId(member_id)) {
        Ok(eligibility) => (StatusCode::OK, axum::Json(eligibility)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_prediction_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
    Path(number): Path<u32>,
    axum::Json(submission): axum::Json<PredictionSubmission>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.submit_prediction(number, submission) {
        Ok(prediction) => (StatusCode::ACCEPTED, axum::Json(prediction)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_doubles_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
    Path(number): Path<u32>,
    axum::Json(submission): axum::Json<PredictionSubmission>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.submit_doubles(number, submission) {
        Ok(prediction) => (StatusCode::ACCEPTED, axum::Json(prediction)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pardon_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
    Path((number, member_id)): Path<(u32, u32)>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.pardon_prediction(number, MemberId(member_id)) {
        Ok(prediction) => (StatusCode::OK, axum::Json(prediction)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ledger_handler<S>(State(service): State<Arc<PoolService<S>>>) -> Response
where
    S: DocumentStore + 'static,
{
    match service.ledger() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ledger_export_handler<S>(
    State(service): State<Arc<PoolService<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.ledger_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
