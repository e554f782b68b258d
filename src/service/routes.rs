//! HTTP API for voting, comparisons, and admin operations
//!
//! Route handlers translate domain errors into status codes: duplicate
//! votes are 409, validation failures 400, missing companies or a roster
//! too small to pair 404, exhausted update retries 503. Anything else is
//! a generic 500 so internal detail never leaks to clients.

use crate::error::VotingError;
use crate::service::app::AppState;
use crate::service::health::HealthCheck;
use crate::types::{
    CompanyId, DailyUpdateRequest, FixVoteCountsRequest, Identity, NewCompany,
    ScheduledComparison, VoteRequest,
};
use crate::utils::{parse_date, today_utc};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Assemble the service router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
        .route("/comparison", get(get_comparison))
        .route("/vote", post(post_vote))
        .route("/admin/daily-updates", post(post_daily_updates))
        .route(
            "/admin/vote-counts",
            get(get_vote_counts).post(post_vote_counts),
        )
        .route("/admin/companies", post(post_company))
        .route("/admin/companies/{id}", delete(delete_company))
        .route("/admin/schedule", post(post_schedule))
        .route("/admin/schedule/{date}", delete(delete_schedule))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ComparisonQuery {
    date: Option<String>,
}

/// Parse an optional JSON body; cron triggers often POST nothing at all
fn parse_optional_body<T: serde::de::DeserializeOwned + Default>(
    body: &Bytes,
) -> std::result::Result<T, Response> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        error_response(
            VotingError::InvalidInput {
                reason: format!("malformed request body: {}", e),
            }
            .into(),
        )
    })
}

fn error_response(err: anyhow::Error) -> Response {
    let (status, message) = match err.downcast_ref::<VotingError>() {
        Some(e @ VotingError::DuplicateVote { .. }) => (StatusCode::CONFLICT, e.to_string()),
        Some(e @ VotingError::InvalidInput { .. }) => (StatusCode::BAD_REQUEST, e.to_string()),
        Some(e @ VotingError::NotEnoughCompanies { .. }) => (StatusCode::NOT_FOUND, e.to_string()),
        Some(e @ VotingError::CompanyNotFound { .. }) => (StatusCode::NOT_FOUND, e.to_string()),
        Some(e @ VotingError::StorageConflict { .. }) => {
            warn!("Request hit a storage conflict: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        _ => {
            error!("Request failed: {:#}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process request. Please try again later.".to_string(),
            )
        }
    };

    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

async fn get_health(State(state): State<Arc<AppState>>) -> Response {
    match HealthCheck::check(state).await {
        Ok(health) => Json(health).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics().gather() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Today's comparison, or any date's via `?date=YYYY-MM-DD`
async fn get_comparison(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ComparisonQuery>,
) -> Response {
    let date = match query.date.as_deref() {
        Some(raw) => match parse_date(raw) {
            Ok(date) => date,
            Err(e) => return error_response(e),
        },
        None => today_utc(),
    };

    match state.selector().comparison_for(date) {
        Ok(comparison) => Json(comparison).into_response(),
        Err(e) => error_response(e),
    }
}

async fn post_vote(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VoteRequest>,
) -> Response {
    let identity = match Identity::from_parts(request.user_id, request.anonymous_id) {
        Ok(identity) => identity,
        Err(e) => return error_response(e),
    };

    let result = state
        .recorder()
        .record_vote(
            identity,
            request.company_id,
            request.comparison_date,
            &request.company_ids,
        )
        .await;

    match result {
        Ok(changes) => {
            info!(
                "Vote recorded for company {} on {}",
                request.company_id, request.comparison_date
            );
            Json(json!({ "success": true, "elo_changes": changes })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Run the daily aggregation; an empty body targets yesterday UTC
async fn post_daily_updates(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: DailyUpdateRequest = match parse_optional_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let date = request.date;

    match state.aggregator().process_daily_updates(date).await {
        Ok(updates) => Json(json!({
            "success": true,
            "message": format!("Processed {} companies", updates.len()),
            "updates": updates,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_vote_counts(State(state): State<Arc<AppState>>) -> Response {
    match state.auditor().audit().await {
        Ok(rows) => {
            let in_sync = rows.iter().all(|row| row.difference == 0);
            Json(json!({ "success": true, "in_sync": in_sync, "companies": rows })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Repair drifted vote counters when the body asks for it with `"fix": true`
async fn post_vote_counts(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: FixVoteCountsRequest = match parse_optional_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if !request.fix {
        return match state.auditor().audit().await {
            Ok(rows) => {
                Json(json!({ "success": true, "fixed": 0, "companies": rows })).into_response()
            }
            Err(e) => error_response(e),
        };
    }

    match state.auditor().fix().await {
        Ok(repaired) => {
            info!("Vote-count fix repaired {} companies", repaired.len());
            Json(json!({ "success": true, "fixed": repaired.len(), "companies": repaired }))
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn post_company(
    State(state): State<Arc<AppState>>,
    Json(new_company): Json<NewCompany>,
) -> Response {
    match state.register_company(new_company).await {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<CompanyId>,
) -> Response {
    match state.remove_company(company_id).await {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => error_response(VotingError::CompanyNotFound { company_id }.into()),
        Err(e) => error_response(e),
    }
}

async fn post_schedule(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<ScheduledComparison>,
) -> Response {
    match state.schedule().insert(entry) {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "success": true }))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Response {
    match state.schedule().remove(date) {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": format!("no schedule entry for {}", date) })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
