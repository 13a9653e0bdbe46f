use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use shared::{IpInfoResponse, PlayerInfoResponse, SessionIdResponse};

use crate::{
    error::{ApiError, ApiResult},
    metrics,
    state::AppState,
    store::StoreError,
    validation::{validate_all, Operation, RequestFields, ValidatedFields},
};

/// Run the field set of `operation`; nothing reaches storage on rejection.
fn gate(
    state: &AppState,
    operation: Operation,
    method: &Method,
    fields: &RequestFields,
) -> ApiResult<ValidatedFields> {
    let descriptors = operation.descriptors(method, &state.protocols);
    validate_all(&descriptors, fields, false).map_err(|rejected| {
        tracing::debug!(operation = operation.label(), "request rejected by validation");
        state.metrics.observe_rejection(operation.label());
        ApiError::from(rejected)
    })
}

fn store_failure(state: &AppState, err: StoreError) -> ApiError {
    tracing::error!(procedure = err.procedure(), error = %err, "stored procedure call failed");
    state.metrics.observe_store_failure(err.procedure());
    ApiError::internal("An unexpected database error occurred")
}

// ─────────────────────────────────────────────────────────────────────────────
// Player info
// ─────────────────────────────────────────────────────────────────────────────

pub async fn get_player_info(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<Json<PlayerInfoResponse>> {
    let values = gate(&state, Operation::LookupPlayer, &method, &fields)?;

    let player = state
        .store
        .get_player_info(values.value("uuid"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(Json(player.unwrap_or_default()))
}

pub async fn add_player_info(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<StatusCode> {
    let values = gate(&state, Operation::CreatePlayer, &method, &fields)?;

    state
        .store
        .add_player_info(values.value("uuid"), values.value("name"), values.value("version"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_player_info(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<StatusCode> {
    let values = gate(&state, Operation::UpdatePlayer, &method, &fields)?;

    state
        .store
        .update_player_info(values.value("uuid"), values.value("name"), values.value("version"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// IP info
// ─────────────────────────────────────────────────────────────────────────────

pub async fn get_ip_info(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<Json<Vec<IpInfoResponse>>> {
    let values = gate(&state, Operation::LookupIp, &method, &fields)?;

    let ips = state
        .store
        .get_ip_info(values.value("ip"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(Json(ips))
}

pub async fn add_ip_info(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<StatusCode> {
    let values = gate(&state, Operation::CreateIp, &method, &fields)?;

    state
        .store
        .add_ip_info(values.value("ip"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Logins and sessions
// ─────────────────────────────────────────────────────────────────────────────

pub async fn handle_player_login(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<StatusCode> {
    let values = gate(&state, Operation::RecordLogin, &method, &fields)?;

    state
        .store
        .handle_player_login(values.value("uuid"), values.value("ipid"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session_id(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<Json<SessionIdResponse>> {
    let values = gate(&state, Operation::LookupSession, &method, &fields)?;

    let session = state
        .store
        .get_session_id(values.value("uuid"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(Json(session.unwrap_or_default()))
}

pub async fn update_login_session(
    State(state): State<AppState>,
    method: Method,
    fields: RequestFields,
) -> ApiResult<StatusCode> {
    let values = gate(&state, Operation::CreateSession, &method, &fields)?;

    state
        .store
        .update_login_session(values.value("id"))
        .await
        .map_err(|err| store_failure(&state, err))?;

    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Placeholders and observability
// ─────────────────────────────────────────────────────────────────────────────

pub async fn route_not_found() -> ApiError {
    ApiError::not_found("NotFound", "Route not found")
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let body = metrics::gather_metrics(&state.registry);
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}
