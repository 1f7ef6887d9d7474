use axum::{Json, body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use estate_common::LifecycleAction;

use super::{ApiError, ApiPath, ApiQuery, ApiResult, SharedState, ValidJson};
use crate::crm::filters::InteractionFilter;
use crate::crm::models::Interaction;
use crate::crm::payloads::{CompleteRequest, InteractionPatch, NewInteraction, ReasonRequest, Validate};

pub(super) async fn list_interactions(
    State(state): State<SharedState>,
    ApiQuery(filter): ApiQuery<InteractionFilter>,
) -> ApiResult<impl IntoResponse> {
    let overdue_days = state.overdue_days;
    let interactions = state
        .db
        .call(move |db| db.list_interactions(&filter, Utc::now(), overdue_days))
        .await?;
    Ok(Json(interactions))
}

pub(super) async fn list_overdue(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    let overdue_days = state.overdue_days;
    let interactions = state
        .db
        .call(move |db| db.list_overdue_interactions(Utc::now(), overdue_days))
        .await?;
    Ok(Json(interactions))
}

pub(super) async fn get_interaction(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let overdue_days = state.overdue_days;
    let interaction = state
        .db
        .call(move |db| db.get_interaction_details(id, Utc::now(), overdue_days))
        .await?
        .ok_or_else(|| ApiError::not_found("Interaction", id))?;
    Ok(Json(interaction))
}

pub(super) async fn create_interaction(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<NewInteraction>,
) -> ApiResult<impl IntoResponse> {
    let interaction = state.db.call(move |db| db.create_interaction(req)).await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

pub(super) async fn update_interaction(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(patch): ValidJson<InteractionPatch>,
) -> ApiResult<impl IntoResponse> {
    let interaction = state
        .db
        .call(move |db| db.update_interaction(id, patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Interaction", id))?;
    Ok(Json(interaction))
}

pub(super) async fn delete_interaction(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if state.db.call(move |db| db.delete_interaction(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Interaction", id))
    }
}

// ── Lifecycle actions ─────────────────────────────────────────────────

async fn transition(
    state: &SharedState,
    id: i64,
    action: LifecycleAction,
) -> ApiResult<Json<Interaction>> {
    let interaction = state
        .db
        .call(move |db| db.transition_interaction(id, action))
        .await?
        .ok_or_else(|| ApiError::not_found("Interaction", id))?;
    Ok(Json(interaction))
}

pub(super) async fn start(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Interaction>> {
    transition(&state, id, LifecycleAction::Start).await
}

pub(super) async fn resume(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Interaction>> {
    transition(&state, id, LifecycleAction::Resume).await
}

pub(super) async fn pause(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<ReasonRequest>,
) -> ApiResult<Json<Interaction>> {
    transition(&state, id, LifecycleAction::Pause { reason: req.reason }).await
}

pub(super) async fn end(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<ReasonRequest>,
) -> ApiResult<Json<Interaction>> {
    transition(&state, id, LifecycleAction::End { reason: req.reason }).await
}

/// The body is optional: an empty request completes the interaction now.
pub(super) async fn complete(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    body: Bytes,
) -> ApiResult<Json<Interaction>> {
    let completion: CompleteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid completion body: {}", e)))?
    };
    completion.validate()?;
    let interaction = state
        .db
        .call(move |db| db.complete_interaction(id, completion))
        .await?
        .ok_or_else(|| ApiError::not_found("Interaction", id))?;
    Ok(Json(interaction))
}
