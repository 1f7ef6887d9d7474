use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::{ApiError, ApiPath, ApiQuery, ApiResult, SharedState, ValidJson};
use crate::crm::filters::VisitFilter;
use crate::crm::payloads::{NewVisit, VisitPatch};

pub(super) async fn list_visits(
    State(state): State<SharedState>,
    ApiQuery(filter): ApiQuery<VisitFilter>,
) -> ApiResult<impl IntoResponse> {
    let visits = state.db.call(move |db| db.list_visits(&filter)).await?;
    Ok(Json(visits))
}

pub(super) async fn get_visit(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let visit = state
        .db
        .call(move |db| db.get_visit_details(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Visit", id))?;
    Ok(Json(visit))
}

pub(super) async fn create_visit(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<NewVisit>,
) -> ApiResult<impl IntoResponse> {
    let visit = state.db.call(move |db| db.create_visit(req)).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub(super) async fn update_visit(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(patch): ValidJson<VisitPatch>,
) -> ApiResult<impl IntoResponse> {
    let visit = state
        .db
        .call(move |db| db.update_visit(id, patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Visit", id))?;
    Ok(Json(visit))
}

pub(super) async fn delete_visit(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if state.db.call(move |db| db.delete_visit(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Visit", id))
    }
}
