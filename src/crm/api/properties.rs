use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::{ApiError, ApiPath, ApiQuery, ApiResult, SharedState, ValidJson};
use crate::crm::filters::PropertyFilter;
use crate::crm::payloads::{NewProperty, PropertyPatch};

pub(super) async fn list_properties(
    State(state): State<SharedState>,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
) -> ApiResult<impl IntoResponse> {
    let properties = state.db.call(move |db| db.list_properties(&filter)).await?;
    Ok(Json(properties))
}

pub(super) async fn get_property(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let property = state
        .db
        .call(move |db| db.get_property(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Property", id))?;
    Ok(Json(property))
}

pub(super) async fn create_property(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<NewProperty>,
) -> ApiResult<impl IntoResponse> {
    let property = state.db.call(move |db| db.create_property(req)).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(super) async fn update_property(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(patch): ValidJson<PropertyPatch>,
) -> ApiResult<impl IntoResponse> {
    let property = state
        .db
        .call(move |db| db.update_property(id, patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Property", id))?;
    Ok(Json(property))
}

pub(super) async fn delete_property(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if state.db.call(move |db| db.delete_property(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Property", id))
    }
}
