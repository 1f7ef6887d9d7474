use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use super::{ApiError, ApiPath, ApiQuery, ApiResult, SharedState, ValidJson};
use crate::crm::filters::BrokerFilter;
use crate::crm::payloads::{BrokerPatch, NewBroker};

pub(super) async fn list_brokers(
    State(state): State<SharedState>,
    ApiQuery(filter): ApiQuery<BrokerFilter>,
) -> ApiResult<impl IntoResponse> {
    let brokers = state.db.call(move |db| db.list_brokers(&filter)).await?;
    Ok(Json(brokers))
}

pub(super) async fn get_broker(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let broker = state
        .db
        .call(move |db| db.get_broker(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Broker", id))?;
    Ok(Json(broker))
}

pub(super) async fn broker_stats(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let overdue_days = state.overdue_days;
    let stats = state
        .db
        .call(move |db| db.get_broker_stats(id, Utc::now(), overdue_days))
        .await?
        .ok_or_else(|| ApiError::not_found("Broker", id))?;
    Ok(Json(stats))
}

pub(super) async fn create_broker(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<NewBroker>,
) -> ApiResult<impl IntoResponse> {
    let broker = state.db.call(move |db| db.create_broker(req)).await?;
    Ok((StatusCode::CREATED, Json(broker)))
}

pub(super) async fn update_broker(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(patch): ValidJson<BrokerPatch>,
) -> ApiResult<impl IntoResponse> {
    let broker = state
        .db
        .call(move |db| db.update_broker(id, patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Broker", id))?;
    Ok(Json(broker))
}

pub(super) async fn delete_broker(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if state.db.call(move |db| db.delete_broker(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Broker", id))
    }
}
