use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use super::{ApiError, ApiPath, ApiQuery, ApiResult, SharedState, ValidJson};
use crate::crm::filters::CustomerFilter;
use crate::crm::payloads::{CustomerPatch, NewCustomer};

pub(super) async fn list_customers(
    State(state): State<SharedState>,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
) -> ApiResult<impl IntoResponse> {
    let customers = state.db.call(move |db| db.list_customers(&filter)).await?;
    Ok(Json(customers))
}

pub(super) async fn get_customer(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let customer = state
        .db
        .call(move |db| db.get_customer(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;
    Ok(Json(customer))
}

pub(super) async fn customer_details(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let overdue_days = state.overdue_days;
    let details = state
        .db
        .call(move |db| db.get_customer_details(id, Utc::now(), overdue_days))
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;
    Ok(Json(details))
}

pub(super) async fn create_customer(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<NewCustomer>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.db.call(move |db| db.create_customer(req)).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub(super) async fn update_customer(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(patch): ValidJson<CustomerPatch>,
) -> ApiResult<impl IntoResponse> {
    let customer = state
        .db
        .call(move |db| db.update_customer(id, patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;
    Ok(Json(customer))
}

pub(super) async fn delete_customer(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if state.db.call(move |db| db.delete_customer(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Customer", id))
    }
}
