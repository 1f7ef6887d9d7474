use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::{ApiError, ApiPath, ApiResult, SharedState, ValidJson};
use crate::crm::payloads::NewPropertyInterest;

pub(super) async fn list_interests(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    let interests = state.db.call(|db| db.list_property_interests()).await?;
    Ok(Json(interests))
}

/// Recording the same customer/property pair again replaces the earlier row.
pub(super) async fn record_interest(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<NewPropertyInterest>,
) -> ApiResult<impl IntoResponse> {
    let interest = state
        .db
        .call(move |db| db.upsert_property_interest(req))
        .await?;
    Ok((StatusCode::CREATED, Json(interest)))
}

pub(super) async fn delete_interest(
    State(state): State<SharedState>,
    ApiPath((customer_id, property_id)): ApiPath<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .db
        .call(move |db| db.delete_property_interest(customer_id, property_id))
        .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "No interest recorded for customer {} in property {}",
            customer_id, property_id
        )))
    }
}
