use axum::{Json, extract::State, response::IntoResponse};

use super::{ApiError, ApiPath, ApiResult, SharedState};

pub(super) async fn list_categories(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    let categories = state.db.call(|db| db.list_categories()).await?;
    Ok(Json(categories))
}

pub(super) async fn list_subcategories(
    State(state): State<SharedState>,
    ApiPath(category_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let subs = state
        .db
        .call(move |db| db.list_subcategories(category_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Category", category_id))?;
    Ok(Json(subs))
}
