//! REST surface of the CRM.
//!
//! Each resource lives in its own file and contributes handlers to
//! [`api_router`]. Handlers stay thin: extract, hand owned data to
//! [`DbHandle::call`], map the result.

mod brokers;
mod categories;
mod customers;
mod extract;
mod interactions;
mod interests;
mod properties;
mod visits;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
};
use chrono::Utc;
use tracing::error;

use super::db::DbHandle;
use super::models::DashboardMetrics;
use crate::errors::CrmError;

pub use extract::{ApiPath, ApiQuery, ValidJson};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    /// Days without an update after which an open interaction is overdue.
    pub overdue_days: u32,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: DbHandle, overdue_days: u32) -> SharedState {
        Arc::new(Self { db, overdue_days })
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Details are logged, never sent to the client.
    Internal,
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CrmError::not_found(entity, id).into()
    }
}

impl From<CrmError> for ApiError {
    fn from(e: CrmError) -> Self {
        match e {
            CrmError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CrmError::Validation(msg) => ApiError::BadRequest(msg),
            CrmError::Conflict(msg) => ApiError::Conflict(msg),
            CrmError::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            CrmError::LockPoisoned | CrmError::Database(_) => {
                error!(error = ?e, "Storage failure");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/dashboard/metrics", get(dashboard_metrics))
        .route(
            "/api/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/api/customers/{id}",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/api/customers/{id}/details", get(customers::customer_details))
        .route(
            "/api/properties",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/api/properties/{id}",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
        .route(
            "/api/brokers",
            get(brokers::list_brokers).post(brokers::create_broker),
        )
        .route(
            "/api/brokers/{id}",
            get(brokers::get_broker)
                .put(brokers::update_broker)
                .delete(brokers::delete_broker),
        )
        .route("/api/brokers/{id}/stats", get(brokers::broker_stats))
        .route(
            "/api/visits",
            get(visits::list_visits).post(visits::create_visit),
        )
        .route(
            "/api/visits/{id}",
            get(visits::get_visit)
                .put(visits::update_visit)
                .delete(visits::delete_visit),
        )
        .route(
            "/api/interactions",
            get(interactions::list_interactions).post(interactions::create_interaction),
        )
        .route("/api/interactions/overdue", get(interactions::list_overdue))
        .route(
            "/api/interactions/{id}",
            get(interactions::get_interaction)
                .put(interactions::update_interaction)
                .delete(interactions::delete_interaction),
        )
        .route("/api/interactions/{id}/start", patch(interactions::start))
        .route("/api/interactions/{id}/complete", patch(interactions::complete))
        .route("/api/interactions/{id}/pause", patch(interactions::pause))
        .route("/api/interactions/{id}/resume", patch(interactions::resume))
        .route("/api/interactions/{id}/end", patch(interactions::end))
        .route(
            "/api/property-interests",
            get(interests::list_interests).post(interests::record_interest),
        )
        .route(
            "/api/property-interests/{customer_id}/{property_id}",
            delete(interests::delete_interest),
        )
        .route("/api/property-categories", get(categories::list_categories))
        .route(
            "/api/property-categories/sub/{id}",
            get(categories::list_subcategories),
        )
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn dashboard_metrics(State(state): State<SharedState>) -> ApiResult<Json<DashboardMetrics>> {
    let overdue_days = state.overdue_days;
    let metrics = state
        .db
        .call(move |db| db.dashboard_metrics(Utc::now(), overdue_days))
        .await?;
    Ok(Json(metrics))
}
