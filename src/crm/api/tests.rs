use super::*;
use crate::crm::db::CrmDb;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_app() -> Router {
    let db = CrmDb::new_in_memory().unwrap();
    api_router().with_state(AppState::new(DbHandle::new(db), 20))
}

async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request and return the status with the parsed JSON body
/// (`Value::Null` for empty bodies).
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, created) = send(app, json_request("POST", uri, body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, created);
    created
}

/// Broker, customer and property ids for tests that need linked rows.
async fn seed_basics(app: &Router) -> (i64, i64, i64) {
    let broker = create(
        app,
        "/api/brokers",
        json!({"name": "Amit Mehta", "email": "amit@realty.com", "phone": "+91 99887 76655"}),
    )
    .await;
    let customer = create(
        app,
        "/api/customers",
        json!({
            "name": "Rajesh Kumar",
            "email": "rajesh@email.com",
            "phone": "+91 98765 43210",
            "assignedBrokerId": broker["id"],
        }),
    )
    .await;
    let property = create(
        app,
        "/api/properties",
        json!({
            "title": "Sunrise Apartments",
            "category": "flats",
            "price": 8500000,
            "location": "Andheri West",
            "city": "Mumbai",
        }),
    )
    .await;
    (
        broker["id"].as_i64().unwrap(),
        customer["id"].as_i64().unwrap(),
        property["id"].as_i64().unwrap(),
    )
}

async fn create_interaction(app: &Router, customer_id: i64, broker_id: i64) -> i64 {
    let interaction = create(
        app,
        "/api/interactions",
        json!({
            "customerId": customer_id,
            "brokerId": broker_id,
            "type": "follow_up",
            "title": "Intro call",
        }),
    )
    .await;
    interaction["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_list_customers_empty() {
    let app = test_app();
    let response = app.oneshot(empty_request("GET", "/api/customers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let customers: Vec<Value> = body_json(response.into_body()).await;
    assert!(customers.is_empty());
}

#[tokio::test]
async fn test_customer_crud() {
    let app = test_app();
    let created = create(
        &app,
        "/api/customers",
        json!({
            "name": "Priya Sharma",
            "email": "priya@email.com",
            "phone": "+91 87654 32109",
            "priority": "high",
            "budgetMin": "15000000",
            "budgetMax": 20000000,
            "preferredLocations": ["Bandra", "Khar"],
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "active");
    assert_eq!(created["purpose"], "buy");
    assert_eq!(created["preferredLocations"], json!(["Bandra", "Khar"]));

    let (status, fetched) = send(&app, empty_request("GET", &format!("/api/customers/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["email"], "priya@email.com");

    let (status, updated) = send(
        &app,
        json_request("PUT", &format!("/api/customers/{}", id), json!({"notes": "Wants a garden"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "Wants a garden");
    assert_eq!(updated["name"], "Priya Sharma");

    let (status, _) = send(&app, empty_request("DELETE", &format!("/api/customers/{}", id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, empty_request("GET", &format!("/api/customers/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Customer {} not found", id));
}

#[tokio::test]
async fn test_customer_filters() {
    let app = test_app();
    seed_basics(&app).await;
    create(
        &app,
        "/api/customers",
        json!({"name": "Priya Sharma", "email": "priya@email.com", "phone": "+91 1", "priority": "high"}),
    )
    .await;

    let (_, high) = send(&app, empty_request("GET", "/api/customers?priority=high")).await;
    assert_eq!(high.as_array().unwrap().len(), 1);
    assert_eq!(high[0]["name"], "Priya Sharma");

    let (_, all) = send(&app, empty_request("GET", "/api/customers?priority=all&search=")).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, found) = send(&app, empty_request("GET", "/api/customers?search=RAJESH")).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, empty_request("GET", "/api/customers?priority=urgent")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_payloads_are_bad_requests() {
    let app = test_app();

    let (status, body) = send(
        &app,
        json_request("POST", "/api/customers", json!({"name": "", "email": "nope", "phone": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("name"), "{}", message);
    assert!(message.contains("email"), "{}", message);

    let (status, _) = send(&app, json_request("POST", "/api/customers", json!({"name": "Only"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/brokers")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, empty_request("GET", "/api/customers/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_null_on_required_column_is_bad_request() {
    let app = test_app();
    let (broker_id, _, property_id) = seed_basics(&app).await;
    let property_uri = format!("/api/properties/{}", property_id);

    for price in [json!(null), json!("")] {
        let (status, _) =
            send(&app, json_request("PUT", &property_uri, json!({"price": price}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, _) = send(
        &app,
        json_request("PUT", &format!("/api/brokers/{}", broker_id), json!({"commissionRate": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, property) = send(&app, empty_request("GET", &property_uri)).await;
    assert_eq!(property["price"], 8_500_000.0);

    let (status, updated) =
        send(&app, json_request("PUT", &property_uri, json!({"price": "9000000"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 9_000_000.0);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = test_app();
    let payload = json!({"name": "Amit Mehta", "email": "amit@realty.com", "phone": "+91 1"});
    create(&app, "/api/brokers", payload.clone()).await;
    let (status, body) = send(&app, json_request("POST", "/api/brokers", payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_unknown_reference_is_bad_request() {
    let app = test_app();
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/customers",
            json!({"name": "Ghost", "email": "g@email.com", "phone": "1", "assignedBrokerId": 99}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_property_filters_and_update() {
    let app = test_app();
    let (_, _, property_id) = seed_basics(&app).await;
    create(
        &app,
        "/api/properties",
        json!({
            "title": "Green Valley Bungalow",
            "category": "bungalow",
            "price": 25000000,
            "location": "Bandra",
            "city": "Mumbai",
        }),
    )
    .await;

    let (_, cheap) = send(&app, empty_request("GET", "/api/properties?priceRange=50L-1Cr")).await;
    assert_eq!(cheap.as_array().unwrap().len(), 1);
    assert_eq!(cheap[0]["title"], "Sunrise Apartments");

    let (_, luxury) = send(&app, empty_request("GET", "/api/properties?priceRange=2Cr%2B")).await;
    assert_eq!(luxury.as_array().unwrap().len(), 1);
    assert_eq!(luxury[0]["category"], "bungalow");

    let (status, sold) = send(
        &app,
        json_request("PUT", &format!("/api/properties/{}", property_id), json!({"status": "sold"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sold["status"], "sold");

    let (_, available) = send(&app, empty_request("GET", "/api/properties?status=available")).await;
    assert_eq!(available.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_missing_record_is_not_found() {
    let app = test_app();
    let (status, body) =
        send(&app, json_request("PUT", "/api/properties/404", json!({"title": "Nowhere"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Property 404 not found");

    let (status, _) = send(&app, empty_request("DELETE", "/api/brokers/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_referenced_property_cannot_be_deleted() {
    let app = test_app();
    let (broker_id, customer_id, property_id) = seed_basics(&app).await;
    create(
        &app,
        "/api/visits",
        json!({
            "customerId": customer_id,
            "propertyId": property_id,
            "brokerId": broker_id,
            "visitDate": "2026-10-10T10:00:00Z",
        }),
    )
    .await;
    let (status, _) = send(&app, empty_request("DELETE", &format!("/api/properties/{}", property_id))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_visits_return_details() {
    let app = test_app();
    let (broker_id, customer_id, property_id) = seed_basics(&app).await;
    let visit = create(
        &app,
        "/api/visits",
        json!({
            "customerId": customer_id,
            "propertyId": property_id,
            "brokerId": broker_id,
            "visitDate": "2026-10-10T10:00:00Z",
            "rating": 4,
        }),
    )
    .await;
    let id = visit["id"].as_i64().unwrap();
    assert_eq!(visit["status"], "completed");

    let (status, details) = send(&app, empty_request("GET", &format!("/api/visits/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["customer"]["name"], "Rajesh Kumar");
    assert_eq!(details["property"]["title"], "Sunrise Apartments");
    assert_eq!(details["broker"]["name"], "Amit Mehta");

    let (_, listed) = send(&app, empty_request("GET", "/api/visits?search=sunrise")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request("PUT", &format!("/api/visits/{}", id), json!({"rating": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &app,
        json_request("PUT", &format!("/api/visits/{}", id), json!({"status": "cancelled", "feedback": "Liked it"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "cancelled");
    assert_eq!(updated["feedback"], "Liked it");

    let (status, _) = send(&app, empty_request("DELETE", &format!("/api/visits/{}", id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_interaction_lifecycle() {
    let app = test_app();
    let (broker_id, customer_id, _) = seed_basics(&app).await;
    let id = create_interaction(&app, customer_id, broker_id).await;
    let base = format!("/api/interactions/{}", id);

    let (status, details) = send(&app, empty_request("GET", &base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["status"], "pending");
    assert_eq!(details["type"], "follow_up");
    assert_eq!(details["overdue"], false);
    assert_eq!(details["customer"]["name"], "Rajesh Kumar");

    let (status, started) = send(&app, empty_request("PATCH", &format!("{}/start", base))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");

    let (status, paused) = send(
        &app,
        json_request("PATCH", &format!("{}/pause", base), json!({"reason": "Customer travelling"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["status"], "paused");
    assert_eq!(paused["pauseReason"], "Customer travelling");

    let (status, resumed) = send(&app, empty_request("PATCH", &format!("{}/resume", base))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resumed["status"], "in_progress");
    assert!(resumed["pauseReason"].is_null());

    let (status, completed) = send(
        &app,
        json_request(
            "PATCH",
            &format!("{}/complete", base),
            json!({"customerFeedback": "Ready to visit", "rating": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["customerFeedback"], "Ready to visit");
    assert!(completed["completedDate"].is_string());

    let (status, body) = send(&app, empty_request("PATCH", &format!("{}/start", base))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("completed"));
}

#[tokio::test]
async fn test_complete_accepts_empty_body() {
    let app = test_app();
    let (broker_id, customer_id, _) = seed_basics(&app).await;
    let id = create_interaction(&app, customer_id, broker_id).await;

    let (status, completed) =
        send(&app, empty_request("PATCH", &format!("/api/interactions/{}/complete", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
}

#[tokio::test]
async fn test_lifecycle_errors() {
    let app = test_app();
    let (broker_id, customer_id, _) = seed_basics(&app).await;
    let id = create_interaction(&app, customer_id, broker_id).await;

    let (status, _) = send(&app, empty_request("PATCH", &format!("/api/interactions/{}/resume", id))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request("PATCH", &format!("/api/interactions/{}/end", id), json!({"reason": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, empty_request("PATCH", "/api/interactions/999/start")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, ended) = send(
        &app,
        json_request("PATCH", &format!("/api/interactions/{}/end", id), json!({"reason": "Bought elsewhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["status"], "ended");
    assert_eq!(ended["endReason"], "Bought elsewhere");
}

#[tokio::test]
async fn test_put_status_follows_transition_rules() {
    let app = test_app();
    let (broker_id, customer_id, _) = seed_basics(&app).await;
    let id = create_interaction(&app, customer_id, broker_id).await;
    let uri = format!("/api/interactions/{}", id);

    let (status, started) =
        send(&app, json_request("PUT", &uri, json!({"status": "in_progress", "notes": "Called"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");
    assert_eq!(started["notes"], "Called");

    let (status, _) = send(&app, json_request("PUT", &uri, json!({"status": "pending"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, unchanged) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(unchanged["status"], "in_progress");
}

#[tokio::test]
async fn test_interaction_filters_and_overdue() {
    let app = test_app();
    let (broker_id, customer_id, _) = seed_basics(&app).await;
    create_interaction(&app, customer_id, broker_id).await;

    let (_, calls) = send(&app, empty_request("GET", "/api/interactions?type=follow_up")).await;
    assert_eq!(calls.as_array().unwrap().len(), 1);
    let (_, emails) = send(&app, empty_request("GET", "/api/interactions?type=digital_sharing")).await;
    assert!(emails.as_array().unwrap().is_empty());

    let (status, overdue) = send(&app, empty_request("GET", "/api/interactions/overdue")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(overdue.as_array().unwrap().is_empty());

    let (_, flagged) = send(&app, empty_request("GET", "/api/interactions?overdue=true")).await;
    assert!(flagged.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_huge_overdue_threshold_keeps_server_usable() {
    let db = CrmDb::new_in_memory().unwrap();
    let app = api_router().with_state(AppState::new(DbHandle::new(db), u32::MAX));
    let (broker_id, customer_id, _) = seed_basics(&app).await;
    create_interaction(&app, customer_id, broker_id).await;

    let (status, overdue) = send(&app, empty_request("GET", "/api/interactions/overdue")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(overdue.as_array().unwrap().is_empty());

    let (status, metrics) = send(&app, empty_request("GET", "/api/dashboard/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["overdueInteractions"], 0);

    let (status, customers) = send(&app, empty_request("GET", "/api/customers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_storage_errors_are_not_leaked() {
    for err in [
        CrmError::Database(anyhow::anyhow!("no such table: customers")),
        CrmError::LockPoisoned,
    ] {
        let resp = ApiError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = body_json(resp.into_body()).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }
}

#[tokio::test]
async fn test_customer_details_and_broker_stats() {
    let app = test_app();
    let (broker_id, customer_id, property_id) = seed_basics(&app).await;
    let interaction_id = create_interaction(&app, customer_id, broker_id).await;
    create(
        &app,
        "/api/property-interests",
        json!({
            "customerId": customer_id,
            "propertyId": property_id,
            "interestLevel": "high",
            "interactionId": interaction_id,
        }),
    )
    .await;

    let (status, details) =
        send(&app, empty_request("GET", &format!("/api/customers/{}/details", customer_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["assignedBroker"]["id"], broker_id);
    assert_eq!(details["recentInteractions"].as_array().unwrap().len(), 1);
    assert_eq!(details["interestedProperties"][0]["interestLevel"], "high");
    assert!(details["lastInteractionDate"].is_string());

    let (status, stats) =
        send(&app, empty_request("GET", &format!("/api/brokers/{}/stats", broker_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["assignedCustomers"].as_array().unwrap().len(), 1);
    assert_eq!(stats["monthlyDeals"], 0);

    let (status, _) = send(&app, empty_request("GET", "/api/brokers/77/stats")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_property_interest_upsert_and_delete() {
    let app = test_app();
    let (_, customer_id, property_id) = seed_basics(&app).await;
    let payload = |level: &str| {
        json!({"customerId": customer_id, "propertyId": property_id, "interestLevel": level})
    };
    let first = create(&app, "/api/property-interests", payload("medium")).await;
    let second = create(&app, "/api/property-interests", payload("high")).await;
    assert_eq!(first["id"], second["id"]);

    let (_, listed) = send(&app, empty_request("GET", "/api/property-interests")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["interestLevel"], "high");

    let uri = format!("/api/property-interests/{}/{}", customer_id, property_id);
    let (status, _) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories_after_seed() {
    let db = CrmDb::new_in_memory().unwrap();
    crate::crm::seed::seed_sample_data(&db).unwrap();
    let app = api_router().with_state(AppState::new(DbHandle::new(db), 20));

    let (status, categories) = send(&app, empty_request("GET", "/api/property-categories")).await;
    assert_eq!(status, StatusCode::OK);
    let categories = categories.as_array().unwrap().clone();
    assert_eq!(categories.len(), 4);
    let flats = categories.iter().find(|c| c["name"] == "Flats").unwrap();

    let (status, subs) = send(
        &app,
        empty_request("GET", &format!("/api/property-categories/sub/{}", flats["id"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subs.as_array().unwrap().len(), 4);
    assert_eq!(subs[0]["category"]["name"], "Flats");

    let (status, _) = send(&app, empty_request("GET", "/api/property-categories/sub/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, metrics) = send(&app, empty_request("GET", "/api/dashboard/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["totalCustomers"], 2);
    assert_eq!(metrics["hotLeads"], 1);
}
