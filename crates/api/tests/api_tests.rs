//! Router-level tests against an in-memory gallery.

use atelier_api::auth::{issue_token, Claims};
use atelier_api::config::AppConfig;
use atelier_api::state::AppState;
use atelier_core::Gallery;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

fn setup_app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let state = AppState::new(Gallery::in_memory(), config.clone());
    (atelier_api::app(state), config)
}

fn token(config: &AppConfig, superuser: bool) -> String {
    let claims = Claims {
        sub: Uuid::new_v4(),
        exp: jsonwebtoken::get_current_timestamp() + 600,
        superuser,
    };
    issue_token(&claims, &config.jwt_secret).unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Artist, collection and one art piece with an available original.
async fn stock_one_piece(app: &Router, owner: &str) -> i64 {
    let (status, artist) = send(
        app,
        "POST",
        "/v1/owner/artists",
        Some(owner),
        Some(json!({ "name": "Mira Okafor", "email": "mira@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, collection) = send(
        app,
        "POST",
        "/v1/owner/collections",
        Some(owner),
        Some(json!({ "artist_id": artist["id"], "name": "Tidelines" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, art) = send(
        app,
        "POST",
        "/v1/owner/art",
        Some(owner),
        Some(json!({
            "collection_id": collection["id"],
            "title": "Low Water",
            "medium": "Oil on linen",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(art["currency"], "USD");
    assert_eq!(art["is_available"], false);
    let art_id = art["id"].as_i64().unwrap();

    let (status, variant) = send(
        app,
        "PUT",
        &format!("/v1/owner/art/{art_id}/variants/original_piece"),
        Some(owner),
        Some(json!({ "is_available": true, "price": "250.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(variant["medium"], "original_piece");

    art_id
}

const SHIPPING: &str = r#"{
    "email": "buyer@example.com",
    "full_name": "Sam Buyer",
    "address_line1": "1 Harbour Road",
    "city": "Bristol",
    "postal_code": "BS1 4RN",
    "country": "UK"
}"#;

#[tokio::test]
async fn health_reports_the_memory_store() {
    let (app, _) = setup_app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");

    let (status, _) = send(&app, "GET", "/v1/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn owner_routes_reject_anonymous_and_regular_users() {
    let (app, config) = setup_app();
    let input = json!({ "name": "Someone", "email": "someone@example.com" });

    let (status, body) = send(&app, "POST", "/v1/owner/artists", None, Some(input.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "unauthorized");

    let user = token(&config, false);
    let (status, body) = send(&app, "POST", "/v1/owner/artists", Some(&user), Some(input)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["statusCode"], 403);
}

#[tokio::test]
async fn tampered_token_is_unauthorized() {
    let (app, _) = setup_app();
    let (status, _) = send(&app, "GET", "/v1/basket", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let (app, config) = setup_app();
    let owner = token(&config, true);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/owner/artists",
        Some(&owner),
        Some(json!({ "name": "  ", "email": "a@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validationError");
    assert_eq!(body["error"]["field"], "name");

    let art_id = stock_one_piece(&app, &owner).await;
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/owner/art/{art_id}/variants/digital_copy"),
        Some(&owner),
        Some(json!({ "is_available": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "price");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (app, config) = setup_app();
    let owner = token(&config, true);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/owner/artists")
        .header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn basket_to_order_round_trip() {
    let (app, config) = setup_app();
    let owner = token(&config, true);
    let buyer = token(&config, false);
    let art_id = stock_one_piece(&app, &owner).await;

    let (status, detail) = send(&app, "GET", &format!("/v1/art/{art_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["is_available"], true);
    assert_eq!(detail["variants"].as_array().unwrap().len(), 1);

    let (status, item) = send(
        &app,
        "POST",
        "/v1/basket/items",
        Some(&buyer),
        Some(json!({ "art_id": art_id, "medium": "original_piece" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["quantity"], 1);
    assert_eq!(item["price_at_addition"], "250.00");

    let (_, count) = send(&app, "GET", "/v1/basket/count", Some(&buyer), None).await;
    assert_eq!(count["count"], 1);

    let details: Value = serde_json::from_str(SHIPPING).unwrap();
    let (status, order) = send(&app, "POST", "/v1/checkout", Some(&buyer), Some(details)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_amount"], "250.00");
    assert_eq!(order["payment_method"], "test");
    assert_eq!(order["items"][0]["artwork_title"], "Low Water");
    let order_id = order["id"].as_i64().unwrap();

    let (_, count) = send(&app, "GET", "/v1/basket/count", Some(&buyer), None).await;
    assert_eq!(count["count"], 0);

    let (status, mine) = send(&app, "GET", "/v1/orders", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let stranger = token(&config, false);
    let (status, _) = send(&app, "GET", &format!("/v1/orders/{order_id}"), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pending) = send(&app, "GET", "/v1/owner/orders?status=pending", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let status_uri = format!("/v1/owner/orders/{order_id}/status");
    let (status, _) = send(&app, "PUT", &status_uri, Some(&owner), Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = send(&app, "PUT", &status_uri, Some(&owner), Some(json!({ "status": "processing" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "processing");
}

#[tokio::test]
async fn empty_basket_cannot_check_out() {
    let (app, config) = setup_app();
    let buyer = token(&config, false);
    let details: Value = serde_json::from_str(SHIPPING).unwrap();

    let (status, body) = send(&app, "POST", "/v1/checkout", Some(&buyer), Some(details)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "conflict");
}

#[tokio::test]
async fn zero_quantity_patch_removes_the_line() {
    let (app, config) = setup_app();
    let owner = token(&config, true);
    let buyer = token(&config, false);
    let art_id = stock_one_piece(&app, &owner).await;

    let (_, item) = send(
        &app,
        "POST",
        "/v1/basket/items",
        Some(&buyer),
        Some(json!({ "art_id": art_id })),
    )
    .await;
    let uri = format!("/v1/basket/items/{}", item["id"]);

    let (status, updated) = send(&app, "PATCH", &uri, Some(&buyer), Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 3);

    let other = token(&config, false);
    let (status, _) = send(&app, "PATCH", &uri, Some(&other), Some(json!({ "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PATCH", &uri, Some(&buyer), Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, count) = send(&app, "GET", "/v1/basket/count", Some(&buyer), None).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn unavailable_art_stays_out_of_the_basket() {
    let (app, config) = setup_app();
    let owner = token(&config, true);
    let buyer = token(&config, false);
    let art_id = stock_one_piece(&app, &owner).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/owner/art/{art_id}/variants/original_piece"),
        Some(&owner),
        Some(json!({ "is_available": false, "price": "250.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/basket/items",
        Some(&buyer),
        Some(json!({ "art_id": art_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn draft_exhibitions_are_owner_only() {
    let (app, config) = setup_app();
    let owner = token(&config, true);

    let (status, exhibition) = send(
        &app,
        "POST",
        "/v1/owner/exhibitions",
        Some(&owner),
        Some(json!({ "title": "Winter Hang", "start_date": "2030-01-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exhibition["status"], "draft");
    let uri = format!("/v1/exhibitions/{}", exhibition["id"]);

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/owner/exhibitions",
        Some(&owner),
        Some(json!({ "title": "Backwards", "start_date": "2030-02-10", "end_date": "2030-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "end_date");
}

#[tokio::test]
async fn contact_messages_reach_the_owner_inbox() {
    let (app, config) = setup_app();
    let owner = token(&config, true);

    let (status, message) = send(
        &app,
        "POST",
        "/v1/messages",
        None,
        Some(json!({ "name": "Ada", "email": "ada@example.com", "body": "Is Low Water still for sale?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["unread"], true);

    let (_, unread) = send(&app, "GET", "/v1/owner/messages/unread-count", Some(&owner), None).await;
    assert_eq!(unread["unread"], 1);

    let uri = format!("/v1/owner/messages/{}/read", message["id"]);
    let (status, read) = send(&app, "PUT", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["unread"], false);

    let (_, unread) = send(&app, "GET", "/v1/owner/messages/unread-count", Some(&owner), None).await;
    assert_eq!(unread["unread"], 0);
}

#[tokio::test]
async fn malformed_ids_and_filters_use_the_error_envelope() {
    let (app, config) = setup_app();
    let owner = token(&config, true);

    let (status, body) = send(&app, "GET", "/v1/art/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "badRequest");
    assert_eq!(body["error"]["statusCode"], 400);

    let (status, body) = send(&app, "GET", "/v1/art?min_price=cheap", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "badRequest");

    let (status, body) = send(&app, "GET", "/v1/owner/orders?status=lost", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "badRequest");
}

#[tokio::test]
async fn prices_beyond_the_column_range_are_refused() {
    let (app, config) = setup_app();
    let owner = token(&config, true);
    let art_id = stock_one_piece(&app, &owner).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/owner/art/{art_id}/variants/printed_poster"),
        Some(&owner),
        Some(json!({ "is_available": true, "price": "79228162514264337593543950335" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "price");

    let (status, variants) = send(
        &app,
        "GET",
        &format!("/v1/owner/art/{art_id}/variants"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(variants.as_array().unwrap().len(), 1);
}
