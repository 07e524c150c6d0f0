//! Routing and access control, checked without a database.
//!
//! Every request here is decided before the first query, so the router runs
//! over a lazy pool that never connects.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use tower::ServiceExt;

use shopdesk_core::UserRole;
use shopdesk_integration_tests::{
    TestApp, expired_token, page_request, request, send_raw, token_for,
};

#[tokio::test]
async fn test_health_is_ok() {
    let app = TestApp::without_database();
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::without_database();
    let (status, _) = app.send(request("GET", "/nope", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_list_requires_token() {
    let app = TestApp::without_database();
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/orders", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_customer_cannot_list_orders() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);

    let (status, body) = app
        .send(request("GET", "/orders", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_customer_cannot_create_products() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);
    let product = json!({"name": "Lamp", "price": "10.00", "stock_quantity": 5});

    let (status, _) = app
        .send(request("POST", "/products", Some(&token), Some(product)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_customer_cannot_order_for_someone_else() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);
    let order = json!({"user_id": 8, "items": [{"product_id": 1, "quantity": 1}]});

    let (status, _) = app
        .send(request("POST", "/orders", Some(&token), Some(order)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_customer_cannot_read_other_profiles() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);

    let (status, _) = app
        .send(request("GET", "/users/8", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::without_database();
    let token = expired_token(1, UserRole::Admin);

    let (status, body) = app
        .send(request("GET", "/orders", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token expired");
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let app = TestApp::without_database();
    let (status, _) = app
        .send(request("GET", "/orders", Some("not-a-jwt"), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_page_redirects_to_login() {
    let app = TestApp::without_database();
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/admin/dashboard", None, None))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login"
    );
}

#[tokio::test]
async fn test_admin_page_forbids_customers() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);
    let request = Request::builder()
        .uri("/admin/dashboard")
        .header(header::COOKIE, format!("access_token={token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::without_database();
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/admin/login", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("name=\"password\""));
}

#[tokio::test]
async fn test_empty_order_is_rejected() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);
    let order = json!({"user_id": 7, "items": []});

    let (status, body) = app
        .send(request("POST", "/orders", Some(&token), Some(order)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least one item"));
}

#[tokio::test]
async fn test_unknown_order_status_is_a_json_400() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 1, UserRole::Admin);

    let (status, body) = app
        .send(request(
            "PUT",
            "/orders/1",
            Some(&token),
            Some(json!({"status": "shipped"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("shipped"));
}

#[tokio::test]
async fn test_malformed_product_body_is_a_json_400() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 1, UserRole::Admin);

    let (status, body) = app
        .send(request(
            "POST",
            "/products",
            Some(&token),
            Some(json!({"name": "Lamp", "stock_quantity": 1})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_add_product_page_renders_empty_form() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 1, UserRole::Admin);

    let (status, _, html) = send_raw(&app, page_request("GET", "/admin/products/add", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("action=\"/admin/products\""));
    assert!(html.contains("name=\"stock_quantity\""));
}

#[tokio::test]
async fn test_invalid_product_form_lists_every_field_error() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 1, UserRole::Admin);
    let form = "name=x&description=&price=0&stock_quantity=-2";

    let (status, _, html) =
        send_raw(&app, page_request("POST", "/admin/products", &token, Some(form))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("Please fix the validation errors"));
    assert!(html.contains("name must be between 2 and 100 characters"));
    assert!(html.contains("Price must be greater than zero"));
    assert!(html.contains("Stock quantity cannot be negative"));
    // Submitted values survive the round trip
    assert!(html.contains("value=\"-2\""));
}

#[tokio::test]
async fn test_product_form_requires_admin() {
    let app = TestApp::without_database();
    let token = token_for(&app.state, 7, UserRole::Customer);

    let (status, _, _) = send_raw(&app, page_request("GET", "/admin/products/add", &token, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
