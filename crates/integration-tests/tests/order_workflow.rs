//! Order placement and status workflow against a real database.
//!
//! These tests require:
//! - A scratch `PostgreSQL` database
//! - `SHOPDESK_TEST_DATABASE_URL` pointing at it (migrations run automatically)
//!
//! Without the variable every test returns immediately.

#![allow(clippy::unwrap_used, clippy::print_stderr)]

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use shopdesk_core::UserRole;
use shopdesk_integration_tests::{TEST_PASSWORD, TestApp, request, test_app, unique_suffix};

async fn order_count(app: &TestApp, admin_token: &str, user_id: i64) -> usize {
    let (status, orders) = app
        .send(request(
            "GET",
            &format!("/users/{user_id}/orders"),
            Some(admin_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    orders.as_array().unwrap().len()
}

fn order_body(user_id: i64, items: &[(i64, i32)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(product_id, quantity)| json!({"product_id": product_id, "quantity": quantity}))
        .collect();
    json!({"user_id": user_id, "items": items})
}

#[tokio::test]
async fn test_order_decrements_stock_and_totals() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "10.00", 5).await;

    let body = order_body(i64::from(customer.id.as_i32()), &[(product, 3)]);
    let (status, order) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["total_amount"], "30.00");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"][0]["price_at_time"], "10.00");
    assert_eq!(order["items"][0]["subtotal"], "30.00");
    assert_eq!(app.stock_of(product).await, 2);
}

#[tokio::test]
async fn test_insufficient_stock_changes_nothing() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let user_id = i64::from(customer.id.as_i32());
    let product = app.create_product(&admin, "4.00", 2).await;

    let (status, body) = app
        .send(request(
            "POST",
            "/orders",
            Some(&token),
            Some(order_body(user_id, &[(product, 5)])),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Not enough stock"));
    assert_eq!(app.stock_of(product).await, 2);
    assert_eq!(order_count(&app, &admin, user_id).await, 0);
}

#[tokio::test]
async fn test_missing_product_rolls_back_whole_order() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let user_id = i64::from(customer.id.as_i32());
    let product = app.create_product(&admin, "1.50", 4).await;

    let body = order_body(user_id, &[(product, 1), (i64::from(i32::MAX), 1)]);
    let (status, _) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.stock_of(product).await, 4);
    assert_eq!(order_count(&app, &admin, user_id).await, 0);
}

#[tokio::test]
async fn test_repeated_lines_share_one_stock_check() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "2.00", 3).await;

    let body = order_body(i64::from(customer.id.as_i32()), &[(product, 2), (product, 2)]);
    let (status, _) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.stock_of(product).await, 3);
}

#[tokio::test]
async fn test_cancellation_restores_stock_once() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "10.00", 5).await;

    let body = order_body(i64::from(customer.id.as_i32()), &[(product, 3)]);
    let (_, order) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;
    let order_uri = format!("/orders/{}", order["order_id"]);
    assert_eq!(app.stock_of(product).await, 2);

    let (status, cancelled) = app
        .send(request(
            "PUT",
            &order_uri,
            Some(&admin),
            Some(json!({"status": "cancelled"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{cancelled}");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(app.stock_of(product).await, 5);

    for next in ["pending", "completed"] {
        let (status, _) = app
            .send(request(
                "PUT",
                &order_uri,
                Some(&admin),
                Some(json!({"status": next})),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "cancelled -> {next}");
    }

    // Re-cancelling is accepted but returns nothing twice
    let (status, _) = app
        .send(request(
            "PUT",
            &order_uri,
            Some(&admin),
            Some(json!({"status": "cancelled"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_of(product).await, 5);
}

#[tokio::test]
async fn test_completion_keeps_stock() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, _) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "3.00", 5).await;

    // Admins may order on behalf of a customer
    let body = order_body(i64::from(customer.id.as_i32()), &[(product, 2)]);
    let (status, order) = app
        .send(request("POST", "/orders", Some(&admin), Some(body)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, completed) = app
        .send(request(
            "PUT",
            &format!("/orders/{}", order["order_id"]),
            Some(&admin),
            Some(json!({"status": "completed"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(app.stock_of(product).await, 3);

    // A shipped order that gets cancelled does not put units back
    let (status, cancelled) = app
        .send(request(
            "PUT",
            &format!("/orders/{}", order["order_id"]),
            Some(&admin),
            Some(json!({"status": "cancelled"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(app.stock_of(product).await, 3);
}

#[tokio::test]
async fn test_items_keep_price_at_order_time() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "10.00", 5).await;

    let body = order_body(i64::from(customer.id.as_i32()), &[(product, 3)]);
    let (_, order) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;

    let (status, _) = app
        .send(request(
            "PUT",
            &format!("/products/{product}"),
            Some(&admin),
            Some(json!({"price": "20.00"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.product(product).await["price"], "20.00");

    let (status, detail) = app
        .send(request(
            "GET",
            &format!("/orders/{}", order["order_id"]),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["items"][0]["price_at_time"], "10.00");
    assert_eq!(detail["items"][0]["subtotal"], "30.00");
    assert_eq!(detail["total_amount"], "30.00");
}

#[tokio::test]
async fn test_order_leaves_other_products_alone() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let ordered = app.create_product(&admin, "5.00", 5).await;
    let bystander = app.create_product(&admin, "7.00", 9).await;
    let before = app.product(bystander).await;

    let body = order_body(i64::from(customer.id.as_i32()), &[(ordered, 2)]);
    let (status, _) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.stock_of(ordered).await, 3);
    assert_eq!(app.product(bystander).await, before);
}

#[tokio::test]
async fn test_concurrent_orders_never_oversell() {
    const BUYERS: usize = 12;
    const STOCK: i32 = 3;

    let app = Arc::new(test_app!());
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "1.00", STOCK).await;
    let user_id = i64::from(customer.id.as_i32());

    let mut orders = tokio::task::JoinSet::new();
    for _ in 0..BUYERS {
        let app = Arc::clone(&app);
        let token = token.clone();
        orders.spawn(async move {
            let body = order_body(user_id, &[(product, 1)]);
            app.send(request("POST", "/orders", Some(&token), Some(body)))
                .await
                .0
        });
    }

    let mut placed = 0;
    while let Some(status) = orders.join_next().await {
        match status.unwrap() {
            StatusCode::CREATED => placed += 1,
            other => assert_eq!(other, StatusCode::UNPROCESSABLE_ENTITY),
        }
    }

    assert_eq!(placed, STOCK);
    assert_eq!(app.stock_of(product).await, 0);
    assert_eq!(order_count(&app, &admin, user_id).await, 3);
}

#[tokio::test]
async fn test_order_visibility() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (owner, owner_token) = app.create_user(UserRole::Customer).await;
    let (_, other_token) = app.create_user(UserRole::Customer).await;
    let product = app.create_product(&admin, "1.00", 10).await;

    let body = order_body(i64::from(owner.id.as_i32()), &[(product, 1)]);
    let (_, order) = app
        .send(request("POST", "/orders", Some(&owner_token), Some(body)))
        .await;
    let uri = format!("/orders/{}", order["order_id"]);

    let (status, detail) = app.send(request("GET", &uri, Some(&owner_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);

    let (status, _) = app.send(request("GET", &uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(request("GET", "/orders/2147483647", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = test_app!();
    let suffix = unique_suffix();
    let username = format!("shopper{suffix}");

    let (status, user) = app
        .send(request(
            "POST",
            "/users",
            None,
            Some(json!({
                "first_name": "Sam",
                "last_name": "Shopper",
                "email": format!("shopper{suffix}@example.com"),
                "username": username,
                "password": TEST_PASSWORD,
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    assert_eq!(user["role"], "customer");
    assert!(user.get("password_hash").is_none());

    let (status, token) = app
        .send(request(
            "POST",
            "/users/login",
            None,
            Some(json!({"username": username, "password": TEST_PASSWORD})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["token_type"], "bearer");

    let (status, _) = app
        .send(request(
            "POST",
            "/users/login",
            None,
            Some(json!({"username": username, "password": "wrong-password"})),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_crud() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let product = app.create_product(&admin, "9.99", 1).await;
    let uri = format!("/products/{product}");

    let (status, updated) = app
        .send(request(
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({"price": "12.50"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], "12.50");
    assert_eq!(updated["stock_quantity"], 1);

    let (status, _) = app.send(request("DELETE", &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
