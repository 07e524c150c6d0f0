//! Admin product add/edit/delete forms against a real database.
//!
//! Requires `SHOPDESK_TEST_DATABASE_URL`; without it every test returns
//! immediately.

#![allow(clippy::unwrap_used, clippy::print_stderr)]

use axum::http::StatusCode;
use serde_json::json;

use shopdesk_core::UserRole;
use shopdesk_integration_tests::{
    TestApp, page_request, request, send_raw, test_app, unique_suffix,
};

/// Id of the product with `name`, looked up through the public catalog.
async fn product_named(app: &TestApp, name: &str) -> Option<i64> {
    let (status, products) = app.send(request("GET", "/products", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    products
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .map(|p| p["product_id"].as_i64().unwrap())
}

#[tokio::test]
async fn test_form_creates_product() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let name = format!("Lamp{}", unique_suffix());
    let form = format!("name={name}&description=Brass&price=12.5&stock_quantity=7");

    let (status, _, html) =
        send_raw(&app, page_request("POST", "/admin/products", &admin, Some(&form))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(html.contains("Product created successfully!"));

    let id = product_named(&app, &name).await.unwrap();
    assert!(html.contains(&format!("action=\"/admin/products/{id}\"")));
    let product = app.product(id).await;
    assert_eq!(product["price"], "12.50");
    assert_eq!(product["stock_quantity"], 7);
    assert_eq!(product["description"], "Brass");
}

#[tokio::test]
async fn test_form_updates_product() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let id = app.create_product(&admin, "10.00", 4).await;
    let name = format!("Renamed{}", unique_suffix());
    let form = format!("name={name}&description=&price=11&stock_quantity=9");

    let (status, _, html) = send_raw(
        &app,
        page_request("POST", &format!("/admin/products/{id}"), &admin, Some(&form)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Product updated successfully!"));

    let product = app.product(id).await;
    assert_eq!(product["name"], name.as_str());
    assert_eq!(product["price"], "11.00");
    assert_eq!(product["stock_quantity"], 9);
    assert_eq!(product["description"], "");
}

#[tokio::test]
async fn test_rejected_update_leaves_product_alone() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let id = app.create_product(&admin, "10.00", 4).await;

    let (status, _, html) = send_raw(
        &app,
        page_request(
            "PUT",
            &format!("/admin/products/{id}"),
            &admin,
            Some("name=Valid%20name&price=abc&stock_quantity=3"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("Price must be a number"));
    assert!(html.contains("value=\"abc\""));

    let product = app.product(id).await;
    assert_eq!(product["price"], "10.00");
    assert_eq!(product["stock_quantity"], 4);
}

#[tokio::test]
async fn test_edit_page_of_missing_product() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;

    let (status, _, _) = send_raw(
        &app,
        page_request("GET", "/admin/products/edit/999999", &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_htmx_delete_redirects_to_list() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let id = app.create_product(&admin, "10.00", 1).await;

    let mut delete = page_request("DELETE", &format!("/admin/products/{id}"), &admin, None);
    delete.headers_mut().insert("hx-request", "true".parse().unwrap());
    let (status, headers, _) = send_raw(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["hx-redirect"], "/admin/products");

    let (status, _) = app
        .send(request("GET", &format!("/products/{id}"), None, None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plain_form_delete_is_see_other() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let id = app.create_product(&admin, "10.00", 1).await;

    let (status, headers, _) = send_raw(
        &app,
        page_request("POST", &format!("/admin/products/{id}/delete"), &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers["location"], "/admin/products");
}

#[tokio::test]
async fn test_ordered_product_cannot_be_deleted() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let (customer, token) = app.create_user(UserRole::Customer).await;
    let id = app.create_product(&admin, "10.00", 2).await;

    let body = json!({
        "user_id": customer.id.as_i32(),
        "items": [{"product_id": id, "quantity": 1}],
    });
    let (status, _) = app
        .send(request("POST", "/orders", Some(&token), Some(body)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, html) = send_raw(
        &app,
        page_request("POST", &format!("/admin/products/{id}/delete"), &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(html.contains("Cannot delete"));
    assert_eq!(app.stock_of(id).await, 1);
}
