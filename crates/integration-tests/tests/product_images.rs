//! Product image records against a real database.
//!
//! Runs only when `SHOPDESK_TEST_DATABASE_URL` is set.

#![allow(clippy::unwrap_used, clippy::print_stderr)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use shopdesk_core::UserRole;
use shopdesk_integration_tests::{TestApp, request, test_app};

async fn add_image(app: &TestApp, admin: &str, product: i64, body: Value) -> Value {
    let (status, image) = app
        .send(request(
            "POST",
            &format!("/products/{product}/images"),
            Some(admin),
            Some(body),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{image}");
    image
}

fn image_body(name: &str, is_primary: bool) -> Value {
    json!({
        "image_url": format!("/uploads/products/{name}.jpg"),
        "file_size": 2048,
        "file_type": "image/jpeg",
        "is_primary": is_primary,
    })
}

async fn images_of(app: &TestApp, product: i64) -> Vec<Value> {
    let (status, images) = app
        .send(request("GET", &format!("/products/{product}/images"), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    images.as_array().unwrap().clone()
}

fn primary_ids(images: &[Value]) -> Vec<i64> {
    images
        .iter()
        .filter(|i| i["is_primary"] == true)
        .map(|i| i["image_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_images_append_and_keep_one_primary() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let product = app.create_product(&admin, "5.00", 1).await;

    let first = add_image(&app, &admin, product, image_body("a", true)).await;
    let second = add_image(&app, &admin, product, image_body("b", false)).await;
    let third = add_image(&app, &admin, product, image_body("c", true)).await;

    let images = images_of(&app, product).await;
    let sorts: Vec<i64> = images
        .iter()
        .map(|i| i["sort_order"].as_i64().unwrap())
        .collect();
    assert_eq!(sorts, [1, 2, 3]);
    assert_eq!(primary_ids(&images), [third["image_id"].as_i64().unwrap()]);

    // set-primary moves the flag rather than adding a second one
    let (status, _) = app
        .send(request(
            "PUT",
            &format!("/products/{product}/images/{}/set-primary", second["image_id"]),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        primary_ids(&images_of(&app, product).await),
        [second["image_id"].as_i64().unwrap()]
    );

    let (status, _) = app
        .send(request(
            "PUT",
            &format!("/products/{product}/images/{}", first["image_id"]),
            Some(&admin),
            Some(json!({"is_primary": true})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        primary_ids(&images_of(&app, product).await),
        [first["image_id"].as_i64().unwrap()]
    );
}

#[tokio::test]
async fn test_explicit_sort_order_is_kept() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let product = app.create_product(&admin, "5.00", 1).await;

    let mut body = image_body("late", false);
    body["sort_order"] = json!(10);
    let image = add_image(&app, &admin, product, body).await;
    assert_eq!(image["sort_order"], 10);

    let next = add_image(&app, &admin, product, image_body("next", false)).await;
    assert_eq!(next["sort_order"], 11);
}

#[tokio::test]
async fn test_deleting_primary_promotes_lowest_sort_order() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let product = app.create_product(&admin, "5.00", 1).await;

    let first = add_image(&app, &admin, product, image_body("a", false)).await;
    add_image(&app, &admin, product, image_body("b", false)).await;
    let primary = add_image(&app, &admin, product, image_body("c", true)).await;

    let (status, _) = app
        .send(request(
            "DELETE",
            &format!("/products/{product}/images/{}", primary["image_id"]),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let images = images_of(&app, product).await;
    assert_eq!(images.len(), 2);
    assert_eq!(primary_ids(&images), [first["image_id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn test_image_lookups_are_scoped_to_their_product() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;
    let owner = app.create_product(&admin, "5.00", 1).await;
    let other = app.create_product(&admin, "6.00", 1).await;
    let image = add_image(&app, &admin, owner, image_body("mine", true)).await;
    let foreign = format!("/products/{other}/images/{}", image["image_id"]);

    let (status, body) = app.send(request("GET", &foreign, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Image not found");

    let (status, _) = app
        .send(request("DELETE", &foreign, Some(&admin), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(request(
            "PUT",
            &format!("{foreign}/set-primary"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(images_of(&app, owner).await.len(), 1);
    assert!(images_of(&app, other).await.is_empty());
}

#[tokio::test]
async fn test_images_of_missing_product() {
    let app = test_app!();
    let (_, admin) = app.create_user(UserRole::Admin).await;

    let (status, _) = app
        .send(request("GET", "/products/2147483647/images", None, None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(request(
            "POST",
            "/products/2147483647/images",
            Some(&admin),
            Some(image_body("orphan", false)),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
