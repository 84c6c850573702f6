mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{dec_of, id_of, TestApp};

#[tokio::test]
async fn category_lifecycle() {
    let app = TestApp::new().await;

    let created = app
        .create("/api/v1/categories", json!({ "name": "  Beverages " }))
        .await;
    assert_eq!(created["name"], "Beverages");
    assert_eq!(created["type"], "PRODUCT");
    assert_eq!(created["active"], true);
    let id = id_of(&created);

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/categories/{id}"),
            Some(json!({ "type": "SERVICE", "active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "SERVICE");
    assert_eq!(body["data"]["active"], false);
    assert_eq!(body["data"]["name"], "Beverages");

    let (status, body) = app.request(Method::DELETE, &format!("/api/v1/categories/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = app.get(&format!("/api/v1/categories/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let app = TestApp::new().await;
    app.create("/api/v1/categories", json!({ "name": "Tools" }))
        .await;

    let (status, _) = app
        .post("/api/v1/categories", json!({ "name": "Tools" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_names_are_rejected_with_field_details() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/v1/warehouses", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn product_sku_is_unique_and_unit_defaults() {
    let app = TestApp::new().await;

    let created = app
        .create("/api/v1/products", json!({ "sku": "SKU-9", "name": "Widget" }))
        .await;
    assert_eq!(created["unit_of_measure"], "UND");

    let (status, body) = app
        .post("/api/v1/products", json!({ "sku": "SKU-9", "name": "Other" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("SKU-9"));
}

#[tokio::test]
async fn product_with_unknown_category_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/api/v1/products",
            json!({ "sku": "SKU-2", "name": "Widget", "category_id": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
    let app = TestApp::new().await;
    let category = app
        .create("/api/v1/categories", json!({ "name": "Snacks" }))
        .await;
    let category_id = id_of(&category);
    let product = app
        .create(
            "/api/v1/products",
            json!({ "sku": "CHIPS", "name": "Chips", "category_id": category_id }),
        )
        .await;
    let product_id = id_of(&product);
    let warehouse_id = app.warehouse("North").await;
    app.stock_in(warehouse_id, product_id, "3", "1.5").await;

    for uri in [
        format!("/api/v1/categories/{category_id}"),
        format!("/api/v1/products/{product_id}"),
        format!("/api/v1/warehouses/{warehouse_id}"),
    ] {
        let (status, _) = app.request(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{uri} should be protected");
    }
}

#[tokio::test]
async fn inventory_record_registration_and_deletion() {
    let app = TestApp::new().await;
    let (warehouse_id, product_id) = app.stock_context().await;

    let record = app
        .create(
            "/api/v1/inventory",
            json!({
                "product_id": product_id,
                "warehouse_id": warehouse_id,
                "minimum_stock": "5",
            }),
        )
        .await;
    assert_eq!(dec_of(&record["on_hand"]), dec!(0));
    assert_eq!(dec_of(&record["current_weighted_average_cost"]), dec!(0));
    assert_eq!(record["below_minimum"], true);
    assert_eq!(record["lot_count"], 0);
    let record_id = id_of(&record);

    let (status, _) = app
        .post(
            "/api/v1/inventory",
            json!({ "product_id": product_id, "warehouse_id": warehouse_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/inventory/{record_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // A record with lots stays.
    let received = app.stock_in(warehouse_id, product_id, "2", "4").await;
    let stocked_id = received["inventory_id"].as_str().unwrap().to_string();
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/inventory/{stocked_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn record_lots_and_notes() {
    let app = TestApp::new().await;
    let (warehouse_id, product_id) = app.stock_context().await;
    let received = app
        .stock_in_with(json!({
            "warehouse_id": warehouse_id,
            "product_id": product_id,
            "quantity": "12",
            "unit_cost": "2.5",
            "lot_number": "BATCH-7",
            "received_date": "2024-07-03",
        }))
        .await;
    assert_eq!(received["lot"]["lot_number"], "BATCH-7");
    let inventory_id = received["inventory_id"].as_str().unwrap().to_string();
    let lot_id = id_of(&received["lot"]);

    let (status, body) = app
        .get(&format!("/api/v1/inventory/{inventory_id}/lots"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let lots = body["data"].as_array().unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(dec_of(&lots[0]["current_quantity"]), dec!(12));
    assert_eq!(lots[0]["expired"], false);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/lots/{lot_id}"),
            Some(json!({ "notes": "pallet 3, top shelf" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], "pallet 3, top shelf");
    assert_eq!(dec_of(&body["data"]["unit_cost"]), dec!(2.5));

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/lots/{lot_id}"),
            Some(json!({ "unit_cost": "9" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "body");
    assert!(body["details"][0]["message"]
        .as_str()
        .unwrap()
        .contains("unit_cost"));

    let (_, lot) = app.get(&format!("/api/v1/lots/{lot_id}")).await;
    assert_eq!(dec_of(&lot["data"]["unit_cost"]), dec!(2.5));
}

#[tokio::test]
async fn unreadable_bodies_answer_with_the_error_format() {
    let app = TestApp::new().await;

    let (status, body) = app
        .raw(Method::POST, "/api/v1/warehouses", "application/json", "{\"name\": ")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["details"][0]["field"], "body");

    let (status, body) = app
        .raw(Method::POST, "/api/v1/warehouses", "text/plain", "name=North")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "body");
}
