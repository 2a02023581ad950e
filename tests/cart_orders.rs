mod common;

use axum::http::{Method, StatusCode};
use common::{money, TestApp};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn checkout(governorate: Option<&str>) -> Value {
    json!({
        "first_name": "Amel",
        "last_name": "Trabelsi",
        "phone": "22123456",
        "email": "amel@example.tn",
        "shipping_address": "12 rue de Marseille",
        "city": "Sousse",
        "governorate": governorate,
    })
}

#[tokio::test]
async fn cart_add_merge_update_and_remove() {
    let app = TestApp::new().await;
    let customer = app.register("amel@example.tn").await;
    let [table, lit, _] = app.seed_pack_components().await;

    let (status, cart) = app
        .send(Method::GET, "/api/orders/cart", None, Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());

    for quantity in [1, 2] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/orders/cart/items",
                Some(json!({ "product_id": table.id, "quantity": quantity })),
                Some(&customer.token),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, cart) = app
        .send(
            Method::POST,
            "/api/orders/cart/items",
            Some(json!({ "product_id": lit.id, "quantity": 1 })),
            Some(&customer.token),
        )
        .await;

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(cart["item_count"], 4);
    // 3 x 1000 + 1 x 1500 (discounted)
    assert_eq!(money(&cart["subtotal"]), Decimal::from(4500));

    let line = items
        .iter()
        .find(|line| line["product"]["slug"] == "lit-jasmin")
        .unwrap();
    assert_eq!(money(&line["unit_price"]), Decimal::from(1500));
    let line_id = line["id"].as_str().unwrap().to_string();

    let (status, cart) = app
        .send(
            Method::PUT,
            &format!("/api/orders/cart/items/{line_id}"),
            Some(json!({ "quantity": 3 })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&cart["subtotal"]), Decimal::from(7500));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/orders/cart/items/{line_id}"),
            Some(json!({ "quantity": 0 })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = app
        .send(
            Method::DELETE,
            &format!("/api/orders/cart/items/{line_id}"),
            None,
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/orders/cart/items/{line_id}"),
            None,
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart item not found");

    let (status, body) = app
        .send(Method::DELETE, "/api/orders/cart", None, Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart cleared successfully");
}

#[tokio::test]
async fn cart_item_needs_exactly_one_target() {
    let app = TestApp::new().await;
    let customer = app.register("amel@example.tn").await;
    let [table, _, _] = app.seed_pack_components().await;

    for body in [
        json!({ "quantity": 1 }),
        json!({ "product_id": table.id, "pack_id": table.id, "quantity": 1 }),
    ] {
        let (status, response) = app
            .send(
                Method::POST,
                "/api/orders/cart/items",
                Some(body),
                Some(&customer.token),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response["message"],
            "Exactly one of product_id or pack_id must be provided"
        );
    }
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() {
    let app = TestApp::new().await;
    let customer = app.register("amel@example.tn").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/orders",
            Some(checkout(Some("Sousse"))),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");

    let mut explicit = checkout(None);
    explicit["items"] = json!([]);
    let (status, body) = app
        .send(Method::POST, "/api/orders", Some(explicit), Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No items provided");
}

#[tokio::test]
async fn order_from_cart_snapshots_prices_and_clears_cart() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let customer = app.register("amel@example.tn").await;
    let [table, lit, salon] = app.seed_pack_components().await;

    let (status, pack) = app
        .send(
            Method::POST,
            "/api/admin/packs",
            Some(json!({
                "name": "Pack Médina",
                "slug": "pack-medina",
                "product_sam_id": table.id,
                "product_cac_id": lit.id,
                "product_salon_id": salon.id,
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.send(
        Method::POST,
        "/api/orders/cart/items",
        Some(json!({ "product_id": table.id, "quantity": 2 })),
        Some(&customer.token),
    )
    .await;
    app.send(
        Method::POST,
        "/api/orders/cart/items",
        Some(json!({ "pack_id": pack["id"], "quantity": 1 })),
        Some(&customer.token),
    )
    .await;

    let (status, order) = app
        .send(
            Method::POST,
            "/api/orders",
            Some(checkout(Some("sousse"))),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "PENDING");
    // 2 x 1000 + 5225
    assert_eq!(money(&order["subtotal"]), Decimal::from(7225));
    assert_eq!(money(&order["shipping_cost"]), Decimal::from(8));
    assert_eq!(money(&order["total_price"]), Decimal::from(7233));

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let pack_line = items.iter().find(|i| !i["pack_id"].is_null()).unwrap();
    assert_eq!(pack_line["item_name"], "Pack Médina");
    assert_eq!(money(&pack_line["price_at_time"]), Decimal::from(5225));

    let (_, cart) = app
        .send(Method::GET, "/api/orders/cart", None, Some(&customer.token))
        .await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    // Later price changes leave the placed order untouched
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/catalog/products/{}", table.id),
            Some(json!({ "price": 1300 })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = app
        .send(
            Method::GET,
            &format!("/api/orders/{}", order["id"].as_str().unwrap()),
            None,
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&fetched["total_price"]), Decimal::from(7233));
    let table_line = fetched["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| !i["product_id"].is_null())
        .unwrap();
    assert_eq!(money(&table_line["price_at_time"]), Decimal::from(1000));
}

#[tokio::test]
async fn explicit_items_use_default_shipping_for_unknown_governorate() {
    let app = TestApp::new().await;
    let customer = app.register("amel@example.tn").await;
    let [_, lit, _] = app.seed_pack_components().await;

    let mut request = checkout(Some("Atlantide"));
    request["items"] = json!([{ "product_id": lit.id, "quantity": 2 }]);
    let (status, order) = app
        .send(Method::POST, "/api/orders", Some(request), Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(money(&order["subtotal"]), Decimal::from(3000));
    assert_eq!(money(&order["shipping_cost"]), Decimal::from(10));
    assert_eq!(money(&order["total_price"]), Decimal::from(3010));
}

#[tokio::test]
async fn cancellation_only_while_pending() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let customer = app.register("amel@example.tn").await;
    let other = app.register("sami@example.tn").await;
    let [table, _, _] = app.seed_pack_components().await;

    let place = |n: i32| {
        let mut request = checkout(Some("Tunis"));
        request["items"] = json!([{ "product_id": table.id, "quantity": n }]);
        request
    };

    let (_, shipped) = app
        .send(Method::POST, "/api/orders", Some(place(1)), Some(&customer.token))
        .await;
    let shipped_id = shipped["id"].as_str().unwrap().to_string();
    let (_, pending) = app
        .send(Method::POST, "/api/orders", Some(place(2)), Some(&customer.token))
        .await;
    let pending_id = pending["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .send(
            Method::PATCH,
            &format!("/api/orders/{shipped_id}/status"),
            Some(json!({ "status": "SHIPPED" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "SHIPPED");
    assert_eq!(updated["customer"]["email"], "amel@example.tn");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/orders/{shipped_id}/cancel"),
            None,
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Someone else's order looks like it does not exist
    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/orders/{pending_id}/cancel"),
            None,
            Some(&other.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cancelled) = app
        .send(
            Method::PATCH,
            &format!("/api/orders/{pending_id}/cancel"),
            None,
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (status, mine) = app
        .send(Method::GET, "/api/orders", None, Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/orders/{pending_id}/status"),
            Some(json!({ "status": "LOST" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid order status");

    let (status, _) = app
        .send(Method::GET, "/api/orders/admin/all", None, Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, all) = app
        .send(Method::GET, "/api/orders/admin/all", None, Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cart_quantities_are_capped() {
    let app = TestApp::new().await;
    let customer = app.register("amel@example.tn").await;
    let [table, _, _] = app.seed_pack_components().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/orders/cart/items",
            Some(json!({ "product_id": table.id, "quantity": i32::MAX })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity cannot exceed 1000");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/orders/cart/items",
            Some(json!({ "product_id": table.id, "quantity": 1000 })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Merging into the existing line may not push it past the cap
    let (status, body) = app
        .send(
            Method::POST,
            "/api/orders/cart/items",
            Some(json!({ "product_id": table.id, "quantity": 1 })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity cannot exceed 1000");

    let (status, cart) = app
        .send(Method::GET, "/api/orders/cart", None, Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["item_count"], 1000);

    let mut request = checkout(None);
    request["items"] = json!([{ "product_id": table.id, "quantity": 1001 }]);
    let (status, _) = app
        .send(Method::POST, "/api/orders", Some(request), Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_get_the_error_envelope() {
    let app = TestApp::new().await;
    let customer = app.register("amel@example.tn").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/orders/cart/items",
            Some(json!({ "product_id": null })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["details"], "INVALID_JSON_BODY");
    assert!(body["message"].as_str().unwrap().contains("quantity"));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/orders/cart/items",
            Some(json!({ "product_id": "not-a-uuid", "quantity": 1 })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "INVALID_JSON_BODY");

    let (status, body) = app
        .send_raw("/api/orders/cart/items", "{\"quantity\": 1", Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "INVALID_JSON_SYNTAX");
}
