mod common;

use axum::http::{Method, StatusCode};
use common::{money, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn dashboard_counts_and_revenue() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let customer = app.register("amel@example.tn").await;
    let [table, _, _] = app.seed_pack_components().await;

    let mut ids = Vec::new();
    for quantity in [1, 2, 3] {
        let (status, order) = app
            .send(
                Method::POST,
                "/api/orders",
                Some(json!({
                    "first_name": "Amel",
                    "last_name": "Trabelsi",
                    "phone": "22123456",
                    "email": "amel@example.tn",
                    "shipping_address": "12 rue de Marseille",
                    "city": "Tunis",
                    "governorate": "Tunis",
                    "items": [{ "product_id": table.id, "quantity": quantity }]
                })),
                Some(&customer.token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(order["id"].as_str().unwrap().to_string());
    }

    // Confirmed 1007 and delivered 2007 count, the pending 3007 does not
    for (id, status) in [(&ids[0], "CONFIRMED"), (&ids[1], "delivered")] {
        let (code, _) = app
            .send(
                Method::PATCH,
                &format!("/api/orders/{id}/status"),
                Some(json!({ "status": status })),
                Some(&admin.token),
            )
            .await;
        assert_eq!(code, StatusCode::OK);
    }

    let (status, stats) = app
        .send(Method::GET, "/api/admin/dashboard/stats", None, Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK, "{stats}");
    assert_eq!(stats["total_products"], 3);
    assert_eq!(stats["total_categories"], 3);
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_orders"], 3);
    assert_eq!(stats["pending_orders"], 1);
    assert_eq!(money(&stats["total_revenue"]), Decimal::from(3014));
    assert_eq!(stats["recent_orders"].as_array().unwrap().len(), 3);
    assert_eq!(stats["recent_products"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn users_listing_and_detail() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let customer = app.register("amel@example.tn").await;
    let [table, _, _] = app.seed_pack_components().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/orders",
            Some(json!({
                "first_name": "Amel",
                "last_name": "Trabelsi",
                "phone": "22123456",
                "email": "amel@example.tn",
                "shipping_address": "12 rue de Marseille",
                "city": "Tunis",
                "items": [{ "product_id": table.id, "quantity": 1 }]
            })),
            Some(&customer.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, users) = app
        .send(Method::GET, "/api/admin/users", None, Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    let amel = users
        .iter()
        .find(|u| u["email"] == "amel@example.tn")
        .unwrap();
    assert_eq!(amel["order_count"], 1);
    assert!(amel.get("password_hash").is_none());

    let (status, detail) = app
        .send(
            Method::GET,
            &format!("/api/admin/users/{}", customer.id),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["orders"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/admin/users/{}", uuid::Uuid::new_v4()),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_changes_take_effect_on_next_request() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let customer = app.register("amel@example.tn").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/admin/users/{}/role", customer.id),
            Some(json!({ "role": "SUPERUSER" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid role");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/admin/users/{}/role", customer.id),
            Some(json!({ "role": "admin" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");

    let (status, _) = app
        .send(Method::GET, "/api/admin/users", None, Some(&customer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn contact_form_is_forwarded() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/contact",
            Some(json!({
                "name": "Sami",
                "email": "sami@example.tn",
                "phone": "22123456",
                "subject": "Livraison",
                "message": "Livrez-vous à Djerba ?"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "atelier@lartistou.test");
    assert_eq!(sent[0].reply_to.as_deref(), Some("sami@example.tn"));
    assert_eq!(sent[0].subject, "[Contact] Livraison");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/contact",
            Some(json!({
                "name": "S",
                "phone": "22123456",
                "subject": "Livraison",
                "message": "trop court"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_mail_failure_is_a_server_error() {
    let app = TestApp::with_failing_mailer().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/contact",
            Some(json!({
                "name": "Sami",
                "phone": "22123456",
                "subject": "Livraison",
                "message": "Livrez-vous à Djerba ?"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_and_banner() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("L'Artistou API up"));

    let (status, body) = app.send(Method::GET, "/api/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");

    let response = app.request(Method::GET, "/api/health", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
