//! Integration tests for the admin resource commands against a mock backend.

use std::fs;

use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};


use fixtures::{admin_token, karma, sign_in};

fn users_payload() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "total_users": 2,
            "active_users": 1,
            "total_withdrawals": 3,
            "total_cashback_amount": 120.5,
            "users": [
                {"id": "u1", "username": "asha", "email": "asha@example.com",
                 "phone": "+911234567890", "wallet_balance": 10.0, "total_cashback": 5.0},
                {"id": "u2", "username": "ravi", "email": "ravi@example.com",
                 "phone": "+919999999999", "wallet_balance": 0, "total_cashback": 0}
            ]
        }
    })
}

#[tokio::test]
async fn test_users_list_and_search() {
    let server = MockServer::start().await;
    let token = admin_token();
    Mock::given(method("GET"))
        .and(path("/v1/admin/users"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_payload()))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &token);

    karma(home.path(), &server.uri())
        .args(["users", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("asha@example.com"))
        .stdout(predicate::str::contains("₹10.00"))
        .stdout(predicate::str::contains("Showing 1-2 of 2 users"));

    karma(home.path(), &server.uri())
        .args(["users", "list", "--search", "RAVI"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ravi@example.com"))
        .stdout(predicate::str::contains("asha@example.com").not())
        .stdout(predicate::str::contains("Showing 1-1 of 1 users"));

    karma(home.path(), &server.uri())
        .args(["users", "list", "--search", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No users found."));
}

#[tokio::test]
async fn test_users_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_payload()))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["users", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total users:      2"))
        .stdout(predicate::str::contains("₹120.50"));
}

#[tokio::test]
async fn test_backend_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/users"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "message": "Database unavailable"})),
        )
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["users", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database unavailable"));
}

#[tokio::test]
async fn test_withdrawal_approve() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/withdrawals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": "w1", "user_id": "u1", "amount": 250, "status": "pending",
                 "timestamp": "2026-10-19T08:30:00Z"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/withdrawals/update"))
        .and(body_json(json!({"id": "w1", "status": "approved"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["withdrawals", "approve", "w1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Withdrawal w1 approved (₹250.00)"));
}

#[tokio::test]
async fn test_withdrawal_decided_request_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/withdrawals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": "w1", "user_id": "u1", "amount": 250, "status": "rejected"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/withdrawals/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["withdrawals", "approve", "w1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already rejected"));
}

#[tokio::test]
async fn test_withdrawals_list_filters_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/withdrawals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": "w1", "user_id": "u1", "amount": 250, "status": "pending"},
                {"id": "w2", "user_id": "u2", "amount": 75, "status": "approved"}
            ]
        })))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["withdrawals", "list", "--status", "approved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("w2"))
        .stdout(predicate::str::contains("₹250.00").not())
        .stdout(predicate::str::contains("Showing 1-1 of 1 requests"));
}

#[tokio::test]
async fn test_banner_toggle_sends_flipped_banner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/banners"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"banner_id": "b1", "name": "Diwali", "active": true}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/banners/update"))
        .and(body_partial_json(json!({"banner_id": "b1", "active": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["banners", "toggle", "b1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Banner b1 is now Inactive"));
}

#[tokio::test]
async fn test_banner_delete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/banners/delete"))
        .and(body_json(json!({"banner_id": "b1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["banners", "delete", "b1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Banner deleted (b1)"));
}

#[tokio::test]
async fn test_help_stats_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/admin/help"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": "h1", "title": "Refund", "status": "pending"},
                {"id": "h2", "title": "Callback", "status": "in_progress"},
                {"id": "h3", "title": "Login", "status": "resolved"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/admin/help/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["help", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total requests:   3"))
        .stdout(predicate::str::contains("Pending:          1"))
        .stdout(predicate::str::contains("Resolved:         1"));

    karma(home.path(), &server.uri())
        .args(["help", "delete", "h1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Help request deleted (h1)"));
}

#[tokio::test]
async fn test_products_add() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/products"))
        .and(body_json(json!({"productUrl": "https://shop.example.com/p/1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), &server.uri())
        .args(["products", "add", "  https://shop.example.com/p/1 "])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Product URL added successfully!"));
}

#[test]
fn test_products_add_rejects_blank_url() {
    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());

    karma(home.path(), "http://127.0.0.1:9")
        .args(["products", "add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a product URL"));
}

#[tokio::test]
async fn test_notify_uploads_media_then_sends() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("secret-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://files.example.com/offer.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/notification/send"))
        .and(body_partial_json(json!({
            "notified_to": "u2",
            "media": ["https://files.example.com/offer.png"],
            "triggered_by": "admin"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    sign_in(home.path(), &admin_token());
    fs::write(home.path().join("config.toml"), "upload_api_key = \"secret-key\"\n").unwrap();
    let media = home.path().join("offer.png");
    fs::write(&media, b"png bytes").unwrap();

    karma(home.path(), &server.uri())
        .env("KARMA_UPLOAD_URL", format!("{}/upload", server.uri()))
        .args(["notify", "--user", "u2", "--title", "Offer", "--description", "50% off"])
        .arg("--media")
        .arg(&media)
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded media: https://files.example.com/offer.png"))
        .stdout(predicate::str::contains("sent to u2"));
}

#[test]
fn test_upload_without_api_key_fails() {
    let home = tempdir().unwrap();
    let file = home.path().join("banner.png");
    fs::write(&file, b"png bytes").unwrap();

    karma(home.path(), "http://127.0.0.1:9")
        .env("KARMA_UPLOAD_URL", "http://127.0.0.1:9/upload")
        .arg("upload")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No upload API key configured"));
}
