//! End-to-end client tests
//!
//! Wires the full client together against a mock HTTP server: login feeds the
//! note store, a stored token restores the whole session on startup, and a
//! rejected token lands the user back on the login screen.

use std::sync::Arc;
use std::time::Duration;

use growing_client::{ClientConfig, GrowingClient, MockNavigator, Route, SessionStatus};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json() -> serde_json::Value {
    json!({ "id": 1, "username": "ada", "email": "ada@example.com" })
}

fn note_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "content": "body",
        "category_id": null,
        "category_name": null,
        "created_at": "2024-05-01T10:00:00Z",
        "is_archived": false
    })
}

fn stats_json() -> serde_json::Value {
    json!({
        "stats": {
            "totalStats": { "total_notes": 1, "archived_notes": 0, "active_days": 1 },
            "monthlyStats": [{ "month": 5, "count": 1 }],
            "categoryStats": []
        }
    })
}

async fn mount_collections(server: &MockServer, token: &str) {
    let bearer = format!("Bearer {token}");
    Mock::given(method("GET"))
        .and(path("/notes"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "notes": [note_json(1, "One")] })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "categories": [{ "id": 1, "name": "Work" }] })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/stats"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_populates_the_store() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let navigator = Arc::new(MockNavigator::new(Route::Login));
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        credentials_path: Some(dir.path().join("token")),
    };

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "tok-live", "user": user_json() })),
        )
        .mount(&server)
        .await;
    mount_collections(&server, "tok-live").await;

    let client = GrowingClient::new(config, navigator.clone()).unwrap();
    client.start().await;
    assert_eq!(client.session().status().await, SessionStatus::Unauthenticated);

    let outcome = client.session().login("ada@example.com", "pw").await;
    assert!(outcome.is_success());

    // The store reloads in the background once the session is up.
    let mut populated = false;
    for _ in 0..100 {
        if !client.notes().notes().await.is_empty() {
            populated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(populated, "store did not load after login");
    assert_eq!(client.notes().categories().await.len(), 1);
    assert!(client.notes().stats().await.is_some());
    assert_eq!(navigator.navigation_count(), 0);
}

#[tokio::test]
async fn test_restored_session_loads_collections_on_start() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "tok-stored").unwrap();

    let navigator = Arc::new(MockNavigator::new(Route::Dashboard));
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        credentials_path: Some(token_path),
    };

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .and(header("authorization", "Bearer tok-stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user_json() })))
        .expect(1)
        .mount(&server)
        .await;
    mount_collections(&server, "tok-stored").await;

    let client = GrowingClient::new(config, navigator).unwrap();
    client.start().await;

    assert_eq!(client.session().status().await, SessionStatus::Authenticated);
    assert_eq!(client.session().user().await.unwrap().username, "ada");

    let mut populated = false;
    for _ in 0..100 {
        if !client.notes().notes().await.is_empty() {
            populated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(populated, "store did not load for the restored session");
}

#[tokio::test]
async fn test_rejected_stored_credential_lands_on_the_login_screen() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "tok-expired").unwrap();

    let navigator = Arc::new(MockNavigator::new(Route::Dashboard));
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        credentials_path: Some(token_path.clone()),
    };

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })))
        .mount(&server)
        .await;

    let client = GrowingClient::new(config, navigator.clone()).unwrap();
    client.start().await;

    assert_eq!(client.session().status().await, SessionStatus::Unauthenticated);
    assert!(!client.credentials().is_present().await);
    assert!(!token_path.exists(), "token file should be removed");
    assert_eq!(navigator.navigations(), vec![Route::Login]);
    assert!(client.notes().notes().await.is_empty());
}
